#![allow(dead_code)]

// Shared helpers for integration tests.
//
// These helpers use `tower_cookies::Cookie` parsing/encoding to match what the middleware
// emits in `Set-Cookie` and what browsers send back in `Cookie`.
use axum::{Router, body::Body, extract::Path, routing::get};
use http::{HeaderMap, Response, header};
use http_body_util::BodyExt as _;
use tower_cookies::Cookie;
use tower_login_cookie::{
    CurrentUser, InMemoryDirectory, LoginCookieLayer, LoginSession, MacResolver, Principal,
    UserDirectory, UserId,
};

pub fn alice() -> Principal {
    Principal::new(UserId(1), "a@b.com").with_display_name("alice")
}

pub fn bob() -> Principal {
    Principal::new(UserId(2), "bob@example.com").with_display_name("bob")
}

pub fn directory() -> InMemoryDirectory {
    [alice(), bob()].into_iter().collect()
}

pub async fn body_string(body: Body) -> String {
    // Collect an Axum body into a UTF-8 string for assertions.
    let bytes = body
        .collect()
        .await
        .expect("body collects successfully")
        .to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub fn routes(directory: InMemoryDirectory) -> Router {
    // `/login/{id}` logs the directory user in, the rest read or end the session.
    Router::new()
        .route(
            "/login/{id}",
            get(move |session: LoginSession, Path(id): Path<i64>| {
                let directory = directory.clone();
                async move {
                    let principal = directory
                        .find_by_id(UserId(id))
                        .expect("directory lookup succeeds")
                        .expect("user exists");
                    session.login(&principal).expect("login succeeds");
                }
            }),
        )
        .route(
            "/whoami",
            get(|CurrentUser(user): CurrentUser| async move { user.username }),
        )
        .route(
            "/anomalies",
            get(|session: LoginSession| async move {
                session
                    .outcome()
                    .map(|auth| auth.anomalies.len().to_string())
                    .unwrap_or_else(|err| err.to_string())
            }),
        )
        .route(
            "/logout",
            get(|session: LoginSession| async move {
                session.logout();
            }),
        )
}

pub fn app(directory: InMemoryDirectory) -> Router {
    routes(directory.clone()).layer(LoginCookieLayer::new(directory))
}

pub fn app_with_resolver<M: MacResolver>(directory: InMemoryDirectory, resolver: M) -> Router {
    let layer = LoginCookieLayer::new(directory.clone()).with_mac_resolver(resolver);
    routes(directory).layer(layer)
}

pub fn set_cookies(headers: &HeaderMap) -> Vec<Cookie<'static>> {
    // Parse every `Set-Cookie` header into a `Cookie` structure.
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| {
            let value = value.to_str().expect("set-cookie header is valid utf-8");
            Cookie::parse_encoded(value)
                .expect("set-cookie parses successfully")
                .into_owned()
        })
        .collect()
}

pub fn find_cookie(res: &Response<Body>, name: &str) -> Cookie<'static> {
    set_cookies(res.headers())
        .into_iter()
        .find(|cookie| cookie.name() == name)
        .expect("response sets the cookie")
}

pub fn cookie_header_value(cookie: &Cookie<'_>) -> String {
    // Encode a cookie for use in a `Cookie` request header.
    Cookie::new(cookie.name().to_owned(), cookie.value().to_owned())
        .encoded()
        .to_string()
}
