use std::net::SocketAddr;

use axum::{Router, extract::Path, http::StatusCode, routing::get};
use time::Duration;
use tower_login_cookie::{
    CurrentUser, InMemoryDirectory, LoginCookieConfig, LoginCookieLayer, LoginSession, Principal,
    SameSite, UserDirectory, UserId,
};

async fn index(CurrentUser(user): CurrentUser) -> String {
    format!("hello {} <{}>", user.display_name, user.username)
}

async fn logout(session: LoginSession) -> &'static str {
    session.logout();
    "bye"
}

#[tokio::main]
async fn main() {
    let directory: InMemoryDirectory = [
        Principal::new(UserId(1), "alice@example.com").with_display_name("alice"),
        Principal::new(UserId(2), "bob@example.com").with_display_name("bob"),
    ]
    .into_iter()
    .collect();

    let config = LoginCookieConfig::default()
        // Default: "_U"
        .with_name("_U")
        // Default: 1800 seconds
        .with_ttl(Duration::minutes(30))
        // Default: SameSite::Lax
        .with_same_site(SameSite::Lax)
        // Default: true (set to false for local HTTP development)
        .with_secure(false)
        // Default: "/"
        .with_path("/")
        // Default: None
        .without_domain();
    let layer = LoginCookieLayer::new(directory.clone()).with_config(config);

    // A stand-in for a real credential check: `/login/1` logs in as alice.
    let login = move |session: LoginSession, Path(id): Path<i64>| {
        let directory = directory.clone();
        async move {
            match directory.find_by_id(UserId(id)) {
                Ok(Some(principal)) => match session.login(&principal) {
                    Ok(()) => (StatusCode::OK, "logged in".to_owned()),
                    Err(err) => (err.status_code(), err.to_string()),
                },
                _ => (StatusCode::NOT_FOUND, "no such user".to_owned()),
            }
        }
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/login/{id}", get(login))
        .route("/logout", get(logout))
        .layer(layer);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("tcp listener binds successfully");
    let local_addr = listener.local_addr().expect("local address is available");
    println!("listening at http://{local_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server runs successfully");
}
