use std::fmt::Debug;

use tower_cookies::{Cookie, Cookies};

/// How login cookies are read from and written to the request's cookie jar.
pub trait CookieController: Debug + Clone + Send + Sync + 'static {
    fn get(&self, cookies: &Cookies, name: &str) -> Option<Cookie<'static>>;
    fn add(&self, cookies: &Cookies, cookie: Cookie<'static>);
}

/// Cookies are stored as-is. The token format carries no integrity protection of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextCookie;

impl CookieController for PlaintextCookie {
    fn get(&self, cookies: &Cookies, name: &str) -> Option<Cookie<'static>> {
        cookies.get(name).map(Cookie::into_owned)
    }

    fn add(&self, cookies: &Cookies, cookie: Cookie<'static>) {
        cookies.add(cookie);
    }
}
