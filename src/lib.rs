//! Cookie-carried login tokens for `tower` and `axum`.
//!
//! A login token is a [`SessionRecord`] (user id, username, ip, mac, last login time)
//! encoded into a cookie value. Every request presenting the cookie is checked for expiry,
//! looked up in a [`UserDirectory`], cross-checked against the directory's username, and on
//! success reissued with a fresh timestamp. No server-side session store is involved.
//!
//! [`LoginCookieLayer`] runs that pipeline in front of a service and inserts a
//! [`LoginSession`] into request extensions. [`SessionValidator`] and the [`format`] module
//! can also be used on their own.
//!
//! # Security
//! The token format is **not** tamper resistant. It is reversible obfuscation with fixed
//! markers: anyone who knows the format can decode a token and forge one for any user id and
//! username. The username cross-check and the ip/mac anomaly logging do not prevent this.
//! Deploy it only where that is acceptable, or wrap the cookie with a signing
//! [`CookieController`].

mod address;
mod config;
mod controller;
mod directory;
mod error;
pub mod format;
pub mod layer;
mod record;
mod session;
mod validator;

pub use tower_cookies::cookie::SameSite;

pub use crate::address::{
    MacResolver, MacResolverFn, RequestContext, UnresolvedMac, normalize_mac, remote_ip,
};
pub use crate::config::{
    ConfigError, DEFAULT_COOKIE_NAME, DEFAULT_MAIL_COOKIE_NAME, DEFAULT_TTL_SECONDS,
    DEFAULT_USERNAME_COOKIE_NAME, LoginCookieConfig, NAME_ENV_VAR, TTL_ENV_VAR,
};
pub use crate::controller::{CookieController, PlaintextCookie};
pub use crate::directory::{BoxError, InMemoryDirectory, Principal, Status, UserDirectory};
pub use crate::error::LoginError;
pub use crate::layer::LoginCookieLayer;
pub use crate::record::{SessionRecord, UserId};
pub use crate::session::{CurrentUser, LoginSession};
pub use crate::validator::{Anomaly, Authenticated, SessionValidator};
