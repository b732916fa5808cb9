use std::borrow::Cow;

use time::Duration;
use tower_cookies::Cookie;

use crate::SameSite;

/// Default name of the token cookie.
pub const DEFAULT_COOKIE_NAME: &str = "_U";

/// Default name of the display-name cookie.
pub const DEFAULT_USERNAME_COOKIE_NAME: &str = "_UN";

/// Default name of the mail cookie.
pub const DEFAULT_MAIL_COOKIE_NAME: &str = "_UM";

/// Default token time-to-live in seconds.
pub const DEFAULT_TTL_SECONDS: i64 = 1800;

/// Environment variable read by [`LoginCookieConfig::from_env`] for the TTL in seconds.
pub const TTL_ENV_VAR: &str = "LOGIN_COOKIE_EXPIRE_SECONDS";

/// Environment variable read by [`LoginCookieConfig::from_env`] for the token cookie name.
pub const NAME_ENV_VAR: &str = "LOGIN_COOKIE_NAME";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a positive number of seconds, got {value:?}")]
    InvalidTtl { key: &'static str, value: String },

    #[error("{key} must not be empty")]
    EmptyName { key: &'static str },
}

#[derive(Debug, Clone)]
pub struct LoginCookieConfig {
    pub(crate) name: Cow<'static, str>,
    pub(crate) username_name: Cow<'static, str>,
    pub(crate) mail_name: Cow<'static, str>,
    pub(crate) ttl: Duration,
    pub(crate) http_only: bool,
    pub(crate) same_site: SameSite,
    pub(crate) secure: bool,
    pub(crate) path: Cow<'static, str>,
    pub(crate) domain: Option<Cow<'static, str>>,
}

impl Default for LoginCookieConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.into(),
            username_name: DEFAULT_USERNAME_COOKIE_NAME.into(),
            mail_name: DEFAULT_MAIL_COOKIE_NAME.into(),
            ttl: Duration::seconds(DEFAULT_TTL_SECONDS),
            http_only: true,
            same_site: SameSite::Lax,
            secure: true,
            path: "/".into(),
            domain: None,
        }
    }
}

impl LoginCookieConfig {
    /// Defaults overridden by [`TTL_ENV_VAR`] and [`NAME_ENV_VAR`] when they are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary key/value source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a key maps to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(TTL_ENV_VAR) {
            let seconds = value
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|seconds| *seconds > 0)
                .ok_or_else(|| ConfigError::InvalidTtl {
                    key: TTL_ENV_VAR,
                    value: value.clone(),
                })?;
            config = config.with_ttl(Duration::seconds(seconds));
        }

        if let Some(name) = lookup(NAME_ENV_VAR) {
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::EmptyName { key: NAME_ENV_VAR });
            }
            config = config.with_name(name.to_owned());
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_name<N: Into<Cow<'static, str>>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_username_cookie_name<N: Into<Cow<'static, str>>>(mut self, name: N) -> Self {
        self.username_name = name.into();
        self
    }

    #[must_use]
    pub fn with_mail_cookie_name<N: Into<Cow<'static, str>>>(mut self, name: N) -> Self {
        self.mail_name = name.into();
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_path<P: Into<Cow<'static, str>>>(mut self, path: P) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_domain<D: Into<Cow<'static, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn without_domain(mut self) -> Self {
        self.domain = None;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub(crate) fn token_cookie(&self, value: String) -> Cookie<'static> {
        self.build_cookie(self.name.clone(), value, self.ttl)
    }

    pub(crate) fn username_cookie(&self, value: String) -> Cookie<'static> {
        self.build_cookie(self.username_name.clone(), value, self.ttl)
    }

    pub(crate) fn mail_cookie(&self, value: String) -> Cookie<'static> {
        self.build_cookie(self.mail_name.clone(), value, self.ttl)
    }

    /// The empty, already-expired token cookie written on logout.
    pub(crate) fn logout_cookie(&self) -> Cookie<'static> {
        self.build_cookie(self.name.clone(), String::new(), Duration::ZERO)
    }

    fn build_cookie(
        &self,
        name: Cow<'static, str>,
        value: String,
        max_age: Duration,
    ) -> Cookie<'static> {
        let mut cookie_builder = Cookie::build((name, value))
            .http_only(self.http_only)
            .same_site(self.same_site)
            .secure(self.secure)
            .path(self.path.clone())
            .max_age(std::cmp::max(max_age, Duration::ZERO));

        if let Some(domain) = self.domain.clone() {
            cookie_builder = cookie_builder.domain(domain);
        }

        cookie_builder.build()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = LoginCookieConfig::default();
        assert_eq!(config.name(), "_U");
        assert_eq!(config.ttl(), Duration::seconds(1800));
    }

    #[test]
    fn lookup_without_keys_uses_defaults() {
        let config = LoginCookieConfig::from_lookup(lookup(&[])).expect("config builds");
        assert_eq!(config.name(), DEFAULT_COOKIE_NAME);
        assert_eq!(config.ttl(), Duration::seconds(DEFAULT_TTL_SECONDS));
    }

    #[test]
    fn lookup_overrides_ttl_and_name() {
        let config = LoginCookieConfig::from_lookup(lookup(&[
            (TTL_ENV_VAR, " 60 "),
            (NAME_ENV_VAR, "auth"),
        ]))
        .expect("config builds");

        assert_eq!(config.name(), "auth");
        assert_eq!(config.ttl(), Duration::seconds(60));
    }

    #[test]
    fn lookup_rejects_bad_values() {
        let err = LoginCookieConfig::from_lookup(lookup(&[(TTL_ENV_VAR, "soon")]))
            .expect_err("ttl is rejected");
        assert!(matches!(err, ConfigError::InvalidTtl { .. }));

        let err = LoginCookieConfig::from_lookup(lookup(&[(TTL_ENV_VAR, "0")]))
            .expect_err("ttl is rejected");
        assert!(matches!(err, ConfigError::InvalidTtl { .. }));

        let err = LoginCookieConfig::from_lookup(lookup(&[(NAME_ENV_VAR, "  ")]))
            .expect_err("name is rejected");
        assert_eq!(err, ConfigError::EmptyName { key: NAME_ENV_VAR });
    }

    #[test]
    fn cookies_carry_attributes() {
        let config = LoginCookieConfig::default()
            .with_domain("example.com")
            .with_path("/app")
            .with_ttl(Duration::seconds(90));

        let cookie = config.token_cookie("value".into());
        assert_eq!(cookie.name(), "_U");
        assert_eq!(cookie.value(), "value");
        assert_eq!(cookie.max_age(), Some(Duration::seconds(90)));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.path(), Some("/app"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));

        assert_eq!(config.username_cookie("alice".into()).name(), "_UN");
        assert_eq!(config.mail_cookie("a@b.com".into()).name(), "_UM");

        let logout = config.logout_cookie();
        assert_eq!(logout.value(), "");
        assert_eq!(logout.max_age(), Some(Duration::ZERO));
    }
}
