//! The per-request validation pipeline.
//!
//! Checks run in a fixed order and stop at the first failure: presence, decoding, expiry,
//! directory lookup, status, identity. A token that passes is reissued with the current
//! request's address and time, so every successful request extends the session by the full
//! TTL.

use time::{Duration, OffsetDateTime};

use crate::{
    address::RequestContext,
    config::LoginCookieConfig,
    directory::{Principal, UserDirectory},
    error::LoginError,
    format,
    record::{SessionRecord, unix_millis},
};

/// An inconsistency between the token and the current request that does not block login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    MacMismatch { recorded: String, current: String },
    IpMismatch { recorded: String, current: String },
}

/// A request whose login cookie passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub principal: Principal,
    /// The reissued record, already encoded into `token`.
    pub record: SessionRecord,
    /// Value to write back into the login cookie.
    pub token: String,
    pub anomalies: Vec<Anomaly>,
}

#[derive(Debug, Clone)]
pub struct SessionValidator<D> {
    config: LoginCookieConfig,
    directory: D,
}

impl<D: UserDirectory> SessionValidator<D> {
    pub fn new(config: LoginCookieConfig, directory: D) -> Self {
        Self { config, directory }
    }

    pub fn config(&self) -> &LoginCookieConfig {
        &self.config
    }

    /// Encode a fresh token for `principal` logging in from `ctx`.
    pub fn issue(
        &self,
        principal: &Principal,
        ctx: &RequestContext,
    ) -> Result<String, LoginError> {
        self.issue_at(principal, ctx, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        principal: &Principal,
        ctx: &RequestContext,
        now: OffsetDateTime,
    ) -> Result<String, LoginError> {
        let record = SessionRecord::new(
            principal.id,
            principal.username.clone(),
            ctx.ip.clone(),
            ctx.mac.clone(),
            now,
        );

        format::encode_record(&record).map_err(|err| {
            tracing::error!(err = %err, user_id = %principal.id, "login token encode failed");
            LoginError::internal()
        })
    }

    /// Validate a login cookie value against the directory and the current request.
    pub fn validate(
        &self,
        cookie: Option<&str>,
        ctx: &RequestContext,
    ) -> Result<Authenticated, LoginError> {
        self.validate_at(cookie, ctx, OffsetDateTime::now_utc())
    }

    pub fn validate_at(
        &self,
        cookie: Option<&str>,
        ctx: &RequestContext,
        now: OffsetDateTime,
    ) -> Result<Authenticated, LoginError> {
        let Some(value) = cookie.filter(|value| !value.is_empty()) else {
            return Err(LoginError::Unauthenticated);
        };

        let record = match format::decode_payload(value) {
            Ok(Some(record)) => record,
            Ok(None) => return Err(LoginError::CorruptToken),
            Err(err) => {
                tracing::debug!(err = %err, "login token decode failed");
                return Err(LoginError::InvalidToken);
            }
        };

        let now_millis = unix_millis(now);
        let elapsed = Duration::milliseconds(now_millis.saturating_sub(record.last_login));
        if elapsed.whole_seconds() > self.config.ttl.whole_seconds() {
            return Err(LoginError::Expired);
        }

        let principal = match self.directory.find_by_id(record.user_id) {
            Ok(Some(principal)) => principal,
            Ok(None) => return Err(LoginError::UserNotFound),
            Err(err) => {
                tracing::error!(err = %err, cookie = value, "user directory lookup failed");
                return Err(LoginError::internal());
            }
        };

        if !principal.is_available() {
            return Err(LoginError::UserDisabled);
        }
        if principal.username != record.username {
            return Err(LoginError::IdentityMismatch);
        }

        let anomalies = detect_anomalies(&record, ctx, &principal);

        // stamped with the current time; a token refreshed twice within one millisecond
        // still moves forward
        let last_login = if record.last_login == now_millis {
            now_millis.saturating_add(1)
        } else {
            now_millis
        };
        let refreshed = SessionRecord {
            user_id: principal.id,
            username: principal.username.clone(),
            ip: ctx.ip.clone(),
            mac: ctx.mac.clone(),
            last_login,
        };
        let token = format::encode_record(&refreshed).map_err(|err| {
            tracing::error!(err = %err, cookie = value, "login token refresh failed");
            LoginError::internal()
        })?;

        Ok(Authenticated {
            principal,
            record: refreshed,
            token,
            anomalies,
        })
    }
}

fn detect_anomalies(
    record: &SessionRecord,
    ctx: &RequestContext,
    principal: &Principal,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    if ctx.mac != record.mac {
        tracing::warn!(
            username = %principal.display_name,
            recorded = %record.mac,
            current = %ctx.mac,
            "mac address differs from the one recorded at login, cookie may be forged"
        );
        anomalies.push(Anomaly::MacMismatch {
            recorded: record.mac.clone(),
            current: ctx.mac.clone(),
        });
    }

    if ctx.ip != record.ip {
        tracing::error!(
            username = %principal.display_name,
            recorded = %record.ip,
            current = %ctx.ip,
            "ip address differs from the one recorded at login, cookie may be forged"
        );
        anomalies.push(Anomaly::IpMismatch {
            recorded: record.ip.clone(),
            current: ctx.ip.clone(),
        });
    }

    anomalies
}
