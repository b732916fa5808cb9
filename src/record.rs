use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Identifier of a user in the [`UserDirectory`](crate::UserDirectory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The payload carried inside a login token.
///
/// Field order is the serialization order and therefore part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub user_id: UserId,
    /// Canonical identity of the user (an email address) at issue time.
    pub username: String,
    pub ip: String,
    pub mac: String,
    /// Milliseconds since the Unix epoch.
    pub last_login: i64,
}

impl SessionRecord {
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        ip: impl Into<String>,
        mac: impl Into<String>,
        last_login: OffsetDateTime,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            ip: ip.into(),
            mac: mac.into(),
            last_login: unix_millis(last_login),
        }
    }

    /// `last_login` as a timestamp, or `None` when it is outside the representable range.
    pub fn last_login_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.last_login) * 1_000_000).ok()
    }
}

pub(crate) fn unix_millis(at: OffsetDateTime) -> i64 {
    let millis = at.unix_timestamp_nanos() / 1_000_000;
    i64::try_from(millis).unwrap_or(i64::MAX)
}
