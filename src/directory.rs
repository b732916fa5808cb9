//! The user directory the validator consults on every request.
//!
//! Persistence of users is not this crate's business. Applications implement
//! [`UserDirectory`] over whatever store they already have; [`InMemoryDirectory`] exists for
//! tests and demos.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::record::UserId;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Available,
    Disabled,
}

/// A user as known to the [`UserDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    /// Canonical identity (an email address). Compared against the token on every request.
    pub username: String,
    /// Human-readable name, written to the display-name cookie.
    pub display_name: String,
    pub status: Status,
}

impl Principal {
    /// An available principal whose display name is its username.
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            id,
            display_name: username.clone(),
            username,
            status: Status::Available,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == Status::Available
    }
}

/// Read-only lookup of principals by id.
///
/// The call is synchronous and is made once per validated request. Timeouts, caching and
/// retries are the implementor's concern.
///
/// # Example
///
/// ```rust
/// use tower_login_cookie::{BoxError, Principal, UserDirectory, UserId};
///
/// struct Admins;
///
/// impl UserDirectory for Admins {
///     fn find_by_id(&self, id: UserId) -> Result<Option<Principal>, BoxError> {
///         Ok((id == UserId(1)).then(|| Principal::new(UserId(1), "root@example.com")))
///     }
/// }
/// ```
pub trait UserDirectory: Send + Sync + 'static {
    /// `Ok(None)` when no such user exists. `Err` is reserved for a failing backend.
    fn find_by_id(&self, id: UserId) -> Result<Option<Principal>, BoxError>;
}

impl<D: UserDirectory + ?Sized> UserDirectory for Arc<D> {
    fn find_by_id(&self, id: UserId) -> Result<Option<Principal>, BoxError> {
        (**self).find_by_id(id)
    }
}

/// A [`UserDirectory`] held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    users: Arc<RwLock<HashMap<UserId, Principal>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a principal, keyed by its id.
    pub fn insert(&self, principal: Principal) {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(principal.id, principal);
    }

    pub fn remove(&self, id: UserId) -> Option<Principal> {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }
}

impl FromIterator<Principal> for InMemoryDirectory {
    fn from_iter<I: IntoIterator<Item = Principal>>(iter: I) -> Self {
        let users = iter.into_iter().map(|p| (p.id, p)).collect();
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }
}

impl UserDirectory for InMemoryDirectory {
    fn find_by_id(&self, id: UserId) -> Result<Option<Principal>, BoxError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.get(&id).cloned())
    }
}
