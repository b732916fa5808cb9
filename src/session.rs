use std::{fmt, sync::Arc};

use axum::extract::FromRequestParts;
use http::request::Parts;
use tower_cookies::Cookies;

use crate::{
    address::RequestContext,
    controller::CookieController,
    directory::{Principal, UserDirectory},
    error::LoginError,
    validator::{Authenticated, SessionValidator},
};

/// Validator and cookie controller shared by every request a layer serves.
#[derive(Debug)]
pub(crate) struct CookieAuth<D, C> {
    validator: SessionValidator<D>,
    controller: C,
}

impl<D: UserDirectory, C: CookieController> CookieAuth<D, C> {
    pub(crate) fn new(validator: SessionValidator<D>, controller: C) -> Self {
        Self {
            validator,
            controller,
        }
    }

    /// Validate the request's login cookie and, on success, write the refreshed cookies.
    pub(crate) fn authenticate(
        &self,
        cookies: &Cookies,
        ctx: &RequestContext,
    ) -> Result<Authenticated, LoginError> {
        let value = self
            .controller
            .get(cookies, self.validator.config().name())
            .map(|cookie| cookie.value().to_owned());

        let outcome = self.validator.validate(value.as_deref(), ctx);
        match &outcome {
            Ok(auth) => self.write(cookies, &auth.principal, auth.token.clone()),
            Err(err) => tracing::debug!(err = %err, "login cookie rejected"),
        }
        outcome
    }

    fn write(&self, cookies: &Cookies, principal: &Principal, token: String) {
        let config = self.validator.config();
        self.controller.add(cookies, config.token_cookie(token));
        self.controller
            .add(cookies, config.username_cookie(principal.display_name.clone()));
        self.controller
            .add(cookies, config.mail_cookie(principal.username.clone()));
    }
}

/// Object-safe view of [`CookieAuth`] so [`LoginSession`] need not carry its type parameters.
pub(crate) trait CookieAuthDyn: Send + Sync {
    fn login(
        &self,
        cookies: &Cookies,
        principal: &Principal,
        ctx: &RequestContext,
    ) -> Result<(), LoginError>;

    fn logout(&self, cookies: &Cookies);
}

impl<D: UserDirectory, C: CookieController> CookieAuthDyn for CookieAuth<D, C> {
    fn login(
        &self,
        cookies: &Cookies,
        principal: &Principal,
        ctx: &RequestContext,
    ) -> Result<(), LoginError> {
        let token = self.validator.issue(principal, ctx)?;
        self.write(cookies, principal, token);
        Ok(())
    }

    fn logout(&self, cookies: &Cookies) {
        self.controller
            .add(cookies, self.validator.config().logout_cookie());
    }
}

/// The login state of the current request, inserted by
/// [`LoginCookieLayer`](crate::LoginCookieLayer).
///
/// Usable as an axum extractor. Handlers call [`login`](Self::login) after checking
/// credentials and [`logout`](Self::logout) to end the session.
#[derive(Clone)]
pub struct LoginSession {
    cookies: Cookies,
    auth: Arc<dyn CookieAuthDyn>,
    ctx: RequestContext,
    outcome: Arc<Result<Authenticated, LoginError>>,
}

impl LoginSession {
    pub(crate) fn new(
        cookies: Cookies,
        auth: Arc<dyn CookieAuthDyn>,
        ctx: RequestContext,
        outcome: Result<Authenticated, LoginError>,
    ) -> Self {
        Self {
            cookies,
            auth,
            ctx,
            outcome: Arc::new(outcome),
        }
    }

    /// Result of validating the cookie the request arrived with.
    pub fn outcome(&self) -> Result<&Authenticated, &LoginError> {
        (*self.outcome).as_ref()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.outcome().ok().map(|auth| &auth.principal)
    }

    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    /// Issue a token for `principal` and set the login cookies on the response.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::Session`] if the token cannot be encoded.
    pub fn login(&self, principal: &Principal) -> Result<(), LoginError> {
        self.auth.login(&self.cookies, principal, &self.ctx)
    }

    /// Overwrite the login cookie with an empty, expired one.
    pub fn logout(&self) {
        self.auth.logout(&self.cookies);
    }
}

impl fmt::Debug for LoginSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginSession")
            .field("ctx", &self.ctx)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for LoginSession {
    type Rejection = LoginError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<LoginSession>().cloned().ok_or_else(|| {
            tracing::error!("missing LoginSession extension, is LoginCookieLayer installed?");
            LoginError::internal()
        })
    }
}

/// The authenticated principal of the current request.
///
/// Rejects with the [`LoginError`] the request's login cookie failed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = LoginError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = LoginSession::from_request_parts(parts, state).await?;
        session
            .outcome()
            .map(|auth| Self(auth.principal.clone()))
            .map_err(Clone::clone)
    }
}
