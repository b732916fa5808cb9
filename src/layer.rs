use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use http::{Request, Response};
use tower_cookies::{CookieManager, Cookies};
use tower_layer::Layer;
use tower_service::Service;

use crate::{
    address::{MacResolver, RequestContext, UnresolvedMac},
    config::LoginCookieConfig,
    controller::{CookieController, PlaintextCookie},
    directory::UserDirectory,
    session::{CookieAuth, LoginSession},
    validator::SessionValidator,
};

/// Validates the login cookie of every request and exposes the result as a
/// [`LoginSession`] request extension.
///
/// On success the token, display-name and mail cookies are rewritten with a fresh
/// `lastLogin`, so the session slides forward by the configured TTL on each request.
pub struct LoginCookieLayer<D, C: CookieController = PlaintextCookie> {
    config: LoginCookieConfig,
    directory: Arc<D>,
    controller: C,
    resolver: Arc<dyn MacResolver>,
}

impl<D: UserDirectory> LoginCookieLayer<D, PlaintextCookie> {
    #[must_use]
    pub fn new(directory: D) -> Self {
        Self {
            config: LoginCookieConfig::default(),
            directory: Arc::new(directory),
            controller: PlaintextCookie,
            resolver: Arc::new(UnresolvedMac),
        }
    }
}

impl<D: UserDirectory, C: CookieController> LoginCookieLayer<D, C> {
    #[must_use]
    pub fn with_config(mut self, config: LoginCookieConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_mac_resolver<M: MacResolver>(mut self, resolver: M) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    #[must_use]
    pub fn with_controller<C2: CookieController>(
        self,
        controller: C2,
    ) -> LoginCookieLayer<D, C2> {
        LoginCookieLayer {
            config: self.config,
            directory: self.directory,
            controller,
            resolver: self.resolver,
        }
    }
}

impl<D, C: CookieController> Clone for LoginCookieLayer<D, C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            directory: Arc::clone(&self.directory),
            controller: self.controller.clone(),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<D, C: CookieController> fmt::Debug for LoginCookieLayer<D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCookieLayer")
            .field("config", &self.config)
            .field("controller", &self.controller)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

pub struct LoginCookieManager<S, D, C> {
    inner: S,
    auth: Arc<CookieAuth<Arc<D>, C>>,
    resolver: Arc<dyn MacResolver>,
}

impl<S: Clone, D, C> Clone for LoginCookieManager<S, D, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            auth: Arc::clone(&self.auth),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<S: fmt::Debug, D, C> fmt::Debug for LoginCookieManager<S, D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCookieManager")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S, D: UserDirectory, C: CookieController> Layer<S> for LoginCookieLayer<D, C> {
    type Service = CookieManager<LoginCookieManager<S, D, C>>;

    fn layer(&self, inner: S) -> Self::Service {
        let validator = SessionValidator::new(self.config.clone(), Arc::clone(&self.directory));
        CookieManager::new(LoginCookieManager {
            inner,
            auth: Arc::new(CookieAuth::new(validator, self.controller.clone())),
            resolver: Arc::clone(&self.resolver),
        })
    }
}

impl<ReqBody, ResBody, S, D, C> Service<Request<ReqBody>> for LoginCookieManager<S, D, C>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Default + Send,
    D: UserDirectory,
    C: CookieController,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let auth = Arc::clone(&self.auth);
        let resolver = Arc::clone(&self.resolver);

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let Some(cookies) = req.extensions().get::<Cookies>().cloned() else {
                tracing::error!("cookie jar missing from request extensions");
                let mut res = Response::default();
                *res.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                return Ok(res);
            };

            let ctx = RequestContext::from_request(&req, &*resolver);
            let outcome = auth.authenticate(&cookies, &ctx);

            let session = LoginSession::new(cookies, auth, ctx, outcome);
            req.extensions_mut().insert(session);

            inner.call(req).await
        })
    }
}
