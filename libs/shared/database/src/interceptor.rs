use std::sync::Arc;
use std::task::{Context, Poll};

use headers::{authorization::Bearer, Authorization, HeaderMapExt};
use http::Request;
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::store::TokenStore;

/// Stamps outgoing API requests with the stored bearer credential.
#[derive(Clone)]
pub struct AuthInterceptor {
    store: Arc<dyn TokenStore>,
}

impl AuthInterceptor {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Returns a copy of `request` carrying the credential, if one is stored.
    /// The request passed in is left as it was.
    pub fn authorize<B: Clone>(&self, request: &Request<B>) -> Request<B> {
        let mut authorized = request.clone();

        let Some(token) = self.store.load() else {
            debug!("No stored credential, forwarding {} unauthenticated", request.uri());
            return authorized;
        };

        match Authorization::<Bearer>::bearer(&token) {
            Ok(header) => authorized.headers_mut().typed_insert(header),
            Err(_) => warn!("Stored credential is not a valid header value, forwarding without it"),
        }

        authorized
    }
}

#[derive(Clone)]
pub struct AuthInterceptorLayer {
    interceptor: AuthInterceptor,
}

impl AuthInterceptorLayer {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            interceptor: AuthInterceptor::new(store),
        }
    }
}

impl<S> Layer<S> for AuthInterceptorLayer {
    type Service = AuthInterceptorService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthInterceptorService {
            inner,
            interceptor: self.interceptor.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthInterceptorService<S> {
    inner: S,
    interceptor: AuthInterceptor,
}

impl<S, B> Service<Request<B>> for AuthInterceptorService<S>
where
    S: Service<Request<B>>,
    B: Clone,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let authorized = self.interceptor.authorize(&request);
        self.inner.call(authorized)
    }
}
