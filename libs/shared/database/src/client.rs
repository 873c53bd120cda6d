use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use http::{
    header::{ACCEPT, CONTENT_TYPE},
    Method, Request,
};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tower::{Service, ServiceBuilder, ServiceExt};
use tracing::{debug, error};

use shared_models::error::AuthError;

use crate::interceptor::{AuthInterceptorLayer, AuthInterceptorService};
use crate::store::TokenStore;

/// Last stage of the request pipeline: hands requests to `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Service<Request<Vec<u8>>> for HttpTransport {
    type Response = reqwest::Response;
    type Error = reqwest::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Vec<u8>>) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move {
            let request = reqwest::Request::try_from(request)?;
            client.execute(request).await
        })
    }
}

/// Client for the remote HR API. Every call rides through the auth interceptor.
#[derive(Clone)]
pub struct ApiClient {
    service: AuthInterceptorService<HttpTransport>,
}

impl ApiClient {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self::with_client(Client::new(), store)
    }

    pub fn with_client(client: Client, store: Arc<dyn TokenStore>) -> Self {
        let service = ServiceBuilder::new()
            .layer(AuthInterceptorLayer::new(store))
            .service(HttpTransport::new(client));
        Self { service }
    }

    pub async fn request<T, B>(&self, method: Method, url: &str, body: Option<&B>) -> Result<T, AuthError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let bytes = match body {
            Some(body) => serde_json::to_vec(body)?,
            None => Vec::new(),
        };
        self.send(method, url, bytes).await
    }

    async fn send<T>(&self, method: Method, url: &str, bytes: Vec<u8>) -> Result<T, AuthError>
    where
        T: DeserializeOwned,
    {
        debug!("Making request to {}", url);

        let request = Request::builder()
            .method(method)
            .uri(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(bytes)
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let response = self
            .service
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!("API error ({}): {}", status, text);

            return Err(match status.as_u16() {
                401 | 403 => AuthError::AuthenticationFailure(text),
                code => AuthError::Api { status: code, message: text },
            });
        }

        // Endpoints that return no content still deserialize into `()` or `Value::Null`.
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(text)?)
    }

    pub async fn get<T>(&self, url: &str) -> Result<T, AuthError>
    where
        T: DeserializeOwned,
    {
        self.send(Method::GET, url, Vec::new()).await
    }

    pub async fn post<T, B>(&self, url: &str, body: &B) -> Result<T, AuthError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, url, Some(body)).await
    }
}
