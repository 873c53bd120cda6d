pub mod client;
pub mod interceptor;
pub mod store;

pub use client::{ApiClient, HttpTransport};
pub use interceptor::{AuthInterceptor, AuthInterceptorLayer, AuthInterceptorService};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
