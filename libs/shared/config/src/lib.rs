use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_STORAGE_KEY: &str = "VGhpcyBpcyBhIG5pY2Ugc3VjY2Vzc2Z1bCB0aGF0IHNhaWQgb3V0IG15IGpldG9u";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub auth_path: String,
    /// Directory backing the token store. `None` means no durable storage.
    pub storage_dir: Option<PathBuf>,
    pub storage_key: String,
    pub listen_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("API_BASE_URL not set, using default");
                    "https://localhost:7082".to_string()
                }),
            auth_path: env::var("AUTH_API_PATH")
                .unwrap_or_else(|_| "/api/Auth".to_string()),
            storage_dir: env::var("PORTAL_STORAGE_DIR")
                .map(PathBuf::from)
                .ok()
                .or_else(|| {
                    let fallback = env::var("HOME")
                        .ok()
                        .map(|home| PathBuf::from(home).join(".local/share/leave-portal"));
                    if fallback.is_none() {
                        warn!("PORTAL_STORAGE_DIR not set and no home directory, session will not persist");
                    }
                    fallback
                }),
            storage_key: env::var("PORTAL_STORAGE_KEY")
                .unwrap_or_else(|_| DEFAULT_STORAGE_KEY.to_string()),
            listen_addr: env::var("PORTAL_LISTEN_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:4200".to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing API base URL");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
    }

    /// Full URL of an endpoint under the authentication API.
    pub fn auth_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.auth_path.trim_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}
