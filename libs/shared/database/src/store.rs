use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use parking_lot::RwLock;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_models::auth::StoredCredential;
use shared_models::error::AuthError;

/// Owner of the persisted credential and its role hint.
///
/// Every operation is total: a store that cannot reach its backing storage
/// reads as empty and ignores writes.
pub trait TokenStore: Send + Sync {
    fn save(&self, token: &str, role: Option<&str>);

    fn load_credential(&self) -> Option<StoredCredential>;

    fn clear(&self);

    fn load(&self) -> Option<String> {
        self.load_credential().map(|credential| credential.token)
    }

    fn load_role(&self) -> Option<String> {
        self.load_credential().and_then(|credential| credential.role)
    }
}

/// Durable store keeping one JSON envelope per storage key on disk.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: Option<PathBuf>,
}

impl FileTokenStore {
    pub fn new(dir: Option<PathBuf>, key: &str) -> Self {
        let file_name = key.replace(['/', '\\'], "_");
        Self {
            path: dir.map(|dir| dir.join(file_name)),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.storage_dir.clone(), &config.storage_key)
    }

    /// A store for hosts without durable storage.
    pub fn unavailable() -> Self {
        Self { path: None }
    }

    pub fn is_available(&self) -> bool {
        self.path.is_some()
    }

    fn storage_path(&self) -> Result<&PathBuf, AuthError> {
        self.path
            .as_ref()
            .ok_or_else(|| AuthError::Storage("no storage directory configured".to_string()))
    }

    fn try_save(&self, credential: &StoredCredential) -> Result<(), AuthError> {
        let path = self.storage_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| AuthError::Storage(e.to_string()))?;
        }

        let contents = serde_json::to_vec(credential)?;
        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        fs::write(&staging, contents).map_err(|e| AuthError::Storage(e.to_string()))?;
        fs::rename(&staging, path).map_err(|e| AuthError::Storage(e.to_string()))?;
        Ok(())
    }

    fn try_load(&self) -> Result<Option<StoredCredential>, AuthError> {
        let path = self.storage_path()?;
        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuthError::Storage(e.to_string())),
        };
        Ok(Some(serde_json::from_slice(&contents)?))
    }

    fn try_clear(&self) -> Result<(), AuthError> {
        let path = self.storage_path()?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(e.to_string())),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, token: &str, role: Option<&str>) {
        let credential = StoredCredential {
            token: token.to_string(),
            role: role.map(str::to_string),
        };
        match self.try_save(&credential) {
            Ok(()) => debug!("Credential saved"),
            Err(e) => warn!("Credential not persisted: {}", e),
        }
    }

    fn load_credential(&self) -> Option<StoredCredential> {
        if !self.is_available() {
            return None;
        }
        match self.try_load() {
            Ok(credential) => credential,
            Err(e) => {
                warn!("Ignoring unreadable credential: {}", e);
                None
            }
        }
    }

    fn clear(&self) {
        if !self.is_available() {
            return;
        }
        if let Err(e) = self.try_clear() {
            warn!("Credential not cleared: {}", e);
        }
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    credential: RwLock<Option<StoredCredential>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, token: &str, role: Option<&str>) {
        *self.credential.write() = Some(StoredCredential {
            token: token.to_string(),
            role: role.map(str::to_string),
        });
    }

    fn load_credential(&self) -> Option<StoredCredential> {
        self.credential.read().clone()
    }

    fn clear(&self) {
        *self.credential.write() = None;
    }
}
