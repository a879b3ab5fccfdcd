use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::api::AuthToken;
use crate::app_dirs::AppDirs;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    access_token: AuthToken,
}

/// Where the auth token lives between runs
pub trait TokenStore: Send {
    fn load(&self) -> Option<AuthToken>;
    fn save(&self, token: &AuthToken) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::session_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<AuthToken> {
        let bytes = fs::read(&self.path).ok()?;
        serde_json::from_slice::<StoredSession>(&bytes)
            .ok()
            .map(|s| s.access_token)
            .filter(|t| !t.as_str().is_empty())
    }

    fn save(&self, token: &AuthToken) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec(&StoredSession {
            access_token: token.clone(),
        })?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Keeps nothing between runs
#[derive(Debug, Default, Clone)]
pub struct MemoryTokenStore;

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<AuthToken> {
        None
    }

    fn save(&self, _token: &AuthToken) -> Result<(), StoreError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Explicit auth context handed to whatever issues requests.
/// Initialized from the store at startup and torn down on logout.
pub struct SessionContext {
    token: Option<AuthToken>,
    store: Box<dyn TokenStore>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl SessionContext {
    pub fn load(store: Box<dyn TokenStore>) -> Self {
        let token = store.load();
        Self { token, store }
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Adopt a freshly issued token. The in-memory session is updated even if
    /// persisting fails; the error is returned so the caller can log it.
    pub fn sign_in(&mut self, token: AuthToken) -> Result<(), StoreError> {
        let saved = self.store.save(&token);
        self.token = Some(token);
        saved
    }

    pub fn sign_out(&mut self) -> Result<(), StoreError> {
        self.token = None;
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn token_persists_across_contexts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut ctx = SessionContext::load(Box::new(FileTokenStore::with_path(&path)));
        assert!(!ctx.is_authenticated());
        ctx.sign_in(AuthToken::new("tok-1")).unwrap();

        let reloaded = SessionContext::load(Box::new(FileTokenStore::with_path(&path)));
        assert_eq!(reloaded.token(), Some(&AuthToken::new("tok-1")));
    }

    #[test]
    fn sign_out_removes_persisted_token() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut ctx = SessionContext::load(Box::new(FileTokenStore::with_path(&path)));
        ctx.sign_in(AuthToken::new("tok-2")).unwrap();
        ctx.sign_out().unwrap();

        assert!(!ctx.is_authenticated());
        assert!(!path.exists());
        // clearing twice is fine
        ctx.sign_out().unwrap();
    }

    #[test]
    fn corrupt_session_file_means_signed_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, b"garbage").unwrap();
        let ctx = SessionContext::load(Box::new(FileTokenStore::with_path(&path)));
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn memory_store_never_restores() {
        let mut ctx = SessionContext::load(Box::new(MemoryTokenStore));
        ctx.sign_in(AuthToken::new("t")).unwrap();
        assert!(ctx.is_authenticated());
        assert!(SessionContext::load(Box::new(MemoryTokenStore)).token().is_none());
    }
}
