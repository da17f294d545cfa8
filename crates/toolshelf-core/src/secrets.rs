#![deny(unsafe_code)]

//! API key handling for Toolshelf.
//!
//! Two kinds of key exist:
//!
//! - **The user's own key**, persisted by [`CredentialStore`] in a single file
//!   so it survives between sessions. It is read when a chat session is
//!   created and written only by explicit save/clear actions.
//! - **Shared keys** (relay keys, the fallback key), read from environment
//!   variables with [`SecretValue::from_env`].
//!
//! ## Security Properties
//!
//! - All secret values implement `Zeroize` and are cleared on drop.
//! - Secret values are redacted in `Debug` output (shown as `[REDACTED]`).
//! - The credential file is created with owner-only permissions (0o600).
//! - Nothing in this module logs a secret value.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zeroize::Zeroize;

/// A single secret value with automatic zeroization.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue {
    inner: String,
}

impl SecretValue {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Read a secret from an environment variable. Unset or blank ⇒ `None`.
    pub fn from_env(var: &str) -> Option<Self> {
        let value = std::env::var(var).ok()?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self::new(trimmed))
        }
    }

    /// Get the secret value as a string slice.
    ///
    /// Only call this where the key goes on the wire.
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// Get the secret value length (without exposing the value).
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the secret value is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Key with everything but the first and last four characters masked,
    /// for display in status output.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.inner.chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretValue")
            .field("inner", &"[REDACTED]")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl Drop for SecretValue {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

/// Errors from credential storage.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("API key must not be empty")]
    Empty,

    #[error("failed to read credential file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write credential file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Durable, file-backed storage for the user's own API key.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store backed by the file at `path`. Nothing is touched until used.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored key. A missing or blank file means no key.
    pub async fn load(&self) -> Result<Option<SecretValue>, CredentialError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(mut content) => {
                let trimmed = content.trim();
                let value = (!trimmed.is_empty()).then(|| SecretValue::new(trimmed));
                content.zeroize();
                debug!(path = %self.path.display(), present = value.is_some(), "Loaded credential");
                Ok(value)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CredentialError::Read {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    /// Persist `key` (trimmed). Blank keys are rejected.
    pub async fn save(&self, key: &str) -> Result<SecretValue, CredentialError> {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Empty);
        }
        let write_err = |e| CredentialError::Write {
            path: self.path.clone(),
            source: e,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
            }
        }
        tokio::fs::write(&self.path, trimmed.as_bytes())
            .await
            .map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&self.path, perms)
                .await
                .map_err(write_err)?;
        }

        info!(path = %self.path.display(), "API key saved");
        Ok(SecretValue::new(trimmed))
    }

    /// Remove the stored key. Returns whether a key was present.
    pub async fn clear(&self) -> Result<bool, CredentialError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "API key cleared");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CredentialError::Write {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_secret_value_redacted_debug() {
        let secret = SecretValue::new("sk-or-v1-super-secret");
        let debug = format!("{secret:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_secret_value_masked() {
        assert_eq!(SecretValue::new("sk-or-v1-abcdef").masked(), "sk-o*******cdef");
        assert_eq!(SecretValue::new("short").masked(), "*****");
    }

    #[test]
    fn test_from_env_unset() {
        assert!(SecretValue::from_env("TOOLSHELF_TEST_SURELY_UNSET_VARIABLE").is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::new(tmp.path().join("nested/dir/key"));

        let saved = store.save("  sk-or-v1-abc  \n").await.unwrap();
        assert_eq!(saved.expose(), "sk-or-v1-abc");

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.expose(), "sk-or-v1-abc");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::new(tmp.path().join("key"));
        store.save("sk-test").await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_save_rejects_blank_key() {
        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::new(tmp.path().join("key"));
        assert!(matches!(store.save("   ").await, Err(CredentialError::Empty)));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::new(tmp.path().join("absent"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::new(tmp.path().join("key"));
        store.save("sk-test").await.unwrap();

        assert!(store.clear().await.unwrap());
        assert!(store.load().await.unwrap().is_none());
        assert!(!store.clear().await.unwrap());
    }
}
