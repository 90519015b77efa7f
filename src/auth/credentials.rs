use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Errors from persisting a bearer token.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Failed to write token file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Holder of the admin bearer token.
///
/// Set on login, cleared on logout or on a 401 from any endpoint; every other
/// component only reads it.
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;
    fn store(&self, token: String) -> Result<(), CredentialError>;
    fn clear(&self);
}

impl<T: CredentialProvider + ?Sized> CredentialProvider for Arc<T> {
    fn token(&self) -> Option<String> {
        self.as_ref().token()
    }

    fn store(&self, token: String) -> Result<(), CredentialError> {
        self.as_ref().store(token)
    }

    fn clear(&self) {
        self.as_ref().clear()
    }
}

/// Process-local token, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    token: RwLock<Option<String>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialProvider for MemoryCredentials {
    fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn store(&self, token: String) -> Result<(), CredentialError> {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token);
        }
        Ok(())
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}

/// Token persisted to a single file so it survives between CLI invocations.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialProvider for FileCredentials {
    fn token(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn store(&self, token: String) -> Result<(), CredentialError> {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&self.path, token.as_bytes())?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perm = std::fs::Permissions::from_mode(0o600);
                std::fs::set_permissions(&self.path, perm)?;
            }
            Ok(())
        };
        write().map_err(|source| CredentialError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove token file {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_credentials_lifecycle() {
        let creds = MemoryCredentials::new();
        assert_eq!(creds.token(), None);
        creds.store("abc".to_string()).unwrap();
        assert_eq!(creds.token().as_deref(), Some("abc"));
        creds.clear();
        assert_eq!(creds.token(), None);
    }

    #[test]
    fn file_credentials_persist_across_instances() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("adminToken");

        FileCredentials::new(&path)
            .store("jwt-value".to_string())
            .expect("store token");

        let reopened = FileCredentials::new(&path);
        assert_eq!(reopened.token().as_deref(), Some("jwt-value"));

        reopened.clear();
        assert!(!path.exists());
        assert_eq!(reopened.token(), None);
        // clearing twice is fine
        reopened.clear();
    }

    #[cfg(unix)]
    #[test]
    fn stored_token_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("adminToken");
        FileCredentials::new(&path)
            .store("secret".to_string())
            .expect("store token");

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn blank_token_file_reads_as_no_token() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("adminToken");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(FileCredentials::new(path).token(), None);
    }
}
