//! Token store - address to token mapping persisted as JSON
//!
//! The whole map lives in one file (~/.config/vault.d/tokens) as a
//! pretty-printed JSON object. Every mutation rewrites the file.

use std::collections::HashMap;
use std::fs::{self, OpenOptions, Permissions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const TOKEN_FILE_MODE: u32 = 0o600;

/// Token store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unable to read token file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid token file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to serialize tokens")]
    Serialize(#[source] serde_json::Error),

    #[error("unable to write token file {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// In-memory token map bound to its backing file
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    tokens: HashMap<String, String>,
}

impl TokenStore {
    /// Create an empty store that will persist to `path`
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            tokens: HashMap::new(),
        }
    }

    /// Load the store from `path`.
    ///
    /// A missing file yields an empty store. Anything that is not a JSON
    /// object of strings, including an empty file, is an error; the file is
    /// never reset.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no token file yet");
                return Ok(Self::new(path));
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let tokens: HashMap<String, String> =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = %path.display(), count = tokens.len(), "loaded token file");

        Ok(Self {
            path: path.to_path_buf(),
            tokens,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Look up the token for an address
    pub fn get(&self, address: &str) -> Option<&str> {
        self.tokens.get(address).map(String::as_str)
    }

    /// Insert or replace the token for an address, then persist
    pub fn put(&mut self, address: &str, token: &str) -> Result<(), StoreError> {
        self.tokens.insert(address.to_string(), token.to_string());
        self.persist()
    }

    /// Remove the token for an address (if any), then persist.
    ///
    /// Returns whether an entry was removed.
    pub fn delete(&mut self, address: &str) -> Result<bool, StoreError> {
        let removed = self.tokens.remove(address).is_some();
        self.persist()?;
        Ok(removed)
    }

    /// Write the full map to the backing file
    pub fn persist(&self) -> Result<(), StoreError> {
        self.save_to(&self.path)
    }

    /// Write the full map to `path` with mode 0600.
    ///
    /// The content goes to a sibling temp file first and is renamed over
    /// `path`, so readers see either the old or the new file.
    fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(&self.tokens).map_err(StoreError::Serialize)?;

        write_private(path, content.as_bytes()).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), count = self.tokens.len(), "saved token file");
        Ok(())
    }
}

/// Sibling temp path used while rewriting `path`
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tokens".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

fn write_private(path: &Path, content: &[u8]) -> io::Result<()> {
    let tmp = temp_path(path);

    let result = (|| {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(TOKEN_FILE_MODE)
            .open(&tmp)?;
        // A leftover temp file keeps its old mode; force it back
        file.set_permissions(Permissions::from_mode(TOKEN_FILE_MODE))?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    fn token_path(tmp: &TempDir) -> PathBuf {
        tmp.path().join("tokens")
    }

    #[test]
    fn test_load_missing_file() -> Result<()> {
        let tmp = TempDir::new()?;
        let store = TokenStore::load(&token_path(&tmp))?;
        assert!(store.is_empty());
        // Loading alone never creates the file
        assert!(!token_path(&tmp).exists());
        Ok(())
    }

    #[test]
    fn test_load_blank_file_is_invalid() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = token_path(&tmp);

        for content in ["", "  \n"] {
            fs::write(&path, content)?;
            let err = TokenStore::load(&path).unwrap_err();
            assert!(matches!(err, StoreError::Parse { .. }));
            assert_eq!(fs::read_to_string(&path)?, content);
        }
        Ok(())
    }

    #[test]
    fn test_load_malformed_file() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = token_path(&tmp);
        fs::write(&path, "{ not json")?;

        let err = TokenStore::load(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));

        // Corrupt file stays as it was
        assert_eq!(fs::read_to_string(&path)?, "{ not json");
        Ok(())
    }

    #[test]
    fn test_load_wrong_shape() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = token_path(&tmp);

        fs::write(&path, r#"["https://vault:8200"]"#)?;
        assert!(matches!(TokenStore::load(&path), Err(StoreError::Parse { .. })));

        fs::write(&path, r#"{"https://vault:8200": 42}"#)?;
        assert!(matches!(TokenStore::load(&path), Err(StoreError::Parse { .. })));
        Ok(())
    }

    #[test]
    fn test_load_unreadable_path() -> Result<()> {
        let tmp = TempDir::new()?;
        // A directory where the file should be
        let err = TokenStore::load(tmp.path()).unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
        Ok(())
    }

    #[test]
    fn test_put_and_get() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut store = TokenStore::load(&token_path(&tmp))?;

        assert_eq!(store.get("https://vault.example.com:8200"), None);

        store.put("https://vault.example.com:8200", "s.abc123")?;
        assert_eq!(store.get("https://vault.example.com:8200"), Some("s.abc123"));

        store.put("https://vault.example.com:8200", "s.def456")?;
        assert_eq!(store.get("https://vault.example.com:8200"), Some("s.def456"));
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[test]
    fn test_put_persists_and_reloads() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = token_path(&tmp);

        let mut store = TokenStore::load(&path)?;
        store.put("https://a.example.com:8200", "token-a")?;
        store.put("http://127.0.0.1:8200", "token-b")?;

        let reloaded = TokenStore::load(&path)?;
        assert_eq!(reloaded.tokens, store.tokens);
        Ok(())
    }

    #[test]
    fn test_file_is_pretty_json() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = token_path(&tmp);

        let mut store = TokenStore::load(&path)?;
        store.put("https://vault:8200", "s.abc")?;

        let content = fs::read_to_string(&path)?;
        assert_eq!(content, "{\n  \"https://vault:8200\": \"s.abc\"\n}");
        Ok(())
    }

    #[test]
    fn test_file_mode_is_private() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = token_path(&tmp);

        // Pre-existing world-readable file gets tightened on save
        fs::write(&path, "{}")?;
        fs::set_permissions(&path, Permissions::from_mode(0o644))?;

        let mut store = TokenStore::load(&path)?;
        store.put("https://vault:8200", "s.abc")?;

        let mode = fs::metadata(&path)?.permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!temp_path(&path).exists());
        Ok(())
    }

    #[test]
    fn test_delete() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = token_path(&tmp);

        let mut store = TokenStore::load(&path)?;
        store.put("https://a:8200", "token-a")?;
        store.put("https://b:8200", "token-b")?;

        assert!(store.delete("https://a:8200")?);
        assert_eq!(store.get("https://a:8200"), None);
        assert_eq!(store.get("https://b:8200"), Some("token-b"));

        let reloaded = TokenStore::load(&path)?;
        assert_eq!(reloaded.get("https://a:8200"), None);
        assert_eq!(reloaded.len(), 1);
        Ok(())
    }

    #[test]
    fn test_delete_missing_still_persists() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = token_path(&tmp);

        let mut store = TokenStore::load(&path)?;
        assert!(!store.delete("https://nowhere:8200")?);
        assert_eq!(fs::read_to_string(&path)?, "{}");
        Ok(())
    }

    #[test]
    fn test_save_to_missing_dir_fails() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("missing").join("tokens");

        let mut store = TokenStore::new(&path);
        let err = store.put("https://vault:8200", "s.abc").unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        Ok(())
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path(Path::new("/home/dev/.config/vault.d/tokens")),
            PathBuf::from("/home/dev/.config/vault.d/.tokens.tmp")
        );
    }
}
