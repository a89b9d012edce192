//! Standard paths used by the token helper
//!
//! - Token directory: ~/.config/vault.d (created with mode 0700)
//! - Token file: ~/.config/vault.d/tokens
//! - Host config: ~/.vault, or $VAULT_CONFIG_PATH when set

use std::fs::DirBuilder;
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory holding the token file
pub const TOKEN_DIR: &str = "~/.config/vault.d";

/// Name of the token file inside [`TOKEN_DIR`]
pub const TOKEN_FILE_NAME: &str = "tokens";

/// Host config file the Vault CLI reads when VAULT_CONFIG_PATH is unset
pub const DEFAULT_HOST_CONFIG: &str = "~/.vault";

const TOKEN_DIR_MODE: u32 = 0o700;

/// Path resolution errors
#[derive(Error, Debug)]
pub enum PathError {
    #[error("unable to expand home directory path '{0}'")]
    NoHomeDir(String),

    #[error("unable to create tokens directory [{}]", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Resolved helper paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperPaths {
    /// Token directory (~/.config/vault.d)
    pub token_dir: PathBuf,
    /// Token file (~/.config/vault.d/tokens)
    pub token_file: PathBuf,
    /// Host config file the Vault CLI reads
    pub host_config: PathBuf,
}

impl HelperPaths {
    /// Resolve all paths against `home`.
    ///
    /// `host_config_override` is used verbatim; it is not tilde-expanded.
    pub fn resolve(home: Option<&Path>, host_config_override: Option<PathBuf>) -> Result<Self, PathError> {
        let token_dir = expand_home(TOKEN_DIR, home)?;
        let token_file = token_dir.join(TOKEN_FILE_NAME);

        let host_config = match host_config_override {
            Some(path) => path,
            None => expand_home(DEFAULT_HOST_CONFIG, home)?,
        };

        Ok(Self {
            token_dir,
            token_file,
            host_config,
        })
    }

    /// Create the token directory (and any missing parents) if needed
    pub fn ensure_token_dir(&self) -> Result<(), PathError> {
        if self.token_dir.is_dir() {
            return Ok(());
        }

        DirBuilder::new()
            .recursive(true)
            .mode(TOKEN_DIR_MODE)
            .create(&self.token_dir)
            .map_err(|source| PathError::CreateDir {
                path: self.token_dir.clone(),
                source,
            })
    }
}

/// Expand a leading `~` to the home directory.
///
/// A home directory that is not valid UTF-8 counts as unavailable.
pub fn expand_home(path: &str, home: Option<&Path>) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::tilde_with_context(path, || home.and_then(Path::to_str));

    // shellexpand leaves "~" and "~/..." untouched when there is no home
    let unexpanded = path == "~" || path.starts_with("~/");
    if unexpanded && expanded.starts_with('~') {
        return Err(PathError::NoHomeDir(path.to_string()));
    }

    Ok(PathBuf::from(expanded.into_owned()))
}
