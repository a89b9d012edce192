//! Host config toggle
//!
//! The Vault CLI reads ~/.vault (or $VAULT_CONFIG_PATH) to find its token
//! helper. Enabling writes a one-line `token_helper = "..."` file, replacing
//! whatever was there; disabling removes the file.

use std::fs::{self, Permissions};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const HOST_CONFIG_MODE: u32 = 0o644;

/// Host config errors
#[derive(Error, Debug)]
pub enum HostConfigError {
    #[error("unable to determine the path of this executable")]
    UnknownExecutable,

    #[error("unable to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to remove {}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The host config file this helper registers itself in
#[derive(Debug, Clone)]
pub struct HostConfig {
    path: PathBuf,
}

impl HostConfig {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the config line pointing the Vault CLI at `helper`
    pub fn fragment(helper: &Path) -> String {
        let quoted = helper
            .to_string_lossy()
            .replace('\\', "\\\\")
            .replace('"', "\\\"");
        format!("token_helper = \"{}\"\n", quoted)
    }

    /// Register `helper` as the token helper, clobbering any existing file
    pub fn enable(&self, helper: &Path) -> Result<(), HostConfigError> {
        let write_err = |source: io::Error| HostConfigError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        fs::write(&self.path, Self::fragment(helper)).map_err(write_err)?;
        fs::set_permissions(&self.path, Permissions::from_mode(HOST_CONFIG_MODE)).map_err(write_err)?;

        debug!(path = %self.path.display(), helper = %helper.display(), "token helper enabled");
        Ok(())
    }

    /// Remove the host config file. A missing file is not an error.
    ///
    /// Returns whether a file was removed.
    pub fn disable(&self) -> Result<bool, HostConfigError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "token helper disabled");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(HostConfigError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
