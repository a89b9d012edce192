//! Runtime configuration, resolved once from the environment
//!
//! Environment variables:
//! - VAULT_ADDR (required) - server address the token is stored under
//! - VAULT_CONFIG_PATH (optional) - host config file, default ~/.vault

use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::error::HelperError;
use crate::paths::HelperPaths;

/// Server address variable
pub const ADDRESS_VAR: &str = "VAULT_ADDR";

/// Host config override variable
pub const CONFIG_PATH_VAR: &str = "VAULT_CONFIG_PATH";

/// Everything an invocation needs to know about its surroundings
#[derive(Debug, Clone)]
pub struct HelperConfig {
    /// Value of VAULT_ADDR, used verbatim as the store key
    pub address: String,
    /// Token and host config locations
    pub paths: HelperPaths,
    /// Absolute path of this executable, if it could be determined
    pub executable: Option<PathBuf>,
}

impl HelperConfig {
    /// Resolve from the process environment
    pub fn from_env() -> Result<Self, HelperError> {
        let invoked = std::env::current_dir().ok().and_then(|cwd| {
            invoked_executable(std::env::args_os().next(), std::env::var_os("PATH"), &cwd)
        });

        let executable = match invoked {
            Some(path) => Ok(path),
            None => {
                debug!("argv[0] not resolvable, falling back to current_exe");
                std::env::current_exe()
            }
        };

        Self::from_lookup(|name| std::env::var_os(name), dirs::home_dir(), executable)
    }

    /// Resolve from an arbitrary variable lookup.
    ///
    /// Empty variables count as unset. VAULT_ADDR is checked before any path
    /// is resolved.
    pub fn from_lookup<F>(lookup: F, home: Option<PathBuf>, executable: io::Result<PathBuf>) -> Result<Self, HelperError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let address = non_empty(ADDRESS_VAR)
            .ok_or(HelperError::MissingAddress)?
            .into_string()
            .map_err(|_| HelperError::InvalidAddress)?;
        let config_override = non_empty(CONFIG_PATH_VAR).map(PathBuf::from);

        let paths = HelperPaths::resolve(home.as_deref(), config_override)?;

        let executable = match executable {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "unable to determine executable path");
                None
            }
        };

        Ok(Self {
            address,
            paths,
            executable,
        })
    }
}

/// The path this binary was invoked as, made absolute.
///
/// Like a shell: `argv0` containing a `/` is taken relative to `cwd`, a bare
/// name is searched on `search_path`. Symlinks are kept, so a packaged
/// `/usr/local/bin/<name>` link stays the registered helper across upgrades.
pub fn invoked_executable(argv0: Option<OsString>, search_path: Option<OsString>, cwd: &Path) -> Option<PathBuf> {
    let argv0 = argv0.filter(|a| !a.is_empty())?;
    let found = which::which_in(&argv0, search_path, cwd).ok()?;

    let absolute = if found.is_absolute() {
        found
    } else {
        cwd.join(found)
    };

    Some(
        absolute
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect(),
    )
}
