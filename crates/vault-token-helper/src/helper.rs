//! Token helper protocol
//!
//! The Vault CLI runs `<helper> get|store|erase` with VAULT_ADDR set:
//! - get: print the token (no newline), or nothing if there is none
//! - store: read the token from stdin; an empty token means "forget it"
//! - erase: forget the token
//!
//! enable/disable are for humans: they (un)register this binary in the
//! host config file.

use clap::ValueEnum;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::HelperConfig;
use crate::error::HelperError;
use crate::host_config::{HostConfig, HostConfigError};
use crate::store::TokenStore;

/// A helper command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Command {
    /// Print the token for VAULT_ADDR
    Get,
    /// Store the token read from stdin for VAULT_ADDR
    Store,
    /// Forget the token for VAULT_ADDR
    Erase,
    /// Register this executable as the Vault token helper
    Enable,
    /// Remove the host config file
    Disable,
}

/// One invocation's state: the loaded store plus where to find everything else
#[derive(Debug)]
pub struct TokenHelper {
    address: String,
    store: TokenStore,
    host_config: HostConfig,
    executable: Option<PathBuf>,
}

impl TokenHelper {
    pub fn new(address: &str, store: TokenStore, host_config: HostConfig, executable: Option<PathBuf>) -> Self {
        Self {
            address: address.to_string(),
            store,
            host_config,
            executable,
        }
    }

    /// Create the token directory if needed and load the token file
    pub fn open(config: &HelperConfig) -> Result<Self, HelperError> {
        config.paths.ensure_token_dir()?;
        let store = TokenStore::load(&config.paths.token_file).map_err(HelperError::Load)?;
        debug!(path = %store.path().display(), count = store.len(), "token store ready");

        Ok(Self::new(
            &config.address,
            store,
            HostConfig::new(&config.paths.host_config),
            config.executable.clone(),
        ))
    }

    /// Run one command. `input` is only read by `store`, `output` only
    /// written by `get`.
    pub fn run<R: BufRead, W: Write>(&mut self, command: Command, input: R, output: W) -> Result<(), HelperError> {
        debug!(?command, address = %self.address, "dispatching");

        match command {
            Command::Get => self.get(output),
            Command::Store => self.store_from(input),
            Command::Erase => self.erase(),
            Command::Enable => self.enable(),
            Command::Disable => self.disable(),
        }
    }

    fn get<W: Write>(&self, mut output: W) -> Result<(), HelperError> {
        let Some(token) = self.store.get(&self.address) else {
            debug!(address = %self.address, "no token stored");
            return Ok(());
        };

        output
            .write_all(token.as_bytes())
            .and_then(|_| output.flush())
            .map_err(|source| HelperError::Get {
                address: self.address.clone(),
                source,
            })
    }

    fn store_from<R: BufRead>(&mut self, mut input: R) -> Result<(), HelperError> {
        let mut line = String::new();
        input.read_line(&mut line).map_err(|source| HelperError::ReadToken {
            address: self.address.clone(),
            source,
        })?;

        let token = line.trim();
        if token.is_empty() {
            // An empty token is the CLI's way of saying "forget it"
            self.store
                .delete(&self.address)
                .map_err(|source| HelperError::StoreErase {
                    address: self.address.clone(),
                    source,
                })?;
            info!(address = %self.address, "empty token, erased");
            return Ok(());
        }

        self.store
            .put(&self.address, token)
            .map_err(|source| HelperError::Store {
                address: self.address.clone(),
                source,
            })?;
        info!(address = %self.address, "token stored");
        Ok(())
    }

    fn erase(&mut self) -> Result<(), HelperError> {
        let removed = self
            .store
            .delete(&self.address)
            .map_err(|source| HelperError::Erase {
                address: self.address.clone(),
                source,
            })?;
        info!(address = %self.address, removed, "token erased");
        Ok(())
    }

    fn enable(&self) -> Result<(), HelperError> {
        let executable = self
            .executable
            .as_deref()
            .ok_or(HelperError::Enable(HostConfigError::UnknownExecutable))?;

        self.host_config.enable(executable).map_err(HelperError::Enable)?;
        info!(path = %self.host_config.path().display(), "token helper enabled");
        Ok(())
    }

    fn disable(&self) -> Result<(), HelperError> {
        let removed = self.host_config.disable().map_err(HelperError::Disable)?;
        info!(path = %self.host_config.path().display(), removed, "token helper disabled");
        Ok(())
    }
}
