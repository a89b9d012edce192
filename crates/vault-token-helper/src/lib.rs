//! vault-token-helper - File-backed token helper for the Vault CLI
//!
//! "One token per server, nothing more."
//!
//! The Vault CLI shells out to a configured token helper instead of writing
//! ~/.vault-token. This helper keeps one token per VAULT_ADDR in
//! ~/.config/vault.d/tokens (mode 0600), so switching between servers does
//! not mean logging in again.
//!
//! Commands:
//! - get: Print the token for VAULT_ADDR
//! - store: Save the token read from stdin (empty token erases)
//! - erase: Forget the token for VAULT_ADDR
//! - enable: Write `token_helper = "<this binary>"` to ~/.vault
//! - disable: Remove ~/.vault

pub mod config;
pub mod error;
pub mod helper;
pub mod host_config;
pub mod paths;
pub mod store;

pub use config::HelperConfig;
pub use error::HelperError;
pub use helper::{Command, TokenHelper};
pub use host_config::HostConfig;
pub use paths::HelperPaths;
pub use store::TokenStore;
