//! vault-token-helper - File-backed token helper for the Vault CLI
//!
//! Usage: vault-token-helper get|store|erase|enable|disable
//!
//! Exit codes:
//! - 0: success
//! - 1: wrong arguments
//! - 2: VAULT_ADDR not set
//! - 3: home directory unavailable
//! - 4: token directory could not be created
//! - 5: token file unreadable or corrupt
//! - 6..=11: get, store, store (empty token), erase, enable, disable failed

use clap::{CommandFactory, Parser};
use std::io;
use tracing_subscriber::EnvFilter;

use vault_token_helper::{Command, HelperConfig, HelperError, TokenHelper};

#[derive(Parser, Debug)]
#[command(name = "vault-token-helper")]
#[command(version)]
#[command(about = "File-backed token helper for the Vault CLI - one token per VAULT_ADDR")]
#[command(override_usage = "vault-token-helper get|store|erase|enable|disable")]
#[command(after_help = r#"ENVIRONMENT:
    VAULT_ADDR           Server address the token belongs to (required)
    VAULT_CONFIG_PATH    Host config file to enable/disable (default: ~/.vault)
    RUST_LOG             Diagnostic logging on stderr (e.g. debug)

FILES:
    ~/.config/vault.d/tokens    Stored tokens, JSON, mode 0600"#)]
struct Cli {
    /// Helper command
    #[arg(value_enum)]
    command: Command,
}

fn main() {
    // Initialize logging; stdout belongs to `get`
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run() {
        let code = err.exit_code();
        match err {
            HelperError::Usage(usage) => eprint!("{}", usage_message(&usage)),
            other => eprintln!("error: {:#}", anyhow::Error::new(other)),
        }
        std::process::exit(code);
    }
}

/// clap's error text, followed by the usage line when clap left it out
/// (it does for an unknown command verb)
fn usage_message(err: &clap::Error) -> String {
    let mut message = err.render().to_string();
    if !message.contains("Usage:") {
        if !message.ends_with('\n') {
            message.push('\n');
        }
        message.push_str(&format!("\n{}\n", Cli::command().render_usage()));
    }
    message
}

fn run() -> Result<(), HelperError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(err) if !err.use_stderr() => {
            let _ = err.print();
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let config = HelperConfig::from_env()?;
    tracing::debug!(
        token_file = %config.paths.token_file.display(),
        host_config = %config.paths.host_config.display(),
        "resolved paths"
    );

    let mut helper = TokenHelper::open(&config)?;
    helper.run(cli.command, io::stdin().lock(), io::stdout().lock())
}
