//! Fatal errors and their process exit codes

use crate::host_config::HostConfigError;
use crate::paths::PathError;
use crate::store::StoreError;
use std::io;
use thiserror::Error;

/// Every way a helper invocation can fail.
///
/// Each variant maps to one process exit code; see [`HelperError::exit_code`].
#[derive(Error, Debug)]
pub enum HelperError {
    /// Wrong argument count or unknown command
    #[error(transparent)]
    Usage(#[from] clap::Error),

    #[error("environment variable 'VAULT_ADDR' is required")]
    MissingAddress,

    #[error("environment variable 'VAULT_ADDR' is not valid UTF-8")]
    InvalidAddress,

    #[error(transparent)]
    Paths(#[from] PathError),

    #[error("error reading tokens file")]
    Load(#[source] StoreError),

    #[error("error getting token for {address}")]
    Get {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("error reading token for {address} from stdin")]
    ReadToken {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("error storing token for {address}")]
    Store {
        address: String,
        #[source]
        source: StoreError,
    },

    /// `store` received an empty token and fell back to erasing
    #[error("error erasing token for {address}")]
    StoreErase {
        address: String,
        #[source]
        source: StoreError,
    },

    #[error("error erasing token for {address}")]
    Erase {
        address: String,
        #[source]
        source: StoreError,
    },

    #[error("error enabling vault token helper")]
    Enable(#[source] HostConfigError),

    #[error("error disabling vault token helper")]
    Disable(#[source] HostConfigError),
}

impl HelperError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 1,
            Self::MissingAddress | Self::InvalidAddress => 2,
            Self::Paths(PathError::NoHomeDir(_)) => 3,
            Self::Paths(PathError::CreateDir { .. }) => 4,
            Self::Load(_) => 5,
            Self::Get { .. } => 6,
            Self::ReadToken { .. } | Self::Store { .. } => 7,
            Self::StoreErase { .. } => 8,
            Self::Erase { .. } => 9,
            Self::Enable(_) => 10,
            Self::Disable(_) => 11,
        }
    }
}
