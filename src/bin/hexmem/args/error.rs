use thiserror::Error;

use super::types::ParseArgError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Arg(#[from] ParseArgError),
    #[error("{path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: hexmem::ParseError,
    },
    #[error(transparent)]
    Hex(#[from] hexmem::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
