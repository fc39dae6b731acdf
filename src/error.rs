use thiserror::Error;

pub type Result<T> = std::result::Result<T, TwingenError>;

#[derive(Error, Debug)]
pub enum TwingenError {
    // Standard library errors with automatic conversion
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Source or artifact is not syntactically valid; fatal, nothing is written
    #[error("Parse error: {0}")]
    Parse(String),

    // The external formatter failed to run or exited abnormally
    #[error("Formatter process error: {0}")]
    Formatter(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown target: {0}")]
    UnknownTarget(String),
}

impl From<syn::Error> for TwingenError {
    fn from(err: syn::Error) -> Self {
        TwingenError::Parse(err.to_string())
    }
}

// Convert from anyhow::Error for CLI integration
impl From<anyhow::Error> for TwingenError {
    fn from(err: anyhow::Error) -> Self {
        TwingenError::Configuration(err.to_string())
    }
}
