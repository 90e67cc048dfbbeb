use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcSetError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ProcSetError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ProcSetError::InvalidArgument(message.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ProcSetError::InvalidArgument(_))
    }
}

impl From<toml::de::Error> for ProcSetError {
    fn from(err: toml::de::Error) -> Self {
        ProcSetError::ParseError(err.to_string())
    }
}

impl From<serde_json::Error> for ProcSetError {
    fn from(err: serde_json::Error) -> Self {
        ProcSetError::ParseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProcSetError>;
