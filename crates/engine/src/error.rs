//! Engine error taxonomy

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Input outside the mathematical domain of a function
    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown country: {0}")]
    UnknownCountry(String),

    /// Malformed or missing match data
    #[error("Data error: {0}")]
    Data(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
