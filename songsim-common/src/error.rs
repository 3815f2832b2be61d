//! Common error types for songsim

use thiserror::Error;

/// Common result type for songsim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the songsim crates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
