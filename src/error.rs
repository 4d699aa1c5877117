use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid board: {0}")]
    InvalidBoard(String),

    #[error("board is not solvable")]
    Unsolvable,

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("cancelled")]
    Cancelled,

    /// A finished build left ranks without a distance; the table cannot be trusted.
    #[error("pattern database {pattern} finished with {unreached} unreached entries")]
    IncompleteTable { pattern: String, unreached: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] serde_json::Error),
}
