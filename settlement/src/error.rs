//! Error types for settlement engine

use crate::types::Amount;
use thiserror::Error;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No balance record exists for the peer
    #[error("Peer not found: {0}")]
    PeerNotFound(String),

    /// Applying the delta would leave the balance outside its bounds
    #[error(
        "Insufficient liquidity: balance {balance} of peer {peer_id} cannot move by {amount_diff} \
         within [{minimum}, {maximum}]"
    )]
    OutOfBounds {
        /// Peer whose balance was being updated
        peer_id: String,
        /// Balance before the rejected update
        balance: Amount,
        /// Requested delta
        amount_diff: Amount,
        /// Lower bound
        minimum: Amount,
        /// Upper bound
        maximum: Amount,
    },

    /// Amount could not be parsed
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Whether the error refers to an unknown peer
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::PeerNotFound(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
