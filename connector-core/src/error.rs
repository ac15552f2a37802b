//! Error types for the connector pipeline

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
///
/// Every variant maps to a protocol reject code through [`Error::code`].
#[derive(Error, Debug)]
pub enum Error {
    /// Packet expired before a reply arrived
    #[error("Transfer timed out: {0}")]
    TransferTimedOut(String),

    /// Rate limit or liquidity bound hit
    #[error("Insufficient liquidity: {0}")]
    InsufficientLiquidity(String),

    /// Unknown peer ID
    #[error("Peer not found: {0}")]
    PeerNotFound(String),

    /// No route toward the destination
    #[error("Unreachable: {0}")]
    Unreachable(String),

    /// A stage completed without producing a reply
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Fulfillment does not hash to the execution condition
    #[error("Wrong condition: {0}")]
    WrongCondition(String),

    /// Packet could not be parsed
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Settlement engine error
    #[error("Settlement error: {0}")]
    Settlement(#[from] settlement::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unstructured failure normalized at the boundary
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Protocol reject code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::TransferTimedOut(_) => ErrorCode::TransferTimedOut,
            Error::InsufficientLiquidity(_) => ErrorCode::InsufficientLiquidity,
            Error::PeerNotFound(_) | Error::Unreachable(_) => ErrorCode::Unreachable,
            Error::WrongCondition(_) => ErrorCode::WrongCondition,
            Error::BadRequest(_) => ErrorCode::BadRequest,
            Error::Settlement(settlement::Error::PeerNotFound(_)) => ErrorCode::Unreachable,
            Error::Settlement(settlement::Error::OutOfBounds { .. }) => {
                ErrorCode::InsufficientLiquidity
            }
            // Anything without a protocol code of its own is final
            Error::Settlement(_)
            | Error::MalformedResponse(_)
            | Error::Config(_)
            | Error::Io(_)
            | Error::Internal(_) => ErrorCode::BadRequest,
        }
    }

    /// Reason carried in a reject, without the variant prefix used in logs
    pub fn reject_message(&self) -> String {
        match self {
            Error::TransferTimedOut(message)
            | Error::InsufficientLiquidity(message)
            | Error::PeerNotFound(message)
            | Error::Unreachable(message)
            | Error::MalformedResponse(message)
            | Error::WrongCondition(message)
            | Error::BadRequest(message)
            | Error::Config(message)
            | Error::Internal(message) => message.clone(),
            Error::Settlement(err) => err.to_string(),
            Error::Io(err) => err.to_string(),
        }
    }

    /// Normalize a panic payload caught at the boundary
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(message) = payload.downcast_ref::<&'static str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "undefined".to_string()
        };
        Error::Internal(format!("Non-object thrown: {}", detail))
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Internal(msg.to_string())
    }
}

/// Three-character reject code
///
/// `F` codes are final, `T` codes temporary, `R` codes relative to expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorCode {
    /// F00
    #[serde(rename = "F00")]
    BadRequest,
    /// F02
    #[serde(rename = "F02")]
    Unreachable,
    /// F05
    #[serde(rename = "F05")]
    WrongCondition,
    /// T00
    #[serde(rename = "T00")]
    InternalError,
    /// T04
    #[serde(rename = "T04")]
    InsufficientLiquidity,
    /// R00
    #[serde(rename = "R00")]
    TransferTimedOut,
}

impl ErrorCode {
    /// Wire code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "F00",
            ErrorCode::Unreachable => "F02",
            ErrorCode::WrongCondition => "F05",
            ErrorCode::InternalError => "T00",
            ErrorCode::InsufficientLiquidity => "T04",
            ErrorCode::TransferTimedOut => "R00",
        }
    }

    /// Whether the sender may retry the same packet
    pub fn is_final(&self) -> bool {
        self.as_str().starts_with('F')
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::TransferTimedOut("x".into()).code().as_str(), "R00");
        assert_eq!(Error::InsufficientLiquidity("x".into()).code().as_str(), "T04");
        assert_eq!(Error::MalformedResponse("x".into()).code().as_str(), "F00");
        assert_eq!(Error::Internal("x".into()).code().as_str(), "F00");
        assert_eq!(Error::Unreachable("x".into()).code().as_str(), "F02");
        assert!(ErrorCode::WrongCondition.is_final());
        assert!(!ErrorCode::TransferTimedOut.is_final());
    }

    #[test]
    fn test_settlement_errors_map_to_codes() {
        let bound = settlement::Error::OutOfBounds {
            peer_id: "alice".to_string(),
            balance: 400,
            amount_diff: 1,
            minimum: 0,
            maximum: 400,
        };
        assert_eq!(Error::from(bound).code(), ErrorCode::InsufficientLiquidity);
        assert_eq!(
            Error::from(settlement::Error::PeerNotFound("bob".into())).code(),
            ErrorCode::Unreachable
        );
    }

    #[test]
    fn test_from_panic_payloads() {
        let err = Error::from_panic(Box::new("boom"));
        assert_eq!(err.to_string(), "Internal error: Non-object thrown: boom");

        let err = Error::from_panic(Box::new(String::from("bang")));
        assert_eq!(err.to_string(), "Internal error: Non-object thrown: bang");

        let err = Error::from_panic(Box::new(42u8));
        assert_eq!(err.to_string(), "Internal error: Non-object thrown: undefined");
        assert_eq!(err.code(), ErrorCode::BadRequest);
    }

    #[test]
    fn test_reject_message_drops_prefix() {
        let err = Error::InsufficientLiquidity("exceeded money bandwidth, throttling.".into());
        assert_eq!(err.reject_message(), "exceeded money bandwidth, throttling.");
        assert_eq!(
            err.to_string(),
            "Insufficient liquidity: exceeded money bandwidth, throttling."
        );

        let err = Error::from(settlement::Error::PeerNotFound("bob".into()));
        assert_eq!(err.reject_message(), settlement::Error::PeerNotFound("bob".into()).to_string());
    }
}
