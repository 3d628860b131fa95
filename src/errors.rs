//! Typed error hierarchy for the board.
//!
//! Two top-level enums cover the two failure domains:
//! - `BoardError`: local state and drag/drop failures
//! - `RemoteError`: failures talking to the remote task service

use thiserror::Error;

/// Errors raised by board operations before or after a remote round trip.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Card {id} not found")]
    CardNotFound { id: String },

    #[error("Unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("Column '{column}' is configured more than once")]
    DuplicateColumn { column: String },

    #[error("No drag in progress")]
    NoActiveDrag,

    #[error("Board state lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors from the remote task service.
///
/// The transition applier never inspects the variant: any of these reverts
/// an optimistic move.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Failed to decode remote response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Remote rejected request: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_error_card_not_found_carries_id() {
        let err = BoardError::CardNotFound { id: "c-42".into() };
        match &err {
            BoardError::CardNotFound { id } => assert_eq!(id, "c-42"),
            _ => panic!("Expected CardNotFound"),
        }
        assert!(err.to_string().contains("c-42"));
    }

    #[test]
    fn board_error_converts_from_remote_error() {
        let inner = RemoteError::Rejected("locked".to_string());
        let err: BoardError = inner.into();
        match &err {
            BoardError::Remote(RemoteError::Rejected(msg)) => assert_eq!(msg, "locked"),
            _ => panic!("Expected BoardError::Remote(Rejected(...))"),
        }
    }

    #[test]
    fn remote_status_error_mentions_code() {
        let err = RemoteError::Status {
            code: 503,
            body: "maintenance".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("maintenance"));
    }

    #[test]
    fn board_error_lock_poisoned_is_matchable() {
        let err = BoardError::LockPoisoned;
        assert!(matches!(err, BoardError::LockPoisoned));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&BoardError::NoActiveDrag);
        assert_std_error(&RemoteError::Rejected("x".into()));
    }
}
