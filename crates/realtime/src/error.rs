//! Error taxonomy for realtime operations.

use thiserror::Error;

use crate::stores::StoreError;

/// Result type alias for realtime operations
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Failures of a single client operation (join, send).
///
/// Every variant is reported back to the initiating connection only. Delivery
/// failures never reach callers; they are logged where they happen.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RealtimeError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("authorization failed: {0}")]
    Authorization(String),

    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl RealtimeError {
    /// Text safe to show next to the message composer.
    pub fn client_message(&self) -> String {
        match self {
            RealtimeError::Validation(message) => message.clone(),
            RealtimeError::NotFound(resource) => {
                let mut chars = resource.chars();
                match chars.next() {
                    Some(first) => format!("{}{} not found.", first.to_uppercase(), chars.as_str()),
                    None => "Not found.".to_string(),
                }
            }
            RealtimeError::Authorization(message) => message.clone(),
            RealtimeError::Persistence(_) => "Could not send message.".to_string(),
        }
    }

    /// Short machine-readable category, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            RealtimeError::Validation(_) => "validation",
            RealtimeError::NotFound(_) => "not_found",
            RealtimeError::Authorization(_) => "authorization",
            RealtimeError::Persistence(_) => "persistence",
        }
    }
}

impl From<StoreError> for RealtimeError {
    fn from(error: StoreError) -> Self {
        RealtimeError::Persistence(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_hide_storage_details() {
        let error = RealtimeError::from(StoreError::new("disk I/O error"));
        assert_eq!(error.client_message(), "Could not send message.");
        assert_eq!(error.kind(), "persistence");
    }

    #[test]
    fn not_found_message_is_capitalised() {
        assert_eq!(
            RealtimeError::NotFound("exchange").client_message(),
            "Exchange not found."
        );
    }
}
