//! Error types for the freight staging core.
//!

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FreightError {
    /// Missing sku / shipping type / sub-SKUs, rejected before any network call
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// A backend record expected to exist was not there
    #[error("Not found: {0}")]
    NotFoundError(String),
    /// Non-success HTTP status or transport failure
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Cached and backend state that cannot be reconciled automatically
    #[error("Conflict: {0}")]
    ConflictError(String),
    #[error("State transition error: {0}")]
    StateTransitionError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Event error: {0}")]
    EventError(String),
}

impl FreightError {
    /// One readable sentence suitable for showing to an operator.
    pub fn user_message(&self) -> String {
        match self {
            FreightError::ValidationError(msg) => msg.clone(),
            FreightError::NotFoundError(_) => {
                "The shipment record could not be found. Please reload the order and try again."
                    .to_string()
            }
            FreightError::NetworkError(_) => {
                "The request could not be completed. Please try again.".to_string()
            }
            FreightError::ConflictError(_) => {
                "This order was changed elsewhere. Please review it before saving again."
                    .to_string()
            }
            FreightError::StateTransitionError(_) => {
                "That step is not available right now.".to_string()
            }
            FreightError::StorageError(_) => {
                "Saved progress for this order could not be read or written.".to_string()
            }
            FreightError::ConfigurationError(_) => {
                "The application is not configured correctly.".to_string()
            }
            FreightError::EventError(_) => "An internal update could not be delivered.".to_string(),
        }
    }

    /// Whether the failure happened before anything left the process
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            FreightError::ValidationError(_)
                | FreightError::StateTransitionError(_)
                | FreightError::ConfigurationError(_)
        )
    }
}

impl From<serde_json::Error> for FreightError {
    fn from(error: serde_json::Error) -> Self {
        FreightError::StorageError(format!("JSON serialization error: {error}"))
    }
}

impl From<reqwest::Error> for FreightError {
    fn from(error: reqwest::Error) -> Self {
        FreightError::NetworkError(error.to_string())
    }
}

impl From<config::ConfigError> for FreightError {
    fn from(error: config::ConfigError) -> Self {
        FreightError::ConfigurationError(error.to_string())
    }
}

impl From<std::io::Error> for FreightError {
    fn from(error: std::io::Error) -> Self {
        FreightError::StorageError(error.to_string())
    }
}

pub type FreightResult<T> = Result<T, FreightError>;
