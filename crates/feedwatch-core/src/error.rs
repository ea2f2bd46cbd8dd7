//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

#[cfg(test)]
mod tests {
    use super::DomainError;

    #[test]
    fn test_infrastructure_error_carries_cause() {
        let error = DomainError::Infrastructure("connection reset".into());
        assert_eq!(error.to_string(), "infrastructure error: connection reset");
    }
}
