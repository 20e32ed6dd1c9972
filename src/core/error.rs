//! Error types shared by the conversion workflow.

use thiserror::Error;

/// Why a rate lookup did not produce a rate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupFailure {
    /// The rate service answered with its own error message. Shown verbatim.
    #[error("{0}")]
    ServiceReported(String),
    /// The request never produced a usable answer (network, status, decoding).
    #[error("Rate lookup failed: {0}")]
    Transport(String),
}

/// Rejected currency selections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Invalid currency code: '{0}' (expected three letters)")]
    MalformedCurrency(String),
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_reported_is_verbatim() {
        let failure = LookupFailure::ServiceReported("Invalid key".to_string());
        assert_eq!(failure.to_string(), "Invalid key");
    }

    #[test]
    fn test_transport_is_prefixed() {
        let failure = LookupFailure::Transport("connection refused".to_string());
        assert_eq!(failure.to_string(), "Rate lookup failed: connection refused");
    }
}
