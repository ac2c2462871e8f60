//! Client error taxonomy

use thiserror::Error;

/// Errors that can occur when calling the generation or formatting service
///
/// Transport details (status codes, reqwest errors) are folded into one of
/// three cases so callers can pattern-match instead of inspecting HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Rate limited: {}", message.as_deref().unwrap_or("usage limit reached"))]
    RateLimited { message: Option<String> },

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Formatting failed: {0}")]
    FormattingFailed(String),
}

impl ClientError {
    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ClientError::RateLimited { .. })
    }

    /// The service-supplied quota message, if any
    pub fn rate_limit_message(&self) -> Option<&str> {
        match self {
            ClientError::RateLimited { message } => message.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_rate_limit() {
        assert!(ClientError::RateLimited { message: None }.is_rate_limit());
        assert!(!ClientError::GenerationFailed("boom".to_string()).is_rate_limit());
        assert!(!ClientError::FormattingFailed("boom".to_string()).is_rate_limit());
    }

    #[test]
    fn test_rate_limit_message() {
        let err = ClientError::RateLimited {
            message: Some("Daily usage limit exceeded.".to_string()),
        };
        assert_eq!(err.rate_limit_message(), Some("Daily usage limit exceeded."));
        assert_eq!(ClientError::RateLimited { message: None }.rate_limit_message(), None);
        assert_eq!(ClientError::GenerationFailed("x".to_string()).rate_limit_message(), None);
    }

    #[test]
    fn test_display() {
        let err = ClientError::RateLimited { message: None };
        assert_eq!(err.to_string(), "Rate limited: usage limit reached");
        let err = ClientError::FormattingFailed("status 500".to_string());
        assert_eq!(err.to_string(), "Formatting failed: status 500");
    }
}
