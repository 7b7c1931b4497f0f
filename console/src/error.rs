//! Error types for the admin console.

use thiserror::Error;

/// The single structured failure used across the console.
///
/// Actors, the guard and the gate all report through this type. It is
/// `Clone` so a failure can travel inside an action back to the reducer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// Transport or remote-service failure
    #[error("{message}")]
    Network {
        /// Human-readable message
        message: String,
        /// Optional machine code reported by the remote service
        code: Option<String>,
    },

    /// Role hierarchy or permission violation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed request
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Target entity is not (or no longer) known
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ConsoleError {
    /// Network failure without a code
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            code: None,
        }
    }

    /// Network failure carrying the remote code
    pub fn network_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Forbidden failure
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Not-found failure
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Whether the presentation layer should use its "not allowed" messaging
    #[must_use]
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    /// Remote code, if any
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Network { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Short human-readable description
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Result alias for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_is_the_only_special_case() {
        assert!(ConsoleError::forbidden("no").is_forbidden());
        assert!(!ConsoleError::validation("no").is_forbidden());
        assert!(!ConsoleError::network("down").is_forbidden());
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            ConsoleError::network_with_code("Service unavailable", "UNAVAILABLE").user_message(),
            "Service unavailable"
        );
        assert_eq!(
            ConsoleError::not_found("product p-1").user_message(),
            "Not found: product p-1"
        );
        assert_eq!(
            ConsoleError::network_with_code("x", "RATE_LIMIT").code(),
            Some("RATE_LIMIT")
        );
    }
}
