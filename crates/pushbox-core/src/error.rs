//! Error types for pushbox.

use thiserror::Error;

/// A shared error type for the pushbox crates.
///
/// Gateway failures carry the operation that failed so the presentation layer can
/// show something more useful than the bare reason string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InboxError {
    /// The sync gateway reported a failure
    #[error("Gateway error during {operation}: {reason}")]
    Gateway {
        operation: &'static str,
        reason: String,
    },

    /// A gateway payload did not have the notification record shape
    #[error("Malformed notification record: {0}")]
    MalformedRecord(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InboxError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Gateway error
    pub fn gateway(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Gateway {
            operation,
            reason: reason.into(),
        }
    }

    /// Creates a MalformedRecord error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRecord(reason.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a gateway failure
    pub fn is_gateway(&self) -> bool {
        matches!(self, Self::Gateway { .. })
    }

    /// Check if this is a malformed record error
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedRecord(_))
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for InboxError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for InboxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for InboxError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for InboxError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, InboxError>`.
pub type Result<T> = std::result::Result<T, InboxError>;
