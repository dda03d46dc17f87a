//! Error types for hotswap-kv-config.

use std::fmt;

/// Result type alias for hotswap-kv-config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading or watching configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The provider was constructed with an incomplete or invalid source.
    #[error("Invalid provider configuration: {0}")]
    Configuration(String),

    /// A mandatory key had no data on the initial load.
    #[error("The configuration for key '{key}' was not found and is not optional")]
    MandatoryDataMissing {
        /// The watched key
        key: String,
    },

    /// The store could not be reached or answered with an error.
    #[error("Store request failed: {0}")]
    Transport(String),

    /// A stored value was rejected by the value parser.
    #[error("Failed to parse value for '{key}': {message}")]
    Parse {
        /// The flattened key of the value that failed to parse
        key: String,
        /// Parser error message
        message: String,
    },

    /// A recoverable failure while waiting for changes.
    #[error("Watch error: {0}")]
    Watch(String),

    /// The operation was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Provider settings could not be read or deserialized.
    #[error("Invalid provider settings: {0}")]
    Settings(String),

    /// Generic error for other cases.
    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    /// Create a parse error for the given key.
    pub fn parse(key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// The broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::Settings(_) => ErrorKind::Configuration,
            Self::MandatoryDataMissing { .. } => ErrorKind::MandatoryDataMissing,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Watch(_) => ErrorKind::TransientWatch,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Settings(err.to_string())
    }
}

/// Category of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing collaborator or invalid settings.
    Configuration,
    /// Required key absent on the initial load.
    MandatoryDataMissing,
    /// Network or connectivity failure.
    Transport,
    /// Value parser rejected a stored value.
    Parse,
    /// Recoverable failure reported while watching.
    TransientWatch,
    /// Cancelled by the provider's lifetime.
    Cancelled,
    /// Anything else.
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::MandatoryDataMissing => "mandatory-data-missing",
            Self::Transport => "transport",
            Self::Parse => "parse",
            Self::TransientWatch => "transient-watch",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            ConfigError::MandatoryDataMissing { key: "app".into() }.kind(),
            ErrorKind::MandatoryDataMissing
        );
        assert_eq!(ConfigError::Transport("down".into()).kind(), ErrorKind::Transport);
        assert_eq!(ConfigError::parse("a:b", "bad").kind(), ErrorKind::Parse);
        assert_eq!(ConfigError::Watch("503".into()).kind(), ErrorKind::TransientWatch);
    }

    #[test]
    fn test_display_messages() {
        let err = ConfigError::MandatoryDataMissing {
            key: "app/settings".into(),
        };
        assert_eq!(
            err.to_string(),
            "The configuration for key 'app/settings' was not found and is not optional"
        );

        let err = ConfigError::parse("db:port", "expected value at line 1");
        assert_eq!(
            err.to_string(),
            "Failed to parse value for 'db:port': expected value at line 1"
        );
    }
}
