//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

/// Boxed error carried by panic-class log calls and collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Format name not present in the formatter registry
    #[error("Unknown log format '{0}'")]
    UnknownFormat(String),

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// A hook failed while handling a record
    #[error("Hook '{hook}' failed: {message}")]
    HookError { hook: String, message: String },

    /// The alerting collaborator reported a failure
    #[error("Alert capture failed: {0}")]
    AlertError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create a hook error
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::HookError {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Create an alert error
    pub fn alert<S: Into<String>>(msg: S) -> Self {
        LoggerError::AlertError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// True for errors raised while validating settings.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidConfiguration { .. } | LoggerError::UnknownFormat(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config("level", "unknown level 'verbose'");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert!(err.is_configuration());

        let err = LoggerError::hook("alert", "transport down");
        assert!(matches!(err, LoggerError::HookError { .. }));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::UnknownFormat("xml".to_string());
        assert_eq!(err.to_string(), "Unknown log format 'xml'");

        let err = LoggerError::formatter("gelf", "Invalid field type");
        assert_eq!(err.to_string(), "Formatter error (gelf): Invalid field type");

        let err = LoggerError::hook("alert", "transport down");
        assert_eq!(err.to_string(), "Hook 'alert' failed: transport down");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: LoggerError = io_err.into();

        assert!(matches!(err, LoggerError::IoError(_)));
        assert!(err.to_string().contains("pipe closed"));
    }
}
