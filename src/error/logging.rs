use thiserror::Error;

/// Ошибка инициализации логирования.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },

    #[error("unknown log format '{0}' (expected compact, pretty or json)")]
    UnknownFormat(String),

    #[error("global tracing subscriber is already set: {0}")]
    AlreadyInitialized(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_error_display() {
        let err = LoggingError::InvalidDirective {
            directive: "=!".into(),
            reason: "bad".into(),
        };
        assert_eq!(err.to_string(), "invalid log filter directive '=!': bad");
        assert_eq!(
            LoggingError::UnknownFormat("xml".into()).to_string(),
            "unknown log format 'xml' (expected compact, pretty or json)"
        );
    }
}
