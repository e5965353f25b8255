use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Sync request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Authorization failed: {message}")]
    AuthError { message: String },

    #[error("Sync error: {message}")]
    SyncError { message: String },
}

impl TrackerError {
    /// 給使用者看的訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            TrackerError::ApiError(_) | TrackerError::SyncError { .. } => {
                "Could not reach the sync endpoint. Your data is saved locally.".to_string()
            }
            TrackerError::CsvError(e) => format!("Could not write the CSV file: {}", e),
            TrackerError::IoError(e) => format!("File access failed: {}", e),
            TrackerError::SerializationError(_) => {
                "Stored data could not be read or written as JSON.".to_string()
            }
            TrackerError::ConfigError { message } => format!("Configuration problem: {}", message),
            TrackerError::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            TrackerError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            TrackerError::MissingConfigError { field } => {
                format!("Missing setting '{}'", field)
            }
            TrackerError::ValidationError { message } => message.clone(),
            TrackerError::AuthError { message } => message.clone(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            TrackerError::ApiError(_) | TrackerError::SyncError { .. } => {
                "Check the network connection and the [sync] endpoint, then run `bingo weight sync`"
            }
            TrackerError::CsvError(_) | TrackerError::IoError(_) => {
                "Check that the data directory exists and is writable"
            }
            TrackerError::SerializationError(_) => {
                "Inspect the slot file in the data directory; a malformed file can be deleted to start over"
            }
            TrackerError::ConfigError { .. }
            | TrackerError::ConfigValidationError { .. }
            | TrackerError::InvalidConfigValueError { .. }
            | TrackerError::MissingConfigError { .. } => {
                "Fix the configuration file or the command line flags"
            }
            TrackerError::ValidationError { .. } => "Check the command arguments",
            TrackerError::AuthError { .. } => "Re-run the command with the correct admin password",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            TrackerError::ApiError(_) | TrackerError::SyncError { .. } => 2,
            TrackerError::AuthError { .. } | TrackerError::ValidationError { .. } => 1,
            TrackerError::ConfigError { .. }
            | TrackerError::ConfigValidationError { .. }
            | TrackerError::InvalidConfigValueError { .. }
            | TrackerError::MissingConfigError { .. } => 1,
            TrackerError::CsvError(_)
            | TrackerError::IoError(_)
            | TrackerError::SerializationError(_) => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_message_is_the_alert_text() {
        let err = TrackerError::AuthError {
            message: "Incorrect password.".to_string(),
        };
        assert_eq!(err.user_friendly_message(), "Incorrect password.");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_sync_errors_mention_local_save() {
        let err = TrackerError::SyncError {
            message: "timeout".to_string(),
        };
        assert!(err.user_friendly_message().contains("saved locally"));
        assert_eq!(err.exit_code(), 2);
    }
}
