use thiserror::Error;

use crate::types::Severity;

/// Everything a restore attempt can refuse or fail with. None of these are fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RestoreError {
    #[error("Please select a backup version to restore.")]
    NoSelection,

    #[error("A restore is already in progress for this application.")]
    AlreadyInProgress,

    #[error("This backup version has already been restored. Select a version to restore again.")]
    AlreadyRestored,

    #[error("No restore is awaiting confirmation.")]
    NotConfirming,

    #[error("Confirm that you understand the restore will overwrite existing data.")]
    NotAcknowledged,

    #[error("An error occurred during restore: {0}")]
    TransportFailure(String),

    #[error("Failed to restore backup: {0}")]
    BackendRejected(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to save settings: {0}")]
    Settings(String),
}

impl RestoreError {
    pub fn severity(&self) -> Severity {
        match self {
            RestoreError::NoSelection
            | RestoreError::AlreadyInProgress
            | RestoreError::AlreadyRestored
            | RestoreError::NotConfirming
            | RestoreError::NotAcknowledged
            | RestoreError::Settings(_) => Severity::Warning,
            RestoreError::TransportFailure(_)
            | RestoreError::BackendRejected(_)
            | RestoreError::Configuration(_) => Severity::Danger,
        }
    }

    /// Builds the rejection error from a backend payload, falling back when it carried no message.
    pub fn rejected(message: Option<&str>) -> Self {
        match message {
            Some(m) if !m.trim().is_empty() => RestoreError::BackendRejected(m.to_string()),
            _ => RestoreError::BackendRejected("Unknown error".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(RestoreError::NoSelection.severity(), Severity::Warning);
        assert_eq!(RestoreError::AlreadyInProgress.severity(), Severity::Warning);
        assert_eq!(
            RestoreError::TransportFailure("timeout".into()).severity(),
            Severity::Danger
        );
    }

    #[test]
    fn test_rejected_message() {
        assert_eq!(
            RestoreError::rejected(Some("disk full")).to_string(),
            "Failed to restore backup: disk full"
        );
        assert_eq!(
            RestoreError::rejected(None).to_string(),
            "Failed to restore backup: Unknown error"
        );
        assert_eq!(
            RestoreError::rejected(Some("  ")).to_string(),
            "Failed to restore backup: Unknown error"
        );
    }
}
