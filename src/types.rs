use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stamp format the backend embeds in backup ids and listings.
pub const BACKEND_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const DISPLAY_TIMESTAMP_FORMAT: &str = "%B %d, %Y at %I:%M %p";

/// Size as reported by the backend: raw bytes or an already formatted string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Size {
    Bytes(u64),
    Display(String),
}

impl Size {
    pub fn bytes(&self) -> Option<u64> {
        match self {
            Size::Bytes(b) => Some(*b),
            Size::Display(_) => None,
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Size::Bytes(0)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Size::Bytes(0) => write!(f, "0 B"),
            Size::Bytes(b) => write!(f, "{:.2} MB", *b as f64 / (1024.0 * 1024.0)),
            Size::Display(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupVersion {
    #[serde(alias = "backup_id")]
    pub id: String,
    pub timestamp: String,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub paths: Vec<String>,
}

impl BackupVersion {
    pub fn display_timestamp(&self) -> String {
        display_timestamp(&self.timestamp)
    }

    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }
}

/// Accepts the backend stamp, an already formatted display string or epoch seconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, BACKEND_TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, DISPLAY_TIMESTAMP_FORMAT))
        .ok()
}

/// Renders a stamp for humans, passing anything unparsable through.
pub fn display_timestamp(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format(DISPLAY_TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDetail {
    pub backup_id: String,
    pub timestamp: String,
    pub size: Size,
    pub notes: Option<String>,
    pub paths: Vec<String>,
}

impl VersionDetail {
    pub fn notes_or_placeholder(&self) -> &str {
        match self.notes.as_deref() {
            Some(n) if !n.trim().is_empty() => n,
            _ => "No notes",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DetailResponse {
    pub success: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VersionListResponse {
    pub versions: Vec<BackupVersion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictResolution {
    #[default]
    KeepExisting,
    UseBackup,
    KeepBoth,
}

impl ConflictResolution {
    pub fn as_form_value(&self) -> &'static str {
        match self {
            ConflictResolution::KeepExisting => "keep-existing",
            ConflictResolution::UseBackup => "use-backup",
            ConflictResolution::KeepBoth => "keep-both",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConflictResolution::KeepExisting => "Keep existing",
            ConflictResolution::UseBackup => "Use backup",
            ConflictResolution::KeepBoth => "Keep both",
        }
    }

    /// Message shown once a conflict is resolved this way.
    pub fn outcome_message(&self) -> &'static str {
        match self {
            ConflictResolution::KeepExisting => "Keeping existing file",
            ConflictResolution::UseBackup => "Using backup file",
            ConflictResolution::KeepBoth => "Keeping both files",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ConflictResolution::KeepExisting => ConflictResolution::UseBackup,
            ConflictResolution::UseBackup => ConflictResolution::KeepBoth,
            ConflictResolution::KeepBoth => ConflictResolution::KeepExisting,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOptions {
    pub backup_first: bool,
    pub restore_dot_files: bool,
    pub conflict_resolution: ConflictResolution,
    pub apply_to_all: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            backup_first: true,
            restore_dot_files: false,
            conflict_resolution: ConflictResolution::default(),
            apply_to_all: false,
        }
    }
}

impl RestoreOptions {
    /// Form fields for the restore POST, booleans spelled the way the backend compares them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("backup_first", self.backup_first.to_string()),
            ("restore_dot_files", self.restore_dot_files.to_string()),
            (
                "conflict_resolution",
                self.conflict_resolution.as_form_value().to_string(),
            ),
            ("apply_to_all", self.apply_to_all.to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RestoreResult {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub conflicts: Vec<String>,
}

impl RestoreResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            conflicts: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RestoreResponse {
    pub result: Option<RestoreResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestoreState {
    #[default]
    Idle,
    Selected,
    Confirming,
    Submitting,
    Completed(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme '{}', expected light or dark", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_display() {
        assert_eq!(Size::Bytes(0).to_string(), "0 B");
        assert_eq!(Size::Bytes(3 * 1024 * 1024).to_string(), "3.00 MB");
        assert_eq!(Size::Display("12 KB".to_string()).to_string(), "12 KB");
    }

    #[test]
    fn test_display_timestamp() {
        assert_eq!(
            display_timestamp("20240101-134500"),
            "January 01, 2024 at 01:45 PM"
        );
        assert_eq!(display_timestamp("2024-01-01"), "2024-01-01");
        assert_eq!(display_timestamp("1704067200"), "January 01, 2024 at 12:00 AM");
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = NaiveDateTime::parse_from_str("20240201-090000", BACKEND_TIMESTAMP_FORMAT).ok();
        assert_eq!(parse_timestamp("20240201-090000"), expected);
        assert_eq!(parse_timestamp("February 01, 2024 at 09:00 AM"), expected);
        assert_eq!(parse_timestamp("1706778000"), expected);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_version_accepts_backend_field_names() {
        let json = r#"{"backup_id":"firefox-20240101-120000","timestamp":"20240101-120000","size":2048,"notes":"before upgrade"}"#;
        let version: BackupVersion = serde_json::from_str(json).unwrap();
        assert_eq!(version.id, "firefox-20240101-120000");
        assert_eq!(version.size, Size::Bytes(2048));
        assert!(version.paths.is_empty());
    }

    #[test]
    fn test_restore_form_fields() {
        let options = RestoreOptions {
            backup_first: false,
            restore_dot_files: true,
            conflict_resolution: ConflictResolution::KeepBoth,
            apply_to_all: true,
        };
        let fields = options.form_fields();
        assert!(fields.contains(&("backup_first", "false".to_string())));
        assert!(fields.contains(&("restore_dot_files", "true".to_string())));
        assert!(fields.contains(&("conflict_resolution", "keep-both".to_string())));
        assert!(fields.contains(&("apply_to_all", "true".to_string())));
    }

    #[test]
    fn test_restore_response_without_result() {
        let response: RestoreResponse = serde_json::from_str("{}").unwrap();
        assert!(response.result.is_none());
    }
}
