use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use reqwest::Url;
use tracing::debug;

use crate::errors::RestoreError;
use crate::types::Theme;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const THEME_ENV: &str = "RESTORE_PANEL_THEME";

#[derive(Parser, Debug, Clone)]
#[command(name = "restore-panel")]
#[command(version, about = "Interactive restore panel for application backups", long_about = None)]
pub struct Cli {
    /// Base URL of the backup server
    #[arg(long, env = "RESTORE_PANEL_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// Application whose backups are restored
    #[arg(long, env = "RESTORE_PANEL_APP_ID")]
    pub app_id: String,

    /// Name shown in the confirmation step (defaults to the app id)
    #[arg(long, env = "RESTORE_PANEL_APP_NAME")]
    pub app_name: Option<String>,

    /// Seconds before an alert dismisses itself
    #[arg(long, env = "RESTORE_PANEL_ALERT_SECONDS", default_value_t = 5)]
    pub alert_seconds: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "RESTORE_PANEL_TIMEOUT_SECONDS", default_value_t = 30)]
    pub timeout_seconds: u64,

    /// Directory for the rolling log file
    #[arg(long, env = "RESTORE_PANEL_LOG_DIR", default_value = "./logs")]
    pub log_dir: PathBuf,

    /// Color theme: light or dark
    #[arg(long, env = "RESTORE_PANEL_THEME", default_value = "dark")]
    pub theme: Theme,

    /// Run in dry-run mode (simulate restores without executing)
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: Url,
    pub app_id: String,
    pub app_name: String,
    pub alert_lifetime: Duration,
    pub request_timeout: Duration,
    pub log_dir: PathBuf,
    pub theme: Theme,
    pub dry_run: bool,
    /// `.env` file the theme toggle is written back to. `None` keeps it in memory.
    pub settings_file: Option<PathBuf>,
}

impl Config {
    /// Reads `.env` first so its values act as environment fallbacks for the CLI.
    pub fn load() -> Result<Self, RestoreError> {
        let env_file = dotenv::dotenv().ok();
        let mut config = Self::from_cli(Cli::parse())?;
        config.settings_file = Some(env_file.unwrap_or_else(|| PathBuf::from(".env")));
        Ok(config)
    }

    pub fn from_cli(cli: Cli) -> Result<Self, RestoreError> {
        let server_url = Url::parse(&cli.server_url).map_err(|e| {
            RestoreError::Configuration(format!("invalid server URL '{}': {}", cli.server_url, e))
        })?;
        if server_url.cannot_be_a_base() {
            return Err(RestoreError::Configuration(format!(
                "server URL '{}' cannot be used as a base",
                cli.server_url
            )));
        }

        let app_id = cli.app_id.trim().to_string();
        let app_name = cli
            .app_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| app_id.clone());

        let config = Config {
            server_url,
            app_id,
            app_name,
            alert_lifetime: Duration::from_secs(cli.alert_seconds),
            request_timeout: Duration::from_secs(cli.timeout_seconds),
            log_dir: cli.log_dir,
            theme: cli.theme,
            dry_run: cli.dry_run,
            settings_file: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RestoreError> {
        if self.app_id.is_empty() {
            return Err(RestoreError::Configuration(
                "an application id is required".to_string(),
            ));
        }
        if self.alert_lifetime.is_zero() {
            return Err(RestoreError::Configuration(
                "alert lifetime must be at least one second".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(RestoreError::Configuration(
                "request timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rewrites the theme line of an env file, keeping every other line as is.
pub fn save_theme(path: &Path, theme: Theme) -> Result<(), RestoreError> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(RestoreError::Settings(format!("{}: {}", path.display(), e))),
    };

    let prefix = format!("{}=", THEME_ENV);
    let mut content: String = existing
        .lines()
        .filter(|line| !line.trim_start().starts_with(&prefix))
        .map(|line| format!("{}\n", line))
        .collect();
    content.push_str(&format!("{}{}\n", prefix, theme.as_str()));

    fs::write(path, content)
        .map_err(|e| RestoreError::Settings(format!("{}: {}", path.display(), e)))?;
    debug!(path = %path.display(), theme = theme.as_str(), "theme saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("restore-panel-{}-{}", std::process::id(), name));
        let _ = fs::remove_file(&path);
        path
    }

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["restore-panel"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_cli(parse(&["--app-id", "firefox"])).unwrap();
        assert_eq!(config.server_url.as_str(), "http://localhost:5000/");
        assert_eq!(config.app_name, "firefox");
        assert_eq!(config.alert_lifetime, Duration::from_secs(5));
        assert_eq!(config.theme, Theme::Dark);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_cli(parse(&[
            "--app-id",
            "thunderbird",
            "--app-name",
            "Thunderbird",
            "--server-url",
            "http://backup.local:8080",
            "--theme",
            "light",
            "--dry-run",
        ]))
        .unwrap();
        assert_eq!(config.app_name, "Thunderbird");
        assert_eq!(config.server_url.host_str(), Some("backup.local"));
        assert_eq!(config.theme, Theme::Light);
        assert!(config.dry_run);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Config::from_cli(parse(&["--app-id", "firefox", "--server-url", "not a url"])),
            Err(RestoreError::Configuration(_))
        ));
        assert!(matches!(
            Config::from_cli(parse(&["--app-id", "  "])),
            Err(RestoreError::Configuration(_))
        ));
        assert!(matches!(
            Config::from_cli(parse(&["--app-id", "firefox", "--alert-seconds", "0"])),
            Err(RestoreError::Configuration(_))
        ));
    }

    #[test]
    fn test_save_theme_replaces_only_theme_line() {
        let path = scratch_file("replace.env");
        fs::write(&path, "RESTORE_PANEL_APP_ID=firefox\nRESTORE_PANEL_THEME=dark\n").unwrap();

        save_theme(&path, Theme::Light).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "RESTORE_PANEL_APP_ID=firefox\nRESTORE_PANEL_THEME=light\n"
        );

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_save_theme_creates_missing_file() {
        let path = scratch_file("missing.env");
        save_theme(&path, Theme::Dark).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "RESTORE_PANEL_THEME=dark\n");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_save_theme_reports_unwritable_path() {
        let dir = scratch_file("as-dir");
        fs::create_dir_all(&dir).unwrap();
        assert!(matches!(
            save_theme(&dir, Theme::Light),
            Err(RestoreError::Settings(_))
        ));

        let _ = fs::remove_dir(&dir);
    }
}
