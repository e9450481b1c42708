use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use url::Url;

/// The sign-up form this watcher was written against.
pub const DEFAULT_FORM_URL: &str =
    "https://docs.google.com/forms/d/e/1FAIpQLSeXDOh_uD7b4LEqVBfkbaMu_TqiR9ObwvnNc41ySPaR-y-y1A/viewform";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub email: String,
    pub name: String,
    pub courier_id: u64,
    #[serde(default = "default_poll_minutes")]
    pub poll_minutes: u64,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_true")]
    pub notify_on_found: bool,
    #[serde(default)]
    pub ntfy_topic: Option<String>,
    #[serde(default = "default_ntfy_server")]
    pub ntfy_server: String,
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
    #[serde(default)]
    pub debug_screenshots: bool,
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,
    #[serde(default = "default_form_url")]
    pub form_url: String,
    #[serde(default)]
    pub chrome_path: Option<String>,
}

fn default_poll_minutes() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_ntfy_server() -> String {
    "https://ntfy.sh".to_string()
}

fn default_report_path() -> PathBuf {
    PathBuf::from("reports.json")
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("debug")
}

fn default_form_url() -> String {
    DEFAULT_FORM_URL.to_string()
}

impl AppConfig {
    /// Load the configuration from a JSON file, with `SHIFT_WATCHER_*`
    /// environment variables layered on top. A missing file is fatal.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Message(format!(
                "Missing {}. Copy config.example.json to {} and fill it in.",
                path.display(),
                path.display()
            )));
        }

        let s = Config::builder()
            .add_source(File::from(path).format(FileFormat::Json))
            // Add environment variables with prefix "SHIFT_WATCHER_"
            .add_source(Environment::with_prefix("SHIFT_WATCHER").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // Add Chrome path from environment if not set
        if config.chrome_path.is_none() {
            config.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(ConfigError::Message(
                "email must be a non-empty address".into(),
            ));
        }

        if self.name.trim().is_empty() {
            return Err(ConfigError::Message("name must not be empty".into()));
        }

        if self.courier_id == 0 {
            return Err(ConfigError::Message(
                "courier_id must be greater than 0".into(),
            ));
        }

        if self.poll_minutes == 0 {
            return Err(ConfigError::Message(
                "poll_minutes must be greater than 0".into(),
            ));
        }

        if Url::parse(&self.ntfy_server).is_err() {
            return Err(ConfigError::Message("Invalid ntfy_server URL format".into()));
        }

        if Url::parse(&self.form_url).is_err() {
            return Err(ConfigError::Message("Invalid form_url format".into()));
        }

        Ok(())
    }
}
