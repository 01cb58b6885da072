//! Configuration management for publish-pilot
//!
//! Supports environment variables, config files, and CLI overrides.
//! The configuration is read once at startup, validated, and then passed
//! around as an immutable value.
//!
//! Config file location: ~/.config/publish-pilot/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::core::error::{PilotError, Result};

/// Main configuration for publish-pilot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,
    /// Browser configuration
    pub browser: BrowserConfig,
    /// Admin console credentials
    pub credentials: Credentials,
    /// Admin console URLs
    pub sites: SiteConfig,
    /// Poll budgets and timeouts
    pub timing: TimingConfig,
    /// Vendor UI selectors and marker texts
    pub selectors: Selectors,
    /// Failure diagnostics
    pub diagnostics: DiagnosticsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when RUST_LOG is not set (default: info)
    pub level: String,
}

/// Supported browser backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Google Chrome via chromedriver
    Chrome,
    /// Mozilla Firefox via geckodriver
    Firefox,
}

impl BrowserKind {
    /// Default WebDriver endpoint for this backend
    pub fn default_webdriver_url(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "http://localhost:9515",
            BrowserKind::Firefox => "http://localhost:4444",
        }
    }
}

impl FromStr for BrowserKind {
    type Err = PilotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(BrowserKind::Chrome),
            "firefox" => Ok(BrowserKind::Firefox),
            other => Err(PilotError::config(format!(
                "Unsupported browser '{}' (expected chrome or firefox)",
                other
            ))),
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserKind::Chrome => write!(f, "chrome"),
            BrowserKind::Firefox => write!(f, "firefox"),
        }
    }
}

/// Browser session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Which backend to drive
    pub kind: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// WebDriver endpoint; falls back to the backend default
    pub webdriver_url: Option<String>,
    /// Implicit element wait in seconds
    pub implicit_wait_secs: u64,
    /// Page load timeout in seconds
    pub page_load_timeout_secs: u64,
}

/// Admin console credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    /// Never written out by `--print-config`
    #[serde(default = "env_password", skip_serializing)]
    pub password: String,
}

fn env_password() -> String {
    env::var("PILOT_PASSWORD").unwrap_or_default()
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Admin console URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Admin console of the design site (iterated backups, publication)
    pub design_admin_url: String,
    /// Admin console of the live site (always restores the newest backup)
    pub live_admin_url: String,
}

/// Poll budgets and timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Maximum publication duration in minutes
    pub publish_timeout_minutes: u64,
    /// Maximum restore duration in minutes
    pub restore_timeout_minutes: u64,
    /// Default number of poll attempts
    pub retries: u32,
    /// Default pause between poll attempts in seconds
    pub interval_secs: u64,
    /// Pause around frame switches and window registration in milliseconds
    pub settle_ms: u64,
}

/// CSS selectors and marker texts of the vendor admin UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selectors {
    pub login_username: String,
    pub login_password: String,
    pub login_button: String,
    /// Opens the Backup & Restore window
    pub backup_restore_button: String,
    pub header_frame: String,
    pub main_frame: String,
    pub restore_tab_link: String,
    pub next_button: String,
    pub restore_intro_text: String,
    pub backup_list: String,
    pub restore_button: String,
    pub popup_password: String,
    pub popup_ok: String,
    pub restore_success_text: String,
    pub publish_section_button: String,
    pub publish_sites_frame: String,
    pub publish_site_button: String,
    pub backup_publish_site_checkbox: String,
    pub publish_button: String,
    pub publish_status: String,
    /// Acknowledgment button of unexpected confirmation popups
    pub popup_acknowledge: String,
}

/// Failure diagnostics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Directory screenshots are written to
    pub screenshot_dir: PathBuf,
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|v| v == "true" || v == "1")
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: env::var("PILOT_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            kind: env_parse("PILOT_BROWSER").unwrap_or(BrowserKind::Chrome),
            headless: env_flag("PILOT_HEADLESS").unwrap_or(true),
            webdriver_url: env::var("PILOT_WEBDRIVER_URL").ok(),
            implicit_wait_secs: 2,
            page_load_timeout_secs: 120,
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: env::var("PILOT_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            password: env_password(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            design_admin_url: env::var("PILOT_DESIGN_URL").unwrap_or_else(|_| {
                "https://publishdesign.intellect.com/intellect/admin".to_string()
            }),
            live_admin_url: env::var("PILOT_LIVE_URL").unwrap_or_else(|_| {
                "https://publishlive.intellect.com/intellect/admin".to_string()
            }),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            publish_timeout_minutes: 720,
            restore_timeout_minutes: 10,
            retries: 10,
            interval_secs: 1,
            settle_ms: 1000,
        }
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            login_username: "#Username".to_string(),
            login_password: "#Password".to_string(),
            login_button: "#Button1".to_string(),
            backup_restore_button: "a.button".to_string(),
            header_frame: "[name=\"Header\"]".to_string(),
            main_frame: "[name=\"Main\"]".to_string(),
            restore_tab_link: "a[href^=\"RestoreDB\"]".to_string(),
            next_button: "#NextButton".to_string(),
            restore_intro_text: "select the backup file that you want".to_string(),
            backup_list: "select#lstDBBackupFiles".to_string(),
            restore_button: "#RestoreButton".to_string(),
            popup_password: "#Password".to_string(),
            popup_ok: "#OK".to_string(),
            restore_success_text: "Completed successfully".to_string(),
            publish_section_button: "#SectionPublishButton".to_string(),
            publish_sites_frame: "#PublishSites".to_string(),
            publish_site_button: "#PublishButton_0".to_string(),
            backup_publish_site_checkbox: "#BackupPublishSite".to_string(),
            publish_button: "#PublishButton".to_string(),
            publish_status: "span#lblPublishStatus".to_string(),
            popup_acknowledge: "#OKButton".to_string(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: env::var("PILOT_SCREENSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl TimingConfig {
    /// Number of one-second status ticks a publication may take
    pub fn publish_ticks(&self) -> u64 {
        self.publish_timeout_minutes * 60
    }

    /// Restore budget in seconds
    pub fn restore_timeout_secs(&self) -> u64 {
        self.restore_timeout_minutes * 60
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl BrowserConfig {
    /// WebDriver endpoint to connect to
    pub fn webdriver_url(&self) -> &str {
        self.webdriver_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_webdriver_url())
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("publish-pilot")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from(&Self::config_file()) {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PilotError::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text; missing keys take their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check the values once before any browser is started
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("sites.design_admin_url", &self.sites.design_admin_url),
            ("sites.live_admin_url", &self.sites.live_admin_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| {
                    PilotError::config(format!("{} is not a URL ({}): {}", name, value, e))
                })?;
        }

        if let Some(ref webdriver_url) = self.browser.webdriver_url {
            url::Url::parse(webdriver_url).map_err(|e| {
                PilotError::config(format!("browser.webdriver_url is not a URL: {}", e))
            })?;
        }

        if self.credentials.username.is_empty() {
            return Err(PilotError::config("credentials.username is empty"));
        }
        if self.credentials.password.is_empty() {
            return Err(PilotError::config(
                "credentials.password is empty (set PILOT_PASSWORD or the config file)",
            ));
        }

        if self.timing.retries == 0 {
            return Err(PilotError::config("timing.retries must be at least 1"));
        }
        if self.timing.publish_timeout_minutes == 0 || self.timing.restore_timeout_minutes == 0 {
            return Err(PilotError::config("timeouts must be at least one minute"));
        }

        Ok(())
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}
