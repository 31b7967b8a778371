use chrono::NaiveDate;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PLACEHOLDER_START: &str = "<!-- CROWDIN-CONTRIBUTORS-START -->";
pub const DEFAULT_PLACEHOLDER_END: &str = "<!-- CROWDIN-CONTRIBUTORS-END -->";
pub const DEFAULT_EXCLUDED_ACCOUNT: &str = "REMOVED_USER";

/// Top-level configuration for a contributors table run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: CredentialsConfig,
    pub table: ContributorsTableConfig,
    pub polling: PollConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            credentials: CredentialsConfig::from_env()?,
            table: ContributorsTableConfig::from_env()?,
            polling: PollConfig::from_env()?,
            telemetry: TelemetryConfig::from_env(),
        })
    }
}

/// Access to the Crowdin project the report is generated for.
#[derive(Clone)]
pub struct CredentialsConfig {
    pub token: String,
    pub organization: Option<String>,
    pub project_id: u64,
    pub base_url: Option<String>,
}

impl CredentialsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            token: required_var("CROWDIN_PERSONAL_TOKEN")?,
            organization: optional_var("CROWDIN_ORGANIZATION"),
            project_id: parse_var::<u64>("CROWDIN_PROJECT_ID", None)?,
            base_url: optional_var("CROWDIN_BASE_URL"),
        })
    }

    /// API root, honoring an explicit override before the organization domain.
    pub fn api_base_url(&self) -> String {
        if let Some(base) = &self.base_url {
            return base.trim_end_matches('/').to_string();
        }
        match &self.organization {
            Some(org) => format!("https://{org}.api.crowdin.com/api/v2"),
            None => "https://api.crowdin.com/api/v2".to_string(),
        }
    }
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("token", &"<redacted>")
            .field("organization", &self.organization)
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Selection, rendering, and target-file options for the contributors table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorsTableConfig {
    pub excluded_account: String,
    pub min_words_contributed: Option<u64>,
    pub max_contributors: usize,
    pub contributors_per_line: usize,
    pub image_size: u32,
    pub files: Vec<PathBuf>,
    pub placeholder_start: String,
    pub placeholder_end: String,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl ContributorsTableConfig {
    /// Reads the table options; credentials are not required here.
    pub fn from_env() -> Result<Self, ConfigError> {
        let min_words_contributed = match optional_var("MIN_WORDS_CONTRIBUTED") {
            Some(raw) if raw.eq_ignore_ascii_case("null") => None,
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                name: "MIN_WORDS_CONTRIBUTED",
                value: raw,
            })?),
            None => None,
        };

        let config = Self {
            excluded_account: optional_var("EXCLUDED_ACCOUNT")
                .unwrap_or_else(|| DEFAULT_EXCLUDED_ACCOUNT.to_string()),
            min_words_contributed,
            max_contributors: parse_positive("MAX_CONTRIBUTORS", 16)?,
            contributors_per_line: parse_positive("CONTRIBUTORS_PER_LINE", 8)?,
            image_size: parse_positive::<u32>("IMAGE_SIZE", 100)?,
            files: parse_file_list(
                &optional_var("FILES").unwrap_or_else(|| "README.md".to_string()),
            ),
            placeholder_start: optional_var("PLACEHOLDER_START")
                .unwrap_or_else(|| DEFAULT_PLACEHOLDER_START.to_string()),
            placeholder_end: optional_var("PLACEHOLDER_END")
                .unwrap_or_else(|| DEFAULT_PLACEHOLDER_END.to_string()),
            date_from: parse_date_var("REPORT_DATE_FROM")?,
            date_to: parse_date_var("REPORT_DATE_TO")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_contributors == 0 {
            return Err(ConfigError::MustBePositive("MAX_CONTRIBUTORS"));
        }
        if self.contributors_per_line == 0 {
            return Err(ConfigError::MustBePositive("CONTRIBUTORS_PER_LINE"));
        }
        if self.image_size == 0 {
            return Err(ConfigError::MustBePositive("IMAGE_SIZE"));
        }
        if self.files.is_empty() {
            return Err(ConfigError::NoFiles);
        }
        if self.placeholder_start.is_empty()
            || self.placeholder_end.is_empty()
            || self.placeholder_start == self.placeholder_end
        {
            return Err(ConfigError::InvalidMarkers);
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(ConfigError::InvalidDateRange { from, to });
            }
        }
        Ok(())
    }
}

impl Default for ContributorsTableConfig {
    fn default() -> Self {
        Self {
            excluded_account: DEFAULT_EXCLUDED_ACCOUNT.to_string(),
            min_words_contributed: None,
            max_contributors: 16,
            contributors_per_line: 8,
            image_size: 100,
            files: vec![PathBuf::from("README.md")],
            placeholder_start: DEFAULT_PLACEHOLDER_START.to_string(),
            placeholder_end: DEFAULT_PLACEHOLDER_END.to_string(),
            date_from: None,
            date_to: None,
        }
    }
}

/// Bounds for waiting on a remote report job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub timeout: Duration,
}

impl PollConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            initial_interval: Duration::from_millis(parse_var(
                "REPORT_POLL_INTERVAL_MS",
                Some(defaults.initial_interval.as_millis() as u64),
            )?),
            max_interval: Duration::from_millis(parse_var(
                "REPORT_POLL_MAX_INTERVAL_MS",
                Some(defaults.max_interval.as_millis() as u64),
            )?),
            timeout: Duration::from_secs(parse_var(
                "REPORT_POLL_TIMEOUT_SECS",
                Some(defaults.timeout.as_secs()),
            )?),
        })
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(30),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Splits a comma or newline separated list of paths, dropping blanks.
pub fn parse_file_list(raw: &str) -> Vec<PathBuf> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    optional_var(name).ok_or(ConfigError::Missing(name))
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    default: Option<T>,
) -> Result<T, ConfigError> {
    match optional_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
        None => default.ok_or(ConfigError::Missing(name)),
    }
}

fn parse_positive<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    let value = parse_var::<T>(name, Some(default))?;
    if value == T::default() {
        return Err(ConfigError::MustBePositive(name));
    }
    Ok(value)
}

fn parse_date_var(name: &'static str) -> Result<Option<NaiveDate>, ConfigError> {
    optional_var(name)
        .map(|raw| parse_date(&raw).map_err(|reason| ConfigError::InvalidDate { name, reason }))
        .transpose()
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    InvalidNumber { name: &'static str, value: String },
    MustBePositive(&'static str),
    InvalidDate { name: &'static str, reason: String },
    InvalidDateRange { from: NaiveDate, to: NaiveDate },
    NoFiles,
    InvalidMarkers,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{name} must be set"),
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a non-negative integer, got '{value}'")
            }
            ConfigError::MustBePositive(name) => write!(f, "{name} must be at least 1"),
            ConfigError::InvalidDate { name, reason } => write!(f, "{name}: {reason}"),
            ConfigError::InvalidDateRange { from, to } => {
                write!(f, "REPORT_DATE_FROM ({from}) is after REPORT_DATE_TO ({to})")
            }
            ConfigError::NoFiles => write!(f, "FILES must name at least one target file"),
            ConfigError::InvalidMarkers => write!(
                f,
                "PLACEHOLDER_START and PLACEHOLDER_END must be non-empty and distinct"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const VARS: &[&str] = &[
        "CROWDIN_PERSONAL_TOKEN",
        "CROWDIN_PROJECT_ID",
        "CROWDIN_ORGANIZATION",
        "CROWDIN_BASE_URL",
        "MAX_CONTRIBUTORS",
        "CONTRIBUTORS_PER_LINE",
        "MIN_WORDS_CONTRIBUTED",
        "EXCLUDED_ACCOUNT",
        "FILES",
        "PLACEHOLDER_START",
        "PLACEHOLDER_END",
        "IMAGE_SIZE",
        "REPORT_DATE_FROM",
        "REPORT_DATE_TO",
        "REPORT_POLL_INTERVAL_MS",
        "REPORT_POLL_MAX_INTERVAL_MS",
        "REPORT_POLL_TIMEOUT_SECS",
        "APP_LOG_LEVEL",
    ];

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in VARS {
            env::remove_var(name);
        }
        env::set_var("CROWDIN_PERSONAL_TOKEN", "secret");
        env::set_var("CROWDIN_PROJECT_ID", "42");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.credentials.project_id, 42);
        assert!(config.credentials.organization.is_none());
        assert_eq!(config.table, ContributorsTableConfig::default());
        assert_eq!(config.polling, PollConfig::default());
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn reads_overrides_and_null_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MIN_WORDS_CONTRIBUTED", "null");
        env::set_var("FILES", "README.md, docs/index.md\nCONTRIBUTORS.md");
        env::set_var("MAX_CONTRIBUTORS", "4");
        env::set_var("REPORT_DATE_FROM", "2024-01-01");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.table.min_words_contributed, None);
        assert_eq!(config.table.max_contributors, 4);
        assert_eq!(
            config.table.files,
            vec![
                PathBuf::from("README.md"),
                PathBuf::from("docs/index.md"),
                PathBuf::from("CONTRIBUTORS.md"),
            ]
        );
        assert_eq!(
            config.table.date_from,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );

        env::set_var("MIN_WORDS_CONTRIBUTED", "250");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.table.min_words_contributed, Some(250));
    }

    #[test]
    fn rejects_missing_token_and_zero_row_width() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::remove_var("CROWDIN_PERSONAL_TOKEN");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::Missing("CROWDIN_PERSONAL_TOKEN"))
        ));

        reset_env();
        env::set_var("CONTRIBUTORS_PER_LINE", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::MustBePositive("CONTRIBUTORS_PER_LINE"))
        ));
    }

    #[test]
    fn rejects_image_size_beyond_u32() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("IMAGE_SIZE", "4294967297");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber { name: "IMAGE_SIZE", .. })
        ));

        env::set_var("IMAGE_SIZE", "64");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.table.image_size, 64);
    }

    #[test]
    fn organization_selects_enterprise_domain() {
        let mut credentials = CredentialsConfig {
            token: "t".to_string(),
            organization: Some("acme".to_string()),
            project_id: 1,
            base_url: None,
        };
        assert_eq!(
            credentials.api_base_url(),
            "https://acme.api.crowdin.com/api/v2"
        );
        credentials.base_url = Some("http://127.0.0.1:1234/".to_string());
        assert_eq!(credentials.api_base_url(), "http://127.0.0.1:1234");
        assert!(!format!("{credentials:?}").contains("\"t\""));
    }

    #[test]
    fn rejects_reversed_date_window() {
        let config = ContributorsTableConfig {
            date_from: NaiveDate::from_ymd_opt(2024, 5, 1),
            date_to: NaiveDate::from_ymd_opt(2024, 4, 1),
            ..ContributorsTableConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDateRange { .. })
        ));
    }
}
