use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::indicator::{DEFAULT_MA_LONG, DEFAULT_MA_SHORT, DEFAULT_RSI, IndicatorSettings};
use crate::model::Period;

pub const TAIL_ROWS_RANGE: std::ops::RangeInclusive<usize> = 5..=10;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_requests_per_second() -> u32 {
    2
}

fn default_symbol() -> String {
    "AAPL".into()
}

fn default_period() -> String {
    "6mo".into()
}

fn default_ma_short_window() -> usize {
    DEFAULT_MA_SHORT.get()
}

fn default_ma_long_window() -> usize {
    DEFAULT_MA_LONG.get()
}

fn default_rsi_window() -> usize {
    DEFAULT_RSI.get()
}

fn default_tail_rows() -> usize {
    5
}

fn default_currency_symbol() -> String {
    "$".into()
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_symbol")]
    pub default_symbol: String,
    #[serde(default = "default_period")]
    pub default_period: String,
    #[serde(default = "default_ma_short_window")]
    pub ma_short_window: usize,
    #[serde(default = "default_ma_long_window")]
    pub ma_long_window: usize,
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,
}

impl AnalysisConfig {
    pub fn indicator_settings(&self) -> IndicatorSettings {
        IndicatorSettings {
            ma_short: self.ma_short_window,
            ma_long: self.ma_long_window,
            rsi: self.rsi_window,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_symbol: default_symbol(),
            default_period: default_period(),
            ma_short_window: default_ma_short_window(),
            ma_long_window: default_ma_long_window(),
            rsi_window: default_rsi_window(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_tail_rows")]
    pub tail_rows: usize,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tail_rows: default_tail_rows(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(config)?;
    validate_provider(config)?;
    validate_analysis(config)?;
    validate_display(config)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_general(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let format = config.general.log_format.as_str();
    if !VALID_LOG_FORMATS.contains(&format) {
        return Err(invalid(format!(
            "general.log_format \"{format}\" is not one of {VALID_LOG_FORMATS:?}"
        )));
    }
    Ok(())
}

fn validate_provider(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let provider = &config.provider;
    if provider.base_url.trim().is_empty() {
        return Err(invalid("provider.base_url must not be empty".into()));
    }
    if provider.requests_per_second == 0 {
        return Err(invalid("provider.requests_per_second must be > 0".into()));
    }
    if provider.timeout_secs == 0 {
        return Err(invalid("provider.timeout_secs must be > 0".into()));
    }
    Ok(())
}

fn validate_analysis(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let analysis = &config.analysis;
    if Period::from_str(&analysis.default_period).is_none() {
        return Err(invalid(format!(
            "analysis.default_period: unknown period \"{}\"",
            analysis.default_period
        )));
    }
    if analysis.default_symbol.trim().is_empty() {
        return Err(invalid("analysis.default_symbol must not be empty".into()));
    }

    let windows = [
        ("ma_short_window", analysis.ma_short_window),
        ("ma_long_window", analysis.ma_long_window),
        ("rsi_window", analysis.rsi_window),
    ];
    for (name, value) in windows {
        if value == 0 {
            return Err(invalid(format!("analysis.{name} must be > 0")));
        }
    }

    if analysis.ma_short_window >= analysis.ma_long_window {
        return Err(invalid(format!(
            "analysis.ma_short_window ({}) must be less than ma_long_window ({})",
            analysis.ma_short_window, analysis.ma_long_window
        )));
    }
    Ok(())
}

fn validate_display(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if !TAIL_ROWS_RANGE.contains(&config.display.tail_rows) {
        return Err(invalid(format!(
            "display.tail_rows {} is outside {}..={}",
            config.display.tail_rows,
            TAIL_ROWS_RANGE.start(),
            TAIL_ROWS_RANGE.end()
        )));
    }
    Ok(())
}
