use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::engine::DEFAULT_HIGH_COST_THRESHOLD;
use crate::format::{CurrencyOptions, NumberLocale};
use crate::rates::{RateOverrides, RateTable};
use crate::usage::UsageField;

const SETTINGS_FILE: &str = "settings.toml";
const MAX_DISPLAY_PRECISION: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySettings {
    pub precision: usize,
    pub show_cents: bool,
    pub locale: NumberLocale,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        let currency = CurrencyOptions::default();
        Self {
            precision: currency.precision,
            show_cents: currency.show_cents,
            locale: currency.locale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    /// Merged over the built-in rate table.
    pub rates: RateOverrides,
    pub high_cost_threshold: f64,
    pub display: DisplaySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rates: RateOverrides::new(),
            high_cost_threshold: DEFAULT_HIGH_COST_THRESHOLD,
            display: DisplaySettings::default(),
        }
    }
}

impl Settings {
    /// Built-in rates with the configured overrides applied.
    pub fn rate_table(&self) -> RateTable {
        RateTable::default().with_overrides(&self.rates)
    }

    pub fn currency_options(&self) -> CurrencyOptions {
        CurrencyOptions {
            precision: self.display.precision,
            show_cents: self.display.show_cents,
            locale: self.display.locale,
        }
    }
}

pub fn config_dir() -> PathBuf {
    config_dir_with_home(dirs::home_dir())
}

fn config_dir_with_home(home: Option<PathBuf>) -> PathBuf {
    match home {
        Some(h) => h.join(".config").join("agentcost"),
        None => PathBuf::from(".config/agentcost"),
    }
}

pub fn default_settings_path() -> PathBuf {
    config_dir().join(SETTINGS_FILE)
}

/// Load settings from `path`, or from the default location when `None`.
///
/// A missing default file yields defaults; a missing explicit file is an error.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_settings_path(), false),
    };

    if !path.exists() {
        if explicit {
            bail!("settings file not found: {}", path.display());
        }
        debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let settings = load_from_toml(&content)
        .with_context(|| format!("invalid settings in {}", path.display()))?;
    debug!(path = %path.display(), overrides = settings.rates.len(), "loaded settings");
    Ok(settings)
}

fn as_number(value: &toml::Value) -> Option<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
}

pub fn load_from_toml(content: &str) -> Result<Settings> {
    let table: toml::Value = content.parse()?;
    let mut settings = Settings::default();

    if let Some(rates) = table.get("rates").and_then(|v| v.as_table()) {
        for (key, value) in rates {
            let field: UsageField = key.parse()?;
            let rate = as_number(value)
                .ok_or_else(|| anyhow!("rate for {key} must be a number"))?;
            if !rate.is_finite() || rate < 0.0 {
                bail!("rate for {key} must be a non-negative number");
            }
            settings.rates.insert(field, rate);
        }
    }

    if let Some(limits) = table.get("limits") {
        if let Some(value) = limits.get("high_cost_threshold") {
            let threshold = as_number(value)
                .ok_or_else(|| anyhow!("limits.high_cost_threshold must be a number"))?;
            if !threshold.is_finite() || threshold < 0.0 {
                bail!("limits.high_cost_threshold must be a non-negative number");
            }
            settings.high_cost_threshold = threshold;
        }
    }

    if let Some(display) = table.get("display") {
        if let Some(value) = display.get("precision") {
            let precision = value
                .as_integer()
                .ok_or_else(|| anyhow!("display.precision must be an integer"))?;
            if !(0..=MAX_DISPLAY_PRECISION).contains(&precision) {
                bail!("display.precision must be between 0 and {MAX_DISPLAY_PRECISION}");
            }
            settings.display.precision = precision as usize;
        }
        if let Some(show_cents) = display.get("show_cents").and_then(|v| v.as_bool()) {
            settings.display.show_cents = show_cents;
        }
        if let Some(locale) = display.get("locale").and_then(|v| v.as_str()) {
            settings.display.locale = locale.parse().map_err(|e: String| anyhow!(e))?;
        }
    }

    Ok(settings)
}
