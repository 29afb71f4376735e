//! Configuration loading and typed settings for TravelSplit components.
//!
//! Settings are layered: `<dir>/default.toml`, then `<dir>/<env>.toml`, then
//! `TRAVELSPLIT__SECTION__KEY` environment variables. Every layer is optional.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use travelsplit_core::Money;

/// Prefix of environment variables that override file settings.
pub const ENV_PREFIX: &str = "TRAVELSPLIT";

/// Root configuration object.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub ledger: LedgerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Ledger-wide limits and presentation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct LedgerSettings {
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Largest accepted expense amount, in whole currency units.
    #[serde(default = "default_max_amount")]
    pub max_amount: i64,
}

impl LedgerSettings {
    pub fn max_amount(&self) -> Result<Money> {
        if self.max_amount <= 0 {
            bail!("ledger.max_amount must be positive, got {}", self.max_amount);
        }
        Money::new(self.max_amount).with_context(|| {
            format!(
                "ledger.max_amount {} exceeds the safe limit {}",
                self.max_amount,
                Money::MAX_SAFE
            )
        })
    }
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            max_amount: default_max_amount(),
        }
    }
}

/// Logging configuration consumed by binaries.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
}

/// How command results are rendered.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl AppConfig {
    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to render configuration as TOML")
    }

    fn validate(self) -> Result<Self> {
        self.ledger.max_amount()?;
        if self.ledger.currency.trim().is_empty() {
            bail!("ledger.currency must not be empty");
        }
        Ok(self)
    }
}

/// Load configuration for `env` from `config_dir`, honouring process environment overrides.
pub fn load_config(config_dir: &Path, env: Option<&str>) -> Result<AppConfig> {
    load_with_overrides(config_dir, env, None)
}

/// Same as [`load_config`] but reads overrides from `vars` instead of the process environment.
pub fn load_with_overrides(
    config_dir: &Path,
    env: Option<&str>,
    vars: Option<HashMap<String, String>>,
) -> Result<AppConfig> {
    let mut builder = Config::builder().add_source(
        File::from(config_dir.join("default.toml"))
            .format(FileFormat::Toml)
            .required(false),
    );
    if let Some(env) = env {
        builder = builder.add_source(
            File::from(config_dir.join(format!("{env}.toml")))
                .format(FileFormat::Toml)
                .required(false),
        );
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(vars),
    );

    let dir = config_dir.display();
    let config = builder
        .build()
        .with_context(|| format!("failed to load configuration from {dir}"))?;
    let app: AppConfig = config
        .try_deserialize()
        .context("invalid configuration values")?;
    app.validate()
}

fn default_currency() -> String {
    "COP".into()
}

fn default_max_amount() -> i64 {
    Money::MAX_SAFE
}

fn default_log_level() -> String {
    "info".into()
}
