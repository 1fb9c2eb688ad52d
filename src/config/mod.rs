//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::countdown::Countdown;
use crate::format::{compile, TemplateError};
use crate::models::Defaults;
use crate::render::RenderOptions;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid template: {0}")]
    Template(#[from] TemplateError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// A countdown described in TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownConfig {
    /// Template to render with
    #[serde(default = "default_template")]
    pub template: String,

    /// Omit units whose value is zero
    #[serde(default = "default_true")]
    pub remove_empty: bool,

    /// Trim surrounding whitespace
    #[serde(default = "default_true")]
    pub strip: bool,

    /// Ceiling for every unit value
    #[serde(default)]
    pub max_value: Option<u64>,

    /// Render a placeholder when a computed extra fails
    #[serde(default)]
    pub ignore_extra_errors: bool,

    #[serde(default = "default_plus")]
    pub plus: String,

    #[serde(default = "default_minus")]
    pub minus: String,

    /// Literal values for extra decorators and raw keys
    #[serde(default = "default_extras")]
    pub defaults: BTreeMap<String, String>,
}

fn default_template() -> String {
    crate::countdown::DEFAULT_TEMPLATE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_plus() -> String {
    "+".to_string()
}

fn default_minus() -> String {
    "-".to_string()
}

fn default_extras() -> BTreeMap<String, String> {
    [("wd", "w "), ("dd", "d "), ("hd", "h "), ("md", "m "), ("Sd", "s ")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            remove_empty: true,
            strip: true,
            max_value: None,
            ignore_extra_errors: false,
            plus: default_plus(),
            minus: default_minus(),
            defaults: default_extras(),
        }
    }
}

impl CountdownConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: CountdownConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plus.is_empty() || self.minus.is_empty() {
            return Err(ConfigError::ValidationError(
                "Sign literals must not be empty".to_string(),
            ));
        }

        if self.plus == self.minus {
            return Err(ConfigError::ValidationError(
                "Sign literals must differ".to_string(),
            ));
        }

        if self.max_value == Some(0) {
            return Err(ConfigError::ValidationError(
                "max_value must be greater than 0".to_string(),
            ));
        }

        compile(&self.template)?;
        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            remove_empty: self.remove_empty,
            strip: self.strip,
            max_value: self.max_value,
            ignore_extra_errors: self.ignore_extra_errors,
            plus: self.plus.clone(),
            minus: self.minus.clone(),
        }
    }

    pub fn extra_defaults(&self) -> Defaults {
        self.defaults.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    /// Build the configured countdown.
    pub fn into_countdown(self) -> Result<Countdown, ConfigError> {
        let countdown = Countdown::new(&self.template)?
            .with_options(self.render_options())
            .with_defaults(self.extra_defaults());
        Ok(countdown)
    }
}
