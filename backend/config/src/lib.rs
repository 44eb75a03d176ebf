//! `deskflow-config`: runtime configuration for the deskflow router.
//!
//! Provides:
//! - Typed config schema (logging, session, sales catalogue, flow order, channel)
//! - YAML read/write
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation and redaction for display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::{apply_all_defaults, DEFAULT_FLOW_ORDER};
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use redact::redact;
pub use schema::{
    ChannelConfig, DeskflowConfig, DispatchConfig, LoggingConfig, PaymentPointConfig, PlanConfig,
    SalesConfig, SessionConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load, apply env substitution, and apply defaults to a config file.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<DeskflowConfig> {
    let raw_config = load_config(path).await?;
    prepare(raw_config)
}

/// Substitute env vars, apply defaults and log the validation report.
pub fn prepare(raw_config: DeskflowConfig) -> Result<DeskflowConfig> {
    let value: Value =
        serde_json::to_value(&raw_config).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: DeskflowConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }

    Ok(config)
}
