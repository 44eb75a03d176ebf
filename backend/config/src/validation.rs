//! Config validation: checks with user-friendly messages.

use std::collections::HashSet;

use crate::defaults::DEFAULT_FLOW_ORDER;
use crate::schema::DeskflowConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &DeskflowConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_logging(config, &mut report);
    validate_session(config, &mut report);
    validate_sales(config, &mut report);
    validate_dispatch(config, &mut report);
    validate_channel(config, &mut report);
    report
}

fn validate_logging(config: &DeskflowConfig, report: &mut ValidationReport) {
    let Some(level) = config.logging.as_ref().and_then(|l| l.level.as_deref()) else {
        return;
    };
    if !matches!(
        level.to_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        report.error(
            "logging.level",
            format!("Unknown level '{level}'. Use trace, debug, info, warn, or error"),
        );
    }
}

fn validate_session(config: &DeskflowConfig, report: &mut ValidationReport) {
    let Some(session) = &config.session else { return };
    if session.history_limit == Some(0) {
        report.error("session.historyLimit", "historyLimit must be >= 1");
    }
    if session.courtesy_window_secs == Some(0) {
        report.warn(
            "session.courtesyWindowSecs",
            "A zero window disables courtesy replies after a contract",
        );
    }
}

fn validate_sales(config: &DeskflowConfig, report: &mut ValidationReport) {
    let Some(sales) = &config.sales else { return };
    let mut seen = HashSet::new();
    for (i, plan) in sales.plans.iter().enumerate() {
        let path = format!("sales.plans[{i}]");
        if plan.name.trim().is_empty() {
            report.error(format!("{path}.name"), "Plan name cannot be empty");
        } else if !seen.insert(plan.name.to_lowercase()) {
            report.error(format!("{path}.name"), format!("Duplicate plan '{}'", plan.name));
        }
        if plan.price == 0 {
            report.warn(format!("{path}.price"), "Plan price is zero");
        }
    }
    if let Some(default) = &sales.default_plan {
        if !sales.plans.iter().any(|p| &p.name == default) {
            report.error(
                "sales.defaultPlan",
                format!("Default plan '{default}' is not in sales.plans"),
            );
        }
    }
}

/// Flow names must be known and unique. Flows that take hand-offs from the
/// menu only receive them in the same pass when listed after it.
fn validate_dispatch(config: &DeskflowConfig, report: &mut ValidationReport) {
    let Some(dispatch) = &config.dispatch else { return };
    let order = &dispatch.flow_order;

    let mut seen = HashSet::new();
    for (i, name) in order.iter().enumerate() {
        let path = format!("dispatch.flowOrder[{i}]");
        if !DEFAULT_FLOW_ORDER.contains(&name.as_str()) {
            report.error(
                &path,
                format!("Unknown flow '{name}'. Known flows: {}", DEFAULT_FLOW_ORDER.join(", ")),
            );
        } else if !seen.insert(name.as_str()) {
            report.error(&path, format!("Flow '{name}' is listed twice"));
        }
    }

    let Some(menu_at) = order.iter().position(|n| n == "clientMenu") else {
        if !order.is_empty() {
            report.warn(
                "dispatch.flowOrder",
                "clientMenu is not registered; menu selections will not be routed",
            );
        }
        return;
    };
    for target in [
        "ticketIntake",
        "ipDiagnostic",
        "debtInquiry",
        "paymentPoints",
        "invoices",
        "passwordChange",
        "planUpgrade",
        "paymentReceipt",
    ] {
        if let Some(at) = order.iter().position(|n| n == target) {
            if at < menu_at {
                report.warn(
                    format!("dispatch.flowOrder[{at}]"),
                    format!(
                        "{target} runs before clientMenu; menu selections for it need a second message"
                    ),
                );
            }
        }
    }
}

fn validate_channel(config: &DeskflowConfig, report: &mut ValidationReport) {
    let Some(channel) = &config.channel else { return };
    for (i, point) in channel.payment_points.iter().enumerate() {
        if point.name.trim().is_empty() {
            report.error(
                format!("channel.paymentPoints[{i}].name"),
                "Payment point name cannot be empty",
            );
        }
    }
    if channel.phone_number_id.is_some()
        && channel.access_token.as_deref().map(str::is_empty).unwrap_or(true)
    {
        report.error("channel.accessToken", "accessToken is required with phoneNumberId");
    }
}
