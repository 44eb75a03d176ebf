use chrono::Duration;

use deskflow_config::{apply_all_defaults, DeskflowConfig, PaymentPointConfig, PlanConfig};

/// Upper bound on the courtesy window; larger values are clamped.
const MAX_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

/// The slice of configuration the flows read.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub courtesy_window: Duration,
    pub plans: Vec<PlanConfig>,
    pub default_plan: Option<PlanConfig>,
    pub payment_points: Vec<PaymentPointConfig>,
    pub payment_notice: Option<String>,
    pub flow_order: Vec<String>,
}

impl FlowSettings {
    pub fn from_config(config: &DeskflowConfig) -> Self {
        let secs = config.courtesy_window_secs().min(MAX_WINDOW_SECS);
        Self {
            courtesy_window: Duration::seconds(secs as i64),
            plans: config.plans().to_vec(),
            default_plan: config.default_plan().cloned(),
            payment_points: config.payment_points().to_vec(),
            payment_notice: config.payment_notice().map(str::to_string),
            flow_order: config.flow_order(),
        }
    }
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self::from_config(&apply_all_defaults(DeskflowConfig::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_config_defaults() {
        let settings = FlowSettings::default();
        assert_eq!(settings.courtesy_window, Duration::seconds(120));
        assert_eq!(settings.default_plan.unwrap().name, "Internet 50 Mbps");
        assert_eq!(settings.flow_order.len(), 12);
        assert!(!settings.payment_points.is_empty());
    }
}
