//! deskflow runtime configuration schema.
//!
//! Every section is optional so a partial YAML file (or none at all) still
//! deserializes; `defaults::apply_all_defaults` fills the gaps.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeskflowConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    /// Session retention and time-boxed markers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionConfig>,

    /// Plan catalogue offered by the sales conversation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales: Option<SalesConfig>,

    /// Flow registration order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchConfig>,

    /// Messaging channel credentials and static replies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelConfig>,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`; `RUST_LOG` wins when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Seconds after a completed contract during which courtesy replies
    /// ("gracias", "ok") get a closing remark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courtesy_window_secs: Option<u64>,
    /// Conversation turns kept per session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesConfig {
    #[serde(default)]
    pub plans: Vec<PlanConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_plan: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanConfig {
    pub name: String,
    /// Monthly price in pesos.
    pub price: u64,
    /// Lowercase phrases that identify the plan in free text.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl PlanConfig {
    pub fn new(name: &str, price: u64, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            price,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Whether `text` names this plan, by keyword or by full name.
    pub fn mentioned_in(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        lower.contains(&self.name.to_lowercase())
            || self
                .keywords
                .iter()
                .any(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchConfig {
    /// Flow names in registration order. Same-pass hand-offs only reach
    /// flows listed after the flow that hands off.
    #[serde(default)]
    pub flow_order: Vec<String>,
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default)]
    pub payment_points: Vec<PaymentPointConfig>,
    /// Footer appended to the payment points reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPointConfig {
    pub name: String,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved accessors
// ---------------------------------------------------------------------------

impl DeskflowConfig {
    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(crate::defaults::DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.dir.as_deref())
            .unwrap_or(crate::defaults::DEFAULT_LOG_DIR)
    }

    pub fn courtesy_window_secs(&self) -> u64 {
        self.session
            .as_ref()
            .and_then(|s| s.courtesy_window_secs)
            .unwrap_or(crate::defaults::DEFAULT_COURTESY_WINDOW_SECS)
    }

    pub fn history_limit(&self) -> usize {
        self.session
            .as_ref()
            .and_then(|s| s.history_limit)
            .unwrap_or(crate::defaults::DEFAULT_HISTORY_LIMIT)
    }

    pub fn plans(&self) -> &[PlanConfig] {
        self.sales.as_ref().map(|s| s.plans.as_slice()).unwrap_or(&[])
    }

    /// The configured default plan, falling back to the first plan.
    pub fn default_plan(&self) -> Option<&PlanConfig> {
        let plans = self.plans();
        self.sales
            .as_ref()
            .and_then(|s| s.default_plan.as_deref())
            .and_then(|name| plans.iter().find(|p| p.name == name))
            .or_else(|| plans.first())
    }

    pub fn flow_order(&self) -> Vec<String> {
        match &self.dispatch {
            Some(d) if !d.flow_order.is_empty() => d.flow_order.clone(),
            _ => crate::defaults::DEFAULT_FLOW_ORDER
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn payment_points(&self) -> &[PaymentPointConfig] {
        self.channel
            .as_ref()
            .map(|c| c.payment_points.as_slice())
            .unwrap_or(&[])
    }

    pub fn payment_notice(&self) -> Option<&str> {
        self.channel.as_ref().and_then(|c| c.payment_notice.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
session:
  courtesyWindowSecs: 90
  historyLimit: 20
sales:
  defaultPlan: Fibra 200
  plans:
    - name: Fibra 200
      price: 95000
      keywords: ["200 mbps", "200 megas"]
dispatch:
  flowOrder: [clientMenu, sales]
channel:
  paymentPoints:
    - name: Oficina principal
      details: Calle 5 No. 4-20
      hours: Lun a Sáb 8am - 6pm
"#;
        let cfg: DeskflowConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.courtesy_window_secs(), 90);
        assert_eq!(cfg.history_limit(), 20);
        assert_eq!(cfg.default_plan().unwrap().price, 95000);
        assert_eq!(cfg.flow_order(), ["clientMenu", "sales"]);
        assert_eq!(cfg.payment_points()[0].hours.as_deref(), Some("Lun a Sáb 8am - 6pm"));
    }

    #[test]
    fn empty_config_uses_builtin_values() {
        let cfg = DeskflowConfig::default();
        assert_eq!(cfg.log_level(), "info");
        assert_eq!(cfg.courtesy_window_secs(), 120);
        assert_eq!(cfg.flow_order().len(), 12);
        assert!(cfg.default_plan().is_none());
    }

    #[test]
    fn plan_mention_matches_keywords_and_name() {
        let plan = PlanConfig::new("Pack Premium", 100_000, &["premium"]);
        assert!(plan.mentioned_in("Me interesa el PREMIUM"));
        assert!(plan.mentioned_in("quiero el pack premium"));
        assert!(!plan.mentioned_in("el básico"));
    }

    #[test]
    fn unknown_default_plan_falls_back_to_first() {
        let cfg = DeskflowConfig {
            sales: Some(SalesConfig {
                plans: vec![PlanConfig::new("A", 1, &[]), PlanConfig::new("B", 2, &[])],
                default_plan: Some("Z".into()),
            }),
            ..Default::default()
        };
        assert_eq!(cfg.default_plan().unwrap().name, "A");
    }
}
