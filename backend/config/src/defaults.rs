//! Config defaults: applies built-in values to a parsed config.
//!
//! The catalogue and payment points are the ones the sales team publishes;
//! deployments override them in YAML.

use crate::schema::{
    ChannelConfig, DeskflowConfig, DispatchConfig, LoggingConfig, PaymentPointConfig, PlanConfig,
    SalesConfig, SessionConfig,
};

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_COURTESY_WINDOW_SECS: u64 = 120;
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const DEFAULT_PLAN: &str = "Internet 50 Mbps";

/// Registration order in which every same-pass hand-off reaches its target.
pub const DEFAULT_FLOW_ORDER: &[&str] = &[
    "clientMenu",
    "sales",
    "ticketIntake",
    "ipDiagnostic",
    "debtInquiry",
    "paymentPoints",
    "invoices",
    "passwordChange",
    "planUpgrade",
    "paymentReceipt",
    "agentHandover",
    "logout",
];

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: DeskflowConfig) -> DeskflowConfig {
    let config = apply_logging_defaults(config);
    let config = apply_session_defaults(config);
    let config = apply_sales_defaults(config);
    let config = apply_dispatch_defaults(config);
    apply_channel_defaults(config)
}

fn apply_logging_defaults(mut config: DeskflowConfig) -> DeskflowConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.dir.is_none() {
        logging.dir = Some(DEFAULT_LOG_DIR.to_string());
    }
    config
}

fn apply_session_defaults(mut config: DeskflowConfig) -> DeskflowConfig {
    let session = config.session.get_or_insert_with(SessionConfig::default);
    if session.courtesy_window_secs.is_none() {
        session.courtesy_window_secs = Some(DEFAULT_COURTESY_WINDOW_SECS);
    }
    if session.history_limit.is_none() {
        session.history_limit = Some(DEFAULT_HISTORY_LIMIT);
    }
    config
}

/// Fill in the published catalogue when no plans are configured.
fn apply_sales_defaults(mut config: DeskflowConfig) -> DeskflowConfig {
    let sales = config.sales.get_or_insert_with(SalesConfig::default);
    if sales.plans.is_empty() {
        sales.plans = default_plans();
        if sales.default_plan.is_none() {
            sales.default_plan = Some(DEFAULT_PLAN.to_string());
        }
    }
    config
}

fn apply_dispatch_defaults(mut config: DeskflowConfig) -> DeskflowConfig {
    let dispatch = config.dispatch.get_or_insert_with(DispatchConfig::default);
    if dispatch.flow_order.is_empty() {
        dispatch.flow_order = DEFAULT_FLOW_ORDER.iter().map(|s| s.to_string()).collect();
    }
    config
}

fn apply_channel_defaults(mut config: DeskflowConfig) -> DeskflowConfig {
    let channel = config.channel.get_or_insert_with(ChannelConfig::default);
    if channel.payment_points.is_empty() {
        channel.payment_points = default_payment_points();
        if channel.payment_notice.is_none() {
            channel.payment_notice =
                Some("Reconexión de $7.000 después del día 15 de cada mes.".to_string());
        }
    }
    config
}

/// Packs are listed first so "pack premium 100 mbps" matches the pack.
pub fn default_plans() -> Vec<PlanConfig> {
    vec![
        PlanConfig::new("Pack Básico", 60_000, &["pack básico", "pack basico"]),
        PlanConfig::new("Pack Estándar", 70_000, &["pack estándar", "pack estandar"]),
        PlanConfig::new("Pack Premium", 100_000, &["pack premium"]),
        PlanConfig::new("Plan TV HD", 40_000, &["tv hd", "televisión", "television"]),
        PlanConfig::new("Internet 30 Mbps", 40_000, &["30 mbps", "30mb", "30 megas"]),
        PlanConfig::new("Internet 50 Mbps", 50_000, &["50 mbps", "50mb", "50 megas"]),
        PlanConfig::new("Internet 60 Mbps", 60_000, &["60 mbps", "60mb", "60 megas"]),
        PlanConfig::new("Internet 70 Mbps", 68_000, &["70 mbps", "70mb", "70 megas"]),
        PlanConfig::new("Internet 80 Mbps", 75_000, &["80 mbps", "80mb", "80 megas"]),
        PlanConfig::new("Internet 100 Mbps", 80_000, &["100 mbps", "100mb", "100 megas"]),
    ]
}

pub fn default_payment_points() -> Vec<PaymentPointConfig> {
    vec![
        PaymentPointConfig {
            name: "Corresponsal Bancolombia o App".into(),
            details: "Convenio 94375 + tu código de usuario".into(),
            hours: None,
        },
        PaymentPointConfig {
            name: "Bancolombia Ahorros".into(),
            details: "Cuenta 26100006596, NIT 901707684".into(),
            hours: None,
        },
        PaymentPointConfig {
            name: "Nequi".into(),
            details: "Número 3242156679".into(),
            hours: None,
        },
        PaymentPointConfig {
            name: "Davivienda Ahorros".into(),
            details: "Cuenta 0488403242917".into(),
            hours: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_section() {
        let cfg = apply_all_defaults(DeskflowConfig::default());
        assert_eq!(cfg.logging.as_ref().unwrap().level.as_deref(), Some("info"));
        assert_eq!(cfg.courtesy_window_secs(), DEFAULT_COURTESY_WINDOW_SECS);
        assert_eq!(cfg.plans().len(), 10);
        assert_eq!(cfg.default_plan().unwrap().name, DEFAULT_PLAN);
        assert_eq!(cfg.flow_order(), DEFAULT_FLOW_ORDER);
        assert_eq!(cfg.payment_points().len(), 4);
    }

    #[test]
    fn does_not_override_user_values() {
        let mut cfg = DeskflowConfig::default();
        cfg.session = Some(SessionConfig {
            courtesy_window_secs: Some(30),
            history_limit: None,
        });
        cfg.sales = Some(SalesConfig {
            plans: vec![PlanConfig::new("Fibra 200", 95_000, &[])],
            default_plan: None,
        });
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.courtesy_window_secs(), 30);
        assert_eq!(cfg.history_limit(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(cfg.plans().len(), 1);
        assert_eq!(cfg.default_plan().unwrap().name, "Fibra 200");
    }
}
