use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity of the sender as seen by the router.
///
/// Resolved by the authentication layer before dispatch and never mutated
/// during a dispatch pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub phone_number: String,
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Billing-side service id, needed for connectivity probes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl User {
    /// An unauthenticated sender known only by phone number.
    pub fn anonymous(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            authenticated: false,
            customer_id: None,
            service_id: None,
            display_name: None,
        }
    }

    /// An authenticated customer with linked records.
    pub fn customer(
        phone_number: impl Into<String>,
        customer_id: impl Into<String>,
        service_id: impl Into<String>,
    ) -> Self {
        Self {
            phone_number: phone_number.into(),
            authenticated: true,
            customer_id: Some(customer_id.into()),
            service_id: Some(service_id.into()),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// First name for greetings, falling back to a neutral salutation.
    pub fn first_name(&self) -> &str {
        self.display_name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
            .unwrap_or("cliente")
    }
}

/// Service status as reported by the billing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    #[default]
    Active,
    Suspended,
    Inactive,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Active => write!(f, "activo"),
            ServiceStatus::Suspended => write!(f, "suspendido"),
            ServiceStatus::Inactive => write!(f, "inactivo"),
        }
    }
}

/// Customer record returned by the CRM / billing collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: ServiceStatus,
    /// Outstanding balance in whole pesos.
    #[serde(default)]
    pub balance: u64,
    #[serde(default)]
    pub pending_invoices: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<NaiveDate>,
}

impl CustomerInfo {
    pub fn is_active(&self) -> bool {
        self.status == ServiceStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_user_is_not_authenticated() {
        let user = User::anonymous("573001112233");
        assert!(!user.authenticated);
        assert!(user.customer_id.is_none());
    }

    #[test]
    fn first_name_falls_back() {
        let user = User::customer("573001112233", "c-1", "s-1");
        assert_eq!(user.first_name(), "cliente");
        let user = user.with_display_name("Laura Gómez");
        assert_eq!(user.first_name(), "Laura");
    }

    #[test]
    fn customer_deserializes_with_defaults() {
        let json = r#"{"id":"c-9","name":"Ana"}"#;
        let customer: CustomerInfo = serde_json::from_str(json).unwrap();
        assert!(customer.is_active());
        assert_eq!(customer.balance, 0);
        assert!(customer.next_due_date.is_none());
    }
}
