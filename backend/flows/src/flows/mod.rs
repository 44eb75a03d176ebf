//! The conversation flows registered by default.

pub mod agent;
pub mod debt;
pub mod diagnostic;
pub mod invoices;
pub mod logout;
pub mod menu;
pub mod password;
pub mod payment_points;
pub mod payment_receipt;
pub mod plan_upgrade;
pub mod sales;
pub mod ticket;

pub use agent::AgentHandoverFlow;
pub use debt::DebtInquiryFlow;
pub use diagnostic::IpDiagnosticFlow;
pub use invoices::InvoicesFlow;
pub use logout::LogoutFlow;
pub use menu::ClientMenuFlow;
pub use password::PasswordChangeFlow;
pub use payment_points::PaymentPointsFlow;
pub use payment_receipt::PaymentReceiptFlow;
pub use plan_upgrade::PlanUpgradeFlow;
pub use sales::SalesFlow;
pub use ticket::TicketIntakeFlow;

use deskflow_core::{MessageSender, TicketPriority, TicketRequest};
use tracing::warn;

use crate::flow::FlowInput;

pub const CLIENT_MENU: &str = "clientMenu";
pub const SALES: &str = "sales";
pub const TICKET_INTAKE: &str = "ticketIntake";
pub const IP_DIAGNOSTIC: &str = "ipDiagnostic";
pub const DEBT_INQUIRY: &str = "debtInquiry";
pub const PAYMENT_POINTS: &str = "paymentPoints";
pub const INVOICES: &str = "invoices";
pub const PASSWORD_CHANGE: &str = "passwordChange";
pub const PLAN_UPGRADE: &str = "planUpgrade";
pub const PAYMENT_RECEIPT: &str = "paymentReceipt";
pub const AGENT_HANDOVER: &str = "agentHandover";
pub const LOGOUT: &str = "logout";

/// Send a reply, logging instead of failing. A lost reply must not change
/// how the message was routed.
pub(crate) async fn reply(sender: &dyn MessageSender, phone: &str, text: &str) -> bool {
    match sender.send_text(phone, text).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "[Flows] Reply could not be delivered");
            false
        }
    }
}

/// Ticket opened on behalf of whoever sent `input`.
pub(crate) fn ticket_for(
    input: &FlowInput,
    category: &str,
    subject: impl Into<String>,
    description: impl Into<String>,
    priority: TicketPriority,
) -> TicketRequest {
    TicketRequest {
        customer_id: input.user.customer_id.clone(),
        phone: input.phone().to_string(),
        category: category.to_string(),
        subject: subject.into(),
        description: description.into(),
        priority,
    }
}

/// `50000` -> `$50.000`
pub(crate) fn format_price(pesos: u64) -> String {
    let digits = pesos.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    format!("${out}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_use_dot_thousands() {
        assert_eq!(format_price(0), "$0");
        assert_eq!(format_price(950), "$950");
        assert_eq!(format_price(50_000), "$50.000");
        assert_eq!(format_price(1_250_000), "$1.250.000");
    }

    #[test]
    fn names_match_default_order() {
        assert_eq!(
            deskflow_config::DEFAULT_FLOW_ORDER,
            [
                CLIENT_MENU,
                SALES,
                TICKET_INTAKE,
                IP_DIAGNOSTIC,
                DEBT_INQUIRY,
                PAYMENT_POINTS,
                INVOICES,
                PASSWORD_CHANGE,
                PLAN_UPGRADE,
                PAYMENT_RECEIPT,
                AGENT_HANDOVER,
                LOGOUT,
            ]
        );
    }
}
