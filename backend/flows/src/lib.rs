pub mod dispatcher;
pub mod flow;
pub mod flows;
pub mod router;
pub mod settings;

use std::sync::Arc;

use deskflow_core::{Collaborators, DeskError};

pub use dispatcher::{DispatchOutcome, FlowDispatcher, FAREWELL_TEXT, GLOBAL_FLOW};
pub use flow::{Flow, FlowInput, FlowOutcome};
pub use flows::{
    AgentHandoverFlow, ClientMenuFlow, DebtInquiryFlow, InvoicesFlow, IpDiagnosticFlow,
    LogoutFlow, PasswordChangeFlow, PaymentPointsFlow, PaymentReceiptFlow, PlanUpgradeFlow,
    SalesFlow, TicketIntakeFlow,
};
pub use router::ConversationRouter;
pub use settings::FlowSettings;

/// Register every builtin flow, then apply the configured order.
pub fn build_default_dispatcher(
    collabs: &Collaborators,
    settings: &FlowSettings,
) -> Result<FlowDispatcher, DeskError> {
    let mut dispatcher = FlowDispatcher::new(collabs.sender.clone())
        .with_courtesy_window(settings.courtesy_window);

    dispatcher.register(Arc::new(ClientMenuFlow::new(collabs)));
    dispatcher.register(Arc::new(SalesFlow::new(collabs, settings)));
    dispatcher.register(Arc::new(TicketIntakeFlow::new(collabs)));
    dispatcher.register(Arc::new(IpDiagnosticFlow::new(collabs)));
    dispatcher.register(Arc::new(DebtInquiryFlow::new(collabs)));
    dispatcher.register(Arc::new(PaymentPointsFlow::new(collabs, settings)));
    dispatcher.register(Arc::new(InvoicesFlow::new(collabs)));
    dispatcher.register(Arc::new(PasswordChangeFlow::new(collabs)));
    dispatcher.register(Arc::new(PlanUpgradeFlow::new(collabs, settings)));
    dispatcher.register(Arc::new(PaymentReceiptFlow::new(collabs)));
    dispatcher.register(Arc::new(AgentHandoverFlow::new(collabs)));
    dispatcher.register(Arc::new(LogoutFlow::new(collabs)));

    dispatcher.with_order(&settings.flow_order)
}
