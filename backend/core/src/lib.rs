pub mod error;
pub mod fakes;
pub mod session;
pub mod session_store;
pub mod traits;
pub mod user;

pub use error::DeskError;
pub use session::{
    ActiveFlow, ContractData, ContractStep, Contracting, HistoryEntry, SalesState, Session,
    TicketIntake, TicketStep, DEFAULT_HISTORY_LIMIT,
};
pub use session_store::SessionStore;
pub use traits::{
    AiProvider, Collaborators, ConnectivityProbe, CustomerDirectory, MessageSender, ProbeReport,
    TicketApi, TicketPriority, TicketRequest,
};
pub use user::{CustomerInfo, ServiceStatus, User};
