mod health;
mod metrics;
mod reports;
mod server;
mod state;

pub use health::{healthz, ready};
pub use metrics::metrics;
pub use reports::{reports, ReportsQuery};
pub use server::{router, serve};
pub use state::AgentState;
