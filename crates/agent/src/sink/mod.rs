mod channel;
mod memory;
mod queue;
mod retry;
mod tracing_sink;

pub use channel::{ReportSink, SinkError};
pub use memory::MemorySink;
pub use queue::QueueSink;
pub use retry::RetrySink;
pub use tracing_sink::TracingSink;
