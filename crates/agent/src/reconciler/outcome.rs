use serde::Serialize;

/// What an evaluation did to its tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Healthy and nothing was active: no store write, no sink call.
    Unchanged,
    Raised,
    Refreshed,
    /// Active report switched between Warning and Error.
    Escalated,
    Cleared,
    /// A newer pass already wrote this tuple.
    Stale,
    /// The source was stopped; late passes write nothing.
    SourceClosed,
}
