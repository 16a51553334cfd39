mod report_store;

pub use report_store::{ActiveReports, OwnedTuple, ReportStore, Transition};
