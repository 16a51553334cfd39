pub mod api;
pub mod cli;
pub mod config;
pub mod lifecycle;
pub mod monitor;
pub mod reconciler;
pub mod run;
pub mod scheduler;
pub mod shutdown;
pub mod sink;
pub mod store;
