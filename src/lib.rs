pub mod app;
pub mod config;
pub mod errors;
pub mod logging;
pub mod notifier;
pub mod state;
pub mod transport;
pub mod types;
pub mod ui;
