pub mod app;
pub mod cli;
pub mod doctor;
pub mod model;
pub mod net;
pub mod plugin;
pub mod skill;
pub mod tools;
pub mod ui;
pub mod wizard;

#[cfg(test)]
mod testing;

pub use app::{App, ExitOutcome, startup_failure};
pub use model::config::AppConfig;
