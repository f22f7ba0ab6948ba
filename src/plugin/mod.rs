pub mod installer;
pub mod license;
pub mod registry;
pub mod versions;

pub use installer::{PluginInstallOutcome, PluginInstaller};
