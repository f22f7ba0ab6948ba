pub mod catalog;
pub mod installer;

pub use installer::SkillInstaller;
