use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::model::skill::MARKER_FILE;

const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config")]
    Parse(#[from] toml::de::Error),
    #[error("cannot determine home directory")]
    NoHome,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub remote: RemoteConfig,
    pub http: HttpConfig,
    pub setup: SetupConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub skills_dir: PathBuf,
    pub plugin_cache_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    pub skill_file_url: String,
    pub skill_listing_url: String,
    pub license_url: String,
    pub plugin_download_url: String,
    pub plugin_versions_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetupConfig {
    pub runtime_package: String,
    #[serde(default)]
    pub recommended_skills: Vec<String>,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self, ConfigError> {
        let user_path = directories::ProjectDirs::from("", "", "skunk")
            .map(|dirs| dirs.config_dir().join("config.toml"));
        let home = dirs_home().ok_or(ConfigError::NoHome)?;
        Self::load_from(user_path.as_deref(), &home)
    }

    /// Same as [`AppConfig::load`] with an explicit user file and home directory.
    pub fn load_from(user_path: Option<&Path>, home: &Path) -> Result<Self, ConfigError> {
        let mut merged: toml::Table = toml::from_str(DEFAULT_CONFIG)?;

        if let Some(path) = user_path.filter(|p| p.exists()) {
            let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let overrides: toml::Table = toml::from_str(&raw)?;
            merge_tables(&mut merged, overrides);
            tracing::debug!("merged user config from {}", path.display());
        }

        let mut config: AppConfig = toml::Value::Table(merged).try_into()?;
        config.paths.skills_dir = expand_tilde(&config.paths.skills_dir, home);
        config.paths.plugin_cache_dir = expand_tilde(&config.paths.plugin_cache_dir, home);
        Ok(config)
    }

    pub fn skills_dir(&self) -> &Path {
        &self.paths.skills_dir
    }

    pub fn plugin_cache_dir(&self) -> &Path {
        &self.paths.plugin_cache_dir
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.http.probe_timeout_secs)
    }

    /// Every remote endpoint with a short label, for reachability checks.
    pub fn endpoints(&self) -> Vec<(&'static str, String)> {
        let mut endpoints = Vec::new();
        if let Some(skill) = self.setup.recommended_skills.first() {
            endpoints.push(("skill files", self.skill_file_url(skill, MARKER_FILE)));
        }
        endpoints.extend([
            ("skill listing", self.remote.skill_listing_url.clone()),
            ("license server", self.remote.license_url.clone()),
            ("plugin downloads", self.remote.plugin_download_url.clone()),
            ("plugin versions", self.remote.plugin_versions_url.clone()),
        ]);
        endpoints
    }

    pub fn skill_file_url(&self, name: &str, file: &str) -> String {
        self.remote
            .skill_file_url
            .replace("{name}", name)
            .replace("{file}", file)
    }
}

/// Overlay `overrides` onto `base`, recursing into nested tables.
fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn expand_tilde(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
