// Read-only environment checks behind `status` and `doctor`.

use std::path::PathBuf;

use crate::model::config::AppConfig;
use crate::net::Fetcher;
use crate::tools::{Tool, ToolRunner, version_of};

#[derive(Debug, Clone)]
pub struct ToolCheck {
    pub tool: Tool,
    pub present: bool,
    pub version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DirCheck {
    pub label: &'static str,
    pub path: PathBuf,
    pub exists: bool,
}

#[derive(Debug, Clone)]
pub struct EndpointCheck {
    pub label: &'static str,
    pub url: String,
    pub result: Result<u16, String>,
}

impl EndpointCheck {
    /// Any answer below 500 means the host is up, even a 404 for the probe path.
    pub fn reachable(&self) -> bool {
        matches!(self.result, Ok(status) if status < 500)
    }
}

pub fn check_tools(tools: &dyn ToolRunner) -> Vec<ToolCheck> {
    Tool::ALL
        .into_iter()
        .map(|tool| {
            let present = tools.is_available(tool);
            ToolCheck {
                tool,
                present,
                version: present.then(|| version_of(tools, tool)).flatten(),
            }
        })
        .collect()
}

pub fn check_dirs(config: &AppConfig) -> Vec<DirCheck> {
    [
        ("skills", config.skills_dir()),
        ("plugin cache", config.plugin_cache_dir()),
    ]
    .into_iter()
    .map(|(label, path)| DirCheck {
        label,
        path: path.to_path_buf(),
        exists: path.is_dir(),
    })
    .collect()
}

/// Probe each configured endpoint once, each bounded by the probe timeout.
pub fn check_endpoints(config: &AppConfig, fetcher: &dyn Fetcher) -> Vec<EndpointCheck> {
    let timeout = config.probe_timeout();
    config
        .endpoints()
        .into_iter()
        .map(|(label, url)| {
            let result = fetcher.probe(&url, timeout).map_err(|err| err.to_string());
            tracing::debug!("probe {url}: {result:?}");
            EndpointCheck { label, url, result }
        })
        .collect()
}
