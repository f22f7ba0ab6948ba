use std::collections::HashMap;

use serde::Deserialize;

use crate::model::config::AppConfig;
use crate::net::{FetchError, Fetcher};
use crate::plugin::registry::{Edition, REGISTRY};
use crate::tools::{Tool, ToolRunner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRow {
    pub label: String,
    pub slug: &'static str,
    pub latest: Option<String>,
    pub installed: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VersionValue {
    Plain(String),
    Detailed { version: String },
}

#[derive(Debug, Deserialize)]
struct WpPlugin {
    name: String,
    #[serde(default)]
    version: String,
}

/// Latest published version per slug.
pub fn latest_versions(
    config: &AppConfig,
    fetcher: &dyn Fetcher,
) -> Result<HashMap<String, String>, FetchError> {
    let url = &config.remote.plugin_versions_url;
    let response = fetcher.get(url)?;
    if !response.is_success() {
        return Err(FetchError::Status {
            url: url.clone(),
            status: response.status,
        });
    }

    let parsed: HashMap<String, VersionValue> =
        serde_json::from_slice(&response.body).map_err(|err| FetchError::Transport {
            url: url.clone(),
            message: format!("unexpected version listing: {err}"),
        })?;

    Ok(parsed
        .into_iter()
        .map(|(slug, value)| match value {
            VersionValue::Plain(version) | VersionValue::Detailed { version } => (slug, version),
        })
        .collect())
}

/// Installed plugin versions as reported by `wp plugin list --format=json`.
/// `None` when WP-CLI is absent or its output cannot be read.
pub fn installed_versions(tools: &dyn ToolRunner) -> Option<HashMap<String, String>> {
    if !tools.is_available(Tool::WpCli) {
        return None;
    }

    let args = ["plugin", "list", "--format=json", "--fields=name,version"].map(String::from);
    let output = match tools.run(Tool::WpCli, &args) {
        Ok(output) if output.success => output,
        Ok(output) => {
            tracing::warn!("wp plugin list failed: {}", output.stderr.trim());
            return None;
        }
        Err(err) => {
            tracing::warn!("{err}");
            return None;
        }
    };

    match serde_json::from_str::<Vec<WpPlugin>>(output.stdout.trim()) {
        Ok(plugins) => Some(
            plugins
                .into_iter()
                .map(|plugin| (plugin.name, plugin.version))
                .collect(),
        ),
        Err(err) => {
            tracing::warn!("unreadable wp plugin list output: {err}");
            None
        }
    }
}

pub fn version_rows(
    latest: &HashMap<String, String>,
    installed: Option<&HashMap<String, String>>,
) -> Vec<VersionRow> {
    REGISTRY
        .iter()
        .flat_map(|entry| {
            [Edition::Free, Edition::Pro].map(|edition| {
                let slug = entry.slug(edition);
                VersionRow {
                    label: entry.label(edition),
                    slug,
                    latest: latest.get(slug).cloned(),
                    installed: installed.and_then(|map| map.get(slug).cloned()),
                }
            })
        })
        .collect()
}

/// Plain-text table; the "Installed" column only appears when `with_installed`.
pub fn render_table(rows: &[VersionRow], with_installed: bool) -> String {
    let mut header = vec!["Plugin", "Slug", "Latest"];
    if with_installed {
        header.push("Installed");
    }

    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells = vec![
                row.label.clone(),
                row.slug.to_string(),
                row.latest.clone().unwrap_or_else(|| "-".to_string()),
            ];
            if with_installed {
                cells.push(row.installed.clone().unwrap_or_else(|| "-".to_string()));
            }
            cells
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|col| {
            body.iter()
                .map(|cells| cells[col].len())
                .chain(std::iter::once(header[col].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_line = |cells: &[&str]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_line(&header)];
    for cells in &body {
        let refs: Vec<&str> = cells.iter().map(String::as_str).collect();
        lines.push(format_line(&refs));
    }
    lines.join("\n")
}
