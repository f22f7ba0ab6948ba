use std::fs;
use std::path::PathBuf;

use reqwest::Url;
use thiserror::Error;

use crate::model::config::AppConfig;
use crate::net::{FetchError, Fetcher, get_with_single_redirect};
use crate::plugin::license::{self, LicenseStatus};
use crate::plugin::registry::{self, Edition, PluginEntry, PluginRequest};
use crate::tools::{Tool, ToolRunner};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid download url {0}")]
    Url(String),
}

#[derive(Debug)]
pub enum PluginInstallOutcome {
    Installed {
        label: String,
        slug: &'static str,
        via: Tool,
    },
    MissingName,
    UnknownPlugin {
        name: String,
        known: Vec<&'static str>,
        suggestion: Option<&'static str>,
    },
    MissingTools,
    LicenseRequired {
        label: String,
    },
    LicenseRejected {
        label: String,
        status: LicenseStatus,
    },
    DownloadFailed(DownloadError),
    InstallFailed {
        via: Tool,
        detail: String,
    },
}

pub struct PluginInstaller<'a> {
    config: &'a AppConfig,
    fetcher: &'a dyn Fetcher,
    tools: &'a dyn ToolRunner,
}

impl<'a> PluginInstaller<'a> {
    pub fn new(config: &'a AppConfig, fetcher: &'a dyn Fetcher, tools: &'a dyn ToolRunner) -> Self {
        Self {
            config,
            fetcher,
            tools,
        }
    }

    /// Resolve `raw_name` (`forms`, `forms-pro`, ...) and install it with
    /// WP-CLI, or through a cached archive with WordPress Studio.
    pub fn install(&self, raw_name: &str, license_key: Option<&str>) -> PluginInstallOutcome {
        let request = PluginRequest::parse(raw_name);
        if request.base.is_empty() {
            return PluginInstallOutcome::MissingName;
        }

        let Some(entry) = registry::lookup(&request.base) else {
            tracing::info!("unknown plugin requested: {raw_name}");
            return PluginInstallOutcome::UnknownPlugin {
                name: raw_name.trim().to_string(),
                known: registry::known_names(),
                suggestion: registry::suggest(&request.base),
            };
        };

        let Some(via) = self.installer_tool() else {
            return PluginInstallOutcome::MissingTools;
        };

        let label = entry.label(request.edition);
        let license_key = license_key.map(str::trim).filter(|key| !key.is_empty());
        if request.edition == Edition::Pro {
            let Some(key) = license_key else {
                return PluginInstallOutcome::LicenseRequired { label };
            };
            let status = license::validate(self.config, self.fetcher, key, entry.pro_slug);
            if !status.valid {
                return PluginInstallOutcome::LicenseRejected { label, status };
            }
        }

        let slug = entry.slug(request.edition);
        let url = match download_url(self.config, slug, license_key) {
            Ok(url) => url,
            Err(err) => return PluginInstallOutcome::DownloadFailed(err),
        };

        tracing::info!("installing {slug} via {}", via.binary());
        let source = match via {
            Tool::WpCli => url,
            _ => match self.download(entry, request.edition, &url) {
                Ok(path) => path.display().to_string(),
                Err(err) => return PluginInstallOutcome::DownloadFailed(err),
            },
        };

        let mut args: Vec<String> = Vec::new();
        if via == Tool::Studio {
            args.push("wp".to_string());
        }
        args.extend(["plugin", "install"].map(String::from));
        args.push(source);
        args.push("--activate".to_string());

        match self.tools.run(via, &args) {
            Ok(output) if output.success => PluginInstallOutcome::Installed { label, slug, via },
            Ok(output) => PluginInstallOutcome::InstallFailed {
                via,
                detail: last_line(&output.stderr)
                    .or_else(|| last_line(&output.stdout))
                    .unwrap_or_else(|| "exited with an error".to_string()),
            },
            Err(err) => PluginInstallOutcome::InstallFailed {
                via,
                detail: err.to_string(),
            },
        }
    }

    /// Download the archive for `entry` into the plugin cache.
    pub fn download(&self, entry: &PluginEntry, edition: Edition, url: &str) -> Result<PathBuf, DownloadError> {
        let response = get_with_single_redirect(self.fetcher, url)?;

        let dir = self.config.plugin_cache_dir();
        let path = dir.join(format!("{}.zip", entry.slug(edition)));
        fs::create_dir_all(dir)
            .and_then(|()| fs::write(&path, &response.body))
            .map_err(|source| DownloadError::Write {
                path: path.clone(),
                source,
            })?;

        tracing::info!("cached {} bytes at {}", response.body.len(), path.display());
        Ok(path)
    }

    fn installer_tool(&self) -> Option<Tool> {
        [Tool::WpCli, Tool::Studio]
            .into_iter()
            .find(|tool| self.tools.is_available(*tool))
    }
}

pub fn download_url(config: &AppConfig, slug: &str, license_key: Option<&str>) -> Result<String, DownloadError> {
    let base = &config.remote.plugin_download_url;
    let mut params = vec![("plugin", slug)];
    if let Some(key) = license_key {
        params.push(("license", key));
    }
    Url::parse_with_params(base, &params)
        .map(String::from)
        .map_err(|_| DownloadError::Url(base.clone()))
}

fn last_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::HttpResponse;
    use crate::testing::{FakeFetcher, FakeTools};
    use tempfile::{TempDir, tempdir};

    const VALID_LICENSE: &str =
        r#"{"success": true, "data": {"valid": true, "max_sites": 3, "activations": 1}}"#;

    fn config() -> (TempDir, AppConfig) {
        let home = tempdir().unwrap();
        let config = AppConfig::load_from(None, home.path()).unwrap();
        (home, config)
    }

    #[test]
    fn unknown_plugin_lists_registry_without_running_tools() {
        let (_home, config) = config();
        let fetcher = FakeFetcher::default();
        let tools = FakeTools::default().with(Tool::WpCli);

        let outcome = PluginInstaller::new(&config, &fetcher, &tools).install("froms", None);
        let PluginInstallOutcome::UnknownPlugin { known, .. } = outcome else {
            panic!("expected unknown plugin, got {outcome:?}");
        };
        assert_eq!(known, vec!["crm", "forms", "pages"]);
        assert!(tools.calls.borrow().is_empty());
        assert!(fetcher.gets.borrow().is_empty());
    }

    #[test]
    fn pro_without_license_downloads_nothing() {
        let (_home, config) = config();
        let fetcher = FakeFetcher::default();
        let tools = FakeTools::default().with(Tool::Studio);

        let outcome = PluginInstaller::new(&config, &fetcher, &tools).install("crm-pro", None);
        assert!(matches!(outcome, PluginInstallOutcome::LicenseRequired { .. }));
        assert!(fetcher.gets.borrow().is_empty());
        assert!(fetcher.posts.borrow().is_empty());
        assert!(tools.calls.borrow().is_empty());
    }

    #[test]
    fn no_installer_tool_aborts() {
        let (_home, config) = config();
        let fetcher = FakeFetcher::default();
        let tools = FakeTools::default();
        let outcome = PluginInstaller::new(&config, &fetcher, &tools).install("forms", None);
        assert!(matches!(outcome, PluginInstallOutcome::MissingTools));
    }

    #[test]
    fn wp_cli_installs_straight_from_url() {
        let (_home, config) = config();
        let fetcher = FakeFetcher::default();
        let tools = FakeTools::default().with(Tool::WpCli).with(Tool::Studio);

        let outcome = PluginInstaller::new(&config, &fetcher, &tools).install("forms", None);
        assert!(matches!(
            outcome,
            PluginInstallOutcome::Installed {
                slug: "skunkforms",
                via: Tool::WpCli,
                ..
            }
        ));
        let calls = tools.calls_to(Tool::WpCli);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][..2], ["plugin", "install"]);
        assert!(calls[0][2].ends_with("?plugin=skunkforms"));
        assert_eq!(calls[0][3], "--activate");
        assert!(fetcher.gets.borrow().is_empty());
    }

    #[test]
    fn pro_license_is_validated_and_embedded() {
        let (_home, config) = config();
        let fetcher = FakeFetcher::default()
            .route(config.remote.license_url.clone(), HttpResponse::ok(VALID_LICENSE));
        let tools = FakeTools::default().with(Tool::WpCli);

        let outcome =
            PluginInstaller::new(&config, &fetcher, &tools).install("pages-pro", Some("AB C&1"));
        assert!(matches!(outcome, PluginInstallOutcome::Installed { slug: "skunkpages-pro", .. }));
        let url = &tools.calls_to(Tool::WpCli)[0][2];
        assert!(url.contains("plugin=skunkpages-pro"));
        assert!(url.contains("license=AB+C%261"));
    }

    #[test]
    fn rejected_license_stops_install() {
        let (_home, config) = config();
        let fetcher = FakeFetcher::default().route(
            config.remote.license_url.clone(),
            HttpResponse::ok(r#"{"success": false, "message": "Expired", "data": {"valid": false}}"#),
        );
        let tools = FakeTools::default().with(Tool::WpCli);

        let outcome = PluginInstaller::new(&config, &fetcher, &tools).install("crm-pro", Some("K"));
        let PluginInstallOutcome::LicenseRejected { status, .. } = outcome else {
            panic!("expected rejection, got {outcome:?}");
        };
        assert_eq!(status.error.as_deref(), Some("Expired"));
        assert!(tools.calls.borrow().is_empty());
    }

    #[test]
    fn studio_downloads_archive_following_one_redirect() {
        let (_home, config) = config();
        let url = download_url(&config, "skunkcrm", None).unwrap();
        let fetcher = FakeFetcher::default()
            .route(url, HttpResponse::redirect(302, "https://cdn.test/skunkcrm-1.4.zip"))
            .route("https://cdn.test/skunkcrm-1.4.zip", HttpResponse::ok("PK\u{3}\u{4}"));
        let tools = FakeTools::default().with(Tool::Studio);

        let outcome = PluginInstaller::new(&config, &fetcher, &tools).install("crm", None);
        assert!(matches!(outcome, PluginInstallOutcome::Installed { via: Tool::Studio, .. }));

        let cached = config.plugin_cache_dir().join("skunkcrm.zip");
        assert_eq!(fs::read(&cached).unwrap(), b"PK\x03\x04");
        let calls = tools.calls_to(Tool::Studio);
        assert_eq!(calls[0][..3], ["wp", "plugin", "install"]);
        assert_eq!(calls[0][3], cached.display().to_string());
    }

    #[test]
    fn studio_refuses_redirect_chain() {
        let (_home, config) = config();
        let url = download_url(&config, "skunkcrm", None).unwrap();
        let fetcher = FakeFetcher::default()
            .route(url, HttpResponse::redirect(302, "https://cdn.test/a"))
            .route("https://cdn.test/a", HttpResponse::redirect(301, "https://cdn.test/b"))
            .route("https://cdn.test/b", HttpResponse::ok("zip"));
        let tools = FakeTools::default().with(Tool::Studio);

        let outcome = PluginInstaller::new(&config, &fetcher, &tools).install("crm", None);
        assert!(matches!(
            outcome,
            PluginInstallOutcome::DownloadFailed(DownloadError::Fetch(FetchError::TooManyRedirects { .. }))
        ));
        assert!(!config.plugin_cache_dir().join("skunkcrm.zip").exists());
        assert!(tools.calls.borrow().is_empty());
    }

    #[test]
    fn failing_tool_reports_its_last_error_line() {
        let (_home, config) = config();
        let fetcher = FakeFetcher::default();
        let tools = FakeTools::default().output(Tool::WpCli, false, "Warning: x\nError: This does not seem to be a WordPress installation.\n");

        let outcome = PluginInstaller::new(&config, &fetcher, &tools).install("crm", None);
        let PluginInstallOutcome::InstallFailed { detail, .. } = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert!(detail.starts_with("Error: This does not seem"));
    }
}
