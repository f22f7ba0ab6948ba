use anyhow::Result;

use crate::cli::{self, Command, InstallTarget, RemoveTarget};
use crate::doctor;
use crate::model::config::AppConfig;
use crate::net::Fetcher;
use crate::plugin::license;
use crate::plugin::registry::REGISTRY;
use crate::plugin::versions;
use crate::plugin::{PluginInstallOutcome, PluginInstaller};
use crate::skill::SkillInstaller;
use crate::skill::catalog;
use crate::skill::installer::{InstallOutcome, RemoveOutcome};
use crate::tools::{Tool, ToolRunner};
use crate::ui;
use crate::wizard::{self, Prompter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    Failure,
}

impl ExitOutcome {
    pub fn code(self) -> u8 {
        match self {
            ExitOutcome::Success => 0,
            ExitOutcome::Failure => 1,
        }
    }
}

/// Report an error raised before a command could run. Only `setup` turns it
/// into a failing exit.
pub fn startup_failure(command: &Command, err: &anyhow::Error) -> ExitOutcome {
    tracing::error!("cannot run {command:?}: {err:#}");
    ui::error(&format!("{err:#}"));
    if *command == Command::Setup {
        ExitOutcome::Failure
    } else {
        ExitOutcome::Success
    }
}

pub struct App {
    pub config: AppConfig,
    pub(crate) fetcher: Box<dyn Fetcher>,
    pub(crate) tools: Box<dyn ToolRunner>,
    pub(crate) prompter: Box<dyn Prompter>,
}

impl App {
    pub fn new(
        config: AppConfig,
        fetcher: Box<dyn Fetcher>,
        tools: Box<dyn ToolRunner>,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            config,
            fetcher,
            tools,
            prompter,
        }
    }

    /// Run one command. Only `setup` can fail the process; every other
    /// handler reports its problems and exits cleanly.
    pub fn run(&mut self, command: Command) -> ExitOutcome {
        tracing::info!("command: {command:?}");

        if command == Command::Setup {
            return match wizard::run(self) {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!("setup failed: {err:#}");
                    ui::error(&format!("Setup failed: {err:#}"));
                    ExitOutcome::Failure
                }
            };
        }

        if let Err(err) = self.dispatch(command) {
            tracing::error!("{err:#}");
            ui::error(&format!("{err:#}"));
        }
        ExitOutcome::Success
    }

    fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Install {
                target: InstallTarget::Skill { name },
            } => {
                self.install_skill(name.as_deref().unwrap_or_default())?;
            }
            Command::Install {
                target: InstallTarget::Plugin { name, license },
            } => {
                self.install_plugin(name.as_deref().unwrap_or_default(), license.as_deref());
            }
            Command::Remove {
                target: RemoveTarget::Skill { name },
            } => self.remove_skill(name.as_deref().unwrap_or_default())?,
            Command::List => self.list_skills()?,
            Command::Available => self.available_skills()?,
            Command::Plugins => self.list_plugins(),
            Command::Status => self.status()?,
            Command::Update => self.update_skills()?,
            Command::Doctor => self.doctor(),
            Command::License { key, product } => self.check_license(&key, &product),
            Command::Help | Command::Setup => print!("{}", cli::usage()),
        }
        Ok(())
    }

    pub(crate) fn install_skill(&self, name: &str) -> Result<bool> {
        let installer = SkillInstaller::new(&self.config, self.fetcher.as_ref());
        let installed = match installer.install(name)? {
            InstallOutcome::Installed { path, files } => {
                ui::success(&format!("Installed skill {name} ({})", files.join(", ")));
                ui::hint(&path.display().to_string());
                true
            }
            InstallOutcome::AlreadyInstalled { path } => {
                ui::warn(&format!("Skill {name} is already installed at {}", path.display()));
                ui::hint(&format!("Run `skunk remove skill {name}` first to reinstall it."));
                false
            }
            InstallOutcome::MissingName => {
                ui::error_with_fix("No skill name given", "skunk install skill <name>");
                false
            }
            InstallOutcome::InvalidName(raw) => {
                ui::error(&format!("'{raw}' is not a valid skill name"));
                false
            }
            InstallOutcome::NotFound { name, reason } => {
                ui::error_with_fix(
                    &format!("Skill {name} could not be installed: {reason}"),
                    "Run `skunk available` to see published skills.",
                );
                false
            }
        };
        Ok(installed)
    }

    pub(crate) fn install_plugin(&self, name: &str, license_key: Option<&str>) -> bool {
        let installer = PluginInstaller::new(&self.config, self.fetcher.as_ref(), self.tools.as_ref());
        match installer.install(name, license_key) {
            PluginInstallOutcome::Installed { label, slug, via } => {
                ui::success(&format!("{label} installed and activated ({slug}, via {})", via.label()));
                true
            }
            PluginInstallOutcome::MissingName => {
                ui::error_with_fix("No plugin name given", "skunk install plugin <name>");
                false
            }
            PluginInstallOutcome::UnknownPlugin {
                name,
                known,
                suggestion,
            } => {
                ui::error(&format!("Unknown plugin: {name}"));
                if let Some(suggestion) = suggestion {
                    ui::hint(&format!("Did you mean `{suggestion}`?"));
                }
                ui::hint(&format!("Known plugins: {}", known.join(", ")));
                false
            }
            PluginInstallOutcome::MissingTools => {
                ui::error("Neither WP-CLI nor WordPress Studio was found.");
                for tool in [Tool::WpCli, Tool::Studio] {
                    ui::hint(&format!("{}: {}", tool.label(), tool.install_hint()));
                }
                false
            }
            PluginInstallOutcome::LicenseRequired { label } => {
                ui::error_with_fix(
                    &format!("{label} needs a license key"),
                    &format!("skunk install plugin {} --license=YOUR-KEY", name.trim()),
                );
                false
            }
            PluginInstallOutcome::LicenseRejected { label, status } => {
                ui::error(&format!(
                    "License rejected for {label}: {}",
                    status.error.unwrap_or_default()
                ));
                false
            }
            PluginInstallOutcome::DownloadFailed(err) => {
                ui::error(&format!("Download failed: {err}"));
                false
            }
            PluginInstallOutcome::InstallFailed { via, detail } => {
                ui::error(&format!("{} could not install the plugin: {detail}", via.label()));
                false
            }
        }
    }

    fn remove_skill(&self, name: &str) -> Result<()> {
        let installer = SkillInstaller::new(&self.config, self.fetcher.as_ref());
        match installer.remove(name)? {
            RemoveOutcome::Removed { path } => {
                ui::success(&format!("Removed skill {name}"));
                ui::hint(&path.display().to_string());
            }
            RemoveOutcome::NotInstalled { name } => ui::warn(&format!("Skill {name} is not installed")),
            RemoveOutcome::MissingName => {
                ui::error_with_fix("No skill name given", "skunk remove skill <name>");
            }
            RemoveOutcome::InvalidName(raw) => ui::error(&format!("'{raw}' is not a valid skill name")),
        }
        Ok(())
    }

    fn list_skills(&self) -> Result<()> {
        let installer = SkillInstaller::new(&self.config, self.fetcher.as_ref());
        let skills = installer.installed()?;
        ui::heading(&format!("Installed skills ({})", self.config.skills_dir().display()));
        if skills.is_empty() {
            ui::info("No skills installed. Try `skunk available`.");
        }
        for skill in skills {
            let description = skill.description.unwrap_or_default();
            if skill.complete {
                println!("  {} {:<24} {description}", ui::check_mark(true), skill.name);
            } else {
                println!("  {} {:<24} missing SKILL.md", ui::check_mark(false), skill.name);
            }
        }
        Ok(())
    }

    fn available_skills(&self) -> Result<()> {
        let names = catalog::available_skills(&self.config, self.fetcher.as_ref())?;
        let installer = SkillInstaller::new(&self.config, self.fetcher.as_ref());
        let installed: Vec<String> = installer.installed()?.into_iter().map(|s| s.name).collect();

        ui::heading("Available skills");
        for name in &names {
            let marker = if installed.contains(name) { " (installed)" } else { "" };
            println!("  {name}{marker}");
        }
        ui::hint("Install one with `skunk install skill <name>`.");
        Ok(())
    }

    fn list_plugins(&self) {
        ui::heading("Skunk plugins");
        for entry in REGISTRY {
            println!(
                "  {:<8} {:<12} free: {:<12} pro: {}",
                entry.name, entry.display_name, entry.free_slug, entry.pro_slug
            );
        }
        ui::hint("Install with `skunk install plugin <name>` or `<name>-pro --license=KEY`.");
    }

    fn status(&self) -> Result<()> {
        ui::heading("Tools");
        for check in doctor::check_tools(self.tools.as_ref()) {
            println!(
                "  {} {:<18} {}",
                ui::check_mark(check.present),
                check.tool.label(),
                check.version.unwrap_or_default()
            );
        }

        self.list_skills()?;

        ui::heading("Plugins");
        match versions::latest_versions(&self.config, self.fetcher.as_ref()) {
            Ok(latest) => {
                let installed = versions::installed_versions(self.tools.as_ref());
                let rows = versions::version_rows(&latest, installed.as_ref());
                for line in versions::render_table(&rows, installed.is_some()).lines() {
                    println!("  {line}");
                }
            }
            Err(err) => ui::warn(&format!("Could not fetch plugin versions: {err}")),
        }
        Ok(())
    }

    fn update_skills(&self) -> Result<()> {
        let installer = SkillInstaller::new(&self.config, self.fetcher.as_ref());
        let results = installer.update_all()?;
        if results.is_empty() {
            ui::info("No skills installed.");
            return Ok(());
        }

        let mut failed = 0;
        for result in &results {
            match &result.error {
                None => ui::success(&format!("{} ({})", result.name, result.refreshed.join(", "))),
                Some(err) => {
                    failed += 1;
                    ui::warn(&format!("{}: {err}", result.name));
                }
            }
        }
        ui::info(&format!("{} updated, {failed} failed", results.len() - failed));
        Ok(())
    }

    fn doctor(&self) {
        ui::heading("Tools");
        for check in doctor::check_tools(self.tools.as_ref()) {
            if check.present {
                println!("  {} {}", ui::check_mark(true), check.tool.label());
            } else {
                println!(
                    "  {} {:<18} {}",
                    ui::check_mark(false),
                    check.tool.label(),
                    check.tool.install_hint()
                );
            }
        }

        ui::heading("Directories");
        for dir in doctor::check_dirs(&self.config) {
            println!("  {} {:<14} {}", ui::check_mark(dir.exists), dir.label, dir.path.display());
        }

        ui::heading("Endpoints");
        for endpoint in doctor::check_endpoints(&self.config, self.fetcher.as_ref()) {
            let detail = match &endpoint.result {
                Ok(status) => format!("HTTP {status}"),
                Err(err) => err.clone(),
            };
            println!(
                "  {} {:<16} {detail}",
                ui::check_mark(endpoint.reachable()),
                endpoint.label
            );
            ui::hint(&endpoint.url);
        }
    }

    fn check_license(&self, key: &str, product: &str) {
        let status = license::validate(&self.config, self.fetcher.as_ref(), key, product);
        if status.valid {
            let remaining = status
                .remaining_activations
                .map_or_else(|| "unlimited".to_string(), |n| n.to_string());
            ui::success(&format!("License is valid for {product} ({remaining} activations left)"));
        } else {
            ui::error(&format!(
                "License is not valid: {}",
                status.error.unwrap_or_default()
            ));
        }
    }
}
