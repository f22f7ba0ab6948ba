use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "skunk",
    version,
    about = "Install OpenClaw skills and Skunk WordPress plugins",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Interactive setup wizard
    Setup,
    /// Install a skill or a plugin
    Install {
        #[command(subcommand)]
        target: InstallTarget,
    },
    /// Remove an installed skill
    Remove {
        #[command(subcommand)]
        target: RemoveTarget,
    },
    /// List installed skills
    List,
    /// List skills published on the skill host
    Available,
    /// List Skunk WordPress plugins
    Plugins,
    /// Show tools, installed skills and plugin versions
    Status,
    /// Re-fetch every installed skill
    Update,
    /// Check tools, directories and remote endpoints
    Doctor,
    /// Validate a license key
    License {
        key: String,
        #[arg(long, default_value = "skunkcrm-pro")]
        product: String,
    },
    /// Show this help
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum InstallTarget {
    /// Install a skill into the OpenClaw skills directory
    Skill { name: Option<String> },
    /// Install a WordPress plugin (append -pro for the pro edition)
    Plugin {
        name: Option<String>,
        #[arg(long)]
        license: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum RemoveTarget {
    /// Delete an installed skill
    Skill { name: Option<String> },
}

#[derive(Debug)]
pub enum Invocation {
    Run(Command),
    /// `--help`/`--version` output clap already rendered.
    Print(clap::Error),
}

/// Parse arguments; anything unrecognised falls back to `help`.
pub fn parse_from<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Invocation::Run(cli.command.unwrap_or(Command::Help)),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            Invocation::Print(err)
        }
        Err(err) => {
            tracing::debug!("unrecognised arguments: {}", err.kind());
            Invocation::Run(Command::Help)
        }
    }
}

pub fn usage() -> String {
    Cli::command().render_help().to_string()
}
