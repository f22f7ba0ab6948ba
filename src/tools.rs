// Third-party command-line tools that skunk shells out to.

use std::process::{Command, Stdio};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Node,
    Npm,
    OpenClaw,
    WpCli,
    Studio,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Node,
        Tool::Npm,
        Tool::OpenClaw,
        Tool::WpCli,
        Tool::Studio,
    ];

    pub fn binary(self) -> &'static str {
        match self {
            Tool::Node => "node",
            Tool::Npm => "npm",
            Tool::OpenClaw => "openclaw",
            Tool::WpCli => "wp",
            Tool::Studio => "studio",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tool::Node => "Node.js",
            Tool::Npm => "npm",
            Tool::OpenClaw => "OpenClaw",
            Tool::WpCli => "WP-CLI",
            Tool::Studio => "WordPress Studio",
        }
    }

    pub fn install_hint(self) -> &'static str {
        match self {
            Tool::Node | Tool::Npm => "https://nodejs.org/",
            Tool::OpenClaw => "npm install -g openclaw",
            Tool::WpCli => "https://wp-cli.org/#installing",
            Tool::Studio => "https://developer.wordpress.com/studio/",
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: &'static str,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

pub trait ToolRunner {
    fn is_available(&self, tool: Tool) -> bool;

    /// Run `tool` to completion, capturing its output.
    fn run(&self, tool: Tool, args: &[String]) -> Result<ToolOutput, ToolError>;
}

/// Runs the real binaries found on `PATH`.
#[derive(Debug, Default)]
pub struct SystemTools;

impl ToolRunner for SystemTools {
    fn is_available(&self, tool: Tool) -> bool {
        let finder = if cfg!(windows) { "where" } else { "which" };
        Command::new(finder)
            .arg(tool.binary())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn run(&self, tool: Tool, args: &[String]) -> Result<ToolOutput, ToolError> {
        tracing::info!("running {} {}", tool.binary(), args.join(" "));
        let output = Command::new(tool.binary())
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ToolError::Spawn {
                program: tool.binary(),
                source,
            })?;

        let result = ToolOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !result.success {
            tracing::warn!("{} exited with {}", tool.binary(), output.status);
        }
        Ok(result)
    }
}

/// First line of `node --version` style output, if the tool ran cleanly.
pub fn version_of(runner: &dyn ToolRunner, tool: Tool) -> Option<String> {
    let output = runner.run(tool, &["--version".to_string()]).ok()?;
    if !output.success {
        return None;
    }
    output
        .stdout
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}
