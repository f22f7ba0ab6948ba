// `skunk setup`: interactive first-run flow.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::app::{App, ExitOutcome};
use crate::plugin::registry::REGISTRY;
use crate::tools::{Tool, version_of};
use crate::ui;

pub trait Prompter {
    /// Ask a free-form question. An empty answer (or closed stdin) returns `default`.
    fn ask(&mut self, question: &str, default: Option<&str>) -> io::Result<String>;
}

/// Line-oriented prompts on stdin/stdout.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&mut self, question: &str, default: Option<&str>) -> io::Result<String> {
        let mut stdout = io::stdout();
        match default {
            Some(default) if !default.is_empty() => write!(stdout, "? {question} [{default}] ")?,
            _ => write!(stdout, "? {question} ")?,
        }
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        let answer = line.trim();
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupTarget {
    Skills,
    Plugins,
    Both,
    Quit,
}

#[derive(Debug, Clone, Copy)]
pub struct MenuOption<T> {
    pub label: &'static str,
    pub value: T,
}

pub const SETUP_MENU: [MenuOption<SetupTarget>; 4] = [
    MenuOption {
        label: "OpenClaw skills",
        value: SetupTarget::Skills,
    },
    MenuOption {
        label: "WordPress plugins",
        value: SetupTarget::Plugins,
    },
    MenuOption {
        label: "Both",
        value: SetupTarget::Both,
    },
    MenuOption {
        label: "Quit",
        value: SetupTarget::Quit,
    },
];

pub fn confirm(prompter: &mut dyn Prompter, question: &str, default: bool) -> io::Result<bool> {
    let hint = if default { "Y/n" } else { "y/N" };
    let answer = prompter.ask(&format!("{question} ({hint})"), None)?;
    Ok(match answer.to_ascii_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    })
}

/// Numbered menu. Unrecognised answers pick the first option.
pub fn choose<T: Copy>(
    prompter: &mut dyn Prompter,
    question: &str,
    options: &[MenuOption<T>],
) -> io::Result<T> {
    for (index, option) in options.iter().enumerate() {
        println!("  {}) {}", index + 1, option.label);
    }
    let answer = prompter.ask(question, Some("1"))?;
    let picked = answer
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| options.get(index))
        .or_else(|| {
            options
                .iter()
                .find(|option| option.label.eq_ignore_ascii_case(answer.trim()))
        })
        .unwrap_or(&options[0]);
    Ok(picked.value)
}

pub fn run(app: &mut App) -> Result<ExitOutcome> {
    ui::heading("Skunk setup");

    let Some(node) = version_of(app.tools.as_ref(), Tool::Node) else {
        ui::error_with_fix("Node.js is required but was not found.", Tool::Node.install_hint());
        return Ok(ExitOutcome::Failure);
    };
    ui::success(&format!("Node.js {node}"));

    ensure_runtime(app)?;

    let target = choose(app.prompter.as_mut(), "What would you like to set up?", &SETUP_MENU)
        .context("reading setup choice")?;
    if target == SetupTarget::Quit {
        ui::info("Nothing to do. Run `skunk setup` again any time.");
        return Ok(ExitOutcome::Success);
    }

    let mut skills_installed = 0;
    let mut plugins_installed = 0;

    if matches!(target, SetupTarget::Skills | SetupTarget::Both) {
        let default = app.config.setup.recommended_skills.join(",");
        let answer = app
            .prompter
            .ask("Skills to install (comma separated)", Some(&default))
            .context("reading skill list")?;
        for name in answer.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if app.install_skill(name)? {
                skills_installed += 1;
            }
        }
    }

    if matches!(target, SetupTarget::Plugins | SetupTarget::Both) {
        plugins_installed += setup_plugins(app)?;
    }

    ui::heading("Done");
    ui::info(&format!(
        "{skills_installed} skill(s) and {plugins_installed} plugin(s) installed."
    ));
    Ok(ExitOutcome::Success)
}

fn ensure_runtime(app: &mut App) -> Result<()> {
    if app.tools.is_available(Tool::OpenClaw) {
        ui::success("OpenClaw found");
        return Ok(());
    }

    ui::warn("OpenClaw was not found; skills will not load until it is installed.");
    if !app.tools.is_available(Tool::Npm) {
        ui::hint(Tool::OpenClaw.install_hint());
        return Ok(());
    }

    let package = app.config.setup.runtime_package.clone();
    if !confirm(app.prompter.as_mut(), &format!("Install {package} with npm now?"), true)? {
        return Ok(());
    }

    let args = ["install", "-g", package.as_str()].map(String::from);
    match app.tools.run(Tool::Npm, &args) {
        Ok(output) if output.success => ui::success(&format!("Installed {package}")),
        Ok(output) => ui::error(&format!("npm install failed: {}", output.stderr.trim())),
        Err(err) => ui::error(&err.to_string()),
    }
    Ok(())
}

fn setup_plugins(app: &mut App) -> Result<usize> {
    if !app.tools.is_available(Tool::WpCli) && !app.tools.is_available(Tool::Studio) {
        ui::warn("Skipping plugins: neither WP-CLI nor WordPress Studio is installed.");
        return Ok(0);
    }

    let mut options: Vec<MenuOption<Option<&'static str>>> = REGISTRY
        .iter()
        .map(|entry| MenuOption {
            label: entry.display_name,
            value: Some(entry.name),
        })
        .collect();
    options.push(MenuOption {
        label: "Skip",
        value: None,
    });

    let Some(name) = choose(app.prompter.as_mut(), "Which plugin?", &options)? else {
        return Ok(0);
    };

    let key = app
        .prompter
        .ask("License key for the Pro edition (empty for free)", None)?;
    let installed = if key.trim().is_empty() {
        app.install_plugin(name, None)
    } else {
        app.install_plugin(&format!("{name}-pro"), Some(key.trim()))
    };
    Ok(usize::from(installed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<&'static str>);

    impl Prompter for Scripted {
        fn ask(&mut self, _: &str, default: Option<&str>) -> io::Result<String> {
            let answer = self.0.pop_front().unwrap_or("");
            Ok(if answer.is_empty() {
                default.unwrap_or_default().to_string()
            } else {
                answer.to_string()
            })
        }
    }

    fn scripted(answers: &[&'static str]) -> Scripted {
        Scripted(answers.iter().copied().collect())
    }

    #[test]
    fn choose_by_number_label_or_default() {
        assert_eq!(choose(&mut scripted(&["2"]), "?", &SETUP_MENU).unwrap(), SetupTarget::Plugins);
        assert_eq!(choose(&mut scripted(&["quit"]), "?", &SETUP_MENU).unwrap(), SetupTarget::Quit);
        assert_eq!(choose(&mut scripted(&[""]), "?", &SETUP_MENU).unwrap(), SetupTarget::Skills);
        assert_eq!(choose(&mut scripted(&["9"]), "?", &SETUP_MENU).unwrap(), SetupTarget::Skills);
    }

    #[test]
    fn confirm_falls_back_to_default() {
        assert!(confirm(&mut scripted(&["yes"]), "?", false).unwrap());
        assert!(!confirm(&mut scripted(&["N"]), "?", true).unwrap());
        assert!(confirm(&mut scripted(&[""]), "?", true).unwrap());
    }
}
