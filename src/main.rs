use std::process::ExitCode;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use skunk::cli::{self, Command, Invocation};
use skunk::net::HttpFetcher;
use skunk::tools::SystemTools;
use skunk::wizard::StdinPrompter;
use skunk::{App, AppConfig, startup_failure, ui};

fn main() -> ExitCode {
    let _guard = match init_logging() {
        Ok(guard) => Some(guard),
        Err(err) => {
            ui::warn(&format!("Logging disabled: {err:#}"));
            None
        }
    };

    let command = match cli::parse_from(std::env::args_os()) {
        Invocation::Run(command) => command,
        Invocation::Print(output) => {
            if let Err(err) = output.print() {
                tracing::warn!("cannot print usage: {err}");
            }
            return ExitCode::SUCCESS;
        }
    };

    // Help needs neither config nor network.
    if command == Command::Help {
        print!("{}", cli::usage());
        return ExitCode::SUCCESS;
    }

    let outcome = match build_app() {
        Ok(mut app) => app.run(command),
        Err(err) => startup_failure(&command, &err),
    };
    tracing::info!("finished with {outcome:?}");
    ExitCode::from(outcome.code())
}

fn build_app() -> Result<App> {
    let config = AppConfig::load()?;
    let fetcher = HttpFetcher::new(&config)?;
    Ok(App::new(
        config,
        Box::new(fetcher),
        Box::new(SystemTools),
        Box::new(StdinPrompter),
    ))
}

// Logging goes to a daily file (never stdout, which belongs to the user).
fn init_logging() -> Result<WorkerGuard> {
    let log_dir = directories::ProjectDirs::from("", "", "skunk")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "skunk.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_env("SKUNK_LOG").unwrap_or_else(|_| EnvFilter::new("skunk=info"));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;

    tracing::info!("skunk {} starting", env!("CARGO_PKG_VERSION"));
    Ok(guard)
}
