mod args;
mod commands;
mod output;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use nevu_core::config::AppConfig;

use crate::args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose);

    commands::run(cli).await
}

/// Console logging to stderr plus a daily log file in the data directory.
///
/// `--verbose` wins over `RUST_LOG`; without either only info and above
/// from the nevu crates is shown.
fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("nevu=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nevu=info"))
    };

    let (file_layer, guard) = match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("nevu")
        .filename_suffix("log")
        .build(AppConfig::data_dir().join("logs"))
    {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}
