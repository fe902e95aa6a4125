//! ecr-janitor CLI
//!
//! Scans ECS, Lambda, EKS and external sources for images in use, then
//! plans and optionally deletes expired ECR images nothing references.

mod cli;
mod commands;
mod confirm;
mod output;

use anyhow::Result;
use clap::Parser;
use janitor_core::CancelToken;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, ColorChoice, Commands, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    // Must happen before any TLS operation
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet, cli.log_level, cli.color);

    let cancel = CancelToken::new();
    spawn_interrupt_handler(cancel.clone());

    match cli.command {
        Commands::Version(args) => commands::version::run(args),
        Commands::Scan(args) => {
            commands::scan::run(args, &cli.config, cli.region.as_deref(), cancel).await
        }
        Commands::Plan(args) => {
            commands::plan::run(args, &cli.config, cli.region.as_deref(), cancel).await
        }
        Commands::Delete(args) => {
            commands::delete::run(args, &cli.config, cli.region.as_deref(), cancel).await
        }
    }
}

/// Cancel the run on Ctrl-C; in-flight pages finish, no new calls start
fn spawn_interrupt_handler(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            cancel.cancel();
        }
    });
}

fn init_tracing(verbose: u8, quiet: bool, level: Option<LogLevel>, color: ColorChoice) {
    let filter = match level {
        Some(level) => EnvFilter::new(level.as_str()),
        None if quiet => EnvFilter::new("error"),
        None => match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        },
    };

    let ansi = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    console::set_colors_enabled(ansi);

    // stdout carries scan and summary output
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
