// ABOUTME: Main entry point for repoterm
//
// Binary: repoterm
// Usage: repoterm <COMMAND>
// - shell: interactive terminal bound to a repository
// - exec: run one command against a repository
// - auth: manage the stored access token

#![allow(missing_docs)]

use anyhow::Result;
use clap::Parser;

use repoterm::audit::AuditLogger;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    setup_panic_handler();

    if let Err(e) = AuditLogger::init() {
        tracing::warn!("Audit log unavailable, continuing without it: {}", e);
    }

    let args = cli::Cli::parse();

    match args.command {
        cli::Commands::Shell(shell_args) => cli::shell::execute(shell_args, args.format).await,
        cli::Commands::Exec(exec_args) => {
            let succeeded = cli::exec::execute(exec_args, args.format).await?;
            if !succeeded {
                std::process::exit(1);
            }
            Ok(())
        }
        cli::Commands::Auth(auth_command) => cli::auth::execute(auth_command, args.format),
    }
}

fn setup_logging() {
    use std::fs::OpenOptions;
    use tracing_subscriber::prelude::*;

    let log_dir = repoterm::config::repoterm_home().join("logs");
    let _ = std::fs::create_dir_all(&log_dir);

    // Create JSONL log file with timestamp
    let log_file = log_dir.join(format!(
        "repoterm-{}.jsonl",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ));

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "repoterm=info,audit=info".into());

    match OpenOptions::new().create(true).append(true).open(&log_file) {
        Ok(file) => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(file)
                    .with_ansi(false),
            )
            .with(filter)
            .init(),
        Err(e) => {
            // No writable log directory: keep errors visible on stderr instead
            eprintln!("Could not open log file {}: {}", log_file.display(), e);
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_filter(tracing_subscriber::filter::LevelFilter::WARN),
                )
                .init();
        }
    }
}

fn setup_panic_handler() {
    use tracing::error;

    std::panic::set_hook(Box::new(|panic_info| {
        error!("Application panicked: {}", panic_info);
        eprintln!("Application panicked: {}", panic_info);
        eprintln!("Please check the logs for more details.");
    }));
}
