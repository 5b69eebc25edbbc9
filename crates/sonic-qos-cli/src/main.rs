//! qoscfg entry point.
//!
//! Parses the command line, connects to CONFIG_DB and STATE_DB and runs one
//! `config` or `show` command.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use sonic_qos_cli::{execute, Cli, CliResult};

/// Initialize tracing/logging on stderr. `RUST_LOG` overrides `level`.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> CliResult<String> {
    debug!(
        "Redis: {}:{} (CONFIG_DB={}, STATE_DB={})",
        cli.global.redis_host, cli.global.redis_port, cli.global.config_db, cli.global.state_db
    );

    let qos = cli.global.connect().await?;
    execute(cli.command, &qos).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.global.log_level);

    match run(cli).await {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Command failed: {:?}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
