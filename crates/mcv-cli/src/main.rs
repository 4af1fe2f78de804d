//! `mcv`: query config dumps and wait for assertions over them

use clap::{ArgGroup, Parser, Subcommand};
use mcv_cli::commands;
use mcv_convergence::ConvergenceChecker;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mcv", version, about = "Query and wait on data-plane config dumps")]
struct Cli {
    /// TOML config supplying the default retry policy
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every value an expression selects, as JSON
    Query {
        #[arg(long)]
        expr: String,
        /// JSON or YAML dump (by extension)
        file: PathBuf,
    },

    /// Poll a dump file until every assertion holds
    #[command(group(
        ArgGroup::new("assertions")
            .required(true)
            .multiple(true)
            .args(["exists", "absent"])
    ))]
    Assert {
        /// Expression that must select at least one value
        #[arg(long)]
        exists: Vec<String>,
        /// Expression that must select nothing
        #[arg(long)]
        absent: Vec<String>,
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Fixed delay between attempts
        #[arg(long)]
        interval_ms: Option<u64>,
        /// JSON or YAML dump (by extension), re-read on every attempt
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Query { expr, file } => {
            let found = commands::query(&expr, &file)?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        Command::Assert {
            exists,
            absent,
            timeout_ms,
            interval_ms,
            file,
        } => {
            let assertions = commands::assertions(&exists, &absent)?;
            let policy = commands::policy(cli.config.as_deref(), timeout_ms, interval_ms)?;
            let checker = ConvergenceChecker::new();

            let cancel = checker.cancellation().clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });

            tracing::info!(
                "Waiting up to {:?} for {} assertion(s) on {}",
                policy.timeout,
                assertions.len(),
                file.display()
            );
            let report = commands::assert(&checker, &file, &assertions, &policy).await?;
            if let Some(done) = report.converged.first() {
                println!("OK after {} attempt(s) in {:?}", done.attempts, done.elapsed);
            }
        }
    }

    Ok(())
}
