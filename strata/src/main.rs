use std::process::ExitCode;

use clap::{Parser, Subcommand};
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;

use crate::{
    apply::ApplyArgs,
    error::{ObservabilitySnafu, Result},
    generate::GenerateArgs,
};

mod apply;
mod error;
mod generate;
mod record;
mod store;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Strata CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending changes read from a JSON lines file
    Apply {
        #[clap(flatten)]
        inner: ApplyArgs,
    },
    /// Insert generated rows into a single partition
    Generate {
        #[clap(flatten)]
        inner: GenerateArgs,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.kind().exit_code();
            eprintln!("{}", snafu::Report::from_error(err));
            ExitCode::from(code as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    strata_observability::init_observability(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        .context(ObservabilitySnafu {})?;

    let ct = CancellationToken::new();

    tokio::spawn({
        let ct = ct.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            ct.cancel();
        }
    });

    match cli.command {
        Commands::Apply { inner } => inner.run(ct).await,
        Commands::Generate { inner } => inner.run(ct).await,
    }
}
