use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tabula_cli::{run_app, CliArgs, CliConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so the table on stdout stays pipeable.
    // Default to INFO level, can be overridden with RUST_LOG env var
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(std::env::args().skip(1)).await {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: impl Iterator<Item = String>) -> anyhow::Result<String> {
    let args = CliArgs::parse(args)?;
    let config = CliConfig::resolve(args.config_path.clone())?;
    run_app(args, config).await
}
