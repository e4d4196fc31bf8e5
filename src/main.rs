use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use voxpool::config::Config;
use voxpool::error::StartupError;
use voxpool::{credentials, gate, gateway, validator};

#[derive(Parser)]
#[command(name = "voxpool", version, about = "Maintains a pool of authenticated gateway voice sessions")]
struct Cli {
    /// Credentials file, one per line (overrides VOXPOOL_CREDENTIALS).
    #[arg(long)]
    credentials: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voxpool=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(path) = cli.credentials {
        config.credentials_path = path;
    }
    print_banner(&config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), StartupError> {
    let http = reqwest::Client::new();

    let code = gate::prompt_code()?;
    gate::verify(&http, &config.gate_url, &code).await?;
    eprintln!("  \x1b[32m✓ code accepted\x1b[0m");
    eprintln!();

    let candidates = credentials::load(&config.credentials_path)?;
    tracing::info!("loaded {} credential(s)", candidates.len());

    let valid = validator::validate(&http, &config.identity_url, candidates).await;
    tracing::info!("starting {} voice connection(s)", valid.len());

    let handles = gateway::pool::start(Arc::new(config), valid);

    // Sessions retry forever; the process runs until externally terminated.
    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}

fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");

    eprintln!();
    eprintln!("  \x1b[1;36mvoxpool\x1b[0m \x1b[2mv{version}\x1b[0m");
    eprintln!();
    eprintln!("  \x1b[2mgateway\x1b[0m      {}", config.gateway_url);
    eprintln!("  \x1b[2mguild\x1b[0m        {}", config.guild_id);
    eprintln!("  \x1b[2mchannel\x1b[0m      {}", config.channel_id);
    eprintln!(
        "  \x1b[2mcredentials\x1b[0m  {}",
        config.credentials_path.display()
    );
    eprintln!();
}
