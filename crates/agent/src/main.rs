use tracing_subscriber::EnvFilter;

use vigil_agent::{cli, config, run};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = match config::load_from_file(&args.config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %args.config_path.display(), error = %e, "invalid configuration");
            return Err(e.into());
        }
    };

    if args.check {
        println!("{}: configuration ok", args.config_path.display());
        return Ok(());
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "vigil agent starting");
    run::run(config).await
}
