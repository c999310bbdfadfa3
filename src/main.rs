//! thinkcap binary entry point.

use thinkcap::cli::Cli;
use thinkcap::config::SessionConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    let result = async {
        let mut config = SessionConfig::load()?;
        cli.apply(&mut config);
        config.validate()?;
        thinkcap::cli::console::run(config).await
    }
    .await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
