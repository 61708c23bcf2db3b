//! Start the JobHub server.

use clap::Args;

use jobhub_core::config::AppConfig;
use jobhub_core::error::AppError;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the server host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the number of workers
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// Execute the serve command
pub async fn execute(args: &ServeArgs, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.worker.concurrency = concurrency;
    }
    config.validate()?;

    println!("Starting JobHub server...");
    println!("  Host:    {}", config.server.host);
    println!("  Port:    {}", config.server.port);
    println!("  Store:   {}", config.store.backend);
    println!("  Workers: {}", config.worker.concurrency);

    jobhub_api::run_server(config).await
}
