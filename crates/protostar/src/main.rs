use clap::Parser;
use protostar_client::ApiClient;
use protostar_scheduler::{Scheduler, SchedulerConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "protostar", about = "Protostar external pod scheduler")]
struct Cli {
    /// API server host:port
    #[arg(long, default_value = "127.0.0.1:8080")]
    api_host: String,

    /// Scheduler name pods opt into via the scheduler annotation
    #[arg(long, default_value = protostar_core::DEFAULT_SCHEDULER_NAME)]
    scheduler_name: String,

    /// Seconds between reconcile sweeps of unbound pods
    #[arg(long, default_value_t = 30)]
    interval: u64,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let client = ApiClient::new(&format!("http://{}", cli.api_host)).map_err(|e| {
        miette::miette!(
            help = "The API host must be a host:port pair like 127.0.0.1:8080",
            "Failed to build the API client: {}",
            e
        )
    })?;

    // The API server holds all truth; starting without it would just spin.
    let nodes = client.list_nodes().await.map_err(|e| {
        miette::miette!(
            help = "Verify --api-host points at a reachable API server",
            "API server at {} is unreachable: {}",
            cli.api_host,
            e
        )
    })?;
    info!(
        api_host = %cli.api_host,
        nodes = nodes.len(),
        "Connected to API server"
    );

    let config = SchedulerConfig {
        scheduler_name: cli.scheduler_name,
        reconcile_interval: Duration::from_secs(cli.interval),
        ..Default::default()
    };

    let scheduler = Scheduler::new(Arc::new(client), config);
    let token = CancellationToken::new();

    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, shutting down");
            signal_token.cancel();
        }
    });

    if let Err(e) = scheduler.run(token).await {
        error!(error = %e, "Scheduler exited with error");
        return Err(miette::miette!("{}", e));
    }

    Ok(())
}
