use anyhow::Result;
use catify::ai::GeminiServiceFactory;
use catify::config::Config;
use catify::pipeline::Catifier;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU16;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "catify")]
#[command(about = "Serve the catify endpoint")]
struct CliArgs {
    /// Enable debug logging.
    #[arg(long, env = "CATIFY_DEBUG")]
    debug: bool,

    /// Address to listen on.
    #[arg(long, short, default_value = "127.0.0.1", env = "CATIFY_LISTEN_ADDRESS")]
    listen_address: IpAddr,

    /// Port to listen on.
    #[arg(long, short, default_value = "8888", env = "CATIFY_PORT")]
    port: NonZeroU16,
}

fn default_filter(debug: bool) -> &'static str {
    if debug {
        "catify=debug,tower_http=debug"
    } else {
        "catify=info,tower_http=info"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(args.debug).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting catify");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if config.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; every catify request will fail until it is");
    }
    info!(
        "Description model: {}, generation model: {}",
        config.description_model, config.generation_model
    );

    // Reuse one HTTP connection pool across invocations.
    let services = Arc::new(GeminiServiceFactory::new(reqwest::Client::new()));
    let catifier = Arc::new(Catifier::new(Arc::new(config), services));

    let addr = SocketAddr::new(args.listen_address, args.port.get());
    if let Err(e) = catify::web::serve(addr, catifier).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
