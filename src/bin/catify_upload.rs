//! Command-line uploader for a catify server.
//!
//! Stages one image, submits it, and saves the result next to the other
//! outputs. Exits non-zero with the alert text on any failure.

use anyhow::Result;
use catify::client::{SelectedFile, Uploader};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "catify_upload")]
#[command(about = "Catify a photo through a running catify server")]
struct CliArgs {
    /// Image to catify.
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// Catify endpoint URL.
    #[arg(long, default_value = "http://127.0.0.1:8888/api/catify", env = "CATIFY_ENDPOINT")]
    endpoint: String,

    /// Directory the result is saved into.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Declared image type; sniffed from the file when omitted.
    #[arg(long)]
    mime_type: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catify=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let mut uploader = Uploader::new(args.endpoint.clone());

    let file = SelectedFile::from_path(&args.image, args.mime_type).await?;
    if uploader.accept_file(file).is_err() || uploader.submit().await.is_err() {
        let message = uploader.view().alert.unwrap_or("Catify failed").to_string();
        error!("{}", message);
        std::process::exit(1);
    }

    match uploader.save(&args.output_dir)? {
        Some(path) => info!("Catified image written to {}", path.display()),
        None => info!("No result to save"),
    }
    Ok(())
}
