use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ig_comment_harvester::cache::LruCache;
use ig_comment_harvester::config::Config;
use ig_comment_harvester::pipeline::AcquisitionPipeline;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    init_tracing()?;

    info!("Starting ig-comment-harvester");

    // Load and validate configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let shortcodes: Vec<String> = std::env::args().skip(1).collect();
    if shortcodes.is_empty() {
        anyhow::bail!("no content ids given; pass one or more post shortcodes as arguments");
    }

    let max_comments = config.max_comments;
    let pipeline = AcquisitionPipeline::new(config).context("Failed to build pipeline")?;

    // Skip content ids repeated within this invocation.
    let mut acquired: LruCache<String, ()> = LruCache::new(1024);

    for shortcode in shortcodes {
        if acquired.contains(&shortcode) {
            warn!(shortcode = %shortcode, "Content id repeated, skipping");
            continue;
        }
        acquired.insert(shortcode.clone(), ());

        let report = pipeline.acquire(&shortcode, max_comments).await;
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ig_comment_harvester=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        // Pretty-printed logging for development
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
