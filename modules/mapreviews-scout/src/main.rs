use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mapreviews_common::Config;
use mapreviews_scout::page_source::{BrowserlessPageSource, FilePageSource, PageSource};
use mapreviews_scout::{spawn_review_worker, Augmenter, ReviewFetcher};
use review_client::ReviewClient;

#[derive(Parser, Debug)]
#[command(about = "Augment map restaurant search results with review data")]
struct Args {
    /// Map search URL to watch (overrides MAP_URL)
    #[arg(long)]
    url: Option<String>,

    /// Read the page from a saved HTML file instead of rendering it
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Run a single cycle, wait for every review reply and print results
    #[arg(long)]
    once: bool,

    /// Seconds between cycles (overrides POLL_INTERVAL_SECS)
    #[arg(long)]
    interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mapreviews=info".parse()?))
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = args.url {
        config.map_url = Some(url);
    }
    if let Some(secs) = args.interval_secs {
        config.poll_interval = Duration::from_secs(secs);
    }
    config.validate()?;
    config.log_redacted();

    let map_url = config
        .map_url
        .clone()
        .context("MAP_URL or --url is required")?;

    let source: Arc<dyn PageSource> = match args.snapshot {
        Some(path) => Arc::new(FilePageSource::new(path, &map_url)),
        None => Arc::new(BrowserlessPageSource::new(
            &config.browserless_url,
            config.browserless_token.as_deref(),
            &map_url,
        )?),
    };

    let client = ReviewClient::new(&config.review_api_url, config.review_timeout)?;
    let fetcher = Arc::new(ReviewFetcher::new(Arc::new(client)));

    let cancel = CancellationToken::new();
    let (reviews, worker) =
        spawn_review_worker(fetcher, config.max_concurrent_fetches, cancel.child_token());

    let mut augmenter = Augmenter::new(
        source,
        reviews,
        config.poll_interval,
        config.max_tracked_restaurants,
    );

    if args.once {
        let stats = augmenter.run_cycle(&cancel).await?;
        augmenter.drain().await;
        info!("Single cycle complete. {stats}");

        for tracked in augmenter.registry().iter() {
            let line = serde_json::json!({
                "restaurant": tracked.restaurant,
                "discoveredAt": tracked.discovered_at,
                "review": tracked.review,
            });
            println!("{line}");
        }
    } else {
        let shutdown = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown requested");
                shutdown.cancel();
            }
        });
        augmenter.run(cancel.clone()).await;
    }

    cancel.cancel();
    drop(augmenter);
    worker.await?;

    Ok(())
}
