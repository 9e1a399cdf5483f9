//! # Tanki News Relay
//!
//! Watches the Tanki news page and posts every new article to a Discord
//! channel.
//!
//! ## Usage
//!
//! ```sh
//! tanki_news_relay --webhook-url https://discord.com/api/webhooks/... -i 10
//! ```
//!
//! ## Architecture
//!
//! On each tick of a fixed interval:
//! 1. **Listing**: fetch the news index and pick the newest article
//! 2. **Freshness**: skip it if its link was already published this run
//! 3. **Article**: fetch the article page and extract trimmed body text
//! 4. **Publish**: send title, image, body and link to the channel
//!
//! Every failure is logged and the next tick tries again.

use clap::Parser;
use std::error::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

mod cli;
mod config;
mod error;
mod fetch;
mod freshness;
mod logging;
mod models;
mod poller;
mod publish;
mod scrapers;
mod utils;

use cli::Cli;
use config::Settings;
use fetch::ReqwestFetcher;
use poller::Poller;
use publish::{Destination, DiscordWebhookPublisher, LogPublisher};
use scrapers::listing::ListingExtractor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    logging::init(args.log_dir.as_deref())?;
    info!(version = env!("CARGO_PKG_VERSION"), "tanki_news_relay starting up");
    debug!(?args, "Parsed CLI arguments");

    let settings = Settings::load(&args)?;
    info!(
        listing_url = %settings.listing_url,
        interval_minutes = settings.check_interval_minutes,
        max_content_length = settings.max_content_length,
        dry_run = args.dry_run,
        "Loaded configuration"
    );

    let fetcher = ReqwestFetcher::new(&settings.fetch_settings())?;
    let listing = ListingExtractor::new(&settings.layout)?;
    let destination = match (&settings.webhook_url, args.dry_run) {
        (Some(webhook), false) => Destination::Discord(DiscordWebhookPublisher::new(
            fetcher.client().clone(),
            webhook.clone(),
            settings.embed.clone(),
        )),
        _ => Destination::Log(LogPublisher::new(settings.embed.clone())),
    };

    let mut poller = Poller::new(
        fetcher,
        destination,
        listing,
        settings.listing_url.clone(),
        settings.max_content_length,
    )
    .with_listing_policy(settings.on_listing_failure);

    if args.once {
        let outcome = poller.tick().await?;
        info!(?outcome, "Single check complete");
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C; running until killed");
            std::future::pending::<()>().await;
        }
        info!("Ctrl-C received; shutting down");
        let _ = shutdown_tx.send(true);
    });

    poller.run(settings.check_interval(), shutdown_rx).await;
    info!("tanki_news_relay stopped");
    Ok(())
}
