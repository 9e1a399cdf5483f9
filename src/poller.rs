//! Interval-driven news check.
//!
//! Each tick runs the whole pipeline in order:
//!
//! 1. fetch the listing page
//! 2. extract the newest item
//! 3. compare its link with the last published one
//! 4. if new: record it, fetch the article, extract the body, publish
//!
//! Ticks never overlap. The link is recorded before the article is fetched,
//! so an article whose body fetch or publish fails is not retried.

use crate::error::NewsError;
use crate::fetch::HtmlFetcher;
use crate::freshness::FreshnessTracker;
use crate::models::NewsPost;
use crate::publish::Publisher;
use crate::scrapers::article::extract_content;
use crate::scrapers::listing::ListingExtractor;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, instrument, warn};

/// What a successful tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new article was handed to the publisher.
    Published { link: String },
    /// The newest article was already published.
    Unchanged { link: String },
}

/// What a tick does when the listing page cannot be fetched or understood.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingFailurePolicy {
    /// End the tick with the error; nothing is published.
    #[default]
    Skip,
    /// Carry on with [`ListingItem::unknown`](crate::models::ListingItem::unknown),
    /// which is published once like any other new link.
    Sentinel,
}

pub struct Poller<F, P> {
    fetcher: F,
    publisher: P,
    listing: ListingExtractor,
    tracker: FreshnessTracker,
    listing_url: String,
    max_content_length: usize,
    on_listing_failure: ListingFailurePolicy,
    ticks: u64,
}

impl<F, P> Poller<F, P>
where
    F: HtmlFetcher,
    P: Publisher,
{
    pub fn new(
        fetcher: F,
        publisher: P,
        listing: ListingExtractor,
        listing_url: String,
        max_content_length: usize,
    ) -> Self {
        Self {
            fetcher,
            publisher,
            listing,
            tracker: FreshnessTracker::new(),
            listing_url,
            max_content_length,
            on_listing_failure: ListingFailurePolicy::default(),
            ticks: 0,
        }
    }

    pub fn with_listing_policy(mut self, policy: ListingFailurePolicy) -> Self {
        self.on_listing_failure = policy;
        self
    }

    /// Run one check.
    ///
    /// # Errors
    ///
    /// With [`ListingFailurePolicy::Skip`], listing fetch and listing parse
    /// failures end the tick before the tracker is touched. A failed article
    /// fetch is logged and the post goes out with empty content. A publish
    /// failure is returned after the link has already been recorded.
    #[instrument(level = "info", skip_all, fields(tick = self.ticks + 1))]
    pub async fn tick(&mut self) -> Result<TickOutcome, NewsError> {
        self.ticks += 1;

        let item = match self.on_listing_failure {
            ListingFailurePolicy::Skip => {
                let listing_html = self.fetcher.fetch(&self.listing_url).await?;
                self.listing.extract_latest(&listing_html)?
            }
            ListingFailurePolicy::Sentinel => {
                let listing_html = self.fetcher.fetch_or_log(&self.listing_url).await;
                let item = self
                    .listing
                    .extract_latest_or_unknown(listing_html.as_deref().unwrap_or_default());
                if item.is_unknown() {
                    warn!("Listing unreadable; continuing with the unknown item");
                }
                item
            }
        };

        if !self.tracker.observe(&item.link) {
            return Ok(TickOutcome::Unchanged { link: item.link });
        }
        info!(title = %item.title, link = %item.link, "New article detected");

        let content = match self.fetcher.fetch_or_log(&item.link).await {
            Some(html) => extract_content(&html, self.max_content_length),
            None => String::new(),
        };
        if content.is_empty() {
            warn!(link = %item.link, "Article has no extractable text; publishing without body");
        }

        let post = NewsPost::new(item, content);
        self.publisher.publish(&post).await?;
        Ok(TickOutcome::Published { link: post.link })
    }

    /// Tick every `every` until `shutdown` turns `true` or its sender is
    /// dropped. The first tick fires immediately.
    ///
    /// Shutdown also abandons a tick in progress at its next await point.
    pub async fn run(&mut self, every: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = every.as_secs(), url = %self.listing_url, "Poller started");

        loop {
            tokio::select! {
                biased;
                _ = stop_requested(&mut shutdown) => break,
                _ = ticker.tick() => {
                    let t0 = Instant::now();
                    tokio::select! {
                        biased;
                        _ = stop_requested(&mut shutdown) => {
                            warn!("Shutdown requested during a tick; abandoning it");
                            break;
                        }
                        outcome = self.tick() => report(&outcome, t0.elapsed()),
                    }
                }
            }
        }

        info!(
            ticks = self.ticks,
            last_published = ?self.tracker.last_published(),
            "Poller stopped"
        );
    }
}

async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    // Err means the sender is gone, which is treated as a stop request.
    let _ = shutdown.wait_for(|stop| *stop).await;
}

fn report(outcome: &Result<TickOutcome, NewsError>, elapsed: Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    match outcome {
        Ok(TickOutcome::Published { link }) => info!(%link, elapsed_ms, "Tick published an article"),
        Ok(TickOutcome::Unchanged { link }) => info!(%link, elapsed_ms, "No new article"),
        Err(e) => error!(error = %e, kind = e.kind(), elapsed_ms, "Tick failed"),
    }
}
