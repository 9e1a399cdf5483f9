//! Runtime configuration.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! command-line flags and environment variables. [`Settings::validate`] runs
//! once on the merged result before anything is started.
//!
//! ```yaml
//! listing_url: https://tanki.su/ru/news/
//! check_interval_minutes: 10
//! max_content_length: 300
//! request_timeout_secs: 30
//! webhook_url: https://discord.com/api/webhooks/...
//! embed:
//!   color: 0xff7b19
//!   banner_image: https://i.imgur.com/zSwcRBK.png
//! layout:
//!   origin: https://tanki.su
//!   item: .preview_item
//! on_listing_failure: skip
//! ```

use crate::cli::Cli;
use crate::error::NewsError;
use crate::fetch::FetchSettings;
use crate::poller::ListingFailurePolicy;
use crate::publish::EmbedStyle;
use crate::scrapers::listing::SiteLayout;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const MIN_CHECK_INTERVAL_MINUTES: u64 = 5;
/// One week.
pub const MAX_CHECK_INTERVAL_MINUTES: u64 = 7 * 24 * 60;
pub const CONTENT_LENGTH_RANGE: RangeInclusive<usize> = 10..=500;
const MAX_EMBED_COLOR: u32 = 0xFF_FF_FF;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Listing page polled on every tick.
    pub listing_url: String,
    pub check_interval_minutes: u64,
    /// Character budget for the article body in each post.
    pub max_content_length: usize,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: Option<String>,
    /// Required unless running with `--dry-run`.
    pub webhook_url: Option<String>,
    pub embed: EmbedStyle,
    pub layout: SiteLayout,
    /// `skip` (default) or `sentinel`.
    pub on_listing_failure: ListingFailurePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listing_url: "https://tanki.su/ru/news/".to_string(),
            check_interval_minutes: MIN_CHECK_INTERVAL_MINUTES,
            max_content_length: 300,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: None,
            webhook_url: None,
            embed: EmbedStyle::default(),
            layout: SiteLayout::default(),
            on_listing_failure: ListingFailurePolicy::default(),
        }
    }
}

impl Settings {
    /// Read settings from a YAML file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// [`NewsError::Config`] if the file cannot be read or parsed.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, NewsError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| NewsError::Config(format!("cannot read {}: {e}", path.display())))?;
        let settings: Settings = serde_yaml::from_str(&raw)
            .map_err(|e| NewsError::Config(format!("cannot parse {}: {e}", path.display())))?;
        debug!(?settings, "Loaded config file");
        Ok(settings)
    }

    /// Defaults, overlaid with the config file named by `cli` (if any), then
    /// with the CLI values themselves. The result is validated.
    ///
    /// # Errors
    ///
    /// [`NewsError::Config`] for unreadable files or invalid values.
    pub fn load(cli: &Cli) -> Result<Self, NewsError> {
        let mut settings = match cli.config.as_deref() {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_cli(cli);
        settings.validate(cli.dry_run)?;
        Ok(settings)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.listing_url {
            self.listing_url = url.clone();
        }
        if let Some(minutes) = cli.interval_minutes {
            self.check_interval_minutes = minutes;
        }
        if let Some(length) = cli.max_content_length {
            self.max_content_length = length;
        }
        if let Some(webhook) = &cli.webhook_url {
            self.webhook_url = Some(webhook.clone());
        }
    }

    /// # Errors
    ///
    /// [`NewsError::Config`] naming the first offending value.
    pub fn validate(&self, dry_run: bool) -> Result<(), NewsError> {
        if !(MIN_CHECK_INTERVAL_MINUTES..=MAX_CHECK_INTERVAL_MINUTES)
            .contains(&self.check_interval_minutes)
        {
            return Err(NewsError::Config(format!(
                "check_interval_minutes must be between {MIN_CHECK_INTERVAL_MINUTES} and {MAX_CHECK_INTERVAL_MINUTES}, got {}",
                self.check_interval_minutes
            )));
        }
        if !CONTENT_LENGTH_RANGE.contains(&self.max_content_length) {
            return Err(NewsError::Config(format!(
                "max_content_length must be between {} and {}, got {}",
                CONTENT_LENGTH_RANGE.start(),
                CONTENT_LENGTH_RANGE.end(),
                self.max_content_length
            )));
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(NewsError::Config("timeouts must be greater than zero".to_string()));
        }
        if self.embed.color > MAX_EMBED_COLOR {
            return Err(NewsError::Config(format!(
                "embed color {:#x} is not a 24-bit RGB value",
                self.embed.color
            )));
        }

        check_url("listing_url", &self.listing_url)?;
        match (&self.webhook_url, dry_run) {
            (Some(webhook), _) => check_url("webhook_url", webhook)?,
            (None, true) => {}
            (None, false) => {
                return Err(NewsError::Config(
                    "webhook_url is required unless --dry-run is set".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.saturating_mul(60))
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

fn check_url(field: &str, value: &str) -> Result<(), NewsError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| NewsError::Config(format!("{field} `{value}` is not a valid URL: {e}")))
}
