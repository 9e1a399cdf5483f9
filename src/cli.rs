//! Command-line interface definitions.
//!
//! Every option can also come from an environment variable. Values given
//! here override the YAML config file.

use clap::Parser;

/// Relay new articles from the Tanki news page to a Discord channel.
///
/// # Examples
///
/// ```sh
/// # Poll every 10 minutes and post to a webhook
/// tanki_news_relay --webhook-url https://discord.com/api/webhooks/... -i 10
///
/// # Check once and print what would be posted
/// tanki_news_relay --once --dry-run
///
/// # Use a config file and keep an error log on disk
/// tanki_news_relay -c relay.yaml --log-dir ./logs
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "NEWS_CONFIG")]
    pub config: Option<String>,

    /// Discord webhook URL of the destination channel
    #[arg(long, env = "DISCORD_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Minutes between checks (minimum 5)
    #[arg(short = 'i', long, env = "CHECK_INTERVAL_MINUTES")]
    pub interval_minutes: Option<u64>,

    /// Maximum characters of article text per post (10 to 500)
    #[arg(short = 'l', long, env = "MAX_CONTENT_LENGTH")]
    pub max_content_length: Option<usize>,

    /// Listing page to watch
    #[arg(long, env = "NEWS_LISTING_URL")]
    pub listing_url: Option<String>,

    /// Also write daily-rotated error and success logs to this directory
    #[arg(long, env = "NEWS_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Run a single check and exit
    #[arg(long)]
    pub once: bool,

    /// Log posts instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}
