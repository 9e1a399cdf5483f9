//! Delivery of new articles to the destination channel.
//!
//! The destination is a Discord channel reached through an incoming webhook.
//! Each article becomes one message with two embeds: the article's preview
//! image on top, then a text card with the headline, the trimmed body, a
//! banner image and a "read more" link back to the site.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ [preview image]              │
//! ├──────────────────────────────┤
//! │ # Patch 1.2                  │
//! │ Body text…                   │
//! │ ### Читать весь пост [тут]   │
//! │ [banner]                     │
//! └──────────────────────────────┘
//! ```
//!
//! In dry-run mode [`LogPublisher`] renders the same text to the log instead.

use crate::error::NewsError;
use crate::models::NewsPost;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Receives each new article. Called at most once per tick.
pub trait Publisher {
    async fn publish(&self, post: &NewsPost) -> Result<(), NewsError>;
}

/// Look of the published message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbedStyle {
    /// Embed side color, `0xRRGGBB`.
    pub color: u32,
    /// Image shown under the text card. Empty to omit.
    pub banner_image: String,
    /// Heading in front of the link back to the article.
    pub read_more_label: String,
    /// Text of the link back to the article.
    pub read_more_link_text: String,
}

impl Default for EmbedStyle {
    fn default() -> Self {
        Self {
            color: 0xff7b19,
            banner_image: "https://i.imgur.com/zSwcRBK.png".to_string(),
            read_more_label: "Читать весь пост".to_string(),
            read_more_link_text: "тут".to_string(),
        }
    }
}

impl EmbedStyle {
    /// Markdown body of the text card.
    pub fn render_description(&self, post: &NewsPost) -> String {
        format!(
            "# {}\n{}\n### {} [{}]({})",
            post.title, post.content, self.read_more_label, self.read_more_link_text, post.link
        )
    }
}

#[derive(Debug, Serialize)]
struct WebhookMessage {
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbedImage {
    url: String,
}

fn embed_image(url: &str) -> Option<EmbedImage> {
    (!url.is_empty()).then(|| EmbedImage {
        url: url.to_string(),
    })
}

fn build_message(style: &EmbedStyle, post: &NewsPost) -> WebhookMessage {
    let image_embed = Embed {
        color: style.color,
        description: None,
        image: embed_image(&post.image),
        timestamp: None,
    };
    let text_embed = Embed {
        color: style.color,
        description: Some(style.render_description(post)),
        image: embed_image(&style.banner_image),
        timestamp: Some(Utc::now().to_rfc3339()),
    };
    WebhookMessage {
        embeds: vec![image_embed, text_embed],
    }
}

/// Posts articles to a Discord webhook.
#[derive(Debug, Clone)]
pub struct DiscordWebhookPublisher {
    client: Client,
    webhook_url: String,
    style: EmbedStyle,
}

impl DiscordWebhookPublisher {
    pub fn new(client: Client, webhook_url: String, style: EmbedStyle) -> Self {
        Self {
            client,
            webhook_url,
            style,
        }
    }
}

impl Publisher for DiscordWebhookPublisher {
    #[instrument(level = "info", skip_all, fields(link = %post.link))]
    async fn publish(&self, post: &NewsPost) -> Result<(), NewsError> {
        let message = build_message(&self.style, post);
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await
            .map_err(|e| NewsError::Publish(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NewsError::Publish(format!(
                "webhook returned {status}: {}",
                crate::utils::truncate_for_log(&body, 200)
            )));
        }

        info!(title = %post.title, "Published article to Discord");
        Ok(())
    }
}

/// Writes articles to the log instead of a channel.
#[derive(Debug, Clone, Default)]
pub struct LogPublisher {
    style: EmbedStyle,
}

impl LogPublisher {
    pub fn new(style: EmbedStyle) -> Self {
        Self { style }
    }
}

impl Publisher for LogPublisher {
    async fn publish(&self, post: &NewsPost) -> Result<(), NewsError> {
        info!(
            link = %post.link,
            image = %post.image,
            description = %self.style.render_description(post),
            "Dry run: article not sent"
        );
        Ok(())
    }
}

/// The publisher chosen at startup.
#[derive(Debug, Clone)]
pub enum Destination {
    Discord(DiscordWebhookPublisher),
    Log(LogPublisher),
}

impl Publisher for Destination {
    async fn publish(&self, post: &NewsPost) -> Result<(), NewsError> {
        match self {
            Self::Discord(publisher) => publisher.publish(post).await,
            Self::Log(publisher) => publisher.publish(post).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn post() -> NewsPost {
        NewsPost {
            title: "Patch 1.2".to_string(),
            link: "https://tanki.su/ru/news/123/".to_string(),
            image: "http://cdn.tanki.su/a.png".to_string(),
            content: "See https://x.com/y now".to_string(),
        }
    }

    #[test]
    fn test_render_description() {
        let description = EmbedStyle::default().render_description(&post());
        assert_eq!(
            description,
            "# Patch 1.2\nSee https://x.com/y now\n### Читать весь пост [тут](https://tanki.su/ru/news/123/)"
        );
    }

    #[test]
    fn test_render_description_with_empty_content() {
        let mut post = post();
        post.content.clear();
        let description = EmbedStyle::default().render_description(&post);
        assert!(description.starts_with("# Patch 1.2\n\n### "));
    }

    #[test]
    fn test_message_has_image_then_text_embed() {
        let message = build_message(&EmbedStyle::default(), &post());
        let json = serde_json::to_value(&message).unwrap();
        let embeds = json["embeds"].as_array().unwrap();
        assert_eq!(embeds.len(), 2);
        assert_eq!(embeds[0]["image"]["url"], "http://cdn.tanki.su/a.png");
        assert_eq!(embeds[0]["color"], 0xff7b19);
        assert!(embeds[0].get("description").is_none());
        assert_eq!(embeds[1]["image"]["url"], "https://i.imgur.com/zSwcRBK.png");
        assert!(embeds[1]["description"].as_str().unwrap().starts_with("# Patch 1.2"));
        assert!(embeds[1]["timestamp"].is_string());
    }

    #[test]
    fn test_missing_image_is_omitted() {
        let mut post = post();
        post.image.clear();
        let message = build_message(&EmbedStyle::default(), &post);
        let json = serde_json::to_value(&message).unwrap();
        assert!(json["embeds"][0].get("image").is_none());
    }

    #[tokio::test]
    async fn test_discord_publisher_posts_embeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/webhooks/1/token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = DiscordWebhookPublisher::new(
            Client::new(),
            format!("{}/api/webhooks/1/token", server.uri()),
            EmbedStyle::default(),
        );
        publisher.publish(&post()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["embeds"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_discord_publisher_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("{\"message\": \"Invalid Form Body\"}"))
            .mount(&server)
            .await;

        let publisher = DiscordWebhookPublisher::new(Client::new(), server.uri(), EmbedStyle::default());
        let err = publisher.publish(&post()).await.unwrap_err();
        assert!(matches!(err, NewsError::Publish(_)));
        assert!(err.to_string().contains("Invalid Form Body"));
    }

    #[tokio::test]
    async fn test_log_publisher_always_succeeds() {
        let publisher = Destination::Log(LogPublisher::default());
        publisher.publish(&post()).await.unwrap();
    }
}
