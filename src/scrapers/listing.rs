//! Listing page scraper.
//!
//! The news index lists articles newest-first, each inside a "preview item"
//! block carrying a title, a relative link, and an image holder whose inline
//! `style` sets a CSS background image:
//!
//! ```html
//! <div class="preview_item">
//!   <a class="preview_link" href="/ru/news/123/">
//!     <span class="preview_image-holder" style="background-image: url('//cdn/a.png')"></span>
//!     <h2 class="preview_title">Patch 1.2</h2>
//!   </a>
//! </div>
//! ```
//!
//! The selectors live in [`SiteLayout`] so a markup change on the site is a
//! config edit rather than a rebuild.

use crate::error::NewsError;
use crate::models::ListingItem;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};
use url::Url;

/// CSS selectors and origin describing the listing page markup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteLayout {
    /// Scheme and host that relative article links are resolved against.
    pub origin: String,
    /// One block per article on the listing page.
    pub item: String,
    /// Headline element inside an item.
    pub title: String,
    /// Element carrying the relative `href` inside an item.
    pub link: String,
    /// Element whose inline `style` holds the preview image.
    pub image_holder: String,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            origin: "https://tanki.su".to_string(),
            item: ".preview_item".to_string(),
            title: ".preview_title".to_string(),
            link: ".preview_link".to_string(),
            image_holder: ".preview_image-holder".to_string(),
        }
    }
}

fn compile(css: &str) -> Result<Selector, NewsError> {
    Selector::parse(css).map_err(|e| NewsError::Config(format!("invalid selector `{css}`: {e}")))
}

/// Compiled form of a [`SiteLayout`].
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    origin: Url,
    item: Selector,
    title: Selector,
    link: Selector,
    image_holder: Selector,
}

impl ListingExtractor {
    /// Compile the layout's selectors and parse its origin.
    ///
    /// # Errors
    ///
    /// Returns [`NewsError::Config`] if a selector does not parse or the
    /// origin is not an absolute URL.
    pub fn new(layout: &SiteLayout) -> Result<Self, NewsError> {
        let origin = Url::parse(&layout.origin)
            .map_err(|e| NewsError::Config(format!("invalid site origin `{}`: {e}", layout.origin)))?;
        Ok(Self {
            origin,
            item: compile(&layout.item)?,
            title: compile(&layout.title)?,
            link: compile(&layout.link)?,
            image_holder: compile(&layout.image_holder)?,
        })
    }

    /// Extract the newest article from a listing page.
    ///
    /// The first element matching the item selector wins.
    ///
    /// # Errors
    ///
    /// [`NewsError::Parse`] when the item, its title, its link element or the
    /// link's `href` is missing. [`NewsError::Value`] when the `href` cannot be
    /// resolved against the origin or resolves to a different scheme or host.
    #[instrument(level = "debug", skip_all, fields(bytes = html.len()))]
    pub fn extract_latest(&self, html: &str) -> Result<ListingItem, NewsError> {
        let document = Html::parse_document(html);

        let item = document
            .select(&self.item)
            .next()
            .ok_or_else(|| NewsError::Parse("no preview item on listing page".to_string()))?;

        let title = item
            .select(&self.title)
            .next()
            .ok_or_else(|| NewsError::Parse("preview item has no title".to_string()))?
            .text()
            .collect::<String>()
            .trim()
            .to_string();

        let href = item
            .select(&self.link)
            .next()
            .ok_or_else(|| NewsError::Parse("preview item has no link".to_string()))?
            .value()
            .attr("href")
            .ok_or_else(|| NewsError::Parse("preview link has no href".to_string()))?;

        let resolved = self
            .origin
            .join(href)
            .map_err(|e| NewsError::Value(format!("cannot resolve link `{href}`: {e}")))?;
        if resolved.origin() != self.origin.origin() {
            return Err(NewsError::Value(format!(
                "link `{href}` points outside {}",
                self.origin.origin().ascii_serialization()
            )));
        }
        let link = resolved.to_string();

        let image = self.normalize_image_url(item);

        debug!(%title, %link, %image, "Extracted latest listing item");
        Ok(ListingItem { title, link, image })
    }

    /// Like [`extract_latest`](Self::extract_latest) but logs the failure and
    /// returns [`ListingItem::unknown`] instead.
    pub fn extract_latest_or_unknown(&self, html: &str) -> ListingItem {
        match self.extract_latest(html) {
            Ok(item) => item,
            Err(e) => {
                error!(error = %e, kind = e.kind(), "Listing extraction failed");
                ListingItem::unknown()
            }
        }
    }

    /// Preview image URL of an item, or `""` when it has none.
    pub fn normalize_image_url(&self, item: ElementRef<'_>) -> String {
        let Some(holder) = item.select(&self.image_holder).next() else {
            return String::new();
        };

        let style = holder.value().attr("style").unwrap_or_default();
        if style.trim().is_empty() {
            return String::new();
        }

        match normalize_style(style) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, %style, "Could not read preview image");
                String::new()
            }
        }
    }
}

/// Pull the URL out of an inline `background-image: url(...)` declaration.
///
/// Surrounding quotes are stripped and protocol-relative URLs get an `http:`
/// scheme.
///
/// # Errors
///
/// [`NewsError::Value`] when the style has no `url(` or no closing `)`.
pub fn normalize_style(style: &str) -> Result<String, NewsError> {
    const OPEN: &str = "url(";

    let start = style
        .find(OPEN)
        .map(|i| i + OPEN.len())
        .ok_or_else(|| NewsError::Value(format!("no url( in style `{style}`")))?;
    let end = style[start..]
        .find(')')
        .map(|i| start + i)
        .ok_or_else(|| NewsError::Value(format!("unterminated url( in style `{style}`")))?;

    let url = style[start..end]
        .trim()
        .trim_matches('"')
        .trim_matches('\'');

    if url.starts_with("//") {
        Ok(format!("http:{url}"))
    } else {
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <div class="preview_item">
            <a class="preview_link" href="/ru/news/123/">
              <span class="preview_image-holder" style="background-image: url('//cdn.tanki.su/a.png');"></span>
              <h2 class="preview_title">
                Patch 1.2
              </h2>
            </a>
          </div>
          <div class="preview_item">
            <a class="preview_link" href="/ru/news/122/">
              <h2 class="preview_title">Older news</h2>
            </a>
          </div>
        </body></html>
    "#;

    fn extractor() -> ListingExtractor {
        ListingExtractor::new(&SiteLayout::default()).unwrap()
    }

    #[test]
    fn test_extract_latest_picks_first_item() {
        let item = extractor().extract_latest(LISTING).unwrap();
        assert_eq!(item.title, "Patch 1.2");
        assert_eq!(item.link, "https://tanki.su/ru/news/123/");
        assert_eq!(item.image, "http://cdn.tanki.su/a.png");
    }

    #[test]
    fn test_link_is_absolute_under_origin() {
        let item = extractor().extract_latest(LISTING).unwrap();
        assert!(item.link.starts_with("https://tanki.su/"));
    }

    #[test]
    fn test_absolute_href_is_kept() {
        let html = r#"<div class="preview_item">
            <a class="preview_link" href="https://tanki.su/en/news/9/"><b class="preview_title">X</b></a>
        </div>"#;
        let item = extractor().extract_latest(html).unwrap();
        assert_eq!(item.link, "https://tanki.su/en/news/9/");
        assert_eq!(item.image, "");
    }

    #[test]
    fn test_off_origin_href_is_value_error() {
        for href in ["//evil.example/ru/news/1/", "https://cdn.other.net/x/", "http://tanki.su/ru/news/1/"] {
            let html = format!(
                r#"<div class="preview_item"><a class="preview_link" href="{href}"><b class="preview_title">X</b></a></div>"#
            );
            let result = extractor().extract_latest(&html);
            assert!(matches!(result, Err(NewsError::Value(_))), "href={href}: {result:?}");
        }
    }

    #[test]
    fn test_off_origin_href_gives_sentinel() {
        let html = r#"<div class="preview_item"><a class="preview_link" href="//evil.example/ru/news/1/"><b class="preview_title">X</b></a></div>"#;
        assert!(extractor().extract_latest_or_unknown(html).is_unknown());
    }

    #[test]
    fn test_missing_item_is_parse_error() {
        let err = extractor().extract_latest("<html><body><p>maintenance</p></body></html>").unwrap_err();
        assert!(matches!(err, NewsError::Parse(_)));
    }

    #[test]
    fn test_missing_href_is_parse_error() {
        let html = r#"<div class="preview_item"><a class="preview_link"><b class="preview_title">X</b></a></div>"#;
        let err = extractor().extract_latest(html).unwrap_err();
        assert!(matches!(err, NewsError::Parse(_)));
    }

    #[test]
    fn test_missing_title_is_parse_error() {
        let html = r#"<div class="preview_item"><a class="preview_link" href="/ru/news/1/"></a></div>"#;
        let err = extractor().extract_latest(html).unwrap_err();
        assert!(matches!(err, NewsError::Parse(_)));
    }

    #[test]
    fn test_or_unknown_returns_sentinel() {
        let item = extractor().extract_latest_or_unknown("");
        assert!(item.is_unknown());
    }

    #[test]
    fn test_holder_without_style_gives_empty_image() {
        let html = r#"<div class="preview_item">
            <a class="preview_link" href="/ru/news/5/"><span class="preview_image-holder"></span><b class="preview_title">X</b></a>
        </div>"#;
        let item = extractor().extract_latest(html).unwrap();
        assert_eq!(item.image, "");
    }

    #[test]
    fn test_holder_with_broken_style_gives_empty_image() {
        let html = r#"<div class="preview_item">
            <a class="preview_link" href="/ru/news/5/"><span class="preview_image-holder" style="color: red"></span><b class="preview_title">X</b></a>
        </div>"#;
        let item = extractor().extract_latest(html).unwrap();
        assert_eq!(item.image, "");
    }

    #[test]
    fn test_custom_layout() {
        let layout = SiteLayout {
            origin: "https://example.com".to_string(),
            item: "article.card".to_string(),
            title: "h3".to_string(),
            link: "a".to_string(),
            image_holder: ".thumb".to_string(),
        };
        let html = r#"<article class="card"><a href="/n/1"><h3>Hello</h3></a><div class="thumb" style="background:url(/img/1.jpg)"></div></article>"#;
        let item = ListingExtractor::new(&layout).unwrap().extract_latest(html).unwrap();
        assert_eq!(item.title, "Hello");
        assert_eq!(item.link, "https://example.com/n/1");
        assert_eq!(item.image, "/img/1.jpg");
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let layout = SiteLayout {
            item: "[[[".to_string(),
            ..SiteLayout::default()
        };
        assert!(matches!(ListingExtractor::new(&layout), Err(NewsError::Config(_))));
    }

    #[test]
    fn test_normalize_protocol_relative() {
        assert_eq!(
            normalize_style("background-image:url(//example.com/a.png)").unwrap(),
            "http://example.com/a.png"
        );
    }

    #[test]
    fn test_normalize_strips_quotes() {
        assert_eq!(
            normalize_style(r#"background-image: url("https://example.com/b.jpg")"#).unwrap(),
            "https://example.com/b.jpg"
        );
        assert_eq!(
            normalize_style("background-image: url('https://example.com/c.jpg')").unwrap(),
            "https://example.com/c.jpg"
        );
    }

    #[test]
    fn test_normalize_uses_first_url() {
        assert_eq!(
            normalize_style("background: url(//a.com/1.png), url(//b.com/2.png)").unwrap(),
            "http://a.com/1.png"
        );
    }

    #[test]
    fn test_normalize_rejects_missing_url() {
        assert!(matches!(normalize_style("color: red"), Err(NewsError::Value(_))));
        assert!(matches!(normalize_style("background: url(//a.com/1.png"), Err(NewsError::Value(_))));
    }
}
