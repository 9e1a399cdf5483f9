//! Data models passed between the pipeline stages.
//!
//! - [`ListingItem`]: the newest entry found on the news listing page
//! - [`NewsPost`]: a fully extracted article, ready for the publisher

/// The newest article as advertised on the listing page.
///
/// Produced once per poll. Only `link` outlives the tick, inside the
/// [`FreshnessTracker`](crate::freshness::FreshnessTracker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    /// Headline text, trimmed of surrounding whitespace.
    pub title: String,
    /// Absolute article URL.
    pub link: String,
    /// Preview image URL, or an empty string when the item has none.
    pub image: String,
}

impl ListingItem {
    /// Marker value used in place of every field of the sentinel item.
    pub const UNKNOWN: &'static str = "None";

    /// Placeholder item returned when the listing page cannot be understood.
    ///
    /// Every field is the literal string `"None"`, so link comparison keeps
    /// working even though nothing real was found.
    pub fn unknown() -> Self {
        Self {
            title: Self::UNKNOWN.to_string(),
            link: Self::UNKNOWN.to_string(),
            image: Self::UNKNOWN.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self == &Self::unknown()
    }
}

/// An article ready to be handed to a [`Publisher`](crate::publish::Publisher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsPost {
    pub title: String,
    pub link: String,
    pub image: String,
    /// Trimmed body text. Empty when extraction failed.
    pub content: String,
}

impl NewsPost {
    pub fn new(item: ListingItem, content: String) -> Self {
        Self {
            title: item.title,
            link: item.link,
            image: item.image,
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_item_uses_none_markers() {
        let item = ListingItem::unknown();
        assert_eq!(item.title, "None");
        assert_eq!(item.link, "None");
        assert_eq!(item.image, "None");
        assert!(item.is_unknown());
    }

    #[test]
    fn test_real_item_is_not_unknown() {
        let item = ListingItem {
            title: "Patch 1.2".to_string(),
            link: "https://tanki.su/ru/news/123/".to_string(),
            image: String::new(),
        };
        assert!(!item.is_unknown());
    }

    #[test]
    fn test_news_post_from_item() {
        let item = ListingItem {
            title: "Patch 1.2".to_string(),
            link: "https://tanki.su/ru/news/123/".to_string(),
            image: "http://cdn.example.com/a.png".to_string(),
        };
        let post = NewsPost::new(item, "Body".to_string());
        assert_eq!(post.title, "Patch 1.2");
        assert_eq!(post.link, "https://tanki.su/ru/news/123/");
        assert_eq!(post.image, "http://cdn.example.com/a.png");
        assert_eq!(post.content, "Body");
    }
}
