//! Remembers the last article link handed to the publisher.
//!
//! State lives for the life of the process only. It starts empty, so the
//! first article seen after startup is always published.

use tracing::debug;

#[derive(Debug, Default)]
pub struct FreshnessTracker {
    last_published_link: Option<String>,
}

impl FreshnessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` unless `link` equals the last published link exactly.
    pub fn is_new(&self, link: &str) -> bool {
        self.last_published_link.as_deref() != Some(link)
    }

    pub fn mark_published(&mut self, link: &str) {
        debug!(%link, previous = ?self.last_published_link, "Marking link as published");
        self.last_published_link = Some(link.to_string());
    }

    pub fn last_published(&self) -> Option<&str> {
        self.last_published_link.as_deref()
    }

    /// Check `link` and, if it is new, mark it published in the same step.
    ///
    /// Marking happens before the article body is fetched, so a failure
    /// later in the tick does not cause a second attempt on the next tick.
    pub fn observe(&mut self, link: &str) -> bool {
        if self.is_new(link) {
            self.mark_published(link);
            true
        } else {
            false
        }
    }
}
