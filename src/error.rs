//! Typed failures for the fetch → extract → publish pipeline.
//!
//! Every variant is recoverable: the poller logs it and waits for the next
//! tick. Only configuration errors abort startup.

use thiserror::Error;

/// Errors raised by the news pipeline.
#[derive(Debug, Error)]
pub enum NewsError {
    /// The HTTP request failed, timed out, or returned a non-success status.
    #[error("network failure for {url}: {reason}")]
    Network { url: String, reason: String },

    /// An expected structural element is missing from a page.
    #[error("parse failure: {0}")]
    Parse(String),

    /// A value was present but had an unexpected shape.
    #[error("value failure: {0}")]
    Value(String),

    /// The destination channel rejected or never received the post.
    #[error("publish failure: {0}")]
    Publish(String),

    /// Invalid or missing configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl NewsError {
    pub fn network(url: &str, reason: impl ToString) -> Self {
        Self::Network {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Short, stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Parse(_) => "parse",
            Self::Value(_) => "value",
            Self::Publish(_) => "publish",
            Self::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_display() {
        let err = NewsError::network("https://tanki.su/ru/news/", "connection refused");
        assert_eq!(
            err.to_string(),
            "network failure for https://tanki.su/ru/news/: connection refused"
        );
        assert_eq!(err.kind(), "network");
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(NewsError::Parse("x".into()).kind(), "parse");
        assert_eq!(NewsError::Value("x".into()).kind(), "value");
        assert_eq!(NewsError::Publish("x".into()).kind(), "publish");
        assert_eq!(NewsError::Config("x".into()).kind(), "config");
    }
}
