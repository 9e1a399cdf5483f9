//! Page scrapers for the news site.
//!
//! Scraping happens in two phases, one module each:
//!
//! 1. **Listing** ([`listing`]): find the newest article on the news index
//!    and read its title, absolute link and preview image
//! 2. **Article** ([`article`]): turn the article page into trimmed plain
//!    text with links written out as URLs
//!
//! | Phase | Module | Input | Output |
//! |-------|--------|-------|--------|
//! | Listing | [`listing`] | listing page HTML | [`ListingItem`](crate::models::ListingItem) |
//! | Article | [`article`] | article page HTML | `String` |
//!
//! Both phases tolerate markup drift: missing elements become typed errors
//! or empty strings, never panics.

pub mod article;
pub mod listing;
