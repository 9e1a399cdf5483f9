//! Article body extraction.
//!
//! Paragraph text is collected in document order and trimmed to a character
//! budget. Hyperlinks are kept as raw URLs: before trimming, each link's
//! visible text is swapped for a `__LINK{n}__` token; after trimming, the
//! surviving tokens are swapped back for the link's `href`. A token cut by
//! the trim is dropped so no half-restored marker reaches the channel, and a
//! restored URL that would overrun the budget is left out entirely.
//!
//! Substitution matches the link's *visible text*, first occurrence within
//! its paragraph. If the same words appear earlier in the paragraph, that
//! earlier occurrence is the one replaced.

use crate::utils::char_boundary;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("static selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"__LINK\d+__").expect("static regex"));

/// Hrefs for one extraction call; the token index is the position.
#[derive(Debug, Default)]
struct LinkPlaceholders {
    hrefs: Vec<String>,
}

impl LinkPlaceholders {
    /// Allocate the next token for `href`. Numbering is global to the document.
    fn push(&mut self, href: &str) -> String {
        let token = format!("__LINK{}__", self.hrefs.len());
        self.hrefs.push(href.to_string());
        token
    }

    fn href(&self, token: &str) -> Option<&str> {
        token
            .strip_prefix("__LINK")?
            .strip_suffix("__")?
            .parse::<usize>()
            .ok()
            .and_then(|i| self.hrefs.get(i))
            .map(String::as_str)
    }

    /// Replace every token in `text` with its href, keeping the result within
    /// `max_length` characters.
    ///
    /// A URL that does not fit is dropped whole along with the rest of the
    /// text, so the output never ends in half a URL. Tokens with no recorded
    /// href are dropped.
    fn restore(&self, text: &str, max_length: usize) -> String {
        let mut out = String::with_capacity(text.len());
        let mut budget = max_length;
        let mut rest = 0;
        for m in TOKEN.find_iter(text) {
            if !push_within(&mut out, &text[rest..m.start()], &mut budget) {
                return out;
            }
            let href = self.href(m.as_str()).unwrap_or_default();
            let chars = href.chars().count();
            if chars > budget {
                return out;
            }
            out.push_str(href);
            budget -= chars;
            rest = m.end();
        }
        push_within(&mut out, &text[rest..], &mut budget);
        out
    }
}

/// Append as much of `piece` as `budget` allows. True when all of it fit.
fn push_within(out: &mut String, piece: &str, budget: &mut usize) -> bool {
    let end = char_boundary(piece, *budget);
    out.push_str(&piece[..end]);
    *budget -= piece[..end].chars().count();
    end == piece.len()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extract trimmed article text from an article page.
///
/// The result never exceeds `max_length` characters and never contains a
/// placeholder token. Pure: identical input gives identical output.
#[instrument(level = "debug", skip_all, fields(bytes = html.len(), max_length = max_length))]
pub fn extract_content(html: &str, max_length: usize) -> String {
    let document = Html::parse_document(html);
    let mut placeholders = LinkPlaceholders::default();

    let paragraphs: Vec<String> = document
        .select(&PARAGRAPH)
        .map(|p| {
            let mut text = element_text(p);
            for anchor in p.select(&ANCHOR) {
                let href = anchor.value().attr("href").unwrap_or_default();
                let visible = element_text(anchor);
                let token = placeholders.push(href);
                if !visible.is_empty() {
                    text = text.replacen(visible.as_str(), &token, 1);
                }
            }
            text
        })
        .collect();

    let joined = paragraphs.join("\n");
    let trimmed = trim_placeholders(&joined, max_length);
    let content = placeholders.restore(trimmed, max_length);

    debug!(
        paragraphs = paragraphs.len(),
        links = placeholders.hrefs.len(),
        chars = content.chars().count(),
        "Extracted article content"
    );
    content
}

/// Cut `text` to `max_length` characters, then drop a token left at the end.
///
/// A token counts as left at the end when the cut falls inside it or right
/// after it.
fn trim_placeholders(text: &str, max_length: usize) -> &str {
    let cut = char_boundary(text, max_length);
    let end = TOKEN
        .find_iter(text)
        .find(|m| m.start() < cut && cut <= m.end())
        .map(|m| m.start())
        .unwrap_or(cut);
    &text[..end]
}
