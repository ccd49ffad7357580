//! Offline summarizer that narrates the opening of the article itself.
//!
//! Used when no language model is configured: markup is stripped, the first
//! few sentences are kept, and the result is capped to a length that reads
//! in well under a minute.

use anyhow::Result;
use async_trait::async_trait;
use scraper::{ElementRef, Html};

use super::Summarizer;

/// Default number of sentences kept
pub const DEFAULT_SENTENCES: usize = 3;

/// Default character cap on the narration
pub const DEFAULT_MAX_CHARS: usize = 500;

/// Summarizer that keeps the leading sentences of the cleaned text
#[derive(Debug, Clone)]
pub struct ExcerptSummarizer {
    sentences: usize,
    max_chars: usize,
}

impl Default for ExcerptSummarizer {
    fn default() -> Self {
        Self::new(DEFAULT_SENTENCES, DEFAULT_MAX_CHARS)
    }
}

impl ExcerptSummarizer {
    pub fn new(sentences: usize, max_chars: usize) -> Self {
        Self {
            sentences: sentences.max(1),
            max_chars: max_chars.max(1),
        }
    }
}

#[async_trait]
impl Summarizer for ExcerptSummarizer {
    fn name(&self) -> &str {
        "excerpt"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let clean = strip_markup(text);
        if clean.is_empty() {
            anyhow::bail!("Nothing left to narrate after removing markup");
        }

        let excerpt = leading_sentences(&clean, self.sentences);
        Ok(truncate_on_word(excerpt, self.max_chars).to_string())
    }
}

/// Elements whose text is never narrated
const SILENT_ELEMENTS: &[&str] = &["script", "style", "template", "noscript", "svg"];

/// Elements that end a run of text; their closing becomes a word break
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote",
    "section", "article", "figure", "figcaption", "tr", "td", "th",
];

/// Parse an HTML fragment into plain text with collapsed whitespace.
///
/// Entities are decoded by the parser; script and style bodies are dropped.
pub fn strip_markup(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);

    let mut text = String::with_capacity(raw.len());
    collect_text(fragment.root_element(), &mut text);

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SILENT_ELEMENTS.contains(&name) {
        return;
    }

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }

    if BLOCK_ELEMENTS.contains(&name) {
        out.push(' ');
    }
}

/// Return the prefix of `text` holding at most `count` sentences
fn leading_sentences(text: &str, count: usize) -> &str {
    let mut seen = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if at_boundary {
                seen += 1;
                if seen == count {
                    return &text[..idx + c.len_utf8()];
                }
            }
        }
    }

    text
}

/// Cap `text` at `max_chars` characters, backing off to the last word break
fn truncate_on_word(text: &str, max_chars: usize) -> &str {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };

    let head = &text[..cut];
    match head.rfind(char::is_whitespace) {
        Some(space) if space > 0 => head[..space].trim_end(),
        _ => head,
    }
}
