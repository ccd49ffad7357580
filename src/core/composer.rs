//! Narration composer.
//!
//! Turns a feed item into a short script for the speech engine: the raw
//! summary goes through the summarizer, and the result is placed after the
//! headline using a template with `{title}` and `{summary}` placeholders.

use std::sync::Arc;

use tracing::debug;

use crate::adapters::Summarizer;
use crate::domain::PipelineError;

/// Headline first, then the details
pub const DEFAULT_TEMPLATE: &str = "Haberin başlığı: {title}. Detaylar şöyle: {summary}";

pub struct NarrationComposer {
    summarizer: Arc<dyn Summarizer>,
    template: String,
}

impl NarrationComposer {
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            summarizer,
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// Use a different script template
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Produce a trimmed, non-empty narration script for an item
    pub async fn compose(&self, title: &str, raw_summary: &str) -> Result<String, PipelineError> {
        let summary = self
            .summarizer
            .summarize(raw_summary)
            .await
            .map_err(|e| PipelineError::SummarizationFailed(PipelineError::describe(&e)))?;

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(PipelineError::SummarizationFailed(format!(
                "{} returned an empty narration",
                self.summarizer.name()
            )));
        }

        let script = render(&self.template, title, summary);

        debug!(
            summarizer = self.summarizer.name(),
            chars = script.chars().count(),
            "Composed narration"
        );
        Ok(script)
    }
}

/// Fill the template; an item without a headline narrates the summary alone
fn render(template: &str, title: &str, summary: &str) -> String {
    let title = title.trim().trim_end_matches(['.', '!', '?']).trim_end();
    if title.is_empty() {
        return summary.to_string();
    }

    template
        .replace("{title}", title)
        .replace("{summary}", summary)
        .trim()
        .to_string()
}
