//! Pluggable section summarization.

use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use std::sync::LazyLock;

static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?](\s+|$)").unwrap());

#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    /// Summarize one section. `hint` is the category's summary style.
    async fn summarize(&self, text: &str, hint: &str) -> Result<String, String>;
}

/// Keeps the leading sentences of a section. Needs no network access.
pub struct ExtractiveSummarizer {
    max_sentences: usize,
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self { max_sentences: 2 }
    }
}

impl ExtractiveSummarizer {
    pub fn new(max_sentences: usize) -> Self {
        Self {
            max_sentences: max_sentences.max(1),
        }
    }
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    fn name(&self) -> &str {
        "extractive"
    }

    async fn summarize(&self, text: &str, _hint: &str) -> Result<String, String> {
        let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.is_empty() {
            return Err("section has no text to summarize".to_string());
        }
        let end = SENTENCE_END_RE
            .find_iter(&flat)
            .nth(self.max_sentences - 1)
            .map(|m| m.start() + 1)
            .unwrap_or(flat.len());
        Ok(flat[..end].to_string())
    }
}

/// Summarizer for a configured provider name. `none` and unknown providers yield `None`.
pub fn from_provider(provider: &str) -> Option<Arc<dyn Summarizer>> {
    match provider.trim().to_lowercase().as_str() {
        "none" | "" => None,
        "extractive" => Some(Arc::new(ExtractiveSummarizer::default())),
        other => {
            log::warn!(
                "[PIPELINE] AI provider '{}' is not available; content summarization disabled",
                other
            );
            None
        }
    }
}
