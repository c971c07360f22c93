//! Sentence segmentation.
//!
//! Splitting never fails: when the linguistic backend is unavailable
//! or produces nothing, a rule-based splitter on terminal punctuation
//! takes over. The backend is an injected dependency constructed once
//! by the pipeline, not hidden process-global state.

use lazy_static::lazy_static;
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

use crate::types::Sentence;

lazy_static! {
    /// One sentence chunk: text up to and including a run of terminal
    /// punctuation (`.` `!` `?` and the CJK fullwidth equivalents).
    static ref SENTENCE_CHUNK: Regex = Regex::new(r"[^.!?。！？]+[.!?。！？]*").unwrap();
}

/// Errors a segmentation backend may report. All of them are
/// recovered by falling back to rule-based splitting.
#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("segmentation backend failed: {0}")]
    Backend(String),
}

/// A linguistic sentence-boundary backend.
///
/// Implementations may fail or return nothing; the [`Segmenter`]
/// treats either as a signal to degrade, never as a hard error.
pub trait SentenceSplitter: Send + Sync {
    fn split(&self, text: &str) -> Result<Vec<String>, SegmentError>;
}

/// Default backend: UAX #29 sentence boundaries.
pub struct UnicodeSplitter;

impl SentenceSplitter for UnicodeSplitter {
    fn split(&self, text: &str) -> Result<Vec<String>, SegmentError> {
        Ok(text
            .unicode_sentences()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

/// Splits passages into ordered sentences.
pub struct Segmenter {
    backend: Option<Box<dyn SentenceSplitter>>,
    backend_warned: AtomicBool,
}

impl Segmenter {
    /// Segmenter with the default UAX #29 backend.
    pub fn new() -> Self {
        Self::with_backend(Box::new(UnicodeSplitter))
    }

    /// Segmenter that only uses rule-based splitting.
    pub fn rule_based() -> Self {
        Self {
            backend: None,
            backend_warned: AtomicBool::new(false),
        }
    }

    /// Segmenter with a custom linguistic backend.
    pub fn with_backend(backend: Box<dyn SentenceSplitter>) -> Self {
        Self {
            backend: Some(backend),
            backend_warned: AtomicBool::new(false),
        }
    }

    /// Split a passage into sentences.
    ///
    /// Guarantees: at least one sentence for non-empty input,
    /// contiguous indices from 0, and the concatenated sentence texts
    /// carry all of the input's content (modulo whitespace).
    pub fn segment(&self, passage: &str) -> Vec<Sentence> {
        let passage = passage.trim();
        if passage.is_empty() {
            return Vec::new();
        }

        let texts = match &self.backend {
            Some(backend) => match backend.split(passage) {
                Ok(texts) if !texts.is_empty() => texts,
                Ok(_) => {
                    self.warn_once("backend returned no sentences");
                    rule_split(passage)
                }
                Err(e) => {
                    self.warn_once(&e.to_string());
                    rule_split(passage)
                }
            },
            None => rule_split(passage),
        };

        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Sentence { index, text })
            .collect()
    }

    fn warn_once(&self, reason: &str) {
        if !self.backend_warned.swap(true, Ordering::Relaxed) {
            warn!(reason, "sentence backend degraded, using rule-based splitting");
        }
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Rule-based splitting on terminal punctuation, terminator kept
/// attached. Input that is nothing but punctuation comes back as a
/// single sentence so the non-empty guarantee holds.
fn rule_split(text: &str) -> Vec<String> {
    let chunks: Vec<String> = SENTENCE_CHUNK
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if chunks.is_empty() {
        vec![text.to_string()]
    } else {
        chunks
    }
}
