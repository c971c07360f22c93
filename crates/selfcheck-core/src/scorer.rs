//! Consistency scoring and aggregation.
//!
//! The scorer is a tagged variant selected once at pipeline
//! construction. The primary strategy consults each sampled passage
//! independently; the fallback compares against the concatenated
//! samples and never fails. Both report which mode actually ran so
//! degraded items are visible in the output, not just in logs.

use std::collections::HashSet;
use thiserror::Error;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

use crate::types::{ScorerMode, Sentence};

/// Score recorded when a sentence cannot be scored at all: "unknown",
/// not "supported" and not "hallucinated".
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Errors a support estimator may report for a single
/// sentence/sample pair.
#[derive(Error, Debug)]
pub enum SupportError {
    #[error("support estimation failed: {0}")]
    Estimator(String),
}

/// Estimates how well a single sampled passage supports a sentence.
///
/// Returns support in [0,1]: 1.0 means fully entailed by the sample,
/// 0.0 means unrelated or contradicted. A model-backed estimator
/// (NLI, QA, an LLM judge) plugs in here; the shipped
/// [`LexicalSupport`] is deterministic and dependency-free.
pub trait SupportModel: Send + Sync {
    fn support(&self, sentence: &str, sample: &str) -> Result<f64, SupportError>;
}

/// Case-folded content-word containment: the fraction of the
/// sentence's word tokens that appear in the sample. UAX #29 word
/// boundaries tokenize CJK ideographs one per character, so unspaced
/// Chinese text works without a dedicated tokenizer.
pub struct LexicalSupport;

impl SupportModel for LexicalSupport {
    fn support(&self, sentence: &str, sample: &str) -> Result<f64, SupportError> {
        Ok(containment(sentence, sample))
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}

fn containment(needle: &str, haystack: &str) -> f64 {
    let needle_tokens = tokens(needle);
    if needle_tokens.is_empty() {
        return 0.0;
    }
    let haystack_tokens: HashSet<String> = tokens(haystack).into_iter().collect();
    let hits = needle_tokens
        .iter()
        .filter(|t| haystack_tokens.contains(*t))
        .count();
    hits as f64 / needle_tokens.len() as f64
}

fn clamp01(score: f64) -> f64 {
    score.clamp(0.0, 1.0)
}

/// Outcome of scoring one item.
#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    /// One score per sentence, aligned by index, each in [0,1].
    pub scores: Vec<f64>,

    /// Which strategy actually ran.
    pub mode: ScorerMode,

    /// Sentences that received the neutral score because estimation
    /// failed for them.
    pub degraded: usize,
}

/// The consistency scorer: primary (sample-by-sample support
/// estimation) or fallback (lexical overlap), chosen once at
/// pipeline construction rather than per call.
pub enum Scorer {
    Primary(PrimaryScorer),
    Fallback(FallbackScorer),
}

impl Scorer {
    /// Primary strategy with the deterministic lexical estimator.
    pub fn primary() -> Self {
        Self::Primary(PrimaryScorer::new(Box::new(LexicalSupport)))
    }

    /// Primary strategy with a custom support estimator.
    pub fn primary_with_model(model: Box<dyn SupportModel>) -> Self {
        Self::Primary(PrimaryScorer::new(model))
    }

    /// Fallback-only scorer.
    pub fn fallback() -> Self {
        Self::Fallback(FallbackScorer)
    }

    /// Score each sentence against the sampled passages.
    ///
    /// Never fails. The primary variant requires samples; without
    /// them it runs fallback semantics and reports
    /// [`ScorerMode::Fallback`].
    pub fn score(&self, sentences: &[Sentence], sampled_passages: &[String]) -> ScoreOutcome {
        match self {
            Scorer::Primary(primary) if !sampled_passages.is_empty() => {
                primary.score(sentences, sampled_passages)
            }
            Scorer::Primary(_) => FallbackScorer.score(sentences, sampled_passages),
            Scorer::Fallback(fallback) => fallback.score(sentences, sampled_passages),
        }
    }
}

/// Sample-by-sample consistency estimation: the more samples fail to
/// support a sentence, the higher its score.
pub struct PrimaryScorer {
    model: Box<dyn SupportModel>,
}

impl PrimaryScorer {
    pub fn new(model: Box<dyn SupportModel>) -> Self {
        Self { model }
    }

    fn score(&self, sentences: &[Sentence], sampled_passages: &[String]) -> ScoreOutcome {
        let mut degraded = 0;
        let scores = sentences
            .iter()
            .map(|sentence| match self.score_sentence(sentence, sampled_passages) {
                Ok(score) => score,
                Err(e) => {
                    // One bad sentence never aborts the item.
                    degraded += 1;
                    warn!(
                        index = sentence.index,
                        error = %e,
                        "sentence scoring failed, substituting neutral score"
                    );
                    NEUTRAL_SCORE
                }
            })
            .collect();

        ScoreOutcome {
            scores,
            mode: ScorerMode::Primary,
            degraded,
        }
    }

    fn score_sentence(
        &self,
        sentence: &Sentence,
        sampled_passages: &[String],
    ) -> Result<f64, SupportError> {
        if tokens(&sentence.text).is_empty() {
            return Ok(NEUTRAL_SCORE);
        }
        let mut total = 0.0;
        for sample in sampled_passages {
            let support = self.model.support(&sentence.text, sample)?;
            total += 1.0 - clamp01(support);
        }
        Ok(clamp01(total / sampled_passages.len() as f64))
    }
}

/// Lexical overlap against the concatenation of all samples. With no
/// samples at all, every sentence gets the neutral score.
pub struct FallbackScorer;

impl FallbackScorer {
    fn score(&self, sentences: &[Sentence], sampled_passages: &[String]) -> ScoreOutcome {
        let scores = if sampled_passages.is_empty() {
            vec![NEUTRAL_SCORE; sentences.len()]
        } else {
            let corpus = sampled_passages.join("\n");
            sentences
                .iter()
                .map(|sentence| {
                    if tokens(&sentence.text).is_empty() {
                        NEUTRAL_SCORE
                    } else {
                        clamp01(1.0 - containment(&sentence.text, &corpus))
                    }
                })
                .collect()
        };

        ScoreOutcome {
            scores,
            mode: ScorerMode::Fallback,
            degraded: 0,
        }
    }
}

/// Reduce per-sentence scores to an item-level score: arithmetic
/// mean. An empty vector is unreachable through the segmenter but
/// still defined: it aggregates to 0.0 and the caller flags the item
/// degenerate.
pub fn aggregate(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}
