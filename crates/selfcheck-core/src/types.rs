//! Core data model: items under evaluation and their results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference labels attached to an item.
///
/// Labels are matched case-insensitively as substrings; `true` labels
/// indicate a correct answer, `false` labels an incorrect or
/// hallucinated one. On the wire the fields are literally
/// `metadata.true` and `metadata.false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Tokens or phrases indicating a correct answer.
    #[serde(rename = "true", default)]
    pub true_labels: Vec<String>,

    /// Tokens or phrases indicating an incorrect answer.
    #[serde(rename = "false", default)]
    pub false_labels: Vec<String>,
}

/// One evaluation unit: a passage under test plus independently
/// sampled alternative generations for the same prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Stable identifier. Items without one get a positional id
    /// assigned by the pipeline.
    #[serde(default)]
    pub id: String,

    /// The text under test. Absent or blank passages are recorded as
    /// degraded results rather than aborting the run.
    #[serde(default)]
    pub passage: Option<String>,

    /// Alternative generations for the same prompt, in sampling
    /// order. Empty is valid input and forces fallback scoring.
    #[serde(default)]
    pub sampled_passages: Vec<String>,

    /// Reference labels for verdict inference.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Item {
    /// The passage, if present and non-blank.
    pub fn passage(&self) -> Option<&str> {
        self.passage
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// A sentence produced by segmentation. Fresh per item, never
/// mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Position in the segmentation order, contiguous from 0.
    pub index: usize,

    /// The sentence text, whitespace-trimmed.
    pub text: String,
}

/// Final classification for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
    Ambiguous,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail => write!(f, "FAIL"),
            Verdict::Ambiguous => write!(f, "AMBIGUOUS"),
        }
    }
}

/// Which scoring strategy actually ran for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScorerMode {
    Primary,
    Fallback,
}

impl fmt::Display for ScorerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScorerMode::Primary => write!(f, "PRIMARY"),
            ScorerMode::Fallback => write!(f, "FALLBACK"),
        }
    }
}

/// The per-item result, immutable after creation. Serializes to the
/// report schema consumed by downstream tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResult {
    pub item_id: String,

    /// Per-sentence hallucination-likelihood scores, aligned to
    /// segmentation order. Empty when the item could not be scored.
    pub scores: Vec<f64>,

    /// Arithmetic mean of `scores` (0.0 when no scores exist).
    pub aggregate_score: f64,

    pub verdict: Verdict,
    pub scorer_mode: ScorerMode,
}
