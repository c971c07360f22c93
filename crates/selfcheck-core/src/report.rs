//! Report writing.
//!
//! The JSON schema emitted here is the contract consumed by
//! downstream tooling: per-item `item_id`, `scores`,
//! `aggregate_score`, `verdict`, `scorer_mode`, plus a run-level
//! summary. A plain-text rendering is available for quick reading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::types::{ItemResult, Verdict};

/// Per-verdict counts and mean aggregate score, derived from the
/// results and never stored independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub pass: usize,
    pub fail: usize,
    pub ambiguous: usize,
    pub mean_aggregate_score: f64,
}

impl RunSummary {
    pub fn from_results(results: &[ItemResult]) -> Self {
        let mut summary = RunSummary::default();
        for result in results {
            match result.verdict {
                Verdict::Pass => summary.pass += 1,
                Verdict::Fail => summary.fail += 1,
                Verdict::Ambiguous => summary.ambiguous += 1,
            }
        }
        if !results.is_empty() {
            summary.mean_aggregate_score =
                results.iter().map(|r| r.aggregate_score).sum::<f64>() / results.len() as f64;
        }
        summary
    }
}

/// A full run report: results in input order plus the derived
/// summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub summary: RunSummary,
    pub results: Vec<ItemResult>,
}

impl Report {
    pub fn new(results: Vec<ItemResult>) -> Self {
        Self {
            generated_at: Utc::now(),
            summary: RunSummary::from_results(&results),
            results,
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text rendering of the report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "selfcheck results ({})", self.generated_at.to_rfc3339());
        let _ = writeln!(
            out,
            "PASS {}  FAIL {}  AMBIGUOUS {}  mean score {:.3}",
            self.summary.pass,
            self.summary.fail,
            self.summary.ambiguous,
            self.summary.mean_aggregate_score
        );
        let _ = writeln!(out, "---");
        for result in &self.results {
            let _ = writeln!(
                out,
                "{}\t{}\t{:.3}\t{}\tscores: {:?}",
                result.item_id,
                result.verdict,
                result.aggregate_score,
                result.scorer_mode,
                result.scores
            );
        }
        out
    }
}
