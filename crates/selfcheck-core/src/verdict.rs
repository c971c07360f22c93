//! Verdict inference from reference labels and the aggregate score.
//!
//! The decision table is strict and ordered: label evidence first,
//! score second. These rules are the evaluation contract, not a
//! tuning toy:
//!
//! 1. Only true labels match     -> PASS
//! 2. Only false labels match    -> FAIL
//! 3. Mixed match or no match    -> score tie-break, which today
//!    always resolves AMBIGUOUS: contradicting labels are never
//!    overturned by a low score, and with no label evidence the score
//!    alone never produces a verdict.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::Verdict;

/// Which texts labels are matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchScope {
    /// Match labels against the passage only.
    PassageOnly,

    /// Match labels against the passage and all sampled passages.
    #[default]
    PassageAndSamples,
}

/// Classify an item. Pure function: identical inputs always produce
/// the identical verdict.
///
/// `passage` is the matching corpus (the caller widens it to include
/// sampled passages under [`MatchScope::PassageAndSamples`]). Label
/// matching is case-insensitive substring containment; blank labels
/// never match.
pub fn verdict(
    passage: &str,
    aggregate_score: f64,
    true_labels: &[String],
    false_labels: &[String],
    threshold: f64,
) -> Verdict {
    let corpus = passage.to_lowercase();
    let true_hit = any_label_matches(&corpus, true_labels);
    let false_hit = any_label_matches(&corpus, false_labels);

    match (true_hit, false_hit) {
        (true, false) => Verdict::Pass,
        (false, true) => Verdict::Fail,
        (true, true) => {
            // Mixed match: a sub-threshold score could only argue for
            // the true label, but contradicting evidence wins.
            debug!(
                aggregate_score,
                threshold, "mixed label match, score does not resolve it"
            );
            Verdict::Ambiguous
        }
        (false, false) => {
            debug!(
                aggregate_score,
                threshold, "no label evidence, score alone never decides"
            );
            Verdict::Ambiguous
        }
    }
}

fn any_label_matches(corpus: &str, labels: &[String]) -> bool {
    labels.iter().any(|label| {
        let label = label.trim().to_lowercase();
        !label.is_empty() && corpus.contains(&label)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn true_only_match_passes() {
        let v = verdict("答案係貓", 0.5, &labels(&["貓"]), &[], 0.5);
        assert_eq!(v, Verdict::Pass);
    }

    #[test]
    fn false_only_match_fails() {
        let v = verdict("答案係狗", 0.5, &labels(&["貓"]), &labels(&["狗"]), 0.5);
        assert_eq!(v, Verdict::Fail);
    }

    #[test]
    fn no_match_is_ambiguous() {
        let v = verdict("唔知道", 0.5, &labels(&["貓"]), &labels(&["狗"]), 0.5);
        assert_eq!(v, Verdict::Ambiguous);
    }

    #[test]
    fn mixed_match_is_ambiguous() {
        let v = verdict(
            "可能係貓，又可能係狗",
            0.5,
            &labels(&["貓"]),
            &labels(&["狗"]),
            0.5,
        );
        assert_eq!(v, Verdict::Ambiguous);
    }

    #[test]
    fn mixed_match_stays_ambiguous_below_threshold() {
        // A confident (low) score never overturns contradicting labels.
        let v = verdict(
            "係貓定係狗",
            0.01,
            &labels(&["貓"]),
            &labels(&["狗"]),
            0.5,
        );
        assert_eq!(v, Verdict::Ambiguous);
    }

    #[test]
    fn no_labels_at_all_is_ambiguous() {
        assert_eq!(verdict("anything", 0.0, &[], &[], 0.5), Verdict::Ambiguous);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let v = verdict("The answer is CAT.", 0.5, &labels(&["cat"]), &[], 0.5);
        assert_eq!(v, Verdict::Pass);
    }

    #[test]
    fn blank_labels_never_match() {
        let v = verdict("anything", 0.5, &labels(&["", "  "]), &[], 0.5);
        assert_eq!(v, Verdict::Ambiguous);
    }

    proptest! {
        // Pure-function property: same inputs, same verdict.
        #[test]
        fn verdict_is_deterministic(
            passage in ".{0,60}",
            score in 0.0f64..=1.0,
            trues in prop::collection::vec(".{0,10}", 0..3),
            falses in prop::collection::vec(".{0,10}", 0..3),
            threshold in 0.0f64..=1.0,
        ) {
            let first = verdict(&passage, score, &trues, &falses, threshold);
            let second = verdict(&passage, score, &trues, &falses, threshold);
            prop_assert_eq!(first, second);
        }

        // The score never creates a verdict without label evidence.
        #[test]
        fn score_alone_never_decides(
            passage in "[a-z ]{0,40}",
            score in 0.0f64..=1.0,
            threshold in 0.0f64..=1.0,
        ) {
            prop_assert_eq!(
                verdict(&passage, score, &[], &[], threshold),
                Verdict::Ambiguous
            );
        }
    }
}
