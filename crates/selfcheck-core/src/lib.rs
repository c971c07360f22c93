//! # selfcheck-core
//!
//! Sampling-based consistency checking for generated passages.
//!
//! A passage is split into sentences, each sentence is scored in
//! [0,1] for hallucination likelihood against independently sampled
//! alternative generations, the scores are averaged, and reference
//! labels plus the aggregate score yield a PASS/FAIL/AMBIGUOUS
//! verdict per item.
//!
//! ## Key guarantees
//!
//! 1. **Deterministic**: the shipped scorer and the verdict engine
//!    are pure; identical input documents produce identical reports.
//! 2. **Never drops an item**: per-item and per-sentence failures
//!    degrade (neutral scores, `FALLBACK` mode, AMBIGUOUS verdicts)
//!    instead of aborting; only an unreadable input document is fatal.
//! 3. **Observable degradation**: the strategy that actually ran is a
//!    first-class `scorer_mode` field on every result.
//! 4. **Order-preserving**: results appear in input item order.
//!
//! ## Example
//!
//! ```rust,ignore
//! use selfcheck_core::{load_items, Config, Pipeline};
//!
//! let items = load_items("items.json")?;
//! let pipeline = Pipeline::new(Config::default());
//! let report = pipeline.run(&items);
//! println!("{}", report.to_json_string()?);
//! ```

pub mod config;
pub mod dataset;
pub mod report;
pub mod scorer;
pub mod segment;
pub mod types;
pub mod verdict;

pub use config::{Config, ConfigError, DEFAULT_THRESHOLD};
pub use dataset::{items_from_json, load_items, DatasetError};
pub use report::{Report, RunSummary};
pub use scorer::{
    aggregate, LexicalSupport, ScoreOutcome, Scorer, SupportError, SupportModel, NEUTRAL_SCORE,
};
pub use segment::{SegmentError, Segmenter, SentenceSplitter, UnicodeSplitter};
pub use types::{Item, ItemResult, Metadata, ScorerMode, Sentence, Verdict};
pub use verdict::{verdict, MatchScope};

use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that abort a run. Everything below the item level degrades
/// instead.
#[derive(Error, Debug)]
pub enum SelfCheckError {
    #[error("input error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// The evaluation pipeline. Segmenter and scorer are built once at
/// construction; items are then processed sequentially and
/// independently.
pub struct Pipeline {
    config: Config,
    segmenter: Segmenter,
    scorer: Scorer,
    degraded_sentences: AtomicUsize,
    degenerate_items: AtomicUsize,
}

impl Pipeline {
    /// Pipeline with the default segmentation backend and the primary
    /// scoring strategy.
    pub fn new(config: Config) -> Self {
        Self::with_parts(config, Segmenter::new(), Scorer::primary())
    }

    /// Pipeline with explicit segmenter and scorer, for swapping in a
    /// custom linguistic backend or support model.
    pub fn with_parts(config: Config, segmenter: Segmenter, scorer: Scorer) -> Self {
        Self {
            config,
            segmenter,
            scorer,
            degraded_sentences: AtomicUsize::new(0),
            degenerate_items: AtomicUsize::new(0),
        }
    }

    /// Evaluate a single item.
    pub fn evaluate_item(&self, item: &Item) -> ItemResult {
        let item_id = item.id.clone();

        let Some(passage) = item.passage() else {
            warn!(item_id = %item_id, "item has no passage, recording AMBIGUOUS");
            return ItemResult {
                item_id,
                scores: Vec::new(),
                aggregate_score: 0.0,
                verdict: Verdict::Ambiguous,
                scorer_mode: ScorerMode::Fallback,
            };
        };

        let sentences = self.segmenter.segment(passage);
        let outcome = self.scorer.score(&sentences, &item.sampled_passages);

        if outcome.degraded > 0 {
            self.degraded_sentences
                .fetch_add(outcome.degraded, Ordering::Relaxed);
            warn!(
                item_id = %item_id,
                degraded = outcome.degraded,
                "sentences scored with neutral substitution"
            );
        }
        if outcome.scores.is_empty() {
            // Unreachable through the segmenter, defined anyway.
            self.degenerate_items.fetch_add(1, Ordering::Relaxed);
            warn!(item_id = %item_id, "item produced no sentence scores");
        }

        let aggregate_score = aggregate(&outcome.scores);
        let corpus = self.match_corpus(passage, &item.sampled_passages);
        let verdict = verdict::verdict(
            &corpus,
            aggregate_score,
            &item.metadata.true_labels,
            &item.metadata.false_labels,
            self.config.threshold,
        );

        debug!(
            item_id = %item_id,
            sentences = sentences.len(),
            aggregate_score,
            mode = %outcome.mode,
            %verdict,
            "evaluated item"
        );

        ItemResult {
            item_id,
            scores: outcome.scores,
            aggregate_score,
            verdict,
            scorer_mode: outcome.mode,
        }
    }

    /// Evaluate all items in order and produce the run report. Items
    /// without an id get a positional one.
    pub fn run(&self, items: &[Item]) -> Report {
        let results = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let mut result = self.evaluate_item(item);
                if result.item_id.is_empty() {
                    result.item_id = format!("item-{index}");
                }
                result
            })
            .collect();
        Report::new(results)
    }

    /// Sentences that received a neutral substitution so far.
    pub fn degraded_sentences(&self) -> usize {
        self.degraded_sentences.load(Ordering::Relaxed)
    }

    /// Items that produced no scores at all (defensive counter).
    pub fn degenerate_items(&self) -> usize {
        self.degenerate_items.load(Ordering::Relaxed)
    }

    fn match_corpus(&self, passage: &str, sampled_passages: &[String]) -> String {
        match self.config.match_scope {
            MatchScope::PassageOnly => passage.to_string(),
            MatchScope::PassageAndSamples => {
                let mut corpus = passage.to_string();
                for sample in sampled_passages {
                    corpus.push('\n');
                    corpus.push_str(sample);
                }
                corpus
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: &str) -> Item {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn no_samples_yields_neutral_fallback_and_ambiguous() {
        // Two sentences, no samples: 0.5 each, aggregate 0.5,
        // fallback mode, no labels -> AMBIGUOUS.
        let pipeline = Pipeline::new(Config::default());
        let result = pipeline.evaluate_item(&item(
            r#"{ "id": "e2e", "passage": "今日天氣好好。我哋去公園。" }"#,
        ));

        assert_eq!(result.scores, vec![0.5, 0.5]);
        assert_eq!(result.aggregate_score, 0.5);
        assert_eq!(result.scorer_mode, ScorerMode::Fallback);
        assert_eq!(result.verdict, Verdict::Ambiguous);
    }

    #[test]
    fn samples_enable_primary_mode() {
        let pipeline = Pipeline::new(Config::default());
        let result = pipeline.evaluate_item(&item(
            r#"{
                "id": "p",
                "passage": "The capital of France is Paris.",
                "sampled_passages": ["Paris is the capital of France."]
            }"#,
        ));
        assert_eq!(result.scorer_mode, ScorerMode::Primary);
        assert_eq!(result.scores.len(), 1);
        assert!(result.aggregate_score < 0.2);
    }

    #[test]
    fn missing_passage_degrades_without_aborting() {
        let pipeline = Pipeline::new(Config::default());
        let result = pipeline.evaluate_item(&item(r#"{ "id": "broken" }"#));

        assert_eq!(result.item_id, "broken");
        assert!(result.scores.is_empty());
        assert_eq!(result.aggregate_score, 0.0);
        assert_eq!(result.verdict, Verdict::Ambiguous);
        assert_eq!(result.scorer_mode, ScorerMode::Fallback);
    }

    #[test]
    fn labels_drive_the_verdict() {
        let pipeline = Pipeline::new(Config::default());
        let result = pipeline.evaluate_item(&item(
            r#"{
                "id": "cat",
                "passage": "答案係貓。",
                "metadata": { "true": ["貓"], "false": ["狗"] }
            }"#,
        ));
        assert_eq!(result.verdict, Verdict::Pass);
    }

    #[test]
    fn match_scope_controls_sample_matching() {
        let json = r#"{
            "id": "scope",
            "passage": "唔知道。",
            "sampled_passages": ["答案係貓。"],
            "metadata": { "true": ["貓"] }
        }"#;

        // Default scope matches the true label inside a sample.
        let wide = Pipeline::new(Config::default());
        assert_eq!(wide.evaluate_item(&item(json)).verdict, Verdict::Pass);

        let narrow = Pipeline::new(Config {
            match_scope: MatchScope::PassageOnly,
            ..Config::default()
        });
        assert_eq!(
            narrow.evaluate_item(&item(json)).verdict,
            Verdict::Ambiguous
        );
    }

    #[test]
    fn run_preserves_input_order_and_assigns_ids() {
        let items = items_from_json(
            r#"[
                { "id": "first", "passage": "One." },
                { "passage": "Two." },
                { "id": "third", "passage": "Three." }
            ]"#,
        )
        .unwrap();

        let pipeline = Pipeline::new(Config::default());
        let report = pipeline.run(&items);

        let ids: Vec<&str> = report.results.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "item-1", "third"]);
        assert_eq!(report.summary.ambiguous, 3);
    }

    #[test]
    fn rerun_is_idempotent_on_the_fallback_path() {
        let items = items_from_json(
            r#"[
                { "id": "a", "passage": "今日天氣好好。我哋去公園。" },
                { "id": "b", "passage": "One sentence. Another one!" }
            ]"#,
        )
        .unwrap();

        let pipeline = Pipeline::new(Config::default());
        let first = pipeline.run(&items);
        let second = pipeline.run(&items);

        for (x, y) in first.results.iter().zip(second.results.iter()) {
            assert_eq!(x.scores, y.scores);
            assert_eq!(x.verdict, y.verdict);
            assert_eq!(x.scorer_mode, y.scorer_mode);
        }
    }

    #[test]
    fn broken_support_model_is_counted_not_fatal() {
        struct BrokenModel;
        impl SupportModel for BrokenModel {
            fn support(&self, _s: &str, _p: &str) -> Result<f64, SupportError> {
                Err(SupportError::Estimator("offline".to_string()))
            }
        }

        let pipeline = Pipeline::with_parts(
            Config::default(),
            Segmenter::new(),
            Scorer::primary_with_model(Box::new(BrokenModel)),
        );
        let result = pipeline.evaluate_item(&item(
            r#"{ "id": "x", "passage": "One. Two.", "sampled_passages": ["s"] }"#,
        ));

        assert_eq!(result.scores, vec![0.5, 0.5]);
        assert_eq!(result.scorer_mode, ScorerMode::Primary);
        assert_eq!(pipeline.degraded_sentences(), 2);
    }
}
