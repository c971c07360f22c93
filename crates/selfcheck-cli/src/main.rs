//! `selfcheck` — evaluate generated passages against sampled
//! alternatives and write a JSON report.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use selfcheck_core::{load_items, Config, MatchScope, Pipeline};

#[derive(Parser)]
#[command(name = "selfcheck", version, about = "Sampling-based passage consistency checker")]
struct Cli {
    /// Input JSON document with the items to evaluate
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Output JSON report path (default: results/selfcheck_results_<timestamp>.json)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Optional YAML or JSON config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Verdict threshold override, in [0,1]
    #[arg(long)]
    threshold: Option<f64>,

    /// Where reference labels are matched
    #[arg(long, value_enum)]
    match_scope: Option<MatchScopeArg>,

    /// Also write a plain-text summary next to the JSON report
    #[arg(long)]
    text_summary: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MatchScopeArg {
    /// Passage only
    Passage,
    /// Passage plus sampled passages
    All,
}

impl From<MatchScopeArg> for MatchScope {
    fn from(arg: MatchScopeArg) -> Self {
        match arg {
            MatchScopeArg::Passage => MatchScope::PassageOnly,
            MatchScopeArg::All => MatchScope::PassageAndSamples,
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(threshold) = cli.threshold {
        config.threshold = threshold;
    }
    if let Some(scope) = cli.match_scope {
        config.match_scope = scope.into();
    }
    config.validate()?;
    Ok(config)
}

fn load_config_file(path: &Path) -> Result<Config> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let config = if is_yaml {
        Config::from_yaml_file(path)?
    } else {
        Config::from_json_file(path)?
    };
    Ok(config)
}

fn default_output_path() -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("results/selfcheck_results_{timestamp}.json"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    let items = load_items(&cli.input)
        .with_context(|| format!("failed to load items from {}", cli.input.display()))?;
    info!(count = items.len(), "loaded items, starting evaluation");

    let pipeline = Pipeline::new(config);
    let report = pipeline.run(&items);

    let output = cli.output.unwrap_or_else(default_output_path);
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    fs::write(&output, report.to_json_string()?)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(path = %output.display(), "wrote report");

    if cli.text_summary {
        let text_path = output.with_extension("txt");
        fs::write(&text_path, report.render_text())
            .with_context(|| format!("failed to write {}", text_path.display()))?;
        info!(path = %text_path.display(), "wrote text summary");
    }

    println!(
        "{} item(s): PASS {}  FAIL {}  AMBIGUOUS {}  mean score {:.3}",
        report.results.len(),
        report.summary.pass,
        report.summary.fail,
        report.summary.ambiguous,
        report.summary.mean_aggregate_score
    );

    Ok(())
}
