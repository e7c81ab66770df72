//! Command-line entry point for invest-rs
//!
//! ```bash
//! export GOOGLE_API_KEY=...        # or OPENAI_API_KEY / OPENAI_API_BASE
//! export NEWS_API_KEY=...
//! export ALPHA_VANTAGE_API_KEY=... # optional, enables fundamentals
//!
//! cargo run -p invest-cli -- NVDA
//! ```

use anyhow::{Context, Result, bail};
use clap::Parser;
use comfy_table::Table;
use invest_llm::providers::OpenAIProvider;
use invest_llm::{CompletionGenerator, GeneratorConfig};
use invest_stock::scoring::ScoreComponent;
use invest_stock::{
    AnalysisOutcome, InvestmentPipeline, ScoreResult, StockConfig, SubjectConfig, render_report,
    report_file_name,
};
use invest_utils::{AppConfig, LogConfig, init_tracing_with};
use invest_workflow::PipelineConfig;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const DEFAULT_TICKER: &str = "AAPL";

#[derive(Parser, Debug)]
#[command(name = "invest-cli")]
#[command(about = "Multi-stage investment analysis for a single stock", long_about = None)]
struct Args {
    /// Stock ticker to analyze; prompted for when omitted
    ticker: Option<String>,

    /// Directory for the saved report and the run log
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override the generation model
    #[arg(long)]
    model: Option<String>,

    /// Print the stage topology and exit
    #[arg(long)]
    describe: bool,

    /// Print the report without saving it
    #[arg(long)]
    no_save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.describe {
        println!("{}", InvestmentPipeline::topology());
        return Ok(());
    }

    let mut app = AppConfig::from_env();
    if let Some(dir) = &args.output_dir {
        app = app.with_output_dir(dir);
    }
    init_tracing_with(&LogConfig::default().with_log_file(app.log_path()))?;

    let mut config = StockConfig::from_env()?;
    if let Some(model) = &args.model {
        config.model.clone_from(model);
    }

    let provider = Arc::new(OpenAIProvider::from_env()?);
    let generator = Arc::new(CompletionGenerator::new(provider, generator_config(&config)));
    let pipeline = InvestmentPipeline::from_config(&config, generator, PipelineConfig::default())?;

    let ticker = match args.ticker {
        Some(ticker) => ticker,
        None => prompt_ticker()?,
    };
    let subject = SubjectConfig::new(&ticker);
    info!(ticker = %subject.ticker, model = %config.model, "Starting analysis");

    let outcome = pipeline.run_analysis(subject).await;
    let Some(report) = render_report(&outcome) else {
        eprintln!("Analysis aborted ({}):", outcome.status);
        for failure in &outcome.failures {
            eprintln!("  {failure}");
        }
        bail!("analysis of {} failed at {}", outcome.subject.ticker, outcome.failed_stages().join(", "));
    };

    println!("{report}");
    if let Some(score) = &outcome.score {
        println!("{}", score_table(score));
    }

    if !args.no_save {
        let path = save_report(&app.output_dir, &outcome, &report)?;
        println!("Report saved to {}", path.display());
    }

    Ok(())
}

fn generator_config(config: &StockConfig) -> GeneratorConfig {
    GeneratorConfig {
        model: config.model.clone(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        ..GeneratorConfig::default()
    }
}

fn prompt_ticker() -> Result<String> {
    print!("Enter stock ticker (or press Enter for '{DEFAULT_TICKER}'): ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(ticker_or_default(&line))
}

fn ticker_or_default(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        DEFAULT_TICKER.to_string()
    } else {
        input.to_uppercase()
    }
}

/// Component breakdown; defaulted components are marked
fn score_table(score: &ScoreResult) -> Table {
    let mark = |component: ScoreComponent| {
        if score.degraded.contains(&component) {
            "default (no data)"
        } else {
            ""
        }
    };

    let mut table = Table::new();
    table.set_header(vec!["Component", "Weight", "Score", "Note"]);
    table.add_row(vec![
        "Valuation (P/E)".to_string(),
        "40%".to_string(),
        score.components.valuation.to_string(),
        mark(ScoreComponent::Valuation).to_string(),
    ]);
    table.add_row(vec![
        "Profitability (margin)".to_string(),
        "40%".to_string(),
        score.components.profitability.to_string(),
        mark(ScoreComponent::Profitability).to_string(),
    ]);
    table.add_row(vec![
        "News sentiment".to_string(),
        "20%".to_string(),
        score.components.sentiment.to_string(),
        mark(ScoreComponent::Sentiment).to_string(),
    ]);
    table.add_row(vec![
        "Total".to_string(),
        String::new(),
        format!("{:.2}", score.total),
        score.recommendation.to_string(),
    ]);
    table
}

fn save_report(dir: &Path, outcome: &AnalysisOutcome, report: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let path = dir.join(report_file_name(&outcome.subject.ticker));
    std::fs::write(&path, report)
        .with_context(|| format!("failed to write report {}", path.display()))?;
    info!(path = %path.display(), "Report saved");
    Ok(path)
}
