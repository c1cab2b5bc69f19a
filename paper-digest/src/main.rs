use anyhow::Context;
use chrono::{Local, Utc};
use clap::Parser;
use paper_digest::config::{load_config, DEFAULT_CONFIG_PATH};
use paper_digest::utils::TextUtils;
use paper_digest::{
    ArxivFetcher, ClaudeCliSummarizer, DesktopNotifier, DigestRun, RunOutcome, RunSettings,
    SeenLedger, SelectionPipeline,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Paper Digest: daily arXiv paper selection and summarization
#[derive(Parser, Debug)]
#[command(name = "paper-digest", version)]
struct Args {
    /// Path to configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Search papers only, don't run summarization
    #[arg(long)]
    dry_run: bool,

    /// Enable debug output
    #[arg(long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    println!("{} Loading configuration...", TextUtils::clock());
    let mut config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            println!("[ERROR] {}", e);
            return ExitCode::FAILURE;
        }
    };
    if args.debug {
        config.advanced.debug = true;
    }
    init_tracing(config.is_debug());

    match run(config, args.dry_run).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("[ERROR] {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: paper_digest::AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let local_now = Local::now();
    let now = local_now.with_timezone(&Utc);

    let settings = RunSettings::from_config(&config)?;
    let fetcher = ArxivFetcher::new(config.fetch_config()).context("Failed to build HTTP client")?;
    let pipeline = SelectionPipeline::new(Box::new(fetcher));
    let ledger = SeenLedger::open_file(config.history_path());
    let summarizer = ClaudeCliSummarizer::from_config(&config, local_now)?;
    let notifier = DesktopNotifier::from_config(&config.notification);

    debug!("Report path: {}", summarizer.report_path().display());

    let mut digest = DigestRun::new(pipeline, ledger, summarizer, notifier, settings);

    println!("{} Fetching papers from arXiv...", TextUtils::clock());
    let outcome = digest.execute(now, dry_run).await?;

    match outcome {
        RunOutcome::NoCandidates { fetched, recent } => {
            println!("  Found {} papers, {} within the date window", fetched, recent);
            if recent == 0 {
                println!("[INFO] No papers found matching your criteria");
            } else {
                println!("[INFO] All {} matching papers have been seen before", recent);
            }
        }
        RunOutcome::DryRun(candidates) => {
            println!("\n[DRY RUN] {} candidate papers:", candidates.len());
            for (i, paper) in candidates.iter().take(10).enumerate() {
                println!("  {}. {}", i + 1, TextUtils::smart_truncate(&paper.title, 70));
                println!(
                    "     ID: {} | Published: {}",
                    paper.id,
                    TextUtils::date_part(&paper.published)
                );
            }
            println!("\n[DRY RUN] Skipping summarization");
        }
        RunOutcome::Completed {
            report,
            html,
            marked,
        } => {
            println!("  Marked {} papers as seen", marked.len());
            println!("\n{} Done!", TextUtils::clock());
            println!("  Markdown saved to: {}", report.display());
            if let Some(html) = html {
                println!("  HTML saved to: {}", html.display());
            }
        }
    }

    Ok(())
}
