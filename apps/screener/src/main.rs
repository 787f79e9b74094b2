use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use screener::report::ReportView;
use screener::snapshot::{self, Snapshot, DEFAULT_SNAPSHOT_PATH};
use screener::{reduce, Config, HttpScoringClient, ResumeFile, UploadMatchWorkflow};

#[derive(Parser, Debug)]
#[command(
    name = "screener",
    about = "Screen resumes against a job description with a remote scoring service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload resumes, score them, save the raw result and print the ranked report
    Screen(ScreenArgs),
    /// Print the ranked report for the last saved screening
    Report(ReportArgs),
    /// Clear every resume stored by the scoring service
    Reset,
    /// List the scoring models the service reports
    Models,
}

#[derive(Args, Debug)]
struct ScreenArgs {
    /// Resume files to upload (PDF recommended)
    files: Vec<PathBuf>,
    /// Job title or description to score against
    #[arg(long, short = 'j', default_value = "")]
    job_description: String,
    /// Where to save the raw match result
    #[arg(long, default_value = DEFAULT_SNAPSHOT_PATH)]
    snapshot: PathBuf,
    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Saved match result to report on
    #[arg(long, default_value = DEFAULT_SNAPSHOT_PATH)]
    snapshot: PathBuf,
    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Screener v{} using scoring service at {}",
        env!("CARGO_PKG_VERSION"),
        config.scoring_service_url
    );

    match cli.command {
        Command::Screen(args) => screen(scoring_client(&config)?, args).await,
        Command::Report(args) => report(args).await,
        Command::Reset => {
            scoring_client(&config)?
                .reset_store()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Scoring service store reset.");
            Ok(())
        }
        Command::Models => {
            let models = scoring_client(&config)?
                .list_models()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            for model in models {
                println!("{model}");
            }
            Ok(())
        }
    }
}

fn scoring_client(config: &Config) -> Result<HttpScoringClient> {
    HttpScoringClient::new(config.scoring_service_url.clone())
        .context("Failed to build HTTP client")
}

async fn screen(client: HttpScoringClient, args: ScreenArgs) -> Result<()> {
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        files.push(ResumeFile::from_path(path).await?);
    }

    let workflow = UploadMatchWorkflow::new(Arc::new(client));
    let mut progress = workflow.subscribe();
    let progress_task = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let state = progress.borrow_and_update().label();
            info!("Screening {state}");
        }
    });

    let outcome = workflow.submit(&files, &args.job_description).await;
    // Closing the channel lets the logger drain the final state and exit.
    drop(workflow);
    if let Err(e) = progress_task.await {
        warn!("Progress logger stopped unexpectedly: {e}");
    }
    let result = outcome?;

    let snapshot = Snapshot::new(args.job_description, result.as_ref().clone());
    snapshot::save(&args.snapshot, &snapshot).await?;

    print_report(&snapshot, args.json)
}

async fn report(args: ReportArgs) -> Result<()> {
    match snapshot::load(&args.snapshot).await? {
        Some(snapshot) => print_report(&snapshot, args.json),
        None => {
            println!("No results found. Please run a screening first.");
            Ok(())
        }
    }
}

fn print_report(snapshot: &Snapshot, json: bool) -> Result<()> {
    let ranked = reduce(&snapshot.result.shortlisted_candidates);
    let view = ReportView::build(&ranked);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        if !snapshot.job_description.is_empty() {
            println!("Job: {}\n", snapshot.job_description);
        }
        print!("{}", view.render_text());
    }
    Ok(())
}
