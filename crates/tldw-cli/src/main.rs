use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{
    EnvFilter,
    fmt::writer::{BoxMakeWriter, MakeWriterExt},
};

use tldw_core::{
    ChatSummarizer, Pipeline, PipelineConfig, Provider, SectionSource, SummaryStep, YoutubeClient,
    format_offset, format_summary_readable, get_root_cache_dir, transcript::total_duration,
    write_artifacts,
};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MODEL_TIMEOUT: Duration = Duration::from_secs(180);

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Openai,
    Grok,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "tldw")]
#[command(about = "Summarize a YouTube video chapter by chapter from its transcript")]
struct Cli {
    /// Video URL or 11-character video id
    url: String,

    /// AI provider for the summaries
    #[arg(short, long, default_value = "openai")]
    provider: CliProvider,

    /// Override the provider's default model
    #[arg(short, long)]
    model: Option<String>,

    /// Caption languages in order of preference
    #[arg(short, long, value_delimiter = ',', default_value = "de,en")]
    lang: Vec<String>,

    /// Directory the summary files are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Only write chapter summaries, skip the short and unified summaries
    #[arg(long)]
    long_only: bool,

    /// Ignore cached metadata and transcripts
    #[arg(short, long)]
    force: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Also append log output to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn create_progress(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Log to stderr, and to `log_file` as well when one is given.
fn log_writer(log_file: Option<&Path>) -> std::io::Result<BoxMakeWriter> {
    let Some(path) = log_file else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BoxMakeWriter::new(std::io::stderr.and(Mutex::new(file))))
}

fn done(msg: impl std::fmt::Display) -> String {
    format!("{} {}", style("✓").green().bold(), msg)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // API keys may live in a .env file next to where the tool is run
    let env_file = dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "tldw_core=debug,tldw=debug,warn"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let writer = match log_writer(cli.log_file.as_deref()) {
        Ok(writer) => writer,
        Err(e) => {
            eprintln!("{} cannot open log file: {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(cli.log_file.is_none())
        .finish();
    let _log_guard = tracing::subscriber::set_default(subscriber);

    if let Some(path) = env_file {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let provider: Provider = cli.provider.into();

    // Validate API key early
    provider.validate_api_key()?;

    let youtube = YoutubeClient::new(FETCH_TIMEOUT)?;
    let summarizer = ChatSummarizer::new(provider, cli.model, MODEL_TIMEOUT)?;
    let model = summarizer.model().to_string();

    let config = PipelineConfig {
        languages: cli.lang,
        second_pass: !cli.long_only,
        cache_root: Some(get_root_cache_dir()),
        force: cli.force,
    };
    let pipeline = Pipeline::new(
        Box::new(youtube.clone()),
        Box::new(youtube),
        Box::new(summarizer),
        config,
        tracing::info_span!("video", url = %cli.url),
    );

    println!(
        "\n{}  {}\n",
        style("tldw").cyan().bold(),
        style("YouTube Summarizer").dim()
    );

    // Step 1: Metadata and transcript
    let spinner = create_spinner("Fetching video and transcript...");
    let video = match pipeline.load_video(&cli.url).await {
        Ok(video) => video,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    spinner.finish_with_message(done(format!(
        "{} {} {}",
        style(&video.metadata.title).bold(),
        style("by").dim(),
        video.metadata.channel
    )));
    if video.transcript.is_empty() {
        println!("{} No transcript available", style("!").yellow().bold());
    } else {
        println!(
            "{}",
            done(format!(
                "Transcript: {} entries, {}",
                video.transcript.len(),
                format_offset(total_duration(&video.transcript))
            ))
        );
    }

    // Step 2: Chapters
    let spinner = create_spinner(&format!("Looking for an outline with {}...", provider.name()));
    let plan = pipeline.plan_sections(&video).await;
    if plan.sections.is_empty() {
        spinner.finish_and_clear();
        println!(
            "\n{} No content could be produced for \"{}\".\n",
            style("!").yellow().bold(),
            video.metadata.title
        );
        return Ok(());
    }
    let origin = match plan.source {
        SectionSource::Outline => "from the description outline",
        SectionSource::Synthetic => "fixed-length",
    };
    spinner.finish_with_message(done(format!(
        "{} chapters {}",
        plan.sections.len(),
        style(origin).dim()
    )));

    // Step 3: Summaries
    let progress = create_progress(plan.sections.len());
    let summary = pipeline
        .summarize(&video, &plan, |step| match step {
            SummaryStep::Chapter { index, total, topic } => {
                progress.set_length(total as u64);
                progress.set_position(index as u64);
                progress.set_message(format!("Summarizing \"{}\" with {}", topic, model));
            }
            SummaryStep::Minimizing { index, total } => {
                progress.set_length(total as u64);
                progress.set_position(index as u64);
                progress.set_message("Condensing chapter summaries".to_string());
            }
            SummaryStep::Unifying => {
                progress.set_position(progress.length().unwrap_or(0));
                progress.set_message("Writing unified summary".to_string());
            }
        })
        .await;
    progress.finish_and_clear();
    let summary = summary?;
    println!(
        "{}",
        done(format!("Summarized with {} ({})", provider.name(), model))
    );

    // Step 4: Files
    let run_at = chrono::Local::now().naive_local();
    let artifacts = write_artifacts(&summary, &cli.output_dir, run_at).await?;

    println!();
    for path in [Some(&artifacts.long), artifacts.short.as_ref(), artifacts.unified.as_ref()]
        .into_iter()
        .flatten()
    {
        println!("{} {}", style("Saved:").dim(), style(path.display()).cyan());
    }
    println!("\n{}", style("─".repeat(60)).dim());

    // Human-readable output
    println!("{}", format_summary_readable(&summary));

    Ok(())
}
