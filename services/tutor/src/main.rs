use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use fluent_tutor_core::canned_summarizer::CannedSummarizer;
use fluent_tutor_core::catalog;
use fluent_tutor_core::profile_store::{FileStore, ProfileStore};
use fluent_tutor_core::stats;
use fluent_tutor_core::summarizer::{GeminiSummarizer, Summarizer};
use fluent_tutor_core::types::{EnglishLevel, SessionSummary, TeacherId};
use fluent_tutor_core::TutorApp;
use fluent_tutor_service::config::Config;
use fluent_tutor_service::prompt_loader;
use fluent_tutor_service::replay_adapter::ReplayTransport;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Replays a recorded tutoring session and stores its summary")]
struct Cli {
    /// JSON-lines event log to replay
    events: PathBuf,
    /// Directory holding the profile records
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Directory of prompt templates
    #[arg(long, default_value = "prompts")]
    prompts: PathBuf,
    /// Name to sign up with when no profile is stored yet
    #[arg(long, default_value = "Student")]
    name: String,
    #[arg(long, default_value = "B1")]
    level: EnglishLevel,
    #[arg(long, default_value = "sophia")]
    teacher: TeacherId,
    /// Summarize with canned responses instead of calling the API
    #[arg(long)]
    offline: bool,
    /// Pause between replayed events, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Parse Command-Line Arguments ---
    let args = Cli::parse();

    // --- 2. Load Configuration ---
    let config =
        Config::from_env(args.offline).context("Failed to load application configuration")?;

    // --- 3. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!("Configuration loaded successfully. Starting replay...");

    // --- 4. Initialize the Summarizer ---
    let summarizer: Arc<dyn Summarizer> = match &config.api_key {
        Some(api_key) if !args.offline => {
            let mut gemini = GeminiSummarizer::new(api_key.clone(), config.summary_model.clone());
            match prompt_loader::load_prompts(&args.prompts) {
                Ok(prompts) => {
                    tracing::info!("Loaded {} prompts successfully.", prompts.len());
                    if let Some(template) = prompt_loader::summary_template(&prompts) {
                        gemini = gemini.with_prompt_template(template);
                    }
                }
                Err(e) => tracing::warn!("Using the built-in summary prompt: {:#}", e),
            }
            tracing::info!("Summarizing with {}", gemini.model());
            Arc::new(gemini)
        }
        _ => {
            tracing::info!("Offline mode, summaries are canned.");
            Arc::new(CannedSummarizer)
        }
    };

    // --- 5. Application Setup ---
    let store = ProfileStore::new(
        FileStore::open(&args.data_dir).context("Failed to open the data directory")?,
    );
    let transport = ReplayTransport::from_path(&args.events)?
        .with_delay(Duration::from_millis(args.delay_ms));
    let (mut app, mut outcomes) = TutorApp::new(transport, store, summarizer);

    if app.user().is_none() {
        app.sign_up(&args.name, args.level, args.teacher)?;
    }
    let mut recording = app.transport_mut().take_recording()?;

    // --- 6. Replay Loop ---
    let mut replay_done = false;
    loop {
        tokio::select! {
            record = recording.recv(), if !replay_done => match record {
                Some(record) => {
                    let at = record.at.unwrap_or_else(Utc::now);
                    app.handle_event_at(record.event, at);
                }
                None => replay_done = true,
            },
            Some(outcome) = outcomes.recv() => match app.apply_outcome(outcome) {
                Ok(Some(summary)) => print_summary(&summary),
                Ok(None) => {}
                Err(e) => tracing::error!("Failed to store the session summary: {:#}", e),
            },
            else => break,
        }
        if replay_done && !app.is_summarizing() {
            break;
        }
    }

    // --- 7. Report ---
    if let Some(user) = app.user() {
        let (blurb, focus) = catalog::level_description(user.proficiency_level);
        let goal = stats::daily_goal_progress(user, Local::now().date_naive());
        println!(
            "{} ({} {}: {} Focus: {})",
            user.name,
            user.proficiency_level,
            user.proficiency_level.name(),
            blurb,
            focus
        );
        println!(
            "Streak {} day(s), {} minutes total, today's goal {}% ({}/{} min)",
            user.stats.streak,
            user.stats.total_minutes,
            goal.percent(),
            goal.minutes,
            goal.goal
        );
    }
    let vocabulary = app.vocabulary();
    if !vocabulary.is_empty() {
        println!("Vocabulary:");
        for word in vocabulary {
            println!("  {}: {}", word.term, word.definition);
        }
    }
    if let Some(pace) = app.last_pace() {
        println!("Pace: {:?}, {}", pace.suggestion, pace.advice);
    }

    Ok(())
}

fn print_summary(summary: &SessionSummary) {
    println!(
        "{} session with {}, {} min",
        summary.mode(),
        summary.teacher_name(),
        summary.duration_minutes()
    );
    for (heading, items) in [
        ("Key takeaways", summary.key_takeaways()),
        ("Improvement areas", summary.improvement_areas()),
        ("Notable corrections", summary.notable_corrections()),
    ] {
        if items.is_empty() {
            continue;
        }
        println!("{heading}:");
        for item in items {
            println!("  - {item}");
        }
    }
}
