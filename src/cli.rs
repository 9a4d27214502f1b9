use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use crate::{
    capture::{
        CaptureGuard, CommandAnalyzer, EmotionClassifier, EmotionDetector, FaceDetector,
        StillFrameDevice, UnconfiguredAnalyzer,
    },
    notify::LogNotifier,
    paths::AppPaths,
    quotes::{append_user_quote, FallbackQuotes, GroqClient, QuoteService},
    scheduler::{interval_minutes, CycleComponents, CycleScheduler},
    sensing::{spawn_input_listener, ActivitySampler, NoWindowTitles, SysinfoProcesses},
    settings::SettingsStore,
    store::EventLog,
};

#[derive(Parser)]
#[command(name = "vibesync")]
#[command(about = "Background mood check-ins with personalised motivational quotes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the scheduler and keep running until Ctrl-C
    Run {
        /// Run one cycle immediately instead of waiting for the first interval
        #[arg(long)]
        trigger: bool,
    },
    /// Show schedule, last quote and log size
    Status,
    /// Print recent check-ins
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Add a custom fallback quote
    AddQuote {
        text: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        author: Option<String>,
    },
    /// Change the monitoring schedule (e.g. "Every 30 minutes")
    Schedule { value: String },
    /// Restore default settings
    ResetSettings,
}

pub async fn execute(cli: Cli, paths: AppPaths) -> Result<()> {
    paths.ensure()?;
    let settings = Arc::new(SettingsStore::new(paths.settings())?);

    match cli.command {
        Commands::Run { trigger } => run_scheduler(&paths, settings, trigger).await,
        Commands::Status => {
            let schedule = settings.monitoring_schedule();
            println!("Schedule:   {schedule} ({} min)", interval_minutes(&schedule));

            let quotes = build_quote_service(&paths, &settings)?;
            match quotes.last_quote() {
                Some(record) => println!("Last quote: {} ({})", record.quote, record.timestamp),
                None => println!("Last quote: none yet"),
            }

            let entries = EventLog::new(paths.event_log()).entries();
            println!("Check-ins:  {}", entries.len());
            Ok(())
        }
        Commands::History { limit } => {
            let entries = EventLog::new(paths.event_log()).entries();
            let skip = entries.len().saturating_sub(limit);
            for entry in entries.iter().skip(skip) {
                println!(
                    "{}  {:<8}  {:>5.2} keys/s  {:>7.2} px/s  [{}]",
                    entry.timestamp.format(crate::models::timestamp::FORMAT),
                    entry.emotion.as_str(),
                    entry.activity.typing_speed,
                    entry.activity.mouse_speed,
                    entry.activity.active_window
                );
                println!("    {}", entry.quote);
            }
            if entries.is_empty() {
                println!("No check-ins logged yet.");
            }
            Ok(())
        }
        Commands::AddQuote {
            text,
            category,
            author,
        } => {
            let added = append_user_quote(
                &paths.user_quotes(),
                &text,
                category.as_deref(),
                author.as_deref(),
            )?;
            println!("Added {} quote to {}", added.category, paths.user_quotes().display());
            Ok(())
        }
        Commands::Schedule { value } => {
            let schedule = settings.update_schedule(&value)?;
            println!("Schedule set to {schedule}; applies from the next cycle.");
            Ok(())
        }
        Commands::ResetSettings => {
            settings.reset()?;
            println!("Settings restored to defaults.");
            Ok(())
        }
    }
}

async fn run_scheduler(paths: &AppPaths, settings: Arc<SettingsStore>, trigger: bool) -> Result<()> {
    let activity = Arc::new(ActivitySampler::new(Arc::new(NoWindowTitles)));
    spawn_input_listener(activity.clone())?;

    let scheduler = build_scheduler(paths, settings, activity)?;
    let state = scheduler.start().await;
    info!("VibeSync running; next check-in at {}", state.next_trigger_label());

    if trigger {
        scheduler.trigger_now().await;
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    scheduler.stop().await;
    info!("VibeSync stopped");
    Ok(())
}

pub fn build_scheduler(
    paths: &AppPaths,
    settings: Arc<SettingsStore>,
    activity: Arc<ActivitySampler>,
) -> Result<CycleScheduler> {
    let current = settings.current();

    let frame_path = current
        .capture_frame_path
        .clone()
        .unwrap_or_else(|| paths.camera_frame());
    let device = Arc::new(StillFrameDevice::new(frame_path));

    let (faces, classifier): (Arc<dyn FaceDetector>, Arc<dyn EmotionClassifier>) =
        match current.analyzer_command.clone() {
            Some(command) => {
                let analyzer = Arc::new(CommandAnalyzer::new(
                    command,
                    paths.analyzer_work_dir(),
                    Duration::from_secs(current.analyzer_timeout_secs.max(1)),
                )?);
                let faces: Arc<dyn FaceDetector> = analyzer.clone();
                let classifier: Arc<dyn EmotionClassifier> = analyzer;
                (faces, classifier)
            }
            None => {
                log::warn!("No analyzer_command configured; face checks will report no face");
                let faces: Arc<dyn FaceDetector> = Arc::new(UnconfiguredAnalyzer);
                let classifier: Arc<dyn EmotionClassifier> = Arc::new(UnconfiguredAnalyzer);
                (faces, classifier)
            }
        };

    let guard = CaptureGuard::new(device, Arc::new(SysinfoProcesses::new()), faces);
    let emotions = EmotionDetector::new(guard.clone(), classifier, paths.snapshots_dir());
    let quotes = Arc::new(build_quote_service(paths, &settings)?);

    Ok(CycleScheduler::new(CycleComponents {
        settings,
        guard,
        emotions,
        activity,
        quotes,
        event_log: EventLog::new(paths.event_log()),
        notifier: Arc::new(LogNotifier),
    }))
}

fn build_quote_service(paths: &AppPaths, settings: &SettingsStore) -> Result<QuoteService> {
    let current = settings.current();
    let timeout = Duration::from_secs(current.quote_timeout_secs.max(1));
    let generator = GroqClient::from_env(current.quote_model, timeout)?;

    Ok(QuoteService::new(
        Arc::new(generator),
        paths.last_quote(),
        FallbackQuotes::load(&paths.user_quotes()),
        timeout,
    ))
}
