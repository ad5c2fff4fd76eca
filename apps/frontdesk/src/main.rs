use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, ClientSettings, DocumentWorkflow, HttpClinicBackend, NormalizedPatientData,
    PollSettings, QueueEvent, QueuePoller, QueueSync, ValidationInterface, ValidationOutcome,
    WorkflowEvent,
};
use shared::domain::DocumentId;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

mod render;

#[derive(Parser, Debug)]
#[command(about = "Clinic front desk: live queue board and document review")]
struct Cli {
    /// Backend base URL; overrides frontdesk.toml and the environment.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the auto-refreshing patient queue.
    Queue {
        /// Stop after this many snapshot updates.
        #[arg(long)]
        ticks: Option<usize>,
    },
    /// Load a scanned document and optionally drive it through review.
    Document {
        id: String,
        #[arg(long)]
        extract: bool,
        #[arg(long)]
        approve: bool,
    },
}

/// Asks on stdin whether the extracted fields are correct.
struct ConsoleValidation;

#[async_trait]
impl ValidationInterface for ConsoleValidation {
    async fn review(&self, data: &NormalizedPatientData) -> Result<ValidationOutcome> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(
                format!(
                    "approve {} extracted fields for document {}? [y/N] ",
                    data.extracted_data.len(),
                    data.document_id
                )
                .as_bytes(),
            )
            .await?;
        stdout.flush().await?;

        let mut answer = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut answer)
            .await
            .context("failed to read confirmation")?;

        if answer.trim().eq_ignore_ascii_case("y") {
            Ok(ValidationOutcome::Completed)
        } else {
            Ok(ValidationOutcome::Back)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings().context("invalid front desk settings")?;
    if let Some(url) = cli.api_url {
        settings = settings.with_base_url(url).context("invalid --api-url")?;
    }

    match cli.command {
        Command::Queue { ticks } => run_queue(&settings, ticks).await,
        Command::Document {
            id,
            extract,
            approve,
        } => run_document(&settings, DocumentId::new(id), extract, approve).await,
    }
}

async fn run_queue(settings: &ClientSettings, ticks: Option<usize>) -> Result<()> {
    let backend = Arc::new(HttpClinicBackend::new(settings)?);
    info!(api = backend.base_url(), "front desk connected to backend");
    let sync = QueueSync::new(backend, settings.queue_display_limit);
    let mut events = sync.subscribe_events();
    let poller = QueuePoller::start(Arc::clone(&sync), PollSettings::from(settings));

    let mut updates = 0usize;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(QueueEvent::SnapshotUpdated(_)) => {
                    println!("{}", render::render_board(&sync.board().await));
                    updates += 1;
                    if ticks.is_some_and(|limit| updates >= limit) {
                        break;
                    }
                }
                Ok(QueueEvent::PollFailed { .. } | QueueEvent::ClockTick(_)) => {}
                Err(err) => warn!(error = %err, "queue event stream lagged"),
            },
        }
    }

    poller.shutdown();
    Ok(())
}

async fn run_document(
    settings: &ClientSettings,
    document_id: DocumentId,
    extract: bool,
    approve: bool,
) -> Result<()> {
    let backend = Arc::new(HttpClinicBackend::new(settings)?);
    info!(api = backend.base_url(), "front desk connected to backend");
    let workflow = DocumentWorkflow::new_with_validation(backend, Arc::new(ConsoleValidation));
    let mut events = workflow.subscribe_events();

    let mut view = match workflow.load(document_id.clone()).await {
        Ok(view) => view,
        Err(_) => workflow.view().await,
    };
    println!("{}", render::render_view(&view));

    if extract && view.actions.extract {
        if let Ok(extracted) = workflow.extract(document_id).await {
            view = extracted;
        } else {
            view = workflow.view().await;
        }
        println!("{}", render::render_view(&view));
    }

    if approve && view.actions.approve {
        // Failures surface below as notifications; the view stays as it was.
        let _ = workflow.approve().await;
    }

    while let Ok(event) = events.try_recv() {
        match event {
            WorkflowEvent::Notification(notification) => {
                println!("[{:?}] {}", notification.level, notification.message);
            }
            WorkflowEvent::NavigateAway => println!("document approved; returning to list"),
            WorkflowEvent::NavigateBack => println!("returning to list"),
            WorkflowEvent::PhaseChanged(_) => {}
        }
    }
    Ok(())
}
