//! scholarship-console - admin command line
//!
//! Signs in against the admin backend, launches and follows long-running
//! jobs, and works the moderation queue on the scraping engine.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use scholarship_console::auth::{self, FileCredentials};
use scholarship_console::enrichment::{EnrichmentClient, EnrichmentStatus, TestRunOptions};
use scholarship_console::jobs::{
    progress, track, AsyncOperation, JobEndpoint, JobError, Launcher, Maintenance,
    MaintenanceAction, Poller, TaskSnapshot,
};
use scholarship_console::scholarships::{filter_queue, ScholarshipClient};
use scholarship_console::util::truncate_chars;
use scholarship_console::{Config, HttpTransport, Transport};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "scholarship-console",
    about = "Admin console for the scholarship backend"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the admin token
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Show the signed-in admin
    Whoami,
    /// List scholarships waiting for moderation
    Queue {
        /// Case-insensitive filter on name or organization
        #[arg(long)]
        search: Option<String>,
    },
    /// Ask the engine to scrape a scholarship again
    Scrape { id: String },
    /// Show the extracted fields of a scholarship
    Review { id: String },
    /// Publish a reviewed scholarship
    Approve { id: String },
    /// Run the bulk purpose translation and follow it to completion
    Translate {
        /// Re-translate foundations that already have a translation
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Translate one foundation's purpose text
    TranslateOne { id: String },
    /// Trigger a maintenance job
    Maintenance {
        #[arg(value_enum)]
        action: MaintenanceArg,
        /// Required for destructive actions
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Enrichment pipeline
    Enrich {
        #[command(subcommand)]
        command: EnrichCommand,
    },
}

#[derive(Subcommand)]
enum EnrichCommand {
    /// Queue every unprocessed foundation
    Start,
    /// Show fleet progress
    Status {
        /// Keep polling until nothing is pending or processing
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
    /// Run the pipeline for a single foundation and show each step
    Test {
        id: String,
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long, default_value_t = false)]
        force_search: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum MaintenanceArg {
    FoundationSync,
    GrantSync,
    ResetCategories,
    ClearDatabase,
}

impl From<MaintenanceArg> for MaintenanceAction {
    fn from(arg: MaintenanceArg) -> Self {
        match arg {
            MaintenanceArg::FoundationSync => MaintenanceAction::FoundationSync,
            MaintenanceArg::GrantSync => MaintenanceAction::GrantSync,
            MaintenanceArg::ResetCategories => MaintenanceAction::ResetCategories,
            MaintenanceArg::ClearDatabase => MaintenanceAction::ClearDatabase,
        }
    }
}

/// Shared handles built once from configuration.
struct Console {
    config: Config,
    credentials: Arc<FileCredentials>,
    backend: Arc<dyn Transport>,
    engine: Arc<dyn Transport>,
}

impl Console {
    fn new(config: Config) -> anyhow::Result<Self> {
        let credentials = Arc::new(FileCredentials::new(config.token_file.clone()));
        let backend = HttpTransport::new(
            config.backend_url.clone(),
            config.request_timeout,
            credentials.clone(),
        )
        .context("Failed to create backend client")?;
        let engine = HttpTransport::new(
            config.engine_url.clone(),
            config.request_timeout,
            credentials.clone(),
        )
        .context("Failed to create engine client")?;
        Ok(Self {
            config,
            credentials,
            backend: Arc::new(backend),
            engine: Arc::new(engine),
        })
    }

    /// Commands other than login need a live session.
    fn require_session(&self) -> anyhow::Result<()> {
        let user = auth::restore_session(self.credentials.as_ref(), Utc::now())
            .context("Not signed in; run `scholarship-console login`")?;
        tracing::debug!(user = %user.email, "session restored");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "scholarship_console=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!(
        backend = %config.backend_url,
        engine = %config.engine_url,
        "Loaded configuration"
    );
    let console = Console::new(config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    run(&console, cli.command, cancel).await
}

async fn run(console: &Console, command: Command, cancel: CancellationToken) -> anyhow::Result<()> {
    if !matches!(command, Command::Login { .. } | Command::Logout) {
        console.require_session()?;
    }

    match command {
        Command::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            let user = auth::login(
                console.backend.as_ref(),
                console.credentials.as_ref(),
                &email,
                &password,
            )
            .await
            .context("Login failed")?;
            println!("Signed in as {} ({})", user.name, user.role);
        }
        Command::Logout => {
            auth::logout(console.credentials.as_ref());
            println!("Signed out");
        }
        Command::Whoami => {
            let user = auth::restore_session(console.credentials.as_ref(), Utc::now())?;
            println!("{} <{}> role={}", user.name, user.email, user.role);
        }
        Command::Queue { search } => {
            let items = ScholarshipClient::new(console.engine.clone())
                .queue()
                .await
                .context("Failed to load the moderation queue")?;
            let shown = filter_queue(&items, search.as_deref().unwrap_or(""));
            if shown.is_empty() {
                println!("No scholarships in the queue");
            }
            for item in shown {
                println!(
                    "{}\t{}\t{}\t{} ({})",
                    item.id,
                    item.status,
                    item.added_on().unwrap_or_else(|| item.created_at.clone()),
                    item.name,
                    item.organization_name
                );
            }
        }
        Command::Scrape { id } => {
            let response = ScholarshipClient::new(console.engine.clone())
                .trigger_scrape(&id)
                .await
                .with_context(|| format!("Failed to trigger scrape for {}", id))?;
            println!("{}", response.message);
        }
        Command::Review { id } => {
            let record = ScholarshipClient::new(console.engine.clone())
                .review(&id)
                .await
                .with_context(|| format!("Failed to load scholarship {}", id))?;
            println!("{} [{}]", record.id, record.status);
            for (label, value) in record.extracted_fields() {
                println!("{:>20}: {}", label, value);
            }
            if let Some(raw) = record.raw_scraped_content.as_deref() {
                println!("\nRaw scraped content:\n{}", truncate_chars(raw, 2000));
            }
        }
        Command::Approve { id } => {
            let response = ScholarshipClient::new(console.engine.clone())
                .approve(&id)
                .await
                .with_context(|| format!("Failed to approve {}", id))?;
            println!("{} is now {}", response.id, response.status);
        }
        Command::Translate { force } => {
            translate(console, force, cancel).await?;
        }
        Command::TranslateOne { id } => {
            let body = Maintenance::new(console.backend.clone())
                .translate_foundation(&id)
                .await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Maintenance { action, yes } => {
            let action = MaintenanceAction::from(action);
            if action.is_destructive() && !yes {
                bail!(
                    "{} is destructive: {}. Re-run with --yes to confirm.",
                    action.label(),
                    action.description()
                );
            }
            let body = Maintenance::new(console.backend.clone())
                .with_timeout(console.config.launch_timeout)
                .run(action, yes)
                .await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Enrich { command } => {
            enrich(console, command, cancel).await?;
        }
    }
    Ok(())
}

async fn translate(console: &Console, force: bool, cancel: CancellationToken) -> anyhow::Result<()> {
    let launcher = Launcher::new(console.backend.clone());
    let poller = Poller::new(console.backend.clone(), console.config.poll.clone());
    let endpoint = JobEndpoint::bulk_translation(force);

    let mut last_line = String::new();
    let outcome = track(&launcher, &poller, &endpoint, None, cancel, |op| {
        if let AsyncOperation::Running(Some(snapshot)) = op {
            let line = progress_line(snapshot);
            if line != last_line {
                println!("{}", line);
                last_line = line;
            }
        }
    })
    .await;

    match outcome {
        Ok(snapshot) => {
            println!("{}", progress::project(&snapshot).label);
            println!("{}", progress::status_text(&snapshot));
            Ok(())
        }
        Err(JobError::TaskFailed(snapshot)) => {
            println!("{}", progress::status_text(&snapshot));
            bail!("{}", progress::project(&snapshot).label)
        }
        Err(e) => Err(e.into()),
    }
}

fn progress_line(snapshot: &TaskSnapshot) -> String {
    let view = progress::project(snapshot);
    let mut line = format!(
        "{:>5.1}%  {}/{} done, {} failed, {} skipped",
        view.percent, snapshot.completed, snapshot.total, snapshot.failed, snapshot.skipped
    );
    if !view.eta_label.is_empty() {
        line.push_str("  ");
        line.push_str(&view.eta_label);
    }
    line
}

async fn enrich(
    console: &Console,
    command: EnrichCommand,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let client = EnrichmentClient::new(console.backend.clone(), console.config.poll.clone());
    match command {
        EnrichCommand::Start => {
            let enqueued = client.start().await?;
            println!("Enqueued {} foundations", enqueued);
        }
        EnrichCommand::Status { watch: false } => {
            let status = client.status().await.context("Failed to load enrichment status")?;
            println!("{}", enrichment_line(&status));
        }
        EnrichCommand::Status { watch: true } => {
            let stream = client.watch(cancel);
            futures::pin_mut!(stream);
            while let Some(item) = stream.next().await {
                let status = item?;
                println!("{}", enrichment_line(&status));
            }
        }
        EnrichCommand::Test {
            id,
            prompt,
            force_search,
        } => {
            let options = TestRunOptions {
                custom_prompt: prompt,
                force_search,
            };
            let report = client
                .test_item(&id, &options)
                .await
                .with_context(|| format!("Enrichment test for {} failed", id))?;
            println!("{}", report.name);
            for step in &report.steps {
                let detail = step
                    .url
                    .as_deref()
                    .or(step.message.as_deref())
                    .unwrap_or("");
                println!("  [{}] {} {}", step.status, step.step, detail);
            }
            println!("Sites used: {}", report.consensus.sites_used);
            for (field, consensus) in &report.enriched_data {
                println!("{:>20}: {}", field, consensus.verdict());
            }
        }
    }
    Ok(())
}

fn enrichment_line(status: &EnrichmentStatus) -> String {
    format!(
        "{:>5.1}%  {}/{} completed, {} pending, {} processing, {} failed, {} unprocessed",
        status.completed_percentage(),
        status.counts.completed,
        status.total,
        status.counts.pending,
        status.counts.processing,
        status.counts.failed,
        status.counts.unprocessed
    )
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Password is required");
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use scholarship_console::jobs::{TaskId, TaskStatus};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_maintenance_with_confirmation() {
        let cli = Cli::try_parse_from(["scholarship-console", "maintenance", "clear-database", "--yes"])
            .unwrap();
        match cli.command {
            Command::Maintenance { action, yes } => {
                assert_eq!(action, MaintenanceArg::ClearDatabase);
                assert!(yes);
                assert_eq!(
                    MaintenanceAction::from(action),
                    MaintenanceAction::ClearDatabase
                );
            }
            _ => panic!("expected maintenance command"),
        }
    }

    #[test]
    fn parses_enrich_test_options() {
        let cli = Cli::try_parse_from([
            "scholarship-console",
            "enrich",
            "test",
            "77",
            "--prompt",
            "Svara kort",
            "--force-search",
        ])
        .unwrap();
        match cli.command {
            Command::Enrich {
                command:
                    EnrichCommand::Test {
                        id,
                        prompt,
                        force_search,
                    },
            } => {
                assert_eq!(id, "77");
                assert_eq!(prompt.as_deref(), Some("Svara kort"));
                assert!(force_search);
            }
            _ => panic!("expected enrich test command"),
        }
    }

    #[test]
    fn unknown_maintenance_action_is_rejected() {
        assert!(Cli::try_parse_from(["scholarship-console", "maintenance", "drop-everything"]).is_err());
    }

    #[test]
    fn progress_line_includes_eta_when_known() {
        let snapshot = TaskSnapshot {
            task_id: TaskId::new("t"),
            status: TaskStatus::Running,
            progress_percent: 50.0,
            completed: 5,
            failed: 1,
            skipped: 0,
            total: 12,
            estimated_seconds_remaining: Some(45.0),
            error: None,
        };
        assert_eq!(
            progress_line(&snapshot),
            " 50.0%  5/12 done, 1 failed, 0 skipped  ~45s remaining"
        );
    }
}
