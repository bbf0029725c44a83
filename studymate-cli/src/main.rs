//! CLI entry point for studymate

mod render;
mod repl;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use studymate_client::{ApiClient, ChatBackend, DocumentFile};
use studymate_core::config::validate::validate_config;
use studymate_core::config::{Config, ConfigLoader};
use studymate_core::logging::init_logging;
use studymate_core::storage::{FileStore, KeyValueStore};
use studymate_core::utils::{ensure_dir, expand_tilde};
use studymate_core::session::Role;
use studymate_session::{Notification, Outcome, RecentDocuments, SessionManager};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "studymate")]
#[command(about = "Ask questions about your PDF documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file interactively
    Init,
    #[command(flatten)]
    Session(SessionCommands),
}

/// Commands that run against a loaded configuration
#[derive(Subcommand)]
enum SessionCommands {
    /// Start an interactive chat session
    Chat,
    /// Ask a single question
    Ask {
        /// Question to send
        message: String,
    },
    /// Upload a PDF document
    Upload {
        /// Path to the PDF file
        path: PathBuf,
        /// Question to ask once the document is processed
        #[arg(short, long)]
        question: Option<String>,
    },
    /// List recently uploaded documents
    Recent {
        /// Forget the list instead of printing it
        #[arg(long)]
        clear: bool,
    },
    /// Check that the backend is reachable
    Health,
    /// Show configuration and backend status
    Status,
}

/// Everything a command needs to talk to the backend
pub(crate) struct App {
    pub config: Config,
    pub client: Arc<ApiClient>,
    pub session: Arc<SessionManager>,
    pub notifications: broadcast::Receiver<Notification>,
}

impl App {
    fn new(config: Config) -> Self {
        let client = Arc::new(ApiClient::from_config(&config.backend));
        let store = open_store(&config);
        let session = Arc::new(SessionManager::new(
            client.clone(),
            store,
            &config.session,
        ));
        let notifications = session.subscribe_notifications();

        Self {
            config,
            client,
            session,
            notifications,
        }
    }

    /// Print every notification emitted since the last drain
    pub fn drain_notifications(&mut self) {
        loop {
            match self.notifications.try_recv() {
                Ok(notification) => render::print_notification(&notification),
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!("Skipped {} notifications", skipped);
                }
                Err(_) => break,
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    match cli.command {
        Commands::Init => run_init(&config_loader),
        Commands::Session(command) => run(command, &config_loader).await,
    }
}

async fn run(command: SessionCommands, loader: &ConfigLoader) -> Result<()> {
    let config = loader.load()?;
    let _log_guard = init_logging(&config.logging);

    match command {
        SessionCommands::Chat => {
            info!("Starting interactive chat");
            repl::run(App::new(config)).await?;
        }
        SessionCommands::Ask { message } => {
            info!("Asking a single question");
            run_ask(App::new(config), &message).await?;
        }
        SessionCommands::Upload { path, question } => {
            info!("Uploading {}", path.display());
            run_upload(App::new(config), &path, question.as_deref()).await?;
        }
        SessionCommands::Recent { clear } => {
            run_recent(&config, clear);
        }
        SessionCommands::Health => {
            run_health(&config).await?;
        }
        SessionCommands::Status => {
            run_status(loader, &config).await?;
        }
    }

    Ok(())
}

/// Run the setup wizard
fn run_init(loader: &ConfigLoader) -> Result<()> {
    println!("{}", style("Welcome to StudyMate!").bold().cyan());
    println!("Let's point the client at your backend.\n");

    let config_path = loader.config_dir().join("config.json");
    if config_path.exists() {
        let overwrite = Confirm::new()
            .with_prompt("Configuration already exists. Overwrite?")
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Setup cancelled.");
            return Ok(());
        }
    }

    let mut config = Config::default();

    config.backend.api_base = Input::new()
        .with_prompt("Backend API base URL")
        .default(config.backend.api_base.clone())
        .interact_text()?;

    let upload_default = config.backend.effective_upload_base().to_string();
    let upload_base: String = Input::new()
        .with_prompt("Upload service base URL")
        .default(upload_default)
        .interact_text()?;
    config.backend.upload_base = Some(upload_base);

    config.session.include_history = Confirm::new()
        .with_prompt("Send earlier messages along with each question?")
        .default(config.session.include_history)
        .interact()?;

    validate_config(&config)?;
    loader.save(&config)?;
    ensure_dir(expand_tilde(&config.storage.dir))?;

    println!(
        "\n{}",
        style("Configuration saved successfully!").green().bold()
    );
    println!("Config location: {}", config_path.display());
    println!("\nYou can now run:");
    println!("  {} - Upload a document", style("studymate upload notes.pdf").cyan());
    println!("  {} - Start chatting", style("studymate chat").cyan());

    Ok(())
}

fn open_store(config: &Config) -> Arc<dyn KeyValueStore> {
    Arc::new(FileStore::new(expand_tilde(&config.storage.dir)))
}

/// Show a spinner until `future` resolves
pub(crate) async fn with_spinner<F: Future>(message: &str, future: F) -> F::Output {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let output = future.await;
    spinner.finish_and_clear();
    output
}

/// Drive a session operation, cancelling in-flight requests on Ctrl+C
pub(crate) async fn interruptible<F>(session: &SessionManager, operation: F) -> Outcome
where
    F: Future<Output = Outcome>,
{
    tokio::pin!(operation);
    tokio::select! {
        outcome = &mut operation => outcome,
        _ = tokio::signal::ctrl_c() => {
            println!("\n{}", style("Cancelling...").yellow());
            session.cancel_pending();
            operation.await
        }
    }
}

pub(crate) async fn load_document(path: &Path) -> Result<DocumentFile> {
    DocumentFile::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn run_ask(mut app: App, message: &str) -> Result<()> {
    let session = app.session.clone();
    let outcome = with_spinner(
        "Thinking...",
        interruptible(&session, session.send_message(message)),
    )
    .await;

    app.drain_notifications();
    print_replies(&session);
    finish(outcome, "Failed to send message")
}

async fn run_upload(mut app: App, path: &Path, question: Option<&str>) -> Result<()> {
    let document = load_document(path).await?;
    let session = app.session.clone();

    let outcome = with_spinner(
        &format!("Processing {}...", document.name),
        interruptible(&session, session.upload_document(document)),
    )
    .await;
    app.drain_notifications();
    finish(outcome, "Failed to upload document")?;

    if let Some(question) = question {
        let outcome = with_spinner(
            "Thinking...",
            interruptible(&session, session.send_message(question)),
        )
        .await;
        app.drain_notifications();
        print_replies(&session);
        finish(outcome, "Failed to send message")?;
    }

    Ok(())
}

fn print_replies(session: &SessionManager) {
    for message in session
        .messages()
        .iter()
        .filter(|m| m.role != Role::User)
    {
        render::print_message(message);
    }
}

fn finish(outcome: Outcome, context: &str) -> Result<()> {
    match outcome {
        Outcome::Completed | Outcome::Ignored => Ok(()),
        Outcome::Rejected | Outcome::Failed => anyhow::bail!("{}", context),
        Outcome::Cancelled => anyhow::bail!("{}: cancelled", context),
    }
}

fn run_recent(config: &Config, clear: bool) {
    let mut recent = RecentDocuments::load(open_store(config), config.session.recent_limit);

    if clear {
        recent.clear();
        println!("{} Recent documents cleared", style("✓").green().bold());
    } else {
        render::print_recent(recent.names());
    }
}

async fn run_health(config: &Config) -> Result<()> {
    let client = ApiClient::from_config(&config.backend);

    match with_spinner("Checking backend...", client.check_health()).await {
        Ok(health) => {
            println!(
                "{} {} ({})",
                style("✓").green().bold(),
                health.status,
                health.message
            );
            Ok(())
        }
        Err(e) => {
            println!("{} Backend unreachable", style("✗").red());
            Err(e).context(format!("Health check against {} failed", client.api_base()))
        }
    }
}

async fn run_status(loader: &ConfigLoader, config: &Config) -> Result<()> {
    let client = ApiClient::from_config(&config.backend);

    println!("{}", style("StudyMate Status").bold().cyan());
    println!("Version: {}\n", env!("CARGO_PKG_VERSION"));

    println!("{}", style("Configuration:").bold());
    println!("  Config directory: {}", loader.config_dir().display());
    println!("  API base: {}", client.api_base());
    println!("  Upload base: {}", client.upload_base());
    let store = FileStore::new(expand_tilde(&config.storage.dir));
    println!("  Data file: {}", store.path().display());
    println!(
        "  Send history: {}",
        if config.session.include_history {
            style("yes").green()
        } else {
            style("no").dim()
        }
    );
    println!();

    println!("{}", style("Backend:").bold());
    match client.get_status().await {
        Ok(status) => {
            for (name, ready) in [
                ("Initialized", status.initialized),
                ("Vector database", status.has_database),
                ("QA chain", status.has_qa_chain),
            ] {
                let state = if ready {
                    style("ready").green()
                } else {
                    style("not ready").yellow()
                };
                println!("  {}: {}", name, state);
            }
        }
        Err(e) => {
            println!("  {}: {}", style("unreachable").red(), e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_and_session_commands_parse() {
        let cli = Cli::try_parse_from(["studymate", "init"]).unwrap();
        assert!(matches!(cli.command, Commands::Init));

        let cli = Cli::try_parse_from(["studymate", "ask", "what is entropy?"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Session(SessionCommands::Ask { ref message }) if message == "what is entropy?"
        ));

        let cli = Cli::try_parse_from([
            "studymate",
            "upload",
            "notes.pdf",
            "--question",
            "summary?",
            "--config-dir",
            "/tmp/sm",
        ])
        .unwrap();
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/sm")));
        assert!(matches!(
            cli.command,
            Commands::Session(SessionCommands::Upload { question: Some(_), .. })
        ));
    }
}
