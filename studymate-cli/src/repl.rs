//! Interactive chat loop

use anyhow::Result;
use console::style;
use dialoguer::Input;
use studymate_client::ChatBackend;
use studymate_core::utils::expand_tilde;
use tracing::{info, warn};

use crate::{interruptible, load_document, render, with_spinner, App};

enum Command<'a> {
    Ask(&'a str),
    Upload(&'a str),
    Clear,
    Reset,
    Recent,
    Forget,
    Status,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Ask(line);
    };
    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map(|(name, arg)| (name, arg.trim()))
        .unwrap_or((rest, ""));

    match name {
        "upload" => Command::Upload(arg),
        "clear" => Command::Clear,
        "reset" => Command::Reset,
        "recent" => Command::Recent,
        "forget" => Command::Forget,
        "status" => Command::Status,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(name),
    }
}

/// Tracks how much of the transcript has been printed
struct TranscriptView {
    shown: usize,
}

impl TranscriptView {
    /// Print entries added since the last call. A shorter transcript means
    /// it was cleared, so printing restarts from the top.
    fn print_new(&mut self, app: &App) {
        let messages = app.session.messages();
        if messages.len() < self.shown {
            self.shown = 0;
        }
        for message in &messages[self.shown..] {
            render::print_message(message);
        }
        self.shown = messages.len();
    }
}

pub async fn run(mut app: App) -> Result<()> {
    println!("{}", style("StudyMate").bold().cyan());
    println!("Upload a PDF with /upload <path>, then ask questions about it. /help lists commands.\n");

    let mut view = TranscriptView { shown: 0 };

    loop {
        let prompt = match app.session.active_document_name() {
            Some(name) => format!("You [{}]", name),
            None => "You".to_string(),
        };
        let line = tokio::task::spawn_blocking(move || {
            Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
        })
        .await??;

        match parse_command(&line) {
            Command::Ask("") => continue,
            Command::Ask(text) => {
                let session = app.session.clone();
                with_spinner(
                    "Thinking...",
                    interruptible(&session, session.send_message(text)),
                )
                .await;
            }
            Command::Upload("") => {
                println!("{}", style("Usage: /upload <path>").yellow());
                continue;
            }
            Command::Upload(path) => match load_document(&expand_tilde(path)).await {
                Ok(document) => {
                    let session = app.session.clone();
                    with_spinner(
                        &format!("Processing {}...", document.name),
                        interruptible(&session, session.upload_document(document)),
                    )
                    .await;
                }
                Err(e) => {
                    warn!("{:#}", e);
                    println!("{} {:#}", style("✗").red(), e);
                    continue;
                }
            },
            Command::Clear => {
                app.session.clear_chat();
                println!("{}", style("Chat cleared.").dim());
            }
            Command::Reset => {
                let session = app.session.clone();
                with_spinner(
                    "Resetting conversation...",
                    interruptible(&session, session.reset_conversation()),
                )
                .await;
            }
            Command::Recent => render::print_recent(&app.session.recent_documents()),
            Command::Forget => {
                app.session.clear_recent_documents();
                println!("{}", style("Recent documents forgotten.").dim());
            }
            Command::Status => print_backend_status(&app).await,
            Command::Help => render::print_help(),
            Command::Quit => break,
            Command::Unknown(name) => {
                println!(
                    "{} Unknown command /{} (try /help)",
                    style("?").yellow(),
                    name
                );
                continue;
            }
        }

        view.print_new(&app);
        app.drain_notifications();
    }

    info!("Leaving chat");
    Ok(())
}

async fn print_backend_status(app: &App) {
    println!("{} {}", style("Backend:").bold(), app.client.api_base());

    match app.client.check_health().await {
        Ok(health) => println!("  {}: {}", style(&health.status).green(), health.message),
        Err(e) => println!("  {}: {}", style("unreachable").red(), e),
    }
    if let Ok(status) = app.client.get_status().await {
        println!(
            "  initialized: {}, database: {}, qa chain: {}",
            status.initialized, status.has_database, status.has_qa_chain
        );
    }
    println!(
        "  history sent with questions: {}",
        app.config.session.include_history
    );
}
