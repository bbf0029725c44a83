//! Terminal rendering of transcript entries and notifications

use chrono::Local;
use console::style;
use studymate_core::session::{ChatMessage, DeliveryStatus, Role};
use studymate_core::utils::truncate;
use studymate_session::{Notification, NotificationLevel};

const RECENT_NAME_WIDTH: usize = 48;

/// Print one transcript entry with its local-time timestamp
pub fn print_message(message: &ChatMessage) {
    let time = message
        .timestamp
        .with_timezone(&Local)
        .format("%H:%M")
        .to_string();

    match message.role {
        Role::User => {
            let marker = match message.status {
                DeliveryStatus::Failed => format!(" {}", style("(not delivered)").red()),
                DeliveryStatus::Pending => format!(" {}", style("(sending)").dim()),
                DeliveryStatus::Sent => String::new(),
            };
            println!(
                "{} {}{}",
                style(format!("[{}]", time)).dim(),
                style("You:").bold().blue(),
                marker
            );
            println!("  {}", message.content);
        }
        Role::Assistant => {
            println!(
                "{} {}",
                style(format!("[{}]", time)).dim(),
                style("StudyMate:").bold().cyan()
            );
            for line in message.content.lines() {
                println!("  {}", line);
            }
        }
        Role::System => {
            println!(
                "{} {}",
                style(format!("[{}]", time)).dim(),
                style(&message.content).italic().yellow()
            );
        }
    }
    println!();
}

pub fn print_notification(notification: &Notification) {
    let badge = match notification.level {
        NotificationLevel::Success => style("✓").green().bold(),
        NotificationLevel::Error => style("✗").red().bold(),
    };
    println!(
        "{} {} {}",
        badge,
        style(&notification.title).bold(),
        style(&notification.description).dim()
    );
}

pub fn print_recent(names: &[String]) {
    println!("{}", style("Recent Documents").bold().cyan());
    if names.is_empty() {
        println!("  {}", style("none yet").dim());
        return;
    }
    for (index, name) in names.iter().enumerate() {
        println!("  {}. {}", index + 1, truncate(name, RECENT_NAME_WIDTH));
    }
}

pub fn print_help() {
    println!("{}", style("Commands").bold().cyan());
    for (command, help) in [
        ("/upload <path>", "Upload a PDF and make it the active document"),
        ("/clear", "Clear the chat locally"),
        ("/reset", "Reset the conversation on the server"),
        ("/recent", "List recently uploaded documents"),
        ("/forget", "Forget the recent documents list"),
        ("/status", "Show backend health and status"),
        ("/help", "Show this help"),
        ("/quit", "Leave the chat"),
    ] {
        println!("  {:<16} {}", style(command).green(), help);
    }
    println!("  Anything else is sent as a question.");
}
