//! Console host for the anonymous feedback form.
//!
//! Reads line commands from stdin, drives a feedback session and prints the
//! step indicator, dialog and notifications as the session view changes.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::info;

use feedback_core::steps::render_line;
use feedback_core::{
    Category, EmailJsSender, FeedbackConfig, FeedbackSession, LocalDraftStore, SessionDriver,
    SessionView, UiEvent,
};

const HELP: &str = "\
Commands:
  category <suggestion|concern|general>
  text <your feedback>
  submit | ctrl+enter     open the confirmation dialog
  confirm | cancel | esc  answer the dialog
  reset                   clear the form and stored draft
  dismiss                 close the notification
  status                  show the form
  help | quit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedback_core=info,feedback_console=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = FeedbackConfig::from_env().context("invalid feedback configuration")?;
    let sender = EmailJsSender::from_env().context("EmailJS is not configured")?;
    let store = LocalDraftStore::new(&config.draft_path);
    info!(draft_path = %config.draft_path.display(), "Starting feedback console");

    let session = FeedbackSession::start(&config, Arc::new(sender), Arc::new(store)).await;
    let (event_tx, event_rx) = mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (driver, views) = SessionDriver::new(session, event_rx);

    println!("Anonymous Feedback");
    println!("Your voice matters! Share your feedback anonymously with the Student Government Association.");
    println!("{HELP}");

    let status_view = views.clone();
    let renderer = tokio::spawn(render_views(views));
    let driver = tokio::spawn(driver.run(shutdown_rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(line.trim()) {
            Command::Event(event) => {
                if event_tx.send(event).await.is_err() {
                    break;
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Status => render(&status_view.borrow()),
            Command::Quit => break,
            Command::Unknown(message) => println!("{message}"),
        }
    }

    shutdown_tx.send(true).ok();
    let session = driver.await.context("session driver panicked")?;
    let events = session.end();
    renderer.abort();
    info!(events = events.len(), "Feedback console stopped");
    Ok(())
}

enum Command {
    Event(UiEvent),
    Help,
    Status,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map(|(h, r)| (h, r.trim()))
        .unwrap_or((line, ""));

    match head.to_ascii_lowercase().as_str() {
        "category" => match rest.parse::<Category>() {
            Ok(category) => Command::Event(UiEvent::SelectCategory(category.as_str().to_string())),
            Err(e) => Command::Unknown(e.to_string()),
        },
        "text" => Command::Event(UiEvent::EditText(rest.to_string())),
        "submit" => Command::Event(UiEvent::Submit),
        "confirm" | "yes" => Command::Event(UiEvent::Confirm),
        "cancel" | "no" => Command::Event(UiEvent::Cancel),
        "reset" => Command::Event(UiEvent::Reset),
        "dismiss" => Command::Event(UiEvent::DismissNotification),
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "" => Command::Status,
        _ => match line.parse() {
            Ok(chord) => Command::Event(UiEvent::Key(chord)),
            Err(_) => Command::Unknown(format!("Unknown command: {line} (try `help`)")),
        },
    }
}

async fn render_views(mut views: watch::Receiver<SessionView>) {
    render(&views.borrow_and_update());
    while views.changed().await.is_ok() {
        render(&views.borrow_and_update());
    }
}

fn render(view: &SessionView) {
    println!();
    println!("{}", render_line(view.step));

    let category = view.category.map(|c| c.label()).unwrap_or("(none)");
    println!("Category: {category}");
    if let Some(err) = &view.errors.category {
        println!("  ! {err}");
    }

    println!(
        "Feedback: {} ({} characters remaining)",
        if view.text.is_empty() { "(empty)" } else { view.text.as_str() },
        view.remaining_characters
    );
    if let Some(err) = &view.errors.text {
        println!("  ! {err}");
    }

    if let Some(prompt) = &view.prompt {
        println!("── Confirm submission ──");
        println!("  {}: {}", prompt.category.label(), prompt.feedback);
        println!("  Send this feedback anonymously? (confirm / cancel)");
    }
    if view.loading {
        println!("Sending...");
    }
    if view.notification.visible {
        println!(
            "[{}] {}",
            view.notification.kind.as_str().to_uppercase(),
            view.notification.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedback_core::{Key, KeyChord};

    fn event(line: &str) -> Option<UiEvent> {
        match parse_command(line) {
            Command::Event(event) => Some(event),
            _ => None,
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            event("category concern"),
            Some(UiEvent::SelectCategory("concern".to_string()))
        );
        assert_eq!(
            event("text Parking is inadequate"),
            Some(UiEvent::EditText("Parking is inadequate".to_string()))
        );
        assert_eq!(
            event("ctrl+enter"),
            Some(UiEvent::Key(KeyChord::ctrl(Key::Enter)))
        );
        assert_eq!(event("esc"), Some(UiEvent::Key(KeyChord::plain(Key::Escape))));
        assert_eq!(event("confirm"), Some(UiEvent::Confirm));
        assert!(matches!(parse_command("category praise"), Command::Unknown(_)));
        assert!(matches!(parse_command("frobnicate"), Command::Unknown(_)));
        assert!(matches!(parse_command("quit"), Command::Quit));
    }
}
