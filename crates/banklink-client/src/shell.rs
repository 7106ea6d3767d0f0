//! Interactive session: one long-lived client driven from stdin.
//!
//! Sync and exchange run as background tasks, so the prompt stays usable
//! while a backend call is pending.

use std::sync::Arc;

use banklink_core::{BankLinkError, LinkEvent, LinkWidget, Metadata, PublicAuthorization};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{debug, info};

use crate::session::{ExchangeOutcome, LinkEventOutcome, SessionController, SyncOutcome};
use crate::widget::ConsoleLinkWidget;

const HELP: &str = "\
Commands:
  connect                          open the link flow
  success <public_token> [json]    report a completed link flow
  event <name> [json]              report an intermediate link event
  exit [json]                      report an abandoned link flow
  sync                             refresh accounts and transactions
  reset | clear                    clear the session
  status                           show the session
  help                             show this help
  quit                             leave the shell";

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Connect,
    Link(LinkEvent),
    Sync,
    Reset,
    Status,
    Help,
    Quit,
    Empty,
}

/// Parse an optional JSON object argument.
pub fn parse_metadata(text: &str) -> Result<Metadata, String> {
    if text.trim().is_empty() {
        return Ok(Metadata::new());
    }
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err("metadata must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid metadata JSON: {}", e)),
    }
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

/// Parse one line of input.
pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let (word, rest) = split_word(line);
    let command = match word.to_ascii_lowercase().as_str() {
        "" => ShellCommand::Empty,
        "connect" => ShellCommand::Connect,
        "success" => {
            let (token, metadata) = split_word(rest);
            if token.is_empty() {
                return Err("usage: success <public_token> [metadata-json]".to_string());
            }
            let metadata = parse_metadata(metadata)?;
            ShellCommand::Link(LinkEvent::Success(PublicAuthorization::new(token, metadata)))
        }
        "event" => {
            let (name, metadata) = split_word(rest);
            if name.is_empty() {
                return Err("usage: event <name> [metadata-json]".to_string());
            }
            ShellCommand::Link(LinkEvent::Event {
                name: name.to_string(),
                metadata: parse_metadata(metadata)?,
            })
        }
        "exit" => {
            let error = if rest.is_empty() {
                None
            } else {
                Some(
                    serde_json::from_str(rest)
                        .map_err(|e| format!("invalid error JSON: {}", e))?,
                )
            };
            ShellCommand::Link(LinkEvent::Exit {
                error,
                metadata: Metadata::new(),
            })
        }
        "sync" => ShellCommand::Sync,
        "reset" | "clear" => ShellCommand::Reset,
        "status" => ShellCommand::Status,
        "help" | "?" => ShellCommand::Help,
        "quit" | "q" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(command)
}

pub fn describe_sync(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Completed {
            accounts,
            transactions,
        } => format!(
            "Synced {} accounts and {} transactions",
            accounts, transactions
        ),
        SyncOutcome::AlreadyInFlight => "A sync is already in progress".to_string(),
        SyncOutcome::Failed(_) => "Sync failed; run sync again to retry".to_string(),
        SyncOutcome::Superseded => "Sync result discarded: the session changed".to_string(),
    }
}

pub fn describe_exchange(outcome: &ExchangeOutcome) -> String {
    match outcome {
        ExchangeOutcome::Linked => "Bank account linked".to_string(),
        ExchangeOutcome::Failed(_) => "Linking failed; no credential was stored".to_string(),
    }
}

pub fn describe_reset(result: &Result<(), BankLinkError>) -> String {
    match result {
        Ok(()) => "Session cleared".to_string(),
        Err(e) => format!("Could not clear the session: {}", e),
    }
}

async fn print_status(controller: &SessionController, widget: &ConsoleLinkWidget) {
    let view = controller.view(widget.is_ready()).await;
    print!("{}", view);
}

fn spawn_sync(controller: Arc<SessionController>) {
    tokio::spawn(async move {
        match controller.sync().await {
            Ok(outcome) => println!("{}", describe_sync(&outcome)),
            Err(e) => println!("{}", e),
        }
    });
}

fn spawn_link(controller: Arc<SessionController>, event: LinkEvent) {
    tokio::spawn(async move {
        match controller.handle_link_event(event).await {
            Ok(LinkEventOutcome::Exchanged(outcome)) => println!("{}", describe_exchange(&outcome)),
            Ok(LinkEventOutcome::Observed) => {}
            Err(e) => println!("{}", e),
        }
    });
}

/// Run the interactive shell until `quit`, end of input or Ctrl+C.
pub async fn run(
    controller: Arc<SessionController>,
    widget: Arc<ConsoleLinkWidget>,
) -> anyhow::Result<()> {
    // Link initialization runs once, in the background
    {
        let controller = controller.clone();
        let widget = widget.clone();
        tokio::spawn(async move {
            if let Some(token) = controller.initialize_link().await {
                widget.attach(token);
            }
        });
    }

    println!("{}", HELP);
    print_status(&controller, &widget).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, leaving shell");
                None
            }
        };
        let Some(line) = line else { break };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };
        debug!("Shell command: {:?}", command);

        match command {
            ShellCommand::Empty => {}
            ShellCommand::Quit => break,
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Status => print_status(&controller, &widget).await,
            ShellCommand::Connect => {
                if controller.state().await.is_linked() {
                    println!("Already linked; reset the session to link another account");
                } else if let Err(e) = widget.open() {
                    println!("{}", e);
                }
            }
            ShellCommand::Link(event) => spawn_link(controller.clone(), event),
            ShellCommand::Sync => spawn_sync(controller.clone()),
            ShellCommand::Reset => {
                let result = controller.reset().await;
                println!("{}", describe_reset(&result));
                print_status(&controller, &widget).await;
            }
        }
    }

    Ok(())
}
