use std::sync::Arc;

use anyhow::{anyhow, bail};
use banklink_client::config::{Command, Config};
use banklink_client::session::{ExchangeOutcome, LinkEventOutcome, SessionController, SyncOutcome};
use banklink_client::shell;
use banklink_client::store::{CredentialStore, FileStore, MemoryStore};
use banklink_client::widget::ConsoleLinkWidget;
use banklink_core::{KeyValueStore, LinkBackend, LinkEvent, PublicAuthorization};
use banklink_http::HttpLinkBackend;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (stderr, so stdout carries only the session output)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    info!("Starting banklink v{}", env!("CARGO_PKG_VERSION"));
    info!("  API: {}", config.api_url);

    let kv: Arc<dyn KeyValueStore> = if config.ephemeral {
        info!("  Store: memory (ephemeral)");
        Arc::new(MemoryStore::new())
    } else {
        let dir = config.effective_state_dir();
        info!("  Store: {}", dir.display());
        Arc::new(FileStore::new(&dir))
    };

    let backend: Arc<dyn LinkBackend> = Arc::new(HttpLinkBackend::new(
        config.api_url.clone(),
        config.client_name.clone(),
    ));

    let controller = Arc::new(SessionController::start(backend, CredentialStore::new(kv)).await);

    match config.command.clone().unwrap_or(Command::Shell) {
        Command::Status => {
            print!("{}", controller.view(false).await);
        }
        Command::LinkToken => match controller.initialize_link().await {
            Some(token) => println!("{}", token.as_str()),
            None => bail!("Could not obtain a link token from {}", config.api_url),
        },
        Command::Link {
            public_token,
            metadata,
        } => {
            let metadata = shell::parse_metadata(metadata.as_deref().unwrap_or(""))
                .map_err(|e| anyhow!("Invalid --metadata: {}", e))?;
            let event = LinkEvent::Success(PublicAuthorization::new(public_token, metadata));
            match controller.handle_link_event(event).await? {
                LinkEventOutcome::Exchanged(ExchangeOutcome::Linked) => {
                    print!("{}", controller.view(false).await);
                }
                LinkEventOutcome::Exchanged(ExchangeOutcome::Failed(reason)) => {
                    bail!("Linking failed: {}", reason)
                }
                LinkEventOutcome::Observed => {}
            }
        }
        Command::Sync => {
            let outcome = controller.sync().await?;
            println!("{}", shell::describe_sync(&outcome));
            if let SyncOutcome::Failed(reason) = outcome {
                bail!("Sync failed: {}", reason);
            }
        }
        Command::Reset => {
            controller.reset().await?;
            println!("Session cleared");
        }
        Command::Shell => {
            let widget = Arc::new(ConsoleLinkWidget::new());
            shell::run(controller, widget).await?;
        }
    }

    Ok(())
}
