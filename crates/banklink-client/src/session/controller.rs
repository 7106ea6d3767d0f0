use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use banklink_core::{
    BankLinkError, InitToken, LinkBackend, LinkEvent, PublicAuthorization, Snapshot,
};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, instrument, warn};

use super::state::{SessionPhase, SessionState};
use super::view::{LinkReadiness, SessionView};
use crate::store::CredentialStore;

/// Result of a `sync` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Snapshots were replaced and persisted.
    Completed { accounts: usize, transactions: usize },
    /// Another sync was running; nothing was requested.
    AlreadyInFlight,
    /// The backend call failed; snapshots stay empty.
    Failed(String),
    /// The session was reset or relinked while the call was running, so
    /// its result was discarded.
    Superseded,
}

/// Result of exchanging a public authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Linked,
    /// The backend call failed; no credential was committed.
    Failed(String),
}

/// Result of handling a link widget callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEventOutcome {
    Exchanged(ExchangeOutcome),
    /// `Event` and `Exit` callbacks are logged only.
    Observed,
}

struct Inner {
    state: SessionState,
    /// Bumped by every sync start, reset and credential commit. A sync only
    /// commits if the epoch it started under is still current.
    epoch: u64,
}

/// Clears the in-flight flag when the sync that set it ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns the session state and drives linking, syncing and reset.
///
/// The state lock is never held across a backend call, so reset and status
/// stay responsive while a sync is pending.
pub struct SessionController {
    backend: Arc<dyn LinkBackend>,
    store: CredentialStore,
    inner: Mutex<Inner>,
    sync_in_flight: AtomicBool,
    link_requested: AtomicBool,
    link_token: OnceCell<Option<InitToken>>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("backend", &self.backend.backend_name())
            .field("store", &self.store)
            .field("sync_in_flight", &self.sync_in_flight)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Load persisted state and build the controller.
    ///
    /// The session starts linked if a credential was persisted by an earlier run.
    pub async fn start(backend: Arc<dyn LinkBackend>, store: CredentialStore) -> Self {
        let state = store.load().await;
        info!(
            "Session loaded: {} ({} accounts, {} transactions)",
            state.phase(false),
            state.accounts.len(),
            state.transactions.len()
        );

        Self {
            backend,
            store,
            inner: Mutex::new(Inner { state, epoch: 0 }),
            sync_in_flight: AtomicBool::new(false),
            link_requested: AtomicBool::new(false),
            link_token: OnceCell::new(),
        }
    }

    // =========================================================================
    // Link initialization
    // =========================================================================

    /// Request the link initialization token.
    ///
    /// Runs the backend call at most once per controller; later calls return
    /// the first result. A failure is not retried, leaving the widget not ready.
    pub async fn initialize_link(&self) -> Option<InitToken> {
        self.link_requested.store(true, Ordering::SeqCst);
        self.link_token
            .get_or_init(|| async {
                match self.backend.create_link_token().await {
                    Ok(token) => {
                        info!("Link token acquired: {}", token.redacted());
                        Some(token)
                    }
                    Err(e) => {
                        warn!("Link initialization failed, connect stays disabled: {}", e);
                        None
                    }
                }
            })
            .await
            .clone()
    }

    /// The link token, if initialization has completed successfully.
    pub fn link_token(&self) -> Option<InitToken> {
        self.link_token.get().cloned().flatten()
    }

    /// Whether the connect action can be used, given the widget's own readiness.
    pub fn link_readiness(&self, widget_ready: bool) -> LinkReadiness {
        if widget_ready {
            return LinkReadiness::Ready;
        }
        match self.link_token.get() {
            Some(None) => LinkReadiness::Unavailable,
            _ if self.link_requested.load(Ordering::SeqCst) => LinkReadiness::Waiting,
            _ => LinkReadiness::NotRequested,
        }
    }

    // =========================================================================
    // Authorization exchange
    // =========================================================================

    /// Entry point for link widget callbacks. Only `Success` changes state.
    pub async fn handle_link_event(
        &self,
        event: LinkEvent,
    ) -> Result<LinkEventOutcome, BankLinkError> {
        debug!(kind = event.kind(), "Link widget callback");
        match event {
            LinkEvent::Success(public) => {
                let outcome = self.exchange(public).await?;
                Ok(LinkEventOutcome::Exchanged(outcome))
            }
            LinkEvent::Event { name, metadata } => {
                info!(event = %name, metadata = ?metadata, "Link widget event");
                Ok(LinkEventOutcome::Observed)
            }
            LinkEvent::Exit { error, metadata } => {
                match error {
                    Some(error) => {
                        warn!(error = %error, metadata = ?metadata, "Link widget exited with error")
                    }
                    None => info!(metadata = ?metadata, "Link widget closed without linking"),
                }
                Ok(LinkEventOutcome::Observed)
            }
        }
    }

    /// Exchange a public authorization and commit the resulting credential.
    ///
    /// Replaces any credential already held. A backend failure commits nothing.
    #[instrument(skip(self), level = "debug")]
    pub async fn exchange(
        &self,
        public: PublicAuthorization,
    ) -> Result<ExchangeOutcome, BankLinkError> {
        debug!(metadata = ?public.metadata, "Exchanging public token");

        let credential = match self.backend.exchange_public_token(&public).await {
            Ok(credential) => credential,
            Err(e) => {
                warn!("Public token exchange failed, no credential committed: {}", e);
                return Ok(ExchangeOutcome::Failed(e.to_string()));
            }
        };

        let mut inner = self.inner.lock().await;
        if let Err(e) = self.store.save_credential(Some(&credential)).await {
            warn!("Could not persist access credential, not committing it: {}", e);
            return Err(e);
        }
        if let Some(previous) = inner.state.credential.replace(credential.clone()) {
            info!("Replaced access credential {}", previous.redacted());
        }
        inner.epoch += 1;

        info!("Access credential {} committed", credential.redacted());
        Ok(ExchangeOutcome::Linked)
    }

    // =========================================================================
    // Sync
    // =========================================================================

    /// Refresh the account and transaction snapshots.
    ///
    /// A request made while another sync is running performs no backend call.
    /// Snapshots are cleared (and persisted) before the call and stay empty
    /// if it fails.
    pub async fn sync(&self) -> Result<SyncOutcome, BankLinkError> {
        let (credential, epoch, _in_flight) = {
            let mut inner = self.inner.lock().await;
            let credential = inner
                .state
                .credential
                .clone()
                .ok_or(BankLinkError::NotLinked)?;

            if self.sync_in_flight.swap(true, Ordering::SeqCst) {
                debug!("Sync already in flight, ignoring request");
                return Ok(SyncOutcome::AlreadyInFlight);
            }
            let guard = InFlightGuard(&self.sync_in_flight);

            inner.epoch += 1;
            inner.state.accounts.clear();
            inner.state.transactions.clear();
            self.save_snapshots_together(&inner.state.accounts, &inner.state.transactions)
                .await?;

            (credential, inner.epoch, guard)
        };

        info!("Syncing item {}", credential.redacted());
        let result = self.backend.sync_item(&credential).await;

        let mut inner = self.inner.lock().await;
        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Sync failed, snapshots left empty: {}", e);
                return Ok(SyncOutcome::Failed(e.to_string()));
            }
        };

        if inner.epoch != epoch {
            info!(
                "Discarding sync result from epoch {} (current epoch {})",
                epoch, inner.epoch
            );
            return Ok(SyncOutcome::Superseded);
        }

        // Snapshots are still empty in memory from the clearing step
        if let Err(e) = self
            .save_snapshots_together(&payload.accounts, &payload.transactions)
            .await
        {
            warn!("Could not persist synced snapshots, leaving them empty: {}", e);
            return Err(e);
        }
        inner.state.accounts = payload.accounts;
        inner.state.transactions = payload.transactions;

        let outcome = SyncOutcome::Completed {
            accounts: inner.state.accounts.len(),
            transactions: inner.state.transactions.len(),
        };
        info!("Sync completed: {:?}", outcome);
        Ok(outcome)
    }

    pub fn is_syncing(&self) -> bool {
        self.sync_in_flight.load(Ordering::SeqCst)
    }

    /// Save both snapshots, or neither: if a write fails, both stored
    /// snapshots are put back to empty.
    async fn save_snapshots_together(
        &self,
        accounts: &Snapshot,
        transactions: &Snapshot,
    ) -> Result<(), BankLinkError> {
        let Err(e) = self.store.save_snapshots(accounts, transactions).await else {
            return Ok(());
        };
        if let Err(rollback) = self
            .store
            .save_snapshots(&Snapshot::new(), &Snapshot::new())
            .await
        {
            warn!("Could not clear stored snapshots after a failed write: {}", rollback);
        }
        Err(e)
    }

    // =========================================================================
    // Reset
    // =========================================================================

    /// Drop the credential and both snapshots. Local only: the credential is
    /// not revoked on the backend.
    ///
    /// If the store write fails, the in-memory state is reloaded from the
    /// store so it matches whatever part of the reset was persisted.
    pub async fn reset(&self) -> Result<(), BankLinkError> {
        let mut inner = self.inner.lock().await;
        if let Err(e) = self.store.save(&SessionState::default()).await {
            inner.state = self.store.load().await;
            warn!(
                "Session reset could not be persisted, now {}: {}",
                inner.state.phase(self.is_syncing()),
                e
            );
            return Err(e);
        }
        inner.state = SessionState::default();
        inner.epoch += 1;

        if self.is_syncing() {
            info!("Session cleared; the in-flight sync will be discarded");
        } else {
            info!("Session cleared");
        }
        Ok(())
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state.clone()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.inner.lock().await.state.phase(self.is_syncing())
    }

    pub async fn view(&self, widget_ready: bool) -> SessionView {
        let readiness = self.link_readiness(widget_ready);
        let inner = self.inner.lock().await;
        SessionView::new(&inner.state, readiness, self.is_syncing())
    }
}
