use std::sync::Arc;

use banklink_core::{AccessCredential, BankLinkError, KeyValueStore, Snapshot};
use tracing::{debug, warn};

use crate::session::SessionState;

/// Key holding the access credential as plain text. Absent when unlinked.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Key holding the account snapshot as a JSON array.
pub const ACCOUNTS_KEY: &str = "accounts";
/// Key holding the transaction snapshot as a JSON array.
pub const TRANSACTIONS_KEY: &str = "transactions";

/// Decode a stored snapshot value.
///
/// Anything other than a JSON array is a hard parse failure.
pub fn decode_snapshot(field: &str, text: &str) -> Result<Snapshot, BankLinkError> {
    serde_json::from_str::<Snapshot>(text).map_err(|e| BankLinkError::StoreCorruption {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

fn encode_snapshot(field: &str, snapshot: &Snapshot) -> Result<String, BankLinkError> {
    serde_json::to_string(snapshot)
        .map_err(|e| BankLinkError::Store(format!("Failed to encode {}: {}", field, e)))
}

/// Session persistence over a `KeyValueStore`.
///
/// Write-through: every mutation of a field is saved immediately by the
/// controller. Read-once: `load` runs at startup only.
#[derive(Clone)]
pub struct CredentialStore {
    kv: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("backend", &self.kv.backend_name())
            .finish()
    }
}

impl CredentialStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load all three fields.
    ///
    /// Never fails: a field that cannot be read or decoded is logged and
    /// loads as its empty value, leaving the other fields untouched.
    pub async fn load(&self) -> SessionState {
        let credential = match self.kv.get(ACCESS_TOKEN_KEY).await {
            Ok(value) => value.filter(|v| !v.is_empty()).map(AccessCredential::new),
            Err(e) => {
                warn!("Could not load {}, starting unlinked: {}", ACCESS_TOKEN_KEY, e);
                None
            }
        };

        let state = SessionState {
            credential,
            accounts: self.load_snapshot(ACCOUNTS_KEY).await,
            transactions: self.load_snapshot(TRANSACTIONS_KEY).await,
        };

        debug!(
            "Loaded session from {} store (linked={}, {} accounts, {} transactions)",
            self.kv.backend_name(),
            state.credential.is_some(),
            state.accounts.len(),
            state.transactions.len()
        );
        state
    }

    async fn load_snapshot(&self, field: &str) -> Snapshot {
        let loaded = match self.kv.get(field).await {
            Ok(Some(text)) => decode_snapshot(field, &text),
            Ok(None) => Ok(Snapshot::new()),
            Err(e) => Err(e),
        };

        loaded.unwrap_or_else(|e| {
            warn!("Discarding stored {}: {}", field, e);
            Snapshot::new()
        })
    }

    /// Save or clear the access credential.
    pub async fn save_credential(
        &self,
        credential: Option<&AccessCredential>,
    ) -> Result<(), BankLinkError> {
        match credential {
            Some(credential) => self.kv.put(ACCESS_TOKEN_KEY, credential.as_str()).await,
            None => self.kv.delete(ACCESS_TOKEN_KEY).await.map(|_| ()),
        }
    }

    pub async fn save_accounts(&self, accounts: &Snapshot) -> Result<(), BankLinkError> {
        let text = encode_snapshot(ACCOUNTS_KEY, accounts)?;
        self.kv.put(ACCOUNTS_KEY, &text).await
    }

    pub async fn save_transactions(&self, transactions: &Snapshot) -> Result<(), BankLinkError> {
        let text = encode_snapshot(TRANSACTIONS_KEY, transactions)?;
        self.kv.put(TRANSACTIONS_KEY, &text).await
    }

    /// Save both snapshots.
    pub async fn save_snapshots(
        &self,
        accounts: &Snapshot,
        transactions: &Snapshot,
    ) -> Result<(), BankLinkError> {
        self.save_accounts(accounts).await?;
        self.save_transactions(transactions).await
    }

    /// Save all three fields.
    ///
    /// The credential goes last, so a write that fails part way never leaves
    /// snapshots behind without their credential.
    pub async fn save(&self, state: &SessionState) -> Result<(), BankLinkError> {
        self.save_snapshots(&state.accounts, &state.transactions).await?;
        self.save_credential(state.credential.as_ref()).await
    }
}
