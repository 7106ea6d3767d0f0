use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BankLinkError;
use crate::types::{AccessCredential, InitToken, PublicAuthorization, Snapshot};

/// Account and transaction data returned by a sync.
///
/// Both fields are required; a response missing either is malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    pub accounts: Snapshot,
    pub transactions: Snapshot,
}

/// Remote service that issues link tokens, exchanges public tokens and syncs items.
///
/// Implementations report failures with the error kind of the operation
/// (`Initialization`, `Exchange`, `Sync`). They never retry.
#[async_trait]
pub trait LinkBackend: Send + Sync {
    /// Get the backend identifier (e.g., "http").
    fn backend_name(&self) -> &'static str;

    /// Request a one-time link initialization token.
    async fn create_link_token(&self) -> Result<InitToken, BankLinkError>;

    /// Exchange a one-time public authorization for a durable access credential.
    async fn exchange_public_token(
        &self,
        public: &PublicAuthorization,
    ) -> Result<AccessCredential, BankLinkError>;

    /// Fetch the current account and transaction snapshot for a linked item.
    async fn sync_item(&self, credential: &AccessCredential) -> Result<SyncPayload, BankLinkError>;
}
