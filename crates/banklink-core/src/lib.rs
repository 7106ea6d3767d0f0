//! Core traits and types for the banklink client.
//!
//! This crate defines the abstractions shared between the session controller and its collaborators:
//! - `KeyValueStore`: Persistent text storage for the session fields
//! - `LinkBackend`: Link-token issuing, public-token exchange and item sync
//! - `LinkWidget`: The externally hosted bank-linking flow and its callbacks

mod backend;
mod error;
mod store;
mod types;
mod widget;

pub use backend::{LinkBackend, SyncPayload};
pub use error::BankLinkError;
pub use store::KeyValueStore;
pub use types::{redact, AccessCredential, InitToken, Metadata, PublicAuthorization, Record, Snapshot};
pub use widget::{LinkEvent, LinkWidget};
