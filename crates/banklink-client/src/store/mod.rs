//! Persistence for the session fields.

mod credentials;
mod file;
mod memory;

pub use credentials::{
    decode_snapshot, CredentialStore, ACCESS_TOKEN_KEY, ACCOUNTS_KEY, TRANSACTIONS_KEY,
};
pub use file::FileStore;
pub use memory::MemoryStore;
