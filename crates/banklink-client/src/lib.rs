//! Bank-linking session client.
//!
//! Links a bank account through a hosted consent flow, exchanges the
//! resulting public token for a durable access credential, and syncs the
//! linked item's accounts and transactions on demand.

pub mod config;
pub mod session;
pub mod shell;
pub mod store;
pub mod widget;

#[cfg(test)]
mod testing;
