//! HTTP/JSON implementation of `LinkBackend`.
//!
//! Talks to a backend exposing three POST endpoints:
//! - `create-link-token`: `{client}` -> `{link_token}`
//! - `exchange-public-token`: `{public_token}` -> `{access_token}`
//! - `sync-item`: `{access_token}` -> `{accounts, transactions}`

mod client;

pub use client::{HttpLinkBackend, DEFAULT_API_URL};
