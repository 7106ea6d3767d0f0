//! Test doubles for controller tests: a scripted `LinkBackend` and a
//! `KeyValueStore` that fails on demand.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use banklink_core::{
    AccessCredential, BankLinkError, InitToken, KeyValueStore, LinkBackend, PublicAuthorization,
    SyncPayload,
};
use tokio::sync::Notify;

use crate::store::MemoryStore;

struct SyncGate {
    entered: Notify,
    release: Notify,
}

/// Backend double with canned responses. Unset responses fail.
#[derive(Default)]
pub struct ScriptedBackend {
    link_token: Option<String>,
    access_token: Option<String>,
    sync_results: Mutex<VecDeque<Result<SyncPayload, String>>>,
    gate: Option<SyncGate>,
    create_calls: AtomicUsize,
    exchanged: Mutex<Vec<String>>,
    synced: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link_token(mut self, token: &str) -> Self {
        self.link_token = Some(token.to_string());
        self
    }

    pub fn with_access_token(mut self, token: &str) -> Self {
        self.access_token = Some(token.to_string());
        self
    }

    /// Queue the result of the next sync call.
    pub fn with_sync_result(mut self, result: Result<SyncPayload, String>) -> Self {
        self.sync_results.get_mut().unwrap().push_back(result);
        self
    }

    /// Hold every sync call until `release_sync` is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(SyncGate {
            entered: Notify::new(),
            release: Notify::new(),
        });
        self
    }

    /// Wait until a gated sync call has reached the backend.
    pub async fn wait_for_sync_call(&self) {
        self.gate.as_ref().unwrap().entered.notified().await;
    }

    pub fn release_sync(&self) {
        self.gate.as_ref().unwrap().release.notify_one();
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchanged.lock().unwrap().len()
    }

    pub fn exchanged_tokens(&self) -> Vec<String> {
        self.exchanged.lock().unwrap().clone()
    }

    pub fn sync_calls(&self) -> usize {
        self.synced.lock().unwrap().len()
    }

    pub fn synced_credentials(&self) -> Vec<String> {
        self.synced.lock().unwrap().clone()
    }
}

#[async_trait]
impl LinkBackend for ScriptedBackend {
    fn backend_name(&self) -> &'static str {
        "scripted"
    }

    async fn create_link_token(&self) -> Result<InitToken, BankLinkError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.link_token
            .clone()
            .map(InitToken::new)
            .ok_or_else(|| BankLinkError::Initialization("no link token scripted".to_string()))
    }

    async fn exchange_public_token(
        &self,
        public: &PublicAuthorization,
    ) -> Result<AccessCredential, BankLinkError> {
        self.exchanged
            .lock()
            .unwrap()
            .push(public.token().to_string());
        self.access_token
            .clone()
            .map(AccessCredential::new)
            .ok_or_else(|| BankLinkError::Exchange("no access token scripted".to_string()))
    }

    async fn sync_item(&self, credential: &AccessCredential) -> Result<SyncPayload, BankLinkError> {
        self.synced
            .lock()
            .unwrap()
            .push(credential.as_str().to_string());

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let next = self.sync_results.lock().unwrap().pop_front();
        match next {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(message)) => Err(BankLinkError::Sync(message)),
            None => Err(BankLinkError::Sync("no sync result scripted".to_string())),
        }
    }
}

/// Memory-backed store whose writes can be made to fail.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_all: AtomicBool,
    countdowns: Mutex<HashMap<String, usize>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write until switched off again.
    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Let `successes` more puts to `key` through, then fail the next one once.
    pub fn fail_put_after(&self, key: &str, successes: usize) {
        self.countdowns
            .lock()
            .unwrap()
            .insert(key.to_string(), successes);
    }

    fn put_should_fail(&self, key: &str) -> bool {
        if self.fail_all.load(Ordering::SeqCst) {
            return true;
        }
        let mut countdowns = self.countdowns.lock().unwrap();
        let Some(remaining) = countdowns.get_mut(key) else {
            return false;
        };
        if *remaining == 0 {
            countdowns.remove(key);
            true
        } else {
            *remaining -= 1;
            false
        }
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, BankLinkError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), BankLinkError> {
        if self.put_should_fail(key) {
            return Err(BankLinkError::Store(format!("disk full writing {}", key)));
        }
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool, BankLinkError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(BankLinkError::Store(format!("disk full deleting {}", key)));
        }
        self.inner.delete(key).await
    }
}
