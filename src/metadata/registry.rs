//! Named registry of providers and their catalog snapshots.
//!
//! One registry is built at startup and handed to the report generator; there
//! is no process-wide provider table.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::cache::MetadataStore;
use crate::config::Credential;
use crate::report::{ReportError, ReportResult};

use super::provider::Provider;
use super::sync::{sync, SyncOutcome};
use super::types::MetadataSnapshot;

/// A provider together with its store and current snapshot.
pub struct RegisteredProvider {
    name: String,
    provider: Arc<dyn Provider>,
    store: Arc<dyn MetadataStore>,
    snapshot: RwLock<Arc<MetadataSnapshot>>,
    /// Serializes syncs of this provider.
    sync_lock: Mutex<()>,
}

impl RegisteredProvider {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// The snapshot installed by the last successful sync.
    pub async fn snapshot(&self) -> Arc<MetadataSnapshot> {
        self.snapshot.read().await.clone()
    }

    /// Sync against the provider and install the resulting snapshot.
    ///
    /// A failed sync leaves the previous snapshot in place.
    pub async fn sync(&self, credential: &Credential) -> ReportResult<SyncOutcome> {
        let _guard = self.sync_lock.lock().await;

        tracing::info!(provider = %self.name, "connecting to provider and checking metadata version");
        let (snapshot, outcome) =
            sync(self.provider.as_ref(), self.store.as_ref(), credential).await?;

        *self.snapshot.write().await = Arc::new(snapshot);
        Ok(outcome)
    }
}

/// Registry of providers by name.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<RegisteredProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under `name` with an empty snapshot.
    ///
    /// Registering an existing name replaces the previous entry.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        provider: Arc<dyn Provider>,
        store: Arc<dyn MetadataStore>,
    ) {
        let name = name.into();
        let entry = RegisteredProvider {
            name: name.clone(),
            provider,
            store,
            snapshot: RwLock::new(Arc::new(MetadataSnapshot::default())),
            sync_lock: Mutex::new(()),
        };
        self.providers.insert(name, Arc::new(entry));
    }

    /// Look up a provider.
    pub fn get(&self, name: &str) -> ReportResult<Arc<RegisteredProvider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| ReportError::InvalidSpec(format!("provider '{}' does not exist", name)))
    }

    /// Sync a provider's metadata so it can serve reports.
    pub async fn init_provider(
        &self,
        name: &str,
        credential: &Credential,
    ) -> ReportResult<SyncOutcome> {
        self.get(name)?.sync(credential).await
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
