//! Version-gated metadata synchronization.
//!
//! The cached catalog is trusted only while its stored version equals the
//! provider's live version. On mismatch every collection is refetched and
//! saved, and the stored version is written last: a refresh that fails
//! midway leaves the old version in place, so the next sync starts over.

use crate::cache::MetadataStore;
use crate::config::Credential;
use crate::report::ReportResult;

use super::provider::Provider;
use super::types::{unqualified_details, MetadataSnapshot};

/// What a sync had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The stored version matched; the catalog was loaded from the store.
    UpToDate { version: i64 },
    /// The catalog was refetched from the provider and stored.
    Refreshed { from: Option<i64>, to: i64 },
}

impl SyncOutcome {
    pub fn version(&self) -> i64 {
        match self {
            SyncOutcome::UpToDate { version } => *version,
            SyncOutcome::Refreshed { to, .. } => *to,
        }
    }
}

/// Bring the store up to date with the provider and load a snapshot from it.
///
/// Calls are strictly sequential. Any provider or store failure aborts the
/// sync and is returned as-is; nothing is retried.
pub async fn sync(
    provider: &dyn Provider,
    store: &dyn MetadataStore,
    credential: &Credential,
) -> ReportResult<(MetadataSnapshot, SyncOutcome)> {
    let cached = store.get_version().await?;
    let live = provider.metadata_version(credential).await?;

    tracing::info!(?cached, live, "checked metadata version");

    let outcome = if cached == Some(live) {
        tracing::info!("metadata is up to date, loading from cache");
        SyncOutcome::UpToDate { version: live }
    } else {
        tracing::info!("new metadata available from provider, refreshing");
        refresh(provider, store, credential, live).await?;
        SyncOutcome::Refreshed {
            from: cached,
            to: live,
        }
    };

    let snapshot = load_snapshot(store, outcome.version()).await?;
    tracing::info!(
        version = outcome.version(),
        dimensions = snapshot.dimensions.len(),
        facts = snapshot.facts.len(),
        fingerprint = %snapshot.fingerprint().unwrap_or_default(),
        "metadata loaded"
    );

    Ok((snapshot, outcome))
}

async fn refresh(
    provider: &dyn Provider,
    store: &dyn MetadataStore,
    credential: &Credential,
    version: i64,
) -> ReportResult<()> {
    let operators = provider.operator_metadata(credential).await?;
    store.save_operators(&operators).await?;
    tracing::debug!(count = operators.len(), "saved operators");

    let dimensions = provider.dimension_metadata(credential).await?;
    store.save_dimensions(&dimensions).await?;
    tracing::debug!(count = dimensions.len(), "saved dimensions");

    let ids: Vec<i64> = dimensions.iter().map(|d| d.id).collect();
    let column_sets = provider
        .dimension_detail_metadata(credential, &ids)
        .await?;
    let details = unqualified_details(&column_sets);
    store.save_dimension_details(&details).await?;
    tracing::debug!(count = details.len(), "saved dimension details");

    let facts = provider.fact_metadata(credential).await?;
    store.save_facts(&facts).await?;
    tracing::debug!(count = facts.len(), "saved facts");

    // Only now is the refreshed catalog complete.
    store.set_version(version).await?;
    Ok(())
}

async fn load_snapshot(store: &dyn MetadataStore, version: i64) -> ReportResult<MetadataSnapshot> {
    Ok(MetadataSnapshot {
        version: Some(version),
        operators: store.load_operators().await?,
        dimensions: store.load_dimensions().await?,
        dimension_details: store.load_dimension_details().await?,
        facts: store.load_facts().await?,
    })
}
