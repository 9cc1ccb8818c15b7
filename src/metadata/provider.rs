//! Provider trait definition.
//!
//! The Provider trait is the capability set a data backend must offer to the
//! report engine: catalog metadata (versioned), dimension rows and fact values.
//! The primary implementation talks to a worker process over NDJSON.

use async_trait::async_trait;

use super::types::*;
use crate::config::Credential;
use crate::worker::WorkerError;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, WorkerError>;

/// Trait for an external analytical data provider.
///
/// Every call receives the caller's credential explicitly; implementations
/// must not look sessions up from shared state.
///
/// # Example
///
/// ```ignore
/// use reportgen::metadata::Provider;
///
/// async fn example(provider: &dyn Provider, credential: &Credential) -> ProviderResult<()> {
///     let version = provider.metadata_version(credential).await?;
///     let dimensions = provider.dimension_metadata(credential).await?;
///     let ids: Vec<i64> = dimensions.iter().map(|d| d.id).collect();
///     let details = provider.dimension_detail_metadata(credential, &ids).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    // =========================================================================
    // Catalog metadata
    // =========================================================================

    /// Current catalog version; changes whenever the catalog shape changes.
    async fn metadata_version(&self, credential: &Credential) -> ProviderResult<i64>;

    /// Dimension types the provider exposes.
    async fn dimension_metadata(&self, credential: &Credential)
        -> ProviderResult<Vec<DimensionMeta>>;

    /// Column sets for the given dimension types, one entry per id.
    ///
    /// Entries still include parent/grandparent column sets; callers keep the
    /// unqualified one (see [`unqualified_details`]).
    async fn dimension_detail_metadata(
        &self,
        credential: &Credential,
        dimension_ids: &[i64],
    ) -> ProviderResult<Vec<DimensionColumnSets>>;

    /// Measures the provider exposes.
    async fn fact_metadata(&self, credential: &Credential) -> ProviderResult<Vec<FactMeta>>;

    /// Comparison operators usable in dimension filters.
    async fn operator_metadata(&self, credential: &Credential) -> ProviderResult<Vec<Operator>>;

    // =========================================================================
    // Data
    // =========================================================================

    /// Rows of a dimension type, keyed by column name.
    async fn dimension_data(
        &self,
        credential: &Credential,
        dimension_id: i64,
        columns: &[ColumnElement],
        filters: &[DimensionFilter],
    ) -> ProviderResult<Vec<Row>>;

    /// Values of a fact for a batch of parameter maps.
    ///
    /// Each result carries the parameter map of the request it answers.
    async fn fact_data(
        &self,
        credential: &Credential,
        fact_id: i64,
        requests: &[ParameterMap],
    ) -> ProviderResult<Vec<FactValue>>;
}
