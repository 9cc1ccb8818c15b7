//! WorkerProvider implementation.
//!
//! The primary Provider implementation: every capability is one request to a
//! provider worker process via the [`WorkerClient`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::provider::{Provider, ProviderResult};
use super::types::*;
use crate::config::{Credential, ProviderSettings};
use crate::worker::protocol::{self, methods, CatalogParams, CredentialParams, FactRequest};
use crate::worker::{WorkerClient, WorkerError};

/// Provider implementation that forwards to a worker process.
///
/// # Example
///
/// ```ignore
/// let client = WorkerClient::spawn("./voyanta-worker", &[], Duration::from_secs(30)).await?;
/// let provider = WorkerProvider::new(Arc::new(client));
/// let version = provider.metadata_version(&credential).await?;
/// ```
pub struct WorkerProvider {
    client: Arc<WorkerClient>,
}

impl WorkerProvider {
    pub fn new(client: Arc<WorkerClient>) -> Self {
        Self { client }
    }

    /// Spawn the worker described by provider settings.
    pub async fn spawn(settings: &ProviderSettings) -> Result<Self, crate::config::SettingsError> {
        let path = settings.worker_path()?;
        let client = WorkerClient::spawn(&path, &settings.args, settings.timeout())
            .await
            .map_err(|e| {
                crate::config::SettingsError::InvalidConfig(format!(
                    "cannot start worker '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        Ok(Self::new(Arc::new(client)))
    }

    async fn catalog<R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        credential: &Credential,
    ) -> ProviderResult<R> {
        self.client
            .request(
                method,
                CatalogParams {
                    credential: credential.into(),
                },
            )
            .await
    }
}

/// Rebuild named rows from column-id addressed cells.
///
/// Cells with a non-positive column id carry row bookkeeping and are skipped.
pub(crate) fn rows_from_cells(
    cells: Vec<Vec<protocol::DimensionCell>>,
    columns: &[ColumnElement],
) -> ProviderResult<Vec<Row>> {
    let names: HashMap<i64, &str> = columns.iter().map(|c| (c.id, c.name.as_str())).collect();

    cells
        .into_iter()
        .map(|fields| {
            let mut row = Row::new();
            for cell in fields.into_iter().filter(|cell| cell.column_id > 0) {
                let name = names.get(&cell.column_id).ok_or_else(|| {
                    WorkerError::MalformedResponse(format!(
                        "dimension row references unrequested column {}",
                        cell.column_id
                    ))
                })?;
                row.insert((*name).to_string(), cell.value);
            }
            Ok(row)
        })
        .collect()
}

/// Attach each result to the parameter map of the request that produced it.
///
/// Results answering an unknown request id are dropped.
pub(crate) fn attach_requests(
    requests: Vec<FactRequest>,
    results: Vec<protocol::FactResult>,
) -> Vec<FactValue> {
    let by_id: HashMap<String, ParameterMap> = requests
        .into_iter()
        .map(|r| (r.request_id, r.parameters))
        .collect();

    results
        .into_iter()
        .filter_map(|result| match by_id.get(&result.request_id) {
            Some(request) => Some(FactValue {
                value: result.value,
                request: request.clone(),
            }),
            None => {
                tracing::warn!(request_id = %result.request_id, "dropping fact result for unknown request");
                None
            }
        })
        .collect()
}

#[async_trait]
impl Provider for WorkerProvider {
    async fn metadata_version(&self, credential: &Credential) -> ProviderResult<i64> {
        let response: protocol::MetadataVersionResponse =
            self.catalog(methods::METADATA_VERSION, credential).await?;
        Ok(response.version)
    }

    async fn dimension_metadata(
        &self,
        credential: &Credential,
    ) -> ProviderResult<Vec<DimensionMeta>> {
        let response: protocol::DimensionsResponse =
            self.catalog(methods::DIMENSIONS, credential).await?;
        Ok(response.dimensions)
    }

    async fn dimension_detail_metadata(
        &self,
        credential: &Credential,
        dimension_ids: &[i64],
    ) -> ProviderResult<Vec<DimensionColumnSets>> {
        let response: protocol::DimensionDetailsResponse = self
            .client
            .request(
                methods::DIMENSION_DETAILS,
                protocol::DimensionDetailsParams {
                    credential: credential.into(),
                    dimension_ids: dimension_ids.to_vec(),
                },
            )
            .await?;
        Ok(response.details)
    }

    async fn fact_metadata(&self, credential: &Credential) -> ProviderResult<Vec<FactMeta>> {
        let response: protocol::FactsResponse = self.catalog(methods::FACTS, credential).await?;
        Ok(response.facts)
    }

    async fn operator_metadata(&self, credential: &Credential) -> ProviderResult<Vec<Operator>> {
        let response: protocol::OperatorsResponse =
            self.catalog(methods::OPERATORS, credential).await?;
        Ok(response.operators)
    }

    async fn dimension_data(
        &self,
        credential: &Credential,
        dimension_id: i64,
        columns: &[ColumnElement],
        filters: &[DimensionFilter],
    ) -> ProviderResult<Vec<Row>> {
        let response: protocol::DimensionDataResponse = self
            .client
            .request(
                methods::DIMENSION_DATA,
                protocol::DimensionDataParams {
                    credential: CredentialParams::from(credential),
                    dimension_id,
                    column_ids: columns.iter().map(|c| c.id).collect(),
                    filters: filters.to_vec(),
                },
            )
            .await?;

        rows_from_cells(response.rows, columns)
    }

    async fn fact_data(
        &self,
        credential: &Credential,
        fact_id: i64,
        requests: &[ParameterMap],
    ) -> ProviderResult<Vec<FactValue>> {
        let requests: Vec<FactRequest> = requests
            .iter()
            .map(|parameters| FactRequest {
                request_id: uuid::Uuid::new_v4().to_string(),
                parameters: parameters.clone(),
            })
            .collect();

        let response: protocol::FactDataResponse = self
            .client
            .request(
                methods::FACT_DATA,
                protocol::FactDataParams {
                    credential: credential.into(),
                    fact_id,
                    requests: requests.clone(),
                },
            )
            .await?;

        Ok(attach_requests(requests, response.results))
    }
}
