//! Protocol types for provider worker communication.
//!
//! A provider worker is a long-running child process that owns the provider's
//! wire protocol. It reads one request envelope per line on stdin and writes
//! one response envelope per line on stdout.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Credential;
use crate::metadata::{
    DimensionColumnSets, DimensionFilter, DimensionMeta, FactMeta, Operator, ParameterMap,
};

// ============================================================================
// Request/Response Envelope
// ============================================================================

/// Request envelope sent to the worker.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    /// Unique request ID for correlation.
    pub id: String,
    /// Method name (e.g., "provider.metadata_version").
    pub method: String,
    /// Method-specific parameters.
    pub params: Value,
}

/// Response envelope received from the worker.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID this response corresponds to.
    pub id: String,
    /// Whether the request succeeded.
    pub success: bool,
    /// Result data (present if success = true).
    #[serde(default)]
    pub result: Option<Value>,
    /// Error information (present if success = false).
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

/// Error information in a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

// ============================================================================
// Credential (included in all requests)
// ============================================================================

/// Authorization context forwarded with every call.
#[derive(Clone, Serialize)]
pub struct CredentialParams {
    pub token: String,
    pub email: String,
    pub organization: String,
}

impl From<&Credential> for CredentialParams {
    fn from(credential: &Credential) -> Self {
        Self {
            token: credential.token().to_string(),
            email: credential.email().to_string(),
            organization: credential.organization().to_string(),
        }
    }
}

// ============================================================================
// Request parameters
// ============================================================================

/// Parameters for the catalog methods that take nothing but the credential.
#[derive(Clone, Serialize)]
pub struct CatalogParams {
    pub credential: CredentialParams,
}

/// Parameters for `provider.dimension_details`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionDetailsParams {
    pub credential: CredentialParams,
    pub dimension_ids: Vec<i64>,
}

/// Parameters for `provider.dimension_data`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionDataParams {
    pub credential: CredentialParams,
    pub dimension_id: i64,
    pub column_ids: Vec<i64>,
    pub filters: Vec<DimensionFilter>,
}

/// One entry of a batched fact request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactRequest {
    pub request_id: String,
    pub parameters: ParameterMap,
}

/// Parameters for `provider.fact_data`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactDataParams {
    pub credential: CredentialParams,
    pub fact_id: i64,
    pub requests: Vec<FactRequest>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataVersionResponse {
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperatorsResponse {
    pub operators: Vec<Operator>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DimensionsResponse {
    pub dimensions: Vec<DimensionMeta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DimensionDetailsResponse {
    pub details: Vec<DimensionColumnSets>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FactsResponse {
    pub facts: Vec<FactMeta>,
}

/// One cell of a dimension row, addressed by column id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionCell {
    pub column_id: i64,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DimensionDataResponse {
    pub rows: Vec<Vec<DimensionCell>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactResult {
    pub request_id: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FactDataResponse {
    pub results: Vec<FactResult>,
}

/// Method names understood by provider workers.
pub mod methods {
    pub const METADATA_VERSION: &str = "provider.metadata_version";
    pub const OPERATORS: &str = "provider.operators";
    pub const DIMENSIONS: &str = "provider.dimensions";
    pub const DIMENSION_DETAILS: &str = "provider.dimension_details";
    pub const FACTS: &str = "provider.facts";
    pub const DIMENSION_DATA: &str = "provider.dimension_data";
    pub const FACT_DATA: &str = "provider.fact_data";
}
