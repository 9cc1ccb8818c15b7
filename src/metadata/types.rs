//! Catalog types shared by providers, the metadata store and the report engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A single row of dimension data: field name to scalar value.
///
/// Key insertion order is preserved and drives the header of flat tables.
pub type Row = Map<String, Value>;

/// Parameters of a single fact request, keyed by parameter name.
pub type ParameterMap = Map<String, Value>;

/// A comparison operator from the provider's filter catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: i64,
    /// Human readable description, e.g. "is not equal to".
    pub description: String,
}

/// Identifies a dimension type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionMeta {
    pub id: i64,
    pub name: String,
}

/// A column a dimension type exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnElement {
    pub id: i64,
    pub name: String,
}

/// Column catalog for one dimension type (the unqualified column set only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionDetailMeta {
    pub id: i64,
    #[serde(default)]
    pub column_elements: Vec<ColumnElement>,
}

/// Identifies a measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactMeta {
    pub id: i64,
    pub name: String,
}

/// One column set as returned by the provider.
///
/// A dimension type carries its own column set plus one per related
/// parent/grandparent entity; related sets have a non-zero sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSet {
    pub id: i64,
    #[serde(default)]
    pub sequence_number: Option<i64>,
    #[serde(default)]
    pub column_elements: Vec<ColumnElement>,
}

impl ColumnSet {
    /// Whether this set describes the dimension itself rather than a relation.
    pub fn is_unqualified(&self) -> bool {
        matches!(self.sequence_number, None | Some(0))
    }
}

/// All column sets the provider reports for one dimension type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionColumnSets {
    #[serde(default)]
    pub column_sets: Vec<ColumnSet>,
}

impl DimensionColumnSets {
    /// The first column set with no (or a zero) sequence number.
    pub fn unqualified(&self) -> Option<DimensionDetailMeta> {
        self.column_sets
            .iter()
            .find(|set| set.is_unqualified())
            .map(|set| DimensionDetailMeta {
                id: set.id,
                column_elements: set.column_elements.clone(),
            })
    }
}

/// Keep only the unqualified column set of each dimension.
///
/// Dimensions without one are skipped.
pub fn unqualified_details(sets: &[DimensionColumnSets]) -> Vec<DimensionDetailMeta> {
    sets.iter().filter_map(DimensionColumnSets::unqualified).collect()
}

/// A filter applied when fetching dimension rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionFilter {
    pub column_id: i64,
    pub operator_id: i64,
    pub value: Value,
}

/// A fact value tagged with the parameters of the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactValue {
    pub value: Value,
    pub request: ParameterMap,
}

/// In-memory copy of a provider's catalog.
///
/// The four collections always belong to the same `version`. A snapshot is
/// replaced as a whole on every sync, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSnapshot {
    /// `None` until the first successful sync.
    pub version: Option<i64>,
    pub operators: Vec<Operator>,
    pub dimensions: Vec<DimensionMeta>,
    pub dimension_details: Vec<DimensionDetailMeta>,
    pub facts: Vec<FactMeta>,
}

impl MetadataSnapshot {
    /// Whether a sync has populated this snapshot.
    pub fn is_initialized(&self) -> bool {
        self.version.is_some()
    }

    pub fn dimension_by_name(&self, name: &str) -> Option<&DimensionMeta> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn dimension_detail(&self, id: i64) -> Option<&DimensionDetailMeta> {
        self.dimension_details.iter().find(|d| d.id == id)
    }

    pub fn fact_by_name(&self, name: &str) -> Option<&FactMeta> {
        self.facts.iter().find(|f| f.name == name)
    }

    pub fn operator_by_description(&self, description: &str) -> Option<&Operator> {
        self.operators.iter().find(|o| o.description == description)
    }

    /// SHA-256 of the serialized snapshot, as lowercase hex.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(format!("{:x}", Sha256::digest(&json)))
    }
}
