//! Declarative report definitions.
//!
//! A report definition is JSON shaped:
//!
//! ```json
//! {
//!   "data": {
//!     "dimensions": [
//!       {"type": "data", "name": "Asset", "fields": ["Asset Name", "Sector"]},
//!       {"type": "dates", "name": "Date", "start": "2016-01-01", "end": "2016-12-31",
//!        "interval": 3, "intervalUnit": "months"}
//!     ],
//!     "facts": [
//!       {"name": "Market Value", "friendlyName": "Value", "parameters": [
//!         {"name": "assetName", "type": "link", "field": "Asset Name"},
//!         {"name": "date", "type": "link", "field": "Date"},
//!         {"name": "currency", "type": "set", "value": "GBP"}
//!       ]}
//!     ],
//!     "groups": [{"groupByField": "Sector", "aggregateFields": ["Value"]}]
//!   }
//! }
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ReportError, ReportResult};

/// Top-level report definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDefinition {
    pub data: ReportData,
}

impl ReportDefinition {
    /// Parse a definition; malformed JSON is an invalid spec.
    pub fn from_json(json: &str) -> ReportResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ReportError::invalid(format!("cannot parse report definition: {}", e)))
    }
}

/// Dimensions, facts and groups of a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    /// Required at generation time; absent is an invalid spec.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Vec<DimensionSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facts: Option<Vec<FactSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<GroupSpec>>,
}

/// One axis of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DimensionSpec {
    /// Rows fetched from the provider.
    #[serde(rename = "data")]
    Data(DataDimension),
    /// Rows generated from a date range.
    #[serde(rename = "dates")]
    Dates(DateDimension),
    /// Any other `type`; rejected when resolved.
    #[serde(other)]
    Unsupported,
}

impl DimensionSpec {
    pub fn name(&self) -> Option<&str> {
        match self {
            DimensionSpec::Data(d) => Some(&d.name),
            DimensionSpec::Dates(d) => Some(&d.name),
            DimensionSpec::Unsupported => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataDimension {
    /// Dimension type name in the provider catalog.
    pub name: String,
    /// Column names to fetch.
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateDimension {
    /// Field name the formatted date is stored under.
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: i64,
    pub interval_unit: IntervalUnit,
}

/// Step unit of a date dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    #[serde(alias = "day", alias = "d")]
    Days,
    #[serde(alias = "week", alias = "w")]
    Weeks,
    #[serde(alias = "month", alias = "M")]
    Months,
    #[serde(alias = "quarter", alias = "Q")]
    Quarters,
    #[serde(alias = "year", alias = "y")]
    Years,
}

/// A measure looked up for every joined row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactSpec {
    /// Fact name in the provider catalog.
    pub name: String,
    /// Field the value is attached under.
    pub friendly_name: String,
    #[serde(default)]
    pub parameters: Vec<FactParameter>,
}

impl FactSpec {
    /// Parameters whose value comes from a row field.
    pub fn link_parameters(&self) -> impl Iterator<Item = &FactParameter> {
        self.parameters
            .iter()
            .filter(|p| p.kind == ParameterKind::Link)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    /// Row field a link parameter reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Fixed value of a set parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Link,
    Set,
    /// Unknown kinds always send `null`.
    #[serde(other)]
    Other,
}

/// Totals of `aggregate_fields` per distinct value of `group_by_field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSpec {
    pub group_by_field: String,
    #[serde(default)]
    pub aggregate_fields: Vec<String>,
}
