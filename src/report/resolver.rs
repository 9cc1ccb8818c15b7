//! Dimension resolution: turns one dimension spec into rows.

use serde_json::Value;

use super::dates::date_rows;
use super::definition::{DataDimension, DimensionSpec};
use super::error::{ReportError, ReportResult};
use crate::config::{Credential, FilterSettings};
use crate::metadata::{ColumnElement, DimensionFilter, MetadataSnapshot, Provider, Row};

/// Builds the filters sent with a data dimension request.
pub trait FilterStrategy: Send + Sync {
    fn filters(
        &self,
        snapshot: &MetadataSnapshot,
        columns: &[ColumnElement],
    ) -> ReportResult<Vec<DimensionFilter>>;
}

/// A single filter on the first selected column.
///
/// The default (`is not equal to ""`) only drops rows with a blank first
/// column.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstColumnFilter {
    operator: String,
    value: Value,
}

impl FirstColumnFilter {
    pub fn new(operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            operator: operator.into(),
            value: value.into(),
        }
    }
}

impl Default for FirstColumnFilter {
    fn default() -> Self {
        Self::new("is not equal to", "")
    }
}

impl FilterStrategy for FirstColumnFilter {
    fn filters(
        &self,
        snapshot: &MetadataSnapshot,
        columns: &[ColumnElement],
    ) -> ReportResult<Vec<DimensionFilter>> {
        let Some(first) = columns.first() else {
            return Ok(Vec::new());
        };
        let operator = snapshot
            .operator_by_description(&self.operator)
            .ok_or_else(|| ReportError::invalid(format!("unknown operator '{}'", self.operator)))?;

        Ok(vec![DimensionFilter {
            column_id: first.id,
            operator_id: operator.id,
            value: self.value.clone(),
        }])
    }
}

/// Fetch dimension rows unfiltered.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilter;

impl FilterStrategy for NoFilter {
    fn filters(
        &self,
        _snapshot: &MetadataSnapshot,
        _columns: &[ColumnElement],
    ) -> ReportResult<Vec<DimensionFilter>> {
        Ok(Vec::new())
    }
}

/// The strategy described by `[report.filter]`.
pub fn filter_strategy(settings: &FilterSettings) -> Box<dyn FilterStrategy> {
    if settings.enabled {
        Box::new(FirstColumnFilter::new(
            settings.operator.clone(),
            settings.value.clone(),
        ))
    } else {
        Box::new(NoFilter)
    }
}

/// Resolves dimension specs against one provider and catalog snapshot.
pub struct DimensionResolver<'a> {
    provider: &'a dyn Provider,
    credential: &'a Credential,
    snapshot: &'a MetadataSnapshot,
    filter: &'a dyn FilterStrategy,
}

impl<'a> DimensionResolver<'a> {
    pub fn new(
        provider: &'a dyn Provider,
        credential: &'a Credential,
        snapshot: &'a MetadataSnapshot,
        filter: &'a dyn FilterStrategy,
    ) -> Self {
        Self {
            provider,
            credential,
            snapshot,
            filter,
        }
    }

    pub fn snapshot(&self) -> &MetadataSnapshot {
        self.snapshot
    }

    /// Rows of one dimension.
    pub async fn resolve(&self, spec: &DimensionSpec) -> ReportResult<Vec<Row>> {
        match spec {
            DimensionSpec::Dates(dates) => date_rows(dates),
            DimensionSpec::Data(data) => self.resolve_data(data).await,
            DimensionSpec::Unsupported => Err(ReportError::invalid("invalid dimension type")),
        }
    }

    async fn resolve_data(&self, spec: &DataDimension) -> ReportResult<Vec<Row>> {
        let dimension = self
            .snapshot
            .dimension_by_name(&spec.name)
            .ok_or_else(|| ReportError::invalid(format!("unknown dimension '{}'", spec.name)))?;
        let detail = self.snapshot.dimension_detail(dimension.id).ok_or_else(|| {
            ReportError::invalid(format!("no column catalog for dimension '{}'", spec.name))
        })?;

        let columns: Vec<ColumnElement> = detail
            .column_elements
            .iter()
            .filter(|column| spec.fields.contains(&column.name))
            .cloned()
            .collect();
        if columns.is_empty() {
            return Err(ReportError::invalid(format!(
                "dimension '{}' has none of the requested fields",
                spec.name
            )));
        }

        let filters = self.filter.filters(self.snapshot, &columns)?;
        let rows = self
            .provider
            .dimension_data(self.credential, dimension.id, &columns, &filters)
            .await?;

        tracing::debug!(
            dimension = %spec.name,
            columns = columns.len(),
            rows = rows.len(),
            "resolved data dimension"
        );
        Ok(rows)
    }
}
