//! Report generation entry point.

use std::sync::Arc;

use super::aggregate::NanPolicy;
use super::definition::ReportDefinition;
use super::error::{ReportError, ReportResult};
use super::facts::attach_facts;
use super::join::JoinKind;
use super::render::{render, ReportTable};
use super::resolver::{filter_strategy, DimensionResolver};
use crate::config::{Credential, FilterSettings, ReportSettings};
use crate::metadata::ProviderRegistry;

/// Knobs of the generation pipeline.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub join: JoinKind,
    pub filter: FilterSettings,
    pub nan_policy: NanPolicy,
}

impl From<&ReportSettings> for ReportOptions {
    fn from(settings: &ReportSettings) -> Self {
        Self {
            join: settings.join_strategy,
            filter: settings.filter.clone(),
            nan_policy: settings.nan_policy,
        }
    }
}

/// Generates reports against the providers of a registry.
pub struct ReportGenerator {
    registry: Arc<ProviderRegistry>,
    options: ReportOptions,
}

impl ReportGenerator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            options: ReportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Join the report's dimensions, attach its facts and render its tables.
    ///
    /// The provider must have completed a sync. Returns one table, or one
    /// per group when the report defines groups.
    pub async fn generate(
        &self,
        provider_name: &str,
        credential: &Credential,
        report: &ReportDefinition,
    ) -> ReportResult<Vec<ReportTable>> {
        let entry = self.registry.get(provider_name)?;
        let snapshot = entry.snapshot().await;
        if !snapshot.is_initialized() {
            return Err(ReportError::invalid(format!(
                "provider '{}' has not been initialized",
                provider_name
            )));
        }

        let dimensions = report
            .data
            .dimensions
            .as_deref()
            .ok_or_else(|| ReportError::invalid("report does not define any dimensions"))?;

        tracing::info!(
            provider = %provider_name,
            dimensions = dimensions.len(),
            join = %self.options.join,
            "generating report"
        );

        let filter = filter_strategy(&self.options.filter);
        let resolver =
            DimensionResolver::new(entry.provider(), credential, &snapshot, filter.as_ref());
        let mut rows = self.options.join.strategy().join(&resolver, dimensions).await?;
        tracing::debug!(rows = rows.len(), "joined dimensions");

        if let Some(facts) = &report.data.facts {
            attach_facts(entry.provider(), credential, &snapshot, &mut rows, facts).await?;
        }

        let tables = render(&rows, report.data.groups.as_deref(), self.options.nan_policy);
        tracing::info!(rows = rows.len(), tables = tables.len(), "report generated");
        Ok(tables)
    }
}
