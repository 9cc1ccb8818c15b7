//! Fact linking: look up measures for joined rows and attach them.

use serde_json::Value;

use super::definition::{FactSpec, ParameterKind};
use super::error::{ReportError, ReportResult};
use crate::config::Credential;
use crate::metadata::{FactValue, MetadataSnapshot, ParameterMap, Provider, Row};

/// Attach every fact in `facts` to `rows`.
///
/// Each fact costs one batched provider call carrying one parameter map per
/// row. A result is attached to the first row whose link fields equal the
/// result's request parameters; results no row matches are dropped.
pub async fn attach_facts(
    provider: &dyn Provider,
    credential: &Credential,
    snapshot: &MetadataSnapshot,
    rows: &mut [Row],
    facts: &[FactSpec],
) -> ReportResult<()> {
    for fact in facts {
        let meta = snapshot
            .fact_by_name(&fact.name)
            .ok_or_else(|| ReportError::invalid(format!("unknown fact '{}'", fact.name)))?;

        let requests: Vec<ParameterMap> = rows.iter().map(|row| parameters(fact, row)).collect();
        let results = provider.fact_data(credential, meta.id, &requests).await?;

        let dropped = link_results(fact, rows, results);
        tracing::debug!(
            fact = %fact.name,
            requests = requests.len(),
            dropped,
            "linked fact values"
        );
    }
    Ok(())
}

/// The parameter map sent for one row.
pub fn parameters(fact: &FactSpec, row: &Row) -> ParameterMap {
    fact.parameters
        .iter()
        .map(|param| {
            let value = match param.kind {
                ParameterKind::Link => param
                    .field
                    .as_ref()
                    .and_then(|field| row.get(field))
                    .cloned()
                    .unwrap_or(Value::Null),
                ParameterKind::Set => param.value.clone().unwrap_or(Value::Null),
                ParameterKind::Other => Value::Null,
            };
            (param.name.clone(), value)
        })
        .collect()
}

/// Attach results to their first matching row; returns how many matched none.
fn link_results(fact: &FactSpec, rows: &mut [Row], results: Vec<FactValue>) -> usize {
    let mut dropped = 0;
    for result in results {
        let target = rows
            .iter()
            .position(|row| matches(fact, row, &result.request));
        match target {
            Some(index) => {
                rows[index].insert(fact.friendly_name.clone(), result.value);
            }
            None => dropped += 1,
        }
    }
    dropped
}

fn matches(fact: &FactSpec, row: &Row, request: &ParameterMap) -> bool {
    fact.link_parameters().all(|param| {
        let row_value = param
            .field
            .as_ref()
            .and_then(|field| row.get(field))
            .unwrap_or(&Value::Null);
        let request_value = request.get(&param.name).unwrap_or(&Value::Null);
        row_value == request_value
    })
}
