//! Shared fixtures: an in-memory provider and a recording metadata store.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reportgen::cache::{CacheError, CacheResult, MetadataStore};
use reportgen::config::Credential;
use reportgen::metadata::*;
use reportgen::worker::WorkerError;
use serde_json::{json, Value};

pub fn credential() -> Credential {
    Credential::new("token-123", "analyst@example.com", "Demo Co.")
}

/// Build a row from a JSON object literal.
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

pub fn rows(value: Value) -> Vec<Row> {
    match value {
        Value::Array(items) => items.into_iter().map(row).collect(),
        other => panic!("expected a JSON array, got {}", other),
    }
}

pub fn column(id: i64, name: &str) -> ColumnElement {
    ColumnElement {
        id,
        name: name.to_string(),
    }
}

/// Computes a fact value from a request's parameters.
type FactAnswer = Box<dyn Fn(&ParameterMap) -> Value + Send + Sync>;

/// Provider serving a fixed catalog from memory.
///
/// Every call is appended to `calls` as `"<method>"` or `"<method>:<id>"`.
/// Setting `fail_on` to a method name makes that method fail.
pub struct MockProvider {
    pub version: Mutex<i64>,
    pub operators: Vec<Operator>,
    pub dimensions: Vec<DimensionMeta>,
    pub column_sets: Vec<DimensionColumnSets>,
    pub facts: Vec<FactMeta>,
    pub dimension_rows: HashMap<i64, Vec<Row>>,
    fact_answers: HashMap<i64, FactAnswer>,
    fixed_results: HashMap<i64, Vec<FactValue>>,
    pub calls: Mutex<Vec<String>>,
    pub dimension_requests: Mutex<Vec<(i64, Vec<ColumnElement>, Vec<DimensionFilter>)>>,
    pub fact_requests: Mutex<Vec<(i64, Vec<ParameterMap>)>>,
    pub fail_on: Mutex<Option<String>>,
}

impl MockProvider {
    pub fn new(version: i64) -> Self {
        Self {
            version: Mutex::new(version),
            operators: Vec::new(),
            dimensions: Vec::new(),
            column_sets: Vec::new(),
            facts: Vec::new(),
            dimension_rows: HashMap::new(),
            fact_answers: HashMap::new(),
            fixed_results: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            dimension_requests: Mutex::new(Vec::new()),
            fact_requests: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
        }
    }

    /// Catalog used across the report tests.
    ///
    /// - `Asset` (id 12): columns `Asset Name` (121), `Sector` (122), `Id` (123)
    /// - `Fund` (id 13): columns `Fund Name` (131)
    /// - fact `Market Value` (id 99)
    pub fn with_catalog(version: i64) -> Self {
        let mut provider = Self::new(version);
        provider.operators = vec![
            Operator {
                id: 1,
                description: "is equal to".to_string(),
            },
            Operator {
                id: 2,
                description: "is not equal to".to_string(),
            },
        ];
        provider.dimensions = vec![
            DimensionMeta {
                id: 12,
                name: "Asset".to_string(),
            },
            DimensionMeta {
                id: 13,
                name: "Fund".to_string(),
            },
        ];
        provider.column_sets = vec![
            DimensionColumnSets {
                column_sets: vec![
                    ColumnSet {
                        id: 12,
                        sequence_number: None,
                        column_elements: vec![
                            column(121, "Asset Name"),
                            column(122, "Sector"),
                            column(123, "Id"),
                        ],
                    },
                    ColumnSet {
                        id: 13,
                        sequence_number: Some(1),
                        column_elements: vec![column(131, "Fund Name")],
                    },
                ],
            },
            DimensionColumnSets {
                column_sets: vec![ColumnSet {
                    id: 13,
                    sequence_number: Some(0),
                    column_elements: vec![column(131, "Fund Name")],
                }],
            },
        ];
        provider.facts = vec![FactMeta {
            id: 99,
            name: "Market Value".to_string(),
        }];
        provider.dimension_rows.insert(
            12,
            rows(json!([
                {"Asset Name": "Tower", "Sector": "Office", "Id": 1},
                {"Asset Name": "Mall", "Sector": "Retail", "Id": 2},
                {"Asset Name": "Depot", "Sector": "Office", "Id": 3}
            ])),
        );
        provider.dimension_rows.insert(
            13,
            rows(json!([{"Fund Name": "Core"}, {"Fund Name": "Value Add"}])),
        );
        provider
    }

    /// Answer fact `id` requests with `answer(request)`.
    pub fn answer_fact<F>(&mut self, id: i64, answer: F)
    where
        F: Fn(&ParameterMap) -> Value + Send + Sync + 'static,
    {
        self.fact_answers.insert(id, Box::new(answer));
    }

    /// Return exactly `results` for fact `id`, whatever was requested.
    pub fn fixed_fact_results(&mut self, id: i64, results: Vec<FactValue>) {
        self.fixed_results.insert(id, results);
    }

    pub fn set_version(&self, version: i64) {
        *self.version.lock().unwrap() = version;
    }

    pub fn fail(&self, method: &str) {
        *self.fail_on.lock().unwrap() = Some(method.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, method: &str, call: String) -> Result<(), WorkerError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_on.lock().unwrap().as_deref() == Some(method) {
            return Err(WorkerError::remote("MOCK_FAILURE", format!("{} failed", method)));
        }
        Ok(())
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn metadata_version(&self, _credential: &Credential) -> ProviderResult<i64> {
        self.record("metadata_version", "metadata_version".to_string())?;
        Ok(*self.version.lock().unwrap())
    }

    async fn dimension_metadata(&self, _credential: &Credential) -> ProviderResult<Vec<DimensionMeta>> {
        self.record("dimension_metadata", "dimension_metadata".to_string())?;
        Ok(self.dimensions.clone())
    }

    async fn dimension_detail_metadata(
        &self,
        _credential: &Credential,
        dimension_ids: &[i64],
    ) -> ProviderResult<Vec<DimensionColumnSets>> {
        self.record(
            "dimension_detail_metadata",
            format!("dimension_detail_metadata:{:?}", dimension_ids),
        )?;
        Ok(self.column_sets.clone())
    }

    async fn fact_metadata(&self, _credential: &Credential) -> ProviderResult<Vec<FactMeta>> {
        self.record("fact_metadata", "fact_metadata".to_string())?;
        Ok(self.facts.clone())
    }

    async fn operator_metadata(&self, _credential: &Credential) -> ProviderResult<Vec<Operator>> {
        self.record("operator_metadata", "operator_metadata".to_string())?;
        Ok(self.operators.clone())
    }

    async fn dimension_data(
        &self,
        _credential: &Credential,
        dimension_id: i64,
        columns: &[ColumnElement],
        filters: &[DimensionFilter],
    ) -> ProviderResult<Vec<Row>> {
        self.record("dimension_data", format!("dimension_data:{}", dimension_id))?;
        self.dimension_requests
            .lock()
            .unwrap()
            .push((dimension_id, columns.to_vec(), filters.to_vec()));

        // Only the requested columns come back, like the real service.
        let rows = self
            .dimension_rows
            .get(&dimension_id)
            .cloned()
            .unwrap_or_default();
        Ok(rows
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .filter_map(|c| row.get(&c.name).map(|v| (c.name.clone(), v.clone())))
                    .collect()
            })
            .collect())
    }

    async fn fact_data(
        &self,
        _credential: &Credential,
        fact_id: i64,
        requests: &[ParameterMap],
    ) -> ProviderResult<Vec<FactValue>> {
        self.record("fact_data", format!("fact_data:{}", fact_id))?;
        self.fact_requests
            .lock()
            .unwrap()
            .push((fact_id, requests.to_vec()));

        if let Some(results) = self.fixed_results.get(&fact_id) {
            return Ok(results.clone());
        }
        Ok(requests
            .iter()
            .map(|request| FactValue {
                value: self
                    .fact_answers
                    .get(&fact_id)
                    .map(|answer| answer(request))
                    .unwrap_or(Value::Null),
                request: request.clone(),
            })
            .collect())
    }
}

/// In-memory store that records every call.
#[derive(Default)]
pub struct RecordingStore {
    pub version: Mutex<Option<i64>>,
    pub operators: Mutex<Vec<Operator>>,
    pub dimensions: Mutex<Vec<DimensionMeta>>,
    pub details: Mutex<Vec<DimensionDetailMeta>>,
    pub facts: Mutex<Vec<FactMeta>>,
    pub calls: Mutex<Vec<String>>,
    pub fail_on: Mutex<Option<String>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, method: &str) {
        *self.fail_on.lock().unwrap() = Some(method.to_string());
    }

    pub fn recover(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Calls that write to the store.
    pub fn writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("save_") || c == "set_version")
            .collect()
    }

    fn record(&self, method: &str) -> CacheResult<()> {
        self.calls.lock().unwrap().push(method.to_string());
        if self.fail_on.lock().unwrap().as_deref() == Some(method) {
            return Err(CacheError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{} failed", method),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for RecordingStore {
    async fn get_version(&self) -> CacheResult<Option<i64>> {
        self.record("get_version")?;
        Ok(*self.version.lock().unwrap())
    }

    async fn set_version(&self, version: i64) -> CacheResult<()> {
        self.record("set_version")?;
        *self.version.lock().unwrap() = Some(version);
        Ok(())
    }

    async fn save_operators(&self, operators: &[Operator]) -> CacheResult<()> {
        self.record("save_operators")?;
        *self.operators.lock().unwrap() = operators.to_vec();
        Ok(())
    }

    async fn load_operators(&self) -> CacheResult<Vec<Operator>> {
        self.record("load_operators")?;
        Ok(self.operators.lock().unwrap().clone())
    }

    async fn save_dimensions(&self, dimensions: &[DimensionMeta]) -> CacheResult<()> {
        self.record("save_dimensions")?;
        *self.dimensions.lock().unwrap() = dimensions.to_vec();
        Ok(())
    }

    async fn load_dimensions(&self) -> CacheResult<Vec<DimensionMeta>> {
        self.record("load_dimensions")?;
        Ok(self.dimensions.lock().unwrap().clone())
    }

    async fn save_dimension_details(&self, details: &[DimensionDetailMeta]) -> CacheResult<()> {
        self.record("save_dimension_details")?;
        *self.details.lock().unwrap() = details.to_vec();
        Ok(())
    }

    async fn load_dimension_details(&self) -> CacheResult<Vec<DimensionDetailMeta>> {
        self.record("load_dimension_details")?;
        Ok(self.details.lock().unwrap().clone())
    }

    async fn save_facts(&self, facts: &[FactMeta]) -> CacheResult<()> {
        self.record("save_facts")?;
        *self.facts.lock().unwrap() = facts.to_vec();
        Ok(())
    }

    async fn load_facts(&self) -> CacheResult<Vec<FactMeta>> {
        self.record("load_facts")?;
        Ok(self.facts.lock().unwrap().clone())
    }
}

/// Snapshot matching [`MockProvider::with_catalog`] after a sync.
pub fn catalog_snapshot(provider: &MockProvider) -> MetadataSnapshot {
    MetadataSnapshot {
        version: Some(*provider.version.lock().unwrap()),
        operators: provider.operators.clone(),
        dimensions: provider.dimensions.clone(),
        dimension_details: unqualified_details(&provider.column_sets),
        facts: provider.facts.clone(),
    }
}
