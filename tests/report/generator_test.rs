//! Tests for end-to-end report generation.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{credential, MockProvider, RecordingStore};
use reportgen::config::FilterSettings;
use reportgen::metadata::ProviderRegistry;
use reportgen::report::{
    JoinKind, NanPolicy, ReportDefinition, ReportError, ReportGenerator, ReportOptions,
};
use serde_json::{json, Value};

const MARKET_VALUE_REPORT: &str = r#"{
    "data": {
        "dimensions": [
            {"type": "data", "name": "Asset", "fields": ["Asset Name", "Sector"]},
            {"type": "dates", "name": "Date", "start": "2016-01-01", "end": "2016-06-30",
             "interval": 3, "intervalUnit": "months"}
        ],
        "facts": [
            {"name": "Market Value", "friendlyName": "Value", "parameters": [
                {"name": "assetName", "type": "link", "field": "Asset Name"},
                {"name": "date", "type": "link", "field": "Date"},
                {"name": "currency", "type": "set", "value": "GBP"}
            ]}
        ]
    }
}"#;

fn market_value(request: &serde_json::Map<String, Value>) -> Value {
    let base = match request["assetName"].as_str() {
        Some("Tower") => 100,
        Some("Mall") => 40,
        Some("Depot") => 10,
        _ => 0,
    };
    let bump = if request["date"] == json!("2016-04-01") { 1 } else { 0 };
    json!(base + bump)
}

async fn setup() -> (Arc<MockProvider>, ReportGenerator) {
    let mut provider = MockProvider::with_catalog(2);
    provider.answer_fact(99, market_value);
    let provider = Arc::new(provider);

    let mut registry = ProviderRegistry::new();
    registry.register("voyanta", provider.clone(), Arc::new(RecordingStore::new()));
    registry
        .init_provider("voyanta", &credential())
        .await
        .unwrap();

    (provider, ReportGenerator::new(Arc::new(registry)))
}

#[tokio::test]
async fn test_flat_report() {
    let (_, generator) = setup().await;
    let report = ReportDefinition::from_json(MARKET_VALUE_REPORT).unwrap();

    let tables = generator
        .generate("voyanta", &credential(), &report)
        .await
        .unwrap();

    assert_eq!(
        Value::from(tables),
        json!([[
            ["Asset Name", "Sector", "Date", "Value"],
            ["Tower", "Office", "2016-01-01", 100],
            ["Tower", "Office", "2016-04-01", 101],
            ["Mall", "Retail", "2016-01-01", 40],
            ["Mall", "Retail", "2016-04-01", 41],
            ["Depot", "Office", "2016-01-01", 10],
            ["Depot", "Office", "2016-04-01", 11]
        ]])
    );
}

#[tokio::test]
async fn test_grouped_report() {
    let (_, generator) = setup().await;
    let mut report = ReportDefinition::from_json(MARKET_VALUE_REPORT).unwrap();
    report.data.groups = Some(
        serde_json::from_value(json!([
            {"groupByField": "Sector", "aggregateFields": ["Value"]},
            {"groupByField": "Date", "aggregateFields": ["Value"]}
        ]))
        .unwrap(),
    );

    let tables = generator
        .generate("voyanta", &credential(), &report)
        .await
        .unwrap();

    assert_eq!(
        Value::from(tables),
        json!([
            [["Sector", "Value"], ["Office", 222], ["Retail", 81]],
            [["Date", "Value"], ["2016-01-01", 150], ["2016-04-01", 153]]
        ])
    );
}

#[tokio::test]
async fn test_report_without_facts_skips_fact_lookup() {
    let (provider, generator) = setup().await;
    let mut report = ReportDefinition::from_json(MARKET_VALUE_REPORT).unwrap();
    report.data.facts = None;

    let tables = generator
        .generate("voyanta", &credential(), &report)
        .await
        .unwrap();

    assert_eq!(tables[0][0], vec![json!("Asset Name"), json!("Sector"), json!("Date")]);
    assert_eq!(provider.count("fact_data:99"), 0);
}

#[tokio::test]
async fn test_default_filter_is_sent_and_can_be_disabled() {
    let (provider, generator) = setup().await;
    let report = ReportDefinition::from_json(MARKET_VALUE_REPORT).unwrap();
    generator
        .generate("voyanta", &credential(), &report)
        .await
        .unwrap();
    assert_eq!(provider.dimension_requests.lock().unwrap()[0].2.len(), 1);

    let (provider, generator) = setup().await;
    let generator = generator.with_options(ReportOptions {
        filter: FilterSettings {
            enabled: false,
            ..FilterSettings::default()
        },
        ..ReportOptions::default()
    });
    generator
        .generate("voyanta", &credential(), &report)
        .await
        .unwrap();
    assert!(provider.dimension_requests.lock().unwrap()[0].2.is_empty());
}

#[tokio::test]
async fn test_join_strategies_produce_identical_tables() {
    let report = ReportDefinition::from_json(MARKET_VALUE_REPORT).unwrap();

    let (_, recursive) = setup().await;
    let expected = recursive
        .generate("voyanta", &credential(), &report)
        .await
        .unwrap();

    let (provider, materialized) = setup().await;
    let materialized = materialized.with_options(ReportOptions {
        join: JoinKind::Materialized,
        nan_policy: NanPolicy::Zero,
        ..ReportOptions::default()
    });
    let tables = materialized
        .generate("voyanta", &credential(), &report)
        .await
        .unwrap();

    assert_eq!(tables, expected);
    assert_eq!(provider.count("dimension_data:12"), 1);
}

#[tokio::test]
async fn test_unknown_or_uninitialized_provider_is_invalid() {
    let report = ReportDefinition::from_json(MARKET_VALUE_REPORT).unwrap();

    let (_, generator) = setup().await;
    assert!(matches!(
        generator.generate("other", &credential(), &report).await,
        Err(ReportError::InvalidSpec(_))
    ));

    let mut registry = ProviderRegistry::new();
    registry.register(
        "voyanta",
        Arc::new(MockProvider::with_catalog(2)),
        Arc::new(RecordingStore::new()),
    );
    let generator = ReportGenerator::new(Arc::new(registry));
    assert!(matches!(
        generator.generate("voyanta", &credential(), &report).await,
        Err(ReportError::InvalidSpec(m)) if m.contains("not been initialized")
    ));
}

#[tokio::test]
async fn test_missing_dimensions_is_invalid() {
    let (provider, generator) = setup().await;
    let report = ReportDefinition::from_json(r#"{"data": {"facts": []}}"#).unwrap();

    let result = generator.generate("voyanta", &credential(), &report).await;

    assert!(matches!(result, Err(ReportError::InvalidSpec(_))));
    assert_eq!(provider.count("dimension_data:12"), 0);
}

#[tokio::test]
async fn test_provider_failure_surfaces() {
    let (provider, generator) = setup().await;
    provider.fail("fact_data");
    let report = ReportDefinition::from_json(MARKET_VALUE_REPORT).unwrap();

    let result = generator.generate("voyanta", &credential(), &report).await;
    assert!(matches!(result, Err(ReportError::ProviderFailure(_))));
}
