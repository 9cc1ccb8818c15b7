//! Tests for grouped totals and table rendering.

#[path = "../common/mod.rs"]
mod common;

use common::rows;
use reportgen::report::aggregate::{group_totals, NanPolicy};
use reportgen::report::render::{render_flat, render_group};
use reportgen::report::{render, GroupSpec};
use serde_json::{json, Value};

fn group(by: &str, fields: &[&str]) -> GroupSpec {
    GroupSpec {
        group_by_field: by.to_string(),
        aggregate_fields: fields.iter().map(|f| f.to_string()).collect(),
    }
}

fn as_json(tables: Vec<Vec<Vec<Value>>>) -> Value {
    Value::from(tables)
}

#[test]
fn test_grouped_totals_in_first_seen_order() {
    let data = rows(json!([
        {"region": "A", "amt": 5},
        {"region": "A", "amt": 3},
        {"region": "B", "amt": 2}
    ]));

    let tables = render(&data, Some(&[group("region", &["amt"])][..]), NanPolicy::Propagate);
    assert_eq!(
        as_json(tables),
        json!([[["region", "amt"], ["A", 8], ["B", 2]]])
    );
}

#[test]
fn test_one_table_per_group() {
    let data = rows(json!([
        {"Sector": "Office", "Fund": "Core", "Value": 10.5, "Area": 100},
        {"Sector": "Retail", "Fund": "Core", "Value": 4, "Area": "50"},
        {"Sector": "Office", "Fund": "Value Add", "Value": 1.5, "Area": 25}
    ]));
    let groups = [group("Sector", &["Value", "Area"]), group("Fund", &["Value"])];

    let tables = render(&data, Some(&groups[..]), NanPolicy::Propagate);
    assert_eq!(
        as_json(tables),
        json!([
            [["Sector", "Value", "Area"], ["Office", 12, 125], ["Retail", 4, 50]],
            [["Fund", "Value"], ["Core", 14.5], ["Value Add", 1.5]]
        ])
    );
}

#[test]
fn test_group_values_are_stringified() {
    let data = rows(json!([
        {"year": 2016, "amt": 1},
        {"year": "2016", "amt": 2},
        {"year": 2017.0, "amt": 4},
        {"amt": 8}
    ]));

    let table = render_group(&data, &group("year", &["amt"]), NanPolicy::Propagate);
    assert_eq!(
        Value::from(table),
        json!([["year", "amt"], ["2016", 3], ["2017", 4], ["undefined", 8]])
    );
}

#[test]
fn test_nan_propagates_or_zeroes() {
    let data = rows(json!([
        {"region": "A", "amt": 5},
        {"region": "A", "amt": "n/a"},
        {"region": "B", "amt": null},
        {"region": "B", "amt": true},
        {"region": "C"}
    ]));
    let spec = group("region", &["amt"]);

    let propagated = render_group(&data, &spec, NanPolicy::Propagate);
    assert_eq!(
        Value::from(propagated),
        json!([["region", "amt"], ["A", 0], ["B", 1], ["C", 0]])
    );

    let zeroed = render_group(&data, &spec, NanPolicy::Zero);
    assert_eq!(
        Value::from(zeroed),
        json!([["region", "amt"], ["A", 5], ["B", 1], ["C", 0]])
    );
}

#[test]
fn test_unparsable_total_renders_zero_beside_real_totals() {
    let data = rows(json!([
        {"region": "A", "amt": "n/a"},
        {"region": "B", "amt": 2}
    ]));

    let table = render_group(&data, &group("region", &["amt"]), NanPolicy::Propagate);
    assert_eq!(
        Value::from(table),
        json!([["region", "amt"], ["A", 0], ["B", 2]])
    );

    let totals = group_totals(&data, &group("region", &["amt"]), NanPolicy::Propagate);
    assert!(totals.total(0, "A").is_some_and(f64::is_nan));
}

#[test]
fn test_group_totals_exposes_sums() {
    let data = rows(json!([
        {"region": "A", "amt": "1.25", "qty": 1},
        {"region": "A", "amt": "2.25", "qty": 1}
    ]));
    let totals = group_totals(&data, &group("region", &["amt", "qty"]), NanPolicy::Propagate);

    assert_eq!(totals.keys, vec!["A"]);
    assert_eq!(totals.total(0, "A"), Some(3.5));
    assert_eq!(totals.total(1, "A"), Some(2.0));
    assert_eq!(totals.total(1, "B"), None);
}

#[test]
fn test_group_without_rows_renders_header_only() {
    let table = render_group(&[], &group("region", &["amt"]), NanPolicy::Propagate);
    assert_eq!(Value::from(table), json!([["region", "amt"]]));
}

#[test]
fn test_flat_table_uses_first_row_field_order() {
    let data = rows(json!([
        {"Fund Name": "Core", "Date": "2016-01-01", "Value": 1},
        {"Date": "2016-01-02", "Fund Name": "Core", "Extra": true}
    ]));

    let tables = render(&data, None, NanPolicy::Propagate);
    assert_eq!(
        as_json(tables),
        json!([[
            ["Fund Name", "Date", "Value"],
            ["Core", "2016-01-01", 1],
            ["Core", "2016-01-02", null]
        ]])
    );
}

#[test]
fn test_flat_table_without_rows_has_empty_header() {
    assert_eq!(Value::from(render_flat(&[])), json!([[]]));
}
