//! Grouped totals over report rows.
//!
//! Field values are summed the way a loosely typed report consumer would:
//! group values are compared by their string form and aggregate values are
//! coerced to numbers (`"12"` is 12, `""`/`null`/`false` are 0, `true` is 1,
//! anything unparsable is NaN).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::definition::GroupSpec;
use crate::metadata::Row;

/// What an aggregate does with values that are not numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NanPolicy {
    /// NaN poisons the total, which then renders as `0`.
    #[default]
    Propagate,
    /// Unparsable values count as 0.
    Zero,
}

impl NanPolicy {
    pub fn apply(self, n: f64) -> f64 {
        match self {
            NanPolicy::Zero if n.is_nan() => 0.0,
            _ => n,
        }
    }
}

/// Totals of one group spec.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotals {
    pub group_by_field: String,
    /// Distinct group values in first-seen order.
    pub keys: Vec<String>,
    /// Per aggregate field, in definition order: group value to sum.
    pub totals: Vec<(String, HashMap<String, f64>)>,
}

impl GroupTotals {
    pub fn total(&self, aggregate: usize, key: &str) -> Option<f64> {
        self.totals.get(aggregate)?.1.get(key).copied()
    }
}

/// Sum each aggregate field of `group` per stringified group value.
pub fn group_totals(rows: &[Row], group: &GroupSpec, policy: NanPolicy) -> GroupTotals {
    let mut keys: Vec<String> = Vec::new();
    let mut totals = Vec::with_capacity(group.aggregate_fields.len());

    for field in &group.aggregate_fields {
        let mut sums: HashMap<String, f64> = HashMap::new();
        for row in rows {
            let key = group_key(row.get(&group.group_by_field));
            let n = policy.apply(coerce_number(row.get(field)));
            match sums.get_mut(&key) {
                Some(sum) => *sum += n,
                None => {
                    if !keys.contains(&key) {
                        keys.push(key.clone());
                    }
                    sums.insert(key, n);
                }
            }
        }
        totals.push((field.clone(), sums));
    }

    GroupTotals {
        group_by_field: group.group_by_field.clone(),
        keys,
        totals,
    }
}

/// Numeric value of a field; a missing field is NaN.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_number(s),
        Some(Value::Array(_)) | Some(Value::Object(_)) => f64::NAN,
    }
}

fn parse_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN);
        }
    }

    // Rust's float parser also takes "inf" and "nan"; only plain decimals count.
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

/// String form a group value is bucketed under; a missing field is `"undefined"`.
pub fn group_key(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => number_key(n),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => group_key(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

fn number_key(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => {
            format!("{}", f as i128)
        }
        Some(f) => float_key(f),
        None => n.to_string(),
    }
}

/// Exponent form outside `[1e-6, 1e21)`, as `String(number)` prints it.
fn float_key(f: f64) -> String {
    let magnitude = f.abs();
    if f == 0.0 || (1e-6..1e21).contains(&magnitude) || !f.is_finite() {
        return f.to_string();
    }
    let exp = format!("{:e}", f);
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{}e+{}", mantissa, power),
        _ => exp,
    }
}

/// JSON form of a total: integral sums as integers, NaN and infinities as `null`.
pub fn number_value(n: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_992.0;
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        return Value::from(n as i64);
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}
