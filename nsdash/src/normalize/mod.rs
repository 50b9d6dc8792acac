//! Result normalizers: raw endpoint payloads to flat records and series
//!
//! Every normalizer is a pure function of the JSON payload. Missing optional
//! fields become [`PLACEHOLDER`]; only a missing top-level container is a
//! [`MalformedResponse`](crate::error::AppError::MalformedResponse).
//!
//! Most endpoints answer with SPARQL-style bindings, where each field is an
//! object `{"type": ..., "value": ...}`. The helpers here accept both that
//! form and plain JSON values.

use std::cmp::Ordering;

use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::series::Scalar;

mod auth;
mod locus;
mod schema;
mod sequences;
mod stats;

pub use auth::{notice, profile, token};
pub use locus::{fasta, uniprot};
pub use schema::{allele_modes, annotations, contributions, description, length_stats};
pub use sequences::sequence_search;
pub use stats::{loci_alleles, species_roster, species_schemas};

/// Stand-in for a missing optional field
pub const PLACEHOLDER: &str = "N/A";

/// Identifier embedded in a URI: everything after the last `/`.
///
/// Strings without `/` are returned unchanged.
pub fn extract_tail(uri: &str) -> &str {
    match uri.rfind('/') {
        Some(idx) => &uri[idx + 1..],
        None => uri,
    }
}

/// Numeric-aware, case-insensitive comparison (`locus2` < `locus10`).
///
/// Digit runs compare by value, other runs compare case-insensitively and a
/// digit run sorts before text. Remaining ties fall back to the raw strings
/// so the order is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);

    loop {
        let ord = match (left.next(), right.next()) {
            (None, None) => break,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => compare_chunks(x, y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.cmp(b)
}

fn compare_chunks(x: &str, y: &str) -> Ordering {
    let x_digits = x.starts_with(|c: char| c.is_ascii_digit());
    let y_digits = y.starts_with(|c: char| c.is_ascii_digit());

    match (x_digits, y_digits) {
        (true, true) => {
            let x = x.trim_start_matches('0');
            let y = y.trim_start_matches('0');
            x.len().cmp(&y.len()).then_with(|| x.cmp(y))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => x
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(y.chars().flat_map(char::to_lowercase)),
    }
}

/// Alternating runs of ASCII digits and non-digits
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}

/// The required top-level container `key` of a payload.
pub(crate) fn container<'a>(payload: &'a Value, key: &str) -> AppResult<&'a Value> {
    payload
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| AppError::malformed(format!("missing `{key}` in response")))
}

pub(crate) fn container_array<'a>(payload: &'a Value, key: &str) -> AppResult<&'a [Value]> {
    container(payload, key)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| AppError::malformed(format!("`{key}` is not a list")))
}

/// Unwrap a `{"value": ...}` binding; plain values pass through.
pub(crate) fn unwrap_binding(value: &Value) -> Option<&Value> {
    let inner = match value {
        Value::Object(map) if map.contains_key("value") => map.get("value")?,
        other => other,
    };
    (!inner.is_null()).then_some(inner)
}

pub(crate) fn field<'a>(record: &'a Value, key: &str) -> Option<&'a Value> {
    record.get(key).and_then(unwrap_binding)
}

pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn value_scalar(value: &Value) -> Option<Scalar> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Scalar::Int)
            .or_else(|| n.as_f64().map(Scalar::Float)),
        Value::String(s) => Some(Scalar::parse(s)),
        _ => None,
    }
}

/// Text of `key`, or the placeholder
pub(crate) fn text(record: &Value, key: &str) -> String {
    field(record, key)
        .and_then(value_text)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// URI tail of `key`, or the placeholder
pub(crate) fn tail(record: &Value, key: &str) -> String {
    field(record, key)
        .and_then(value_text)
        .map(|uri| extract_tail(&uri).to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Numeric (or parsed) value of `key`, or the placeholder
pub(crate) fn scalar(record: &Value, key: &str) -> Scalar {
    field(record, key)
        .and_then(value_scalar)
        .unwrap_or_else(|| Scalar::from(PLACEHOLDER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_tail() {
        assert_eq!(extract_tail("https://host/species/10/schemas/3"), "3");
        assert_eq!(extract_tail("standalone"), "standalone");
        assert_eq!(extract_tail("trailing/"), "");
    }

    #[test]
    fn test_natural_cmp_numeric_runs() {
        assert_eq!(natural_cmp("locus2", "locus10"), Ordering::Less);
        assert_eq!(natural_cmp("10", "9"), Ordering::Greater);
        assert_eq!(natural_cmp("007", "7"), Ordering::Less);
        assert_eq!(natural_cmp("Locus", "locus"), Ordering::Less);
        assert_eq!(natural_cmp("abc", "abd"), Ordering::Less);
        assert_eq!(natural_cmp("2", "a"), Ordering::Less);
        assert_eq!(natural_cmp("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_natural_sort() {
        let mut ids = vec!["30", "2", "17"];
        ids.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(ids, vec!["2", "17", "30"]);
    }

    #[test]
    fn test_binding_helpers() {
        let record = json!({
            "name": { "type": "literal", "value": "Escherichia coli" },
            "schemas": { "value": "4" },
            "plain": 2.5,
            "species": { "value": "http://ns/species/12" },
            "empty": null
        });

        assert_eq!(text(&record, "name"), "Escherichia coli");
        assert_eq!(scalar(&record, "schemas"), Scalar::Int(4));
        assert_eq!(scalar(&record, "plain"), Scalar::Float(2.5));
        assert_eq!(tail(&record, "species"), "12");
        assert_eq!(text(&record, "empty"), PLACEHOLDER);
        assert_eq!(scalar(&record, "missing"), Scalar::from(PLACEHOLDER));
    }

    #[test]
    fn test_missing_container_is_malformed() {
        let payload = json!({ "other": [] });
        assert!(matches!(
            container_array(&payload, "message"),
            Err(AppError::MalformedResponse(_))
        ));
        let payload = json!({ "message": {} });
        assert!(container_array(&payload, "message").is_err());
    }
}
