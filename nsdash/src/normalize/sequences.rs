//! Sequence search hits with navigable links

use serde_json::Value;

use super::{container_array, extract_tail, field, value_text, PLACEHOLDER};
use crate::error::AppResult;
use crate::records::{SequenceHit, SequenceSearch};

/// Species id inside a schema URI: the segment following `species`.
fn species_segment(schema_uri: &str) -> Option<&str> {
    let mut segments = schema_uri.split('/');
    segments.find(|segment| *segment == "species")?;
    segments.next().filter(|id| !id.is_empty())
}

/// `GET sequences/seq_info`
///
/// Each hit links to `{site_base}/species/{species}/schemas/{schema}/locus/{locus}`.
pub fn sequence_search(payload: &Value, site_base: &str) -> AppResult<SequenceSearch> {
    let base = site_base.trim_end_matches('/');

    let hits = container_array(payload, "result")?
        .iter()
        .map(|record| {
            let schema_uri = field(record, "schemas").and_then(value_text);
            let species = schema_uri
                .as_deref()
                .and_then(species_segment)
                .unwrap_or(PLACEHOLDER)
                .to_string();
            let schema = schema_uri
                .as_deref()
                .map(extract_tail)
                .unwrap_or(PLACEHOLDER)
                .to_string();
            let locus = super::tail(record, "locus");
            let url = format!("{base}/species/{species}/schemas/{schema}/locus/{locus}");

            SequenceHit {
                species,
                schema,
                locus,
                url,
            }
        })
        .collect();

    let total = field(payload, "number_alleles_loci").and_then(value_text);
    Ok(SequenceSearch { hits, total })
}
