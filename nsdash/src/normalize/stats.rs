//! Species roster, per-species schemas and alleles-per-locus series

use std::collections::BTreeMap;

use serde_json::Value;

use super::{container_array, natural_cmp, scalar, tail, text};
use crate::error::AppResult;
use crate::records::{SchemaRow, SpeciesRow};
use crate::series::{Scalar, SeriesKind, SeriesRecord};

/// `GET stats/species`, ordered by species id.
pub fn species_roster(payload: &Value) -> AppResult<Vec<SpeciesRow>> {
    let mut rows: Vec<SpeciesRow> = container_array(payload, "message")?
        .iter()
        .map(|record| SpeciesRow {
            id: tail(record, "species"),
            name: text(record, "name"),
            schemas: scalar(record, "schemas"),
        })
        .collect();

    rows.sort_by(|a, b| natural_cmp(&a.id, &b.id));
    Ok(rows)
}

/// `GET stats/species/{id}`
pub fn species_schemas(payload: &Value) -> AppResult<Vec<SchemaRow>> {
    let mut rows: Vec<SchemaRow> = container_array(payload, "message")?
        .iter()
        .map(|record| SchemaRow {
            id: tail(record, "schema"),
            name: text(record, "name"),
            loci: scalar(record, "nr_loci"),
            alleles: scalar(record, "nr_alleles"),
            creator: tail(record, "user"),
            version: text(record, "chewBBACA_version"),
            created: text(record, "dateEntered"),
        })
        .collect();

    rows.sort_by(|a, b| natural_cmp(&a.id, &b.id));
    Ok(rows)
}

/// `GET stats/species/{id}/schema/loci/nr_alleles`
///
/// One scatter series per schema. Within a series `y` holds the allele
/// counts in descending order, `x` is `1..=n` and `meta` the matching locus
/// ids. Ties keep natural locus order so the output never depends on the
/// order the server returned.
pub fn loci_alleles(payload: &Value) -> AppResult<Vec<SeriesRecord>> {
    let mut groups: BTreeMap<String, Vec<(String, Scalar)>> = BTreeMap::new();

    for record in container_array(payload, "message")? {
        groups
            .entry(tail(record, "schema"))
            .or_default()
            .push((tail(record, "locus"), scalar(record, "nr_allele")));
    }

    let mut schemas: Vec<_> = groups.into_iter().collect();
    schemas.sort_by(|(a, _), (b, _)| natural_cmp(a, b));

    schemas
        .into_iter()
        .map(|(schema, mut points)| {
            points.sort_by(|(locus_a, count_a), (locus_b, count_b)| {
                count_a
                    .cmp_desc(count_b)
                    .then_with(|| natural_cmp(locus_a, locus_b))
            });

            let x = (1..=points.len()).map(Scalar::from).collect();
            let (meta, y): (Vec<_>, Vec<_>) = points
                .into_iter()
                .map(|(locus, count)| (Scalar::Text(locus), count))
                .unzip();

            SeriesRecord::new(schema, SeriesKind::Scatter, x, y)?.with_meta(meta)
        })
        .collect()
}
