//! Schema-level statistics, annotations, description and contributions

use serde_json::Value;

use super::{
    container, container_array, extract_tail, natural_cmp, scalar, tail, text, unwrap_binding,
    value_scalar, value_text, PLACEHOLDER,
};
use crate::error::{AppError, AppResult};
use crate::records::{AnnotationRow, ContributionRow, Contributions};
use crate::series::{Scalar, SeriesKind, SeriesRecord};

/// `GET .../modes`: histogram of allele-size modes, one point per locus.
pub fn allele_modes(payload: &Value) -> AppResult<Vec<SeriesRecord>> {
    let mut points: Vec<(String, Scalar)> = container_array(payload, "message")?
        .iter()
        .map(|record| (tail(record, "locus"), scalar(record, "alleles_mode")))
        .collect();
    points.sort_by(|(a, _), (b, _)| natural_cmp(a, b));

    let y = vec![Scalar::Int(1); points.len()];
    let (meta, x): (Vec<_>, Vec<_>) = points
        .into_iter()
        .map(|(locus, mode)| (Scalar::Text(locus), mode))
        .unzip();

    let series = SeriesRecord::new("Allele mode", SeriesKind::Histogram, x, y)?.with_meta(meta)?;
    Ok(vec![series])
}

/// Entries of a parallel array, bindings unwrapped
fn array_entries<'a>(stats: &'a Value, key: &str) -> Option<Vec<Option<&'a Value>>> {
    stats
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(unwrap_binding).collect())
}

/// `GET .../lengthStats`: parallel arrays zipped into Mode, Mean and Median
/// scatter series over the allele count of each locus.
///
/// `loci` is required. A missing statistic array yields placeholders; arrays
/// of different lengths are malformed.
pub fn length_stats(payload: &Value) -> AppResult<Vec<SeriesRecord>> {
    let stats = container(payload, "message")?;
    let loci: Vec<Scalar> = array_entries(stats, "loci")
        .ok_or_else(|| AppError::malformed("missing `loci` in length statistics"))?
        .into_iter()
        .map(|v| {
            let locus = v
                .and_then(value_text)
                .map(|uri| extract_tail(&uri).to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string());
            Scalar::Text(locus)
        })
        .collect();

    let column = |key: &str| -> AppResult<Vec<Scalar>> {
        let Some(entries) = array_entries(stats, key) else {
            return Ok(vec![Scalar::from(PLACEHOLDER); loci.len()]);
        };
        if entries.len() != loci.len() {
            return Err(AppError::malformed(format!(
                "`{key}` has {} entries for {} loci",
                entries.len(),
                loci.len()
            )));
        }
        Ok(entries
            .into_iter()
            .map(|v| v.and_then(value_scalar).unwrap_or_else(|| Scalar::from(PLACEHOLDER)))
            .collect())
    };

    let counts = column("nr_alleles")?;
    [("Mode", "mode"), ("Mean", "mean"), ("Median", "median")]
        .into_iter()
        .map(|(name, key)| {
            SeriesRecord::new(name, SeriesKind::Scatter, counts.clone(), column(key)?)?
                .with_meta(loci.clone())
        })
        .collect()
}

/// `GET .../annotations`
pub fn annotations(payload: &Value) -> AppResult<Vec<AnnotationRow>> {
    let mut rows: Vec<AnnotationRow> = container_array(payload, "message")?
        .iter()
        .map(|record| AnnotationRow {
            locus: tail(record, "locus"),
            name: text(record, "name"),
            uniprot_label: text(record, "UniprotLabel"),
            uniprot_name: text(record, "UniprotName"),
            uniprot_uri: text(record, "UniprotURI"),
            user_annotation: text(record, "UserAnnotation"),
            custom_annotation: text(record, "CustomAnnotation"),
        })
        .collect();

    rows.sort_by(|a, b| natural_cmp(&a.locus, &b.locus));
    Ok(rows)
}

/// `GET species/{sp}/schemas/{sc}/description`: the markdown text.
pub fn description(payload: &Value) -> AppResult<String> {
    container(payload, "message")?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AppError::malformed("description `message` is not text"))
}

/// `GET .../contributions`: rows by allele count (largest first) and a bar
/// series of alleles per user.
pub fn contributions(payload: &Value) -> AppResult<Contributions> {
    let mut rows: Vec<ContributionRow> = container_array(payload, "message")?
        .iter()
        .map(|record| ContributionRow {
            user: tail(record, "user"),
            alleles: scalar(record, "nr_alleles"),
            loci: scalar(record, "nr_loci"),
        })
        .collect();

    rows.sort_by(|a, b| {
        a.alleles
            .cmp_desc(&b.alleles)
            .then_with(|| natural_cmp(&a.user, &b.user))
    });

    let x = rows.iter().map(|r| Scalar::Text(r.user.clone())).collect();
    let y = rows.iter().map(|r| r.alleles.clone()).collect();
    let series = SeriesRecord::new("Alleles added", SeriesKind::Bar, x, y)?;

    Ok(Contributions { rows, series })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_modes_histogram() {
        let payload = json!({
            "message": [
                { "locus": { "value": "http://ns/loci/10" }, "alleles_mode": { "value": "1200" } },
                { "locus": { "value": "http://ns/loci/2" }, "alleles_mode": { "value": "900" } }
            ]
        });

        let series = allele_modes(&payload).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].kind(), SeriesKind::Histogram);
        assert_eq!(series[0].x(), &[Scalar::Int(900), Scalar::Int(1200)]);
        assert_eq!(series[0].y(), &[Scalar::Int(1), Scalar::Int(1)]);
        assert_eq!(series[0].meta().unwrap(), &[Scalar::from("2"), Scalar::from("10")]);
    }

    #[test]
    fn test_length_stats_zipped_index_wise() {
        let payload = json!({
            "message": {
                "loci": ["http://ns/loci/1", "http://ns/loci/2"],
                "mode": [300, 450],
                "mean": [310.5, 440.0],
                "median": [305, 449],
                "nr_alleles": [12, 40]
            }
        });

        let series = length_stats(&payload).unwrap();
        let names: Vec<_> = series.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Mode", "Mean", "Median"]);

        let mean = &series[1];
        assert_eq!(mean.x(), &[Scalar::Int(12), Scalar::Int(40)]);
        assert_eq!(mean.y(), &[Scalar::Float(310.5), Scalar::Float(440.0)]);
        assert_eq!(mean.meta().unwrap(), &[Scalar::from("1"), Scalar::from("2")]);
    }

    #[test]
    fn test_length_stats_unequal_arrays_malformed() {
        let payload = json!({
            "message": {
                "loci": ["a", "b"],
                "mode": [1],
                "mean": [1, 2],
                "median": [1, 2],
                "nr_alleles": [1, 2],
            }
        });
        assert!(matches!(
            length_stats(&payload),
            Err(AppError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_length_stats_missing_statistic_uses_placeholder() {
        let payload = json!({
            "message": { "loci": ["a"], "mode": [1], "nr_alleles": [7] }
        });
        let series = length_stats(&payload).unwrap();
        assert_eq!(series[2].y(), &[Scalar::from(PLACEHOLDER)]);
    }

    #[test]
    fn test_annotations_placeholders() {
        let payload = json!({
            "message": [{
                "locus": { "value": "http://ns/loci/5" },
                "name": { "value": "dnaA" },
                "UniprotURI": { "value": "http://purl.uniprot.org/uniprot/P03004" }
            }]
        });

        let rows = annotations(&payload).unwrap();
        assert_eq!(rows[0].locus, "5");
        assert_eq!(rows[0].uniprot_uri, "http://purl.uniprot.org/uniprot/P03004");
        assert_eq!(rows[0].user_annotation, PLACEHOLDER);
    }

    #[test]
    fn test_description_requires_text() {
        assert_eq!(
            description(&json!({ "message": "# Schema" })).unwrap(),
            "# Schema"
        );
        assert!(description(&json!({ "message": 3 })).is_err());
    }

    #[test]
    fn test_contributions_sorted_with_series() {
        let payload = json!({
            "message": [
                {
                    "user": { "value": "http://ns/user/3" },
                    "nr_alleles": { "value": "10" },
                    "nr_loci": { "value": "2" },
                },
                {
                    "user": { "value": "http://ns/user/1" },
                    "nr_alleles": { "value": "250" },
                    "nr_loci": { "value": "40" },
                }
            ]
        });

        let contributions = contributions(&payload).unwrap();
        assert_eq!(contributions.rows[0].user, "1");
        assert_eq!(contributions.series.x(), &[Scalar::from("1"), Scalar::from("3")]);
        assert_eq!(contributions.series.y(), &[Scalar::Int(250), Scalar::Int(10)]);
    }
}
