//! Per-locus allele sequences and UniProt annotations

use serde_json::Value;

use super::{container_array, natural_cmp, tail, text};
use crate::error::AppResult;
use crate::records::{AlleleRow, LocusAlleles, UniprotRow};
use crate::series::{Scalar, SeriesKind, SeriesRecord};

/// `GET loci/{id}/fasta`: allele rows in natural id order plus a histogram
/// of sequence lengths.
pub fn fasta(payload: &Value) -> AppResult<LocusAlleles> {
    let mut rows: Vec<AlleleRow> = container_array(payload, "Fasta")?
        .iter()
        .map(|record| {
            let sequence = super::field(record, "nucSeq")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            AlleleRow {
                id: tail(record, "allele_id"),
                length: sequence.len(),
                sequence,
            }
        })
        .collect();
    rows.sort_by(|a, b| natural_cmp(&a.id, &b.id));

    let x = rows.iter().map(|r| Scalar::from(r.length)).collect();
    let y = vec![Scalar::Int(1); rows.len()];
    let meta = rows.iter().map(|r| Scalar::Text(r.id.clone())).collect();
    let lengths =
        SeriesRecord::new("Allele length", SeriesKind::Histogram, x, y)?.with_meta(meta)?;

    Ok(LocusAlleles { rows, lengths })
}

/// `GET loci/{id}/uniprot`
pub fn uniprot(payload: &Value) -> AppResult<Vec<UniprotRow>> {
    Ok(container_array(payload, "UniprotInfo")?
        .iter()
        .map(|record| UniprotRow {
            label: text(record, "UniprotLabel"),
            name: text(record, "UniprotName"),
            uri: text(record, "UniprotURI"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::normalize::PLACEHOLDER;
    use serde_json::json;

    #[test]
    fn test_fasta_rows_and_lengths() {
        let payload = json!({
            "Fasta": [
                { "allele_id": { "value": "10" }, "nucSeq": { "value": "ATGAAATAA" } },
                { "allele_id": { "value": "2" }, "nucSeq": { "value": "ATGTAA" } },
                { "allele_id": { "value": "3" } }
            ]
        });

        let alleles = fasta(&payload).unwrap();
        let ids: Vec<_> = alleles.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "10"]);
        assert_eq!(alleles.rows[1].length, 0);
        assert_eq!(
            alleles.lengths.x(),
            &[Scalar::Int(6), Scalar::Int(0), Scalar::Int(9)]
        );
        assert_eq!(alleles.lengths.meta().unwrap()[2], Scalar::from("10"));
    }

    #[test]
    fn test_fasta_requires_container() {
        assert!(matches!(
            fasta(&json!({ "message": [] })),
            Err(AppError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_uniprot_rows() {
        let payload = json!({
            "UniprotInfo": [{
                "UniprotLabel": { "value": "Chromosomal replication initiator protein DnaA" },
                "UniprotURI": { "value": "http://purl.uniprot.org/uniprot/P03004" }
            }]
        });

        let rows = uniprot(&payload).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, PLACEHOLDER);
        assert_eq!(rows[0].uri, "http://purl.uniprot.org/uniprot/P03004");
    }
}
