//! Flat records produced by the normalizers

use nsdash_dispatch::Patch;
use serde::{Deserialize, Serialize};

use crate::series::{Scalar, SeriesRecord};

/// One species in the roster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesRow {
    pub id: String,
    pub name: String,
    /// Number of schemas published for the species
    pub schemas: Scalar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaRow {
    pub id: String,
    pub name: String,
    pub loci: Scalar,
    pub alleles: Scalar,
    pub creator: String,
    /// chewBBACA version the schema was created with
    pub version: String,
    pub created: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationRow {
    pub locus: String,
    pub name: String,
    pub uniprot_label: String,
    pub uniprot_name: String,
    pub uniprot_uri: String,
    pub user_annotation: String,
    pub custom_annotation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniprotRow {
    pub label: String,
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlleleRow {
    pub id: String,
    pub sequence: String,
    pub length: usize,
}

/// Alleles of one locus plus the histogram of their lengths
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocusAlleles {
    pub rows: Vec<AlleleRow>,
    pub lengths: SeriesRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionRow {
    pub user: String,
    pub alleles: Scalar,
    pub loci: Scalar,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Contributions {
    pub rows: Vec<ContributionRow>,
    pub series: SeriesRecord,
}

/// A sequence search match with its navigable link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceHit {
    pub species: String,
    pub schema: String,
    pub locus: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SequenceSearch {
    pub hits: Vec<SequenceHit>,
    /// Number of alleles and loci scanned, as reported by the server
    pub total: Option<String>,
}

/// The signed-in user as returned by `user/current_user`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Patch)]
#[patch(derive(Serialize, PartialEq))]
pub struct UserProfile {
    pub id: Scalar,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub validated: Option<bool>,
    #[serde(default)]
    pub date_registered: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
}
