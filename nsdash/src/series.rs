//! Chart series with index-aligned parallel arrays

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::normalize::natural_cmp;

/// One cell of a record or series: integer, float or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Text(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Scalar::Text(_))
    }

    /// Parse text the way the API encodes numbers (`"12"`, `"3.5"`).
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return Scalar::Int(v);
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Scalar::Float(v),
            _ => Scalar::Text(raw.to_string()),
        }
    }

    /// Descending order: larger numbers first, text after every number.
    pub fn cmp_desc(&self, other: &Self) -> Ordering {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => b.total_cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => natural_cmp(&self.to_string(), &other.to_string()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<usize> for Scalar {
    fn from(v: usize) -> Self {
        i64::try_from(v).map_or(Scalar::Float(v as f64), Scalar::Int)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    #[default]
    Scatter,
    Histogram,
    Box,
    Bar,
}

/// Chart series; `x`, `y` and `meta` (when present) always have equal length
/// and index `i` in each refers to the same entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesRecord {
    name: String,
    kind: SeriesKind,
    x: Vec<Scalar>,
    y: Vec<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<Vec<Scalar>>,
}

impl SeriesRecord {
    pub fn new(
        name: impl Into<String>,
        kind: SeriesKind,
        x: Vec<Scalar>,
        y: Vec<Scalar>,
    ) -> AppResult<Self> {
        let name = name.into();
        if x.len() != y.len() {
            return Err(AppError::malformed(format!(
                "series {name:?}: x has {} points, y has {}",
                x.len(),
                y.len()
            )));
        }
        Ok(Self {
            name,
            kind,
            x,
            y,
            meta: None,
        })
    }

    /// Attach per-point metadata (typically the originating locus ids).
    pub fn with_meta(mut self, meta: Vec<Scalar>) -> AppResult<Self> {
        if meta.len() != self.x.len() {
            return Err(AppError::malformed(format!(
                "series {:?}: {} points but {} meta entries",
                self.name,
                self.x.len(),
                meta.len()
            )));
        }
        self.meta = Some(meta);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    pub fn x(&self) -> &[Scalar] {
        &self.x
    }

    pub fn y(&self) -> &[Scalar] {
        &self.y
    }

    pub fn meta(&self) -> Option<&[Scalar]> {
        self.meta.as_deref()
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
