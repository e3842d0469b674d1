//! Regime classifier.
//!
//! Records are partitioned by their `(p00, p11)` steady-state pair. Categories
//! are applied in order and each one consumes the records it matches, so the
//! subsets are disjoint even though the predicates overlap (a point can be
//! both `comp` and `indep`; whichever comes first wins).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{ParamName, SampleRecord};
use crate::error::ModelError;

/// Default boundary tolerance ε.
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Named steady-state regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Category {
    /// Both genes almost always on: `p11 ≥ 1 − 2ε`.
    #[serde(rename = "p2ex")]
    P2ex,
    /// Both genes almost always off: `p00 ≥ 1 − 2ε`.
    #[serde(rename = "p0ex")]
    P0ex,
    /// Competitive, below the independent curve: `p11 < (1 − √p00 − ε)²`.
    #[serde(rename = "comp")]
    Comp,
    /// Coordinated, near the line `p11 = 1 − p00`: `p11 ≥ 1 − p00 − ε`.
    #[serde(rename = "coor")]
    Coor,
    /// Semi-coordinated, above the independent curve: `p11 > (1 − √p00 + ε)²`.
    #[serde(rename = "semi")]
    Semi,
    /// Independent, near the curve: `p11 ≤ (1 − √p00 + ε)²`.
    #[serde(rename = "indep")]
    Indep,
}

impl Category {
    /// Every category in priority order. Exhaustive: each record lands somewhere.
    pub const ALL: [Category; 6] = [
        Category::P2ex,
        Category::P0ex,
        Category::Comp,
        Category::Coor,
        Category::Semi,
        Category::Indep,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::P2ex => "p2ex",
            Category::P0ex => "p0ex",
            Category::Comp => "comp",
            Category::Coor => "coor",
            Category::Semi => "semi",
            Category::Indep => "indep",
        }
    }

    /// The category's boundary predicate, evaluated in isolation.
    pub fn contains(self, p00: f64, p11: f64, eps: f64) -> bool {
        let root = p00.max(0.0).sqrt();
        match self {
            Category::P2ex => p11 >= 1.0 - 2.0 * eps,
            Category::P0ex => p00 >= 1.0 - 2.0 * eps,
            Category::Comp => p11 < (1.0 - root - eps).powi(2),
            Category::Coor => p11 >= 1.0 - p00 - eps,
            Category::Semi => p11 > (1.0 - root + eps).powi(2),
            Category::Indep => p11 <= (1.0 - root + eps).powi(2),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.name() == s.trim())
            .ok_or_else(|| {
                ModelError::InvalidParameter(format!(
                    "unknown category '{s}' (expected one of p2ex, p0ex, comp, coor, semi, indep)"
                ))
            })
    }
}

impl TryFrom<String> for Category {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// `p11` on the fully coordinated line.
pub fn coordinated_boundary(p00: f64) -> f64 {
    1.0 - p00
}

/// `p11` of two independent genes with off-probability `√p00` each.
pub fn independent_boundary(p00: f64) -> f64 {
    (1.0 - p00.max(0.0).sqrt()).powi(2)
}

/// Disjoint subsets, in the order the categories were applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub tolerance: f64,
    pub subsets: Vec<(Category, Vec<SampleRecord>)>,
    /// Records no listed category claimed.
    pub unclassified: Vec<SampleRecord>,
}

impl Classification {
    pub fn get(&self, category: Category) -> Option<&[SampleRecord]> {
        self.subsets
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, rows)| rows.as_slice())
    }

    pub fn counts(&self) -> Vec<(Category, usize)> {
        self.subsets.iter().map(|(c, rows)| (*c, rows.len())).collect()
    }

    pub fn classified_len(&self) -> usize {
        self.subsets.iter().map(|(_, rows)| rows.len()).sum()
    }
}

/// Partition `records` by `categories`, first match wins.
///
/// Row order inside each subset is the input order.
pub fn classify(
    records: &[SampleRecord],
    categories: &[Category],
    eps: f64,
) -> Result<Classification, ModelError> {
    if !eps.is_finite() || eps < 0.0 {
        return Err(ModelError::InvalidParameter(format!(
            "classification tolerance must be non-negative, got {eps}"
        )));
    }
    for (i, c) in categories.iter().enumerate() {
        if categories[..i].contains(c) {
            return Err(ModelError::InvalidParameter(format!(
                "category {c} listed twice"
            )));
        }
    }

    let mut pool: Vec<SampleRecord> = records.to_vec();
    let mut subsets = Vec::with_capacity(categories.len());
    for &category in categories {
        let (claimed, rest): (Vec<_>, Vec<_>) = pool
            .into_iter()
            .partition(|r| category.contains(r.p00(), r.p11(), eps));
        subsets.push((category, claimed));
        pool = rest;
    }

    Ok(Classification {
        tolerance: eps,
        subsets,
        unclassified: pool,
    })
}

/// Divisor used to rescale the base rates `p, q, r, s` of a classified row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Normalization {
    /// Largest of `p, q, r, s`.
    Max,
    /// One named base rate.
    Column(ParamName),
}

impl Normalization {
    pub fn column(name: ParamName) -> Result<Self, ModelError> {
        if name.is_interaction() {
            return Err(ModelError::InvalidParameter(format!(
                "cannot normalize by interaction parameter {name}"
            )));
        }
        Ok(Normalization::Column(name))
    }

    fn divisor(self, record: &SampleRecord) -> f64 {
        match self {
            Normalization::Max => record
                .params
                .base_rates()
                .into_iter()
                .fold(f64::NEG_INFINITY, f64::max),
            Normalization::Column(name) => record.params.get(name).unwrap_or(0.0),
        }
    }

    /// Rescale the base rates of one record.
    pub fn apply(self, record: &SampleRecord) -> Result<SampleRecord, ModelError> {
        let divisor = self.divisor(record);
        if divisor == 0.0 || !divisor.is_finite() {
            return Err(ModelError::ZeroDivisor {
                divisor: self.to_string(),
            });
        }
        let mut out = *record;
        out.params.p /= divisor;
        out.params.q /= divisor;
        out.params.r /= divisor;
        out.params.s /= divisor;
        Ok(out)
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalization::Max => f.write_str("max"),
            Normalization::Column(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for Normalization {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "max" => Ok(Normalization::Max),
            other => Normalization::column(other.parse()?),
        }
    }
}

impl TryFrom<String> for Normalization {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Normalization> for String {
    fn from(value: Normalization) -> Self {
        value.to_string()
    }
}

/// A classified row dropped because its normalization divisor was zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Excluded {
    pub category: Category,
    pub record: SampleRecord,
    pub error: ModelError,
}

/// Normalize every subset in place; rows that cannot be normalized are moved out.
pub fn normalize(
    mut classification: Classification,
    normalization: Normalization,
) -> (Classification, Vec<Excluded>) {
    let mut excluded = Vec::new();
    for (category, rows) in classification.subsets.iter_mut() {
        let mut kept = Vec::with_capacity(rows.len());
        for record in rows.drain(..) {
            match normalization.apply(&record) {
                Ok(scaled) => kept.push(scaled),
                Err(error) => excluded.push(Excluded {
                    category: *category,
                    record,
                    error,
                }),
            }
        }
        *rows = kept;
    }
    (classification, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ParameterVector, SteadyState};

    fn record(p00: f64, p11: f64) -> SampleRecord {
        let rest = (1.0 - p00 - p11) / 2.0;
        SampleRecord::new(
            ParameterVector::competitive(0.2, 0.4, 0.6, 0.8, 1.0, 1.0),
            SteadyState::from_array([p00, rest, rest, p11]),
        )
    }

    #[test]
    fn all_off_record_is_p0ex() {
        let c = classify(&[record(1.0, 0.0)], &Category::ALL, DEFAULT_TOLERANCE).unwrap();
        assert_eq!(c.get(Category::P0ex).unwrap().len(), 1);
        assert_eq!(c.classified_len(), 1);
    }

    #[test]
    fn all_on_record_is_p2ex() {
        let c = classify(&[record(0.0, 0.95)], &Category::ALL, DEFAULT_TOLERANCE).unwrap();
        assert_eq!(c.get(Category::P2ex).unwrap().len(), 1);
    }

    #[test]
    fn overlapping_predicates_resolve_by_order() {
        // p00 = 0.25 → independent curve at 0.25; p11 = 0.01 satisfies both comp and indep.
        let r = record(0.25, 0.01);
        assert!(Category::Comp.contains(r.p00(), r.p11(), 0.1));
        assert!(Category::Indep.contains(r.p00(), r.p11(), 0.1));

        let c = classify(&[r], &Category::ALL, 0.1).unwrap();
        assert_eq!(c.get(Category::Comp).unwrap().len(), 1);
        assert!(c.get(Category::Indep).unwrap().is_empty());

        let reversed = [Category::Indep, Category::Comp];
        let c = classify(&[r], &reversed, 0.1).unwrap();
        assert_eq!(c.get(Category::Indep).unwrap().len(), 1);
        assert!(c.get(Category::Comp).unwrap().is_empty());
    }

    #[test]
    fn full_category_list_is_exhaustive() {
        let mut rows = Vec::new();
        for i in 0..=20 {
            for j in 0..=(20 - i) {
                rows.push(record(i as f64 / 20.0, j as f64 / 20.0));
            }
        }
        let c = classify(&rows, &Category::ALL, 0.1).unwrap();
        assert!(c.unclassified.is_empty());
        assert_eq!(c.classified_len(), rows.len());
    }

    #[test]
    fn partial_category_list_leaves_unclassified_rows() {
        let rows = [record(1.0, 0.0), record(0.25, 0.25)];
        let c = classify(&rows, &[Category::P2ex], 0.1).unwrap();
        assert_eq!(c.classified_len(), 0);
        assert_eq!(c.unclassified.len(), 2);
    }

    #[test]
    fn duplicate_categories_are_rejected() {
        assert!(classify(&[], &[Category::Comp, Category::Comp], 0.1).is_err());
    }

    #[test]
    fn boundaries_meet_at_the_axes() {
        assert_eq!(coordinated_boundary(0.0), 1.0);
        assert_eq!(independent_boundary(0.0), 1.0);
        assert_eq!(independent_boundary(1.0), 0.0);
        assert!(independent_boundary(0.25) < coordinated_boundary(0.25));
    }

    #[test]
    fn normalize_by_max_scales_base_rates() {
        let r = record(0.25, 0.25);
        let scaled = Normalization::Max.apply(&r).unwrap();
        for (got, want) in scaled.params.base_rates().iter().zip([0.25, 0.5, 0.75, 1.0]) {
            assert!((got - want).abs() < 1e-12);
        }
        assert_eq!(scaled.params.lambda, r.params.lambda);
        assert_eq!(scaled.steady_state, r.steady_state);
    }

    #[test]
    fn zero_divisor_rows_are_excluded_not_inf() {
        let mut zero = record(0.25, 0.25);
        zero.params.p = 0.0;
        let c = classify(&[zero, record(0.25, 0.25)], &Category::ALL, 0.1).unwrap();
        let (c, excluded) = normalize(c, Normalization::column(ParamName::P).unwrap());
        assert_eq!(excluded.len(), 1);
        assert!(matches!(excluded[0].error, ModelError::ZeroDivisor { .. }));
        assert_eq!(c.classified_len(), 1);
        for (_, rows) in &c.subsets {
            for row in rows {
                assert!(row.params.base_rates().iter().all(|x| x.is_finite()));
            }
        }
    }

    #[test]
    fn normalization_parses_and_rejects_interactions() {
        assert_eq!("max".parse::<Normalization>().unwrap(), Normalization::Max);
        assert_eq!(
            "q".parse::<Normalization>().unwrap(),
            Normalization::Column(ParamName::Q)
        );
        assert!("l".parse::<Normalization>().is_err());
    }
}
