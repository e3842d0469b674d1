//! Classification of a stored dataset into per-category files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use genepair_core::{classify, normalize, Category, ModelVariant, SampleRecord};

use crate::config::ClassifySection;
use crate::runner::RunError;
use crate::store::{Dataset, DatasetStore, WriteOutcome};

pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Summary written to `analysed/<name>/manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationManifest {
    pub schema_version: u32,
    pub dataset: String,
    pub created_at: DateTime<Utc>,
    pub model: ModelVariant,
    pub tolerance: f64,
    pub normalization: Option<String>,
    pub total: usize,
    pub categories: Vec<CategoryEntry>,
    pub unclassified: usize,
    pub excluded: Vec<ExcludedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub category: Category,
    pub count: usize,
    pub file: String,
    /// False when an existing file was kept instead of rewritten.
    pub written: bool,
}

/// A row left out of its category file because normalization failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedRow {
    pub category: Category,
    pub params: genepair_core::ParameterVector,
    pub reason: String,
}

/// Result of classifying one dataset.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The classification just computed. Matches `manifest.json` only when
    /// `manifest_written` is set.
    pub manifest: ClassificationManifest,
    /// False when an existing `manifest.json` was kept.
    pub manifest_written: bool,
    pub unclassified: Vec<SampleRecord>,
}

/// Read `raw/<name>.csv`, classify it, and write one file per category.
pub fn classify_dataset(
    store: &DatasetStore,
    name: &str,
    section: &ClassifySection,
) -> Result<Analysis, RunError> {
    let dataset = store.read_raw(name)?;
    tracing::info!(
        dataset = %name,
        rows = dataset.len(),
        tolerance = section.tolerance,
        "classifying"
    );

    let classification = classify(&dataset.records, &section.categories, section.tolerance)?;
    let (classification, excluded) = match section.normalize {
        Some(norm) => normalize(classification, norm),
        None => (classification, Vec::new()),
    };
    for row in &excluded {
        tracing::warn!(
            category = %row.category,
            params = %row.record.params,
            error = %row.error,
            "row excluded from normalized output"
        );
    }

    let mut categories = Vec::with_capacity(classification.subsets.len());
    for (category, rows) in &classification.subsets {
        let subset = Dataset::new(dataset.variant, rows.clone());
        let outcome = store.write_category(name, *category, &subset, section.force)?;
        let written = matches!(outcome, WriteOutcome::Written(_));
        if written {
            tracing::debug!(category = %category, rows = rows.len(), path = %outcome.path().display(), "wrote category");
        } else {
            tracing::info!(
                category = %category,
                path = %outcome.path().display(),
                "kept existing file, pass force to overwrite"
            );
        }
        categories.push(CategoryEntry {
            category: *category,
            count: rows.len(),
            file: format!("{category}.csv"),
            written,
        });
    }

    let manifest = ClassificationManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        dataset: name.to_string(),
        created_at: Utc::now(),
        model: dataset.variant,
        tolerance: section.tolerance,
        normalization: section.normalize.map(|n| n.to_string()),
        total: dataset.len(),
        categories,
        unclassified: classification.unclassified.len(),
        excluded: excluded
            .iter()
            .map(|e| ExcludedRow {
                category: e.category,
                params: e.record.params,
                reason: e.error.to_string(),
            })
            .collect(),
    };
    let manifest_written = match store.write_manifest(name, &manifest, section.force)? {
        WriteOutcome::Written(_) => true,
        WriteOutcome::Kept(path) => {
            tracing::info!(
                dataset = %name,
                path = %path.display(),
                "kept existing manifest, pass force to overwrite"
            );
            false
        }
    };

    Ok(Analysis {
        manifest,
        manifest_written,
        unclassified: classification.unclassified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use genepair_core::{ParameterVector, SteadyState};

    fn record(p: f64, p00: f64, p11: f64) -> SampleRecord {
        let rest = (1.0 - p00 - p11) / 2.0;
        SampleRecord::new(
            ParameterVector::symmetric(p, 0.5, 0.5, 0.5, 1.0),
            SteadyState::from_array([p00, rest, rest, p11]),
        )
    }

    #[test]
    fn writes_one_file_per_category_and_a_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        let dataset = Dataset::new(
            ModelVariant::Symmetric,
            vec![record(0.5, 0.02, 0.95), record(0.5, 0.25, 0.25), record(0.5, 0.5, 0.5)],
        );
        store.write_raw("toy", &dataset).unwrap();

        let analysis = classify_dataset(&store, "toy", &ClassifySection::default()).unwrap();
        let m = &analysis.manifest;
        assert_eq!(m.total, 3);
        assert_eq!(m.categories.len(), Category::ALL.len());
        assert_eq!(m.unclassified, 0);
        let p2ex = &m.categories[0];
        assert_eq!((p2ex.category, p2ex.count), (Category::P2ex, 1));
        for category in Category::ALL {
            assert!(store.category_path("toy", category).exists());
        }
        let back: ClassificationManifest = store.read_manifest("toy").unwrap();
        assert_eq!(back.categories, m.categories);
    }

    #[test]
    fn zero_divisor_rows_are_excluded_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        let dataset = Dataset::new(
            ModelVariant::Symmetric,
            vec![record(0.0, 0.25, 0.25), record(0.25, 0.25, 0.25)],
        );
        store.write_raw("norm", &dataset).unwrap();
        let section = ClassifySection {
            normalize: Some("p".parse().unwrap()),
            ..ClassifySection::default()
        };
        let analysis = classify_dataset(&store, "norm", &section).unwrap();
        assert_eq!(analysis.manifest.excluded.len(), 1);
        assert_eq!(analysis.manifest.excluded[0].params.p, 0.0);
        let kept: usize = analysis.manifest.categories.iter().map(|c| c.count).sum();
        assert_eq!(kept, 1);
    }

    #[test]
    fn kept_manifest_is_reported_and_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        let dataset = Dataset::new(ModelVariant::Symmetric, vec![record(0.5, 0.02, 0.95)]);
        store.write_raw("toy", &dataset).unwrap();

        let first = classify_dataset(&store, "toy", &ClassifySection::default()).unwrap();
        assert!(first.manifest_written);

        let loose = ClassifySection {
            tolerance: 0.3,
            ..ClassifySection::default()
        };
        let second = classify_dataset(&store, "toy", &loose).unwrap();
        assert!(!second.manifest_written);
        let on_disk: ClassificationManifest = store.read_manifest("toy").unwrap();
        assert_eq!(on_disk.created_at, first.manifest.created_at);
        assert_eq!(on_disk.tolerance, ClassifySection::default().tolerance);

        let forced = ClassifySection { force: true, ..loose };
        let third = classify_dataset(&store, "toy", &forced).unwrap();
        assert!(third.manifest_written);
        let on_disk: ClassificationManifest = store.read_manifest("toy").unwrap();
        assert_eq!(on_disk.tolerance, 0.3);
    }
}
