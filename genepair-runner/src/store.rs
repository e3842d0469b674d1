//! File-based dataset store.
//!
//! Layout under the store root:
//! - `raw/<name>.csv`: sampler + solver output
//! - `raw/<name>-sim.csv`: simulator output (`Time,State`)
//! - `analysed/<name>/<category>.csv`: one file per category
//! - `analysed/<name>/manifest.json`: classification summary
//!
//! Dataset files carry the header `p,q,r,s,l[,d],p00,p01,p10,p11`; the `d`
//! column marks a competitive-model dataset.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use genepair_core::domain::header;
use genepair_core::{
    Category, JointState, ModelVariant, ParameterVector, SampleRecord, SteadyState, TimeSeries,
};

/// Errors from the dataset store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error on '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed data in '{path}': {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Ordered rows of one model variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub variant: ModelVariant,
    pub records: Vec<SampleRecord>,
}

impl Dataset {
    pub fn new(variant: ModelVariant, records: Vec<SampleRecord>) -> Self {
        Self { variant, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Whether a write happened or an existing file was kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    Kept(PathBuf),
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            WriteOutcome::Written(p) | WriteOutcome::Kept(p) => p,
        }
    }
}

/// Row shape accepted on read; extra columns are ignored.
#[derive(Debug, Deserialize)]
struct CsvRow {
    p: f64,
    q: f64,
    r: f64,
    s: f64,
    l: f64,
    #[serde(default)]
    d: Option<f64>,
    p00: f64,
    p01: f64,
    p10: f64,
    p11: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvStep {
    #[serde(rename = "Time")]
    time: usize,
    #[serde(rename = "State")]
    state: usize,
}

// ─── Stream codecs ──────────────────────────────────────────────────

/// Write a dataset as CSV.
pub fn write_records<W: Write>(
    writer: W,
    variant: ModelVariant,
    records: &[SampleRecord],
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header(variant))?;
    for record in records {
        wtr.write_record(record.values().iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a dataset from CSV, inferring the variant from the `d` column.
///
/// On failure returns a human-readable reason; callers attach the path.
pub fn read_records<R: Read>(reader: R) -> Result<Dataset, String> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().map_err(|e| e.to_string())?.clone();
    let variant = if headers.iter().any(|h| h == "d") {
        ModelVariant::Competitive
    } else {
        ModelVariant::Symmetric
    };

    let mut records = Vec::new();
    for (line, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(|e| e.to_string())?;
        let params = match (variant, row.d) {
            (ModelVariant::Competitive, Some(d)) => {
                ParameterVector::competitive(row.p, row.q, row.r, row.s, row.l, d)
            }
            (ModelVariant::Symmetric, _) => {
                ParameterVector::symmetric(row.p, row.q, row.r, row.s, row.l)
            }
            (ModelVariant::Competitive, None) => {
                return Err(format!("row {} has an empty 'd' column", line + 1));
            }
        };
        let steady_state = SteadyState::from_array([row.p00, row.p01, row.p10, row.p11]);
        records.push(SampleRecord::new(params, steady_state));
    }
    Ok(Dataset::new(variant, records))
}

/// Write a time series as `Time,State` rows.
pub fn write_time_series<W: Write>(writer: W, series: &TimeSeries) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (time, state) in series.rows() {
        wtr.serialize(CsvStep {
            time,
            state: state.index(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a `Time,State` series, checking time runs 0, 1, 2, … without gaps.
pub fn read_time_series<R: Read>(reader: R) -> Result<TimeSeries, String> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut states = Vec::new();
    for row in rdr.deserialize::<CsvStep>() {
        let step = row.map_err(|e| e.to_string())?;
        if step.time != states.len() {
            return Err(format!(
                "expected time {} but found {}",
                states.len(),
                step.time
            ));
        }
        let state = JointState::from_index(step.state)
            .ok_or_else(|| format!("state {} at time {} is out of range", step.state, step.time))?;
        states.push(state);
    }
    Ok(TimeSeries::from_states(states))
}

// ─── Store ──────────────────────────────────────────────────────────

/// Dataset store rooted at one directory.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    root: PathBuf,
}

impl DatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_path(&self, name: &str) -> PathBuf {
        self.root.join("raw").join(format!("{name}.csv"))
    }

    pub fn simulation_path(&self, name: &str) -> PathBuf {
        self.root.join("raw").join(format!("{name}-sim.csv"))
    }

    pub fn analysed_dir(&self, name: &str) -> PathBuf {
        self.root.join("analysed").join(name)
    }

    pub fn category_path(&self, name: &str, category: Category) -> PathBuf {
        self.analysed_dir(name).join(format!("{category}.csv"))
    }

    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.analysed_dir(name).join("manifest.json")
    }

    /// Write (always overwriting) the raw dataset for `name`.
    pub fn write_raw(&self, name: &str, dataset: &Dataset) -> Result<PathBuf, StoreError> {
        let path = self.raw_path(name);
        write_csv_file(&path, |file| {
            write_records(file, dataset.variant, &dataset.records)
        })?;
        Ok(path)
    }

    pub fn read_raw(&self, name: &str) -> Result<Dataset, StoreError> {
        read_dataset_file(&self.raw_path(name))
    }

    /// Write one category subset. Existing files are kept unless `force`.
    pub fn write_category(
        &self,
        name: &str,
        category: Category,
        dataset: &Dataset,
        force: bool,
    ) -> Result<WriteOutcome, StoreError> {
        let path = self.category_path(name, category);
        if path.exists() && !force {
            return Ok(WriteOutcome::Kept(path));
        }
        write_csv_file(&path, |file| {
            write_records(file, dataset.variant, &dataset.records)
        })?;
        Ok(WriteOutcome::Written(path))
    }

    pub fn read_category(&self, name: &str, category: Category) -> Result<Dataset, StoreError> {
        read_dataset_file(&self.category_path(name, category))
    }

    /// Write a JSON manifest next to the category files. Existing manifests are kept unless `force`.
    pub fn write_manifest<T: Serialize>(
        &self,
        name: &str,
        manifest: &T,
        force: bool,
    ) -> Result<WriteOutcome, StoreError> {
        let path = self.manifest_path(name);
        if path.exists() && !force {
            return Ok(WriteOutcome::Kept(path));
        }
        let json = serde_json::to_string_pretty(manifest).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        create_parent(&path)?;
        fs::write(&path, json).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(WriteOutcome::Written(path))
    }

    pub fn read_manifest<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Result<T, StoreError> {
        let path = self.manifest_path(name);
        let text = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| StoreError::Json { path, source })
    }

    pub fn write_simulation(&self, name: &str, series: &TimeSeries) -> Result<PathBuf, StoreError> {
        let path = self.simulation_path(name);
        write_csv_file(&path, |file| write_time_series(file, series))?;
        Ok(path)
    }

    pub fn read_simulation(&self, name: &str) -> Result<TimeSeries, StoreError> {
        let path = self.simulation_path(name);
        let file = open(&path)?;
        read_time_series(file).map_err(|reason| StoreError::Malformed { path, reason })
    }
}

fn create_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn open(path: &Path) -> Result<fs::File, StoreError> {
    fs::File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_csv_file<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(fs::File) -> Result<(), csv::Error>,
{
    create_parent(path)?;
    let file = fs::File::create(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write(file).map_err(|source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

fn read_dataset_file(path: &Path) -> Result<Dataset, StoreError> {
    let file = open(path)?;
    read_records(file).map_err(|reason| StoreError::Malformed {
        path: path.to_path_buf(),
        reason,
    })
}
