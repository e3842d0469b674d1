//! Serializable run configuration.
//!
//! A run is described by one TOML file: which model, how to sample it, how
//! strictly to solve it, and optionally how to classify and simulate it.
//! Nothing is read from process-wide state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use genepair_core::classify::DEFAULT_TOLERANCE;
use genepair_core::{
    Category, Distribution, ModelVariant, Normalization, ParameterVector, SamplingPlan,
    SolverConfig,
};

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What the batch loop does when a single sample fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the failure, leave the row out, keep going.
    #[default]
    Skip,
    /// Stop at the first failing row.
    Abort,
}

/// Complete configuration of one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Dataset name. Defaults to the sampling plan's conventional name.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub model: ModelVariant,

    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Root of the dataset store.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub on_error: ErrorPolicy,

    #[serde(default = "default_parallel")]
    pub parallel: bool,

    pub sampling: SamplingPlan,

    #[serde(default)]
    pub solver: SolverSection,

    #[serde(default)]
    pub classify: Option<ClassifySection>,

    #[serde(default)]
    pub simulate: Option<SimulateSection>,
}

fn default_seed() -> u64 {
    42
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_parallel() -> bool {
    true
}

/// Steady-state solver settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SolverSection {
    #[serde(default = "default_solver_tolerance")]
    pub tolerance: f64,
}

fn default_solver_tolerance() -> f64 {
    SolverConfig::default().tolerance
}

impl Default for SolverSection {
    fn default() -> Self {
        Self {
            tolerance: default_solver_tolerance(),
        }
    }
}

impl SolverSection {
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig::with_tolerance(self.tolerance)
    }
}

/// Regime classification settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifySection {
    /// Applied in order; earlier categories claim records first.
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,

    #[serde(default = "default_classify_tolerance")]
    pub tolerance: f64,

    #[serde(default)]
    pub normalize: Option<Normalization>,

    /// Overwrite existing analysed files.
    #[serde(default)]
    pub force: bool,
}

fn default_categories() -> Vec<Category> {
    Category::ALL.to_vec()
}

fn default_classify_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl Default for ClassifySection {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            tolerance: default_classify_tolerance(),
            normalize: None,
            force: false,
        }
    }
}

impl ClassifySection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.categories.is_empty() {
            return Err(ConfigError::Invalid("classify.categories is empty".into()));
        }
        for (i, c) in self.categories.iter().enumerate() {
            if self.categories[..i].contains(c) {
                return Err(ConfigError::Invalid(format!(
                    "classify.categories lists '{c}' twice"
                )));
            }
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "classify.tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Time-series simulation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulateSection {
    #[serde(default = "default_t_max")]
    pub t_max: usize,

    /// Explicit parameters. When absent one vector is drawn at random.
    #[serde(default)]
    pub params: Option<ParameterVector>,

    /// Interaction scaling for the random draw.
    #[serde(default)]
    pub distribution: Distribution,
}

fn default_t_max() -> usize {
    1000
}

impl Default for SimulateSection {
    fn default() -> Self {
        Self {
            t_max: default_t_max(),
            params: None,
            distribution: Distribution::default(),
        }
    }
}

impl RunConfig {
    /// Configuration with defaults for everything but the sampling plan.
    pub fn new(sampling: SamplingPlan) -> Self {
        Self {
            name: None,
            model: ModelVariant::default(),
            seed: default_seed(),
            output_dir: default_output_dir(),
            on_error: ErrorPolicy::default(),
            parallel: default_parallel(),
            sampling,
            solver: SolverSection::default(),
            classify: None,
            simulate: None,
        }
    }

    /// Load and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Dataset name: explicit, or derived from the sampling plan (`loguni`, `sweep-pq`, …).
    pub fn dataset_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.sampling.default_name())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.dataset_name();
        if name.trim().is_empty() {
            return Err(ConfigError::Invalid("name is empty".into()));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ConfigError::Invalid(format!(
                "name '{name}' must not contain path separators"
            )));
        }
        if self.sampling.count() == 0 {
            return Err(ConfigError::Invalid("sampling.count must be positive".into()));
        }
        if !self.solver.tolerance.is_finite() || self.solver.tolerance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "solver.tolerance must be positive, got {}",
                self.solver.tolerance
            )));
        }
        if let Some(classify) = &self.classify {
            classify.validate()?;
        }
        if let Some(params) = self.simulate.as_ref().and_then(|s| s.params.as_ref()) {
            params
                .validate(self.model)
                .map_err(|e| ConfigError::Invalid(format!("simulate.params: {e}")))?;
        }
        Ok(())
    }
}
