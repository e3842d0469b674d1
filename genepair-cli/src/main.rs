//! genepair CLI: generate, classify and simulate two-gene Markov chain datasets.
//!
//! Commands:
//! - `run`: execute a run from a TOML config file
//! - `sample`: random dataset (uniform or log-uniform interactions)
//! - `sweep`: 1-D or 2-D parameter sweep
//! - `sweep-all`: every 1-D sweep, optionally every 2-D pair
//! - `classify`: split an existing dataset into regime files
//! - `simulate`: one chain trajectory for a random parameter draw

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use genepair_core::{Category, Distribution, ModelVariant, Normalization, ParamName, SamplingPlan};
use genepair_runner::{
    batch_configs, classify_dataset, run, run_batch, run_simulation, sweep_plans, ClassifySection,
    DatasetStore, ErrorPolicy, RunConfig, RunSummary, SimulateSection, SweepShape,
};

#[derive(Parser)]
#[command(
    name = "genepair",
    about = "genepair: steady states and regimes of a two-gene Markov chain"
)]
struct Cli {
    /// Print run summaries as JSON instead of text.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Competitive,
    Symmetric,
}

impl From<ModelArg> for ModelVariant {
    fn from(value: ModelArg) -> Self {
        match value {
            ModelArg::Competitive => ModelVariant::Competitive,
            ModelArg::Symmetric => ModelVariant::Symmetric,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Skip,
    Abort,
}

/// Options shared by every dataset-generating command.
#[derive(Args)]
struct Common {
    /// Model form.
    #[arg(long, value_enum, default_value = "competitive")]
    model: ModelArg,

    /// Master seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Dataset store root.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// What to do when a row cannot be solved.
    #[arg(long, value_enum, default_value = "skip")]
    on_error: PolicyArg,

    /// Solve rows on a single thread.
    #[arg(long, default_value_t = false)]
    serial: bool,
}

impl Common {
    fn config(&self, sampling: SamplingPlan, name: Option<String>) -> RunConfig {
        let mut config = RunConfig::new(sampling);
        config.name = name;
        config.model = self.model.into();
        config.seed = self.seed;
        config.output_dir = self.output_dir.clone();
        config.on_error = match self.on_error {
            PolicyArg::Skip => ErrorPolicy::Skip,
            PolicyArg::Abort => ErrorPolicy::Abort,
        };
        config.parallel = !self.serial;
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a run from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
    /// Generate a random dataset.
    Sample {
        /// Interaction scaling: uni or loguni.
        #[arg(long, default_value = "loguni")]
        distribution: Distribution,

        /// Number of rows.
        #[arg(long)]
        count: usize,

        /// Dataset name. Defaults to the distribution name.
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        common: Common,
    },
    /// Sweep one or two parameters while holding the rest fixed.
    Sweep {
        /// One or two parameters, comma separated (e.g. p or p,l).
        #[arg(long, value_delimiter = ',', required = true)]
        params: Vec<ParamName>,

        /// Points per axis.
        #[arg(long)]
        count: usize,

        /// Value of the base rates not being swept.
        #[arg(long, default_value_t = 1.0)]
        fixed_value: f64,

        /// Value of the interaction parameters not being swept.
        #[arg(long, default_value_t = 1.0)]
        fixed_interaction: f64,

        /// Scaling applied when λ or δ is swept.
        #[arg(long, default_value = "loguni")]
        distribution: Distribution,

        /// Dataset name. Defaults to sweep-<params>.
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        common: Common,
    },
    /// Run every 1-D sweep of the model, and with --pairs every 2-D pair.
    SweepAll {
        /// Points per axis.
        #[arg(long)]
        count: usize,

        /// Also sweep every pair of parameters.
        #[arg(long, default_value_t = false)]
        pairs: bool,

        #[arg(long, default_value_t = 1.0)]
        fixed_value: f64,

        #[arg(long, default_value_t = 1.0)]
        fixed_interaction: f64,

        #[arg(long, default_value = "loguni")]
        distribution: Distribution,

        /// Keep the 0 point of 1-D sweeps. In the competitive model the
        /// p = 0 and q = 0 rows are degenerate and fail to solve.
        #[arg(long, default_value_t = false)]
        include_zero: bool,

        #[command(flatten)]
        common: Common,
    },
    /// Classify an existing raw dataset into per-regime files.
    Classify {
        /// Dataset name (reads raw/<name>.csv).
        #[arg(long)]
        name: String,

        /// Boundary tolerance ε.
        #[arg(long, default_value_t = genepair_core::classify::DEFAULT_TOLERANCE)]
        eps: f64,

        /// Rescale base rates by: max, p, q, r or s.
        #[arg(long)]
        normalize: Option<Normalization>,

        /// Overwrite existing analysed files.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Categories in priority order. Defaults to all six.
        #[arg(long, value_delimiter = ',')]
        categories: Vec<Category>,

        /// Dataset store root.
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },
    /// Simulate one trajectory for a random parameter draw.
    Simulate {
        /// Number of transitions.
        #[arg(long, default_value_t = 1000)]
        t_max: usize,

        #[arg(long, default_value = "loguni")]
        distribution: Distribution,

        /// Dataset name (writes raw/<name>-sim.csv). Defaults to the distribution name.
        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_enum, default_value = "competitive")]
        model: ModelArg,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    match cli.command {
        Commands::Run { config } => {
            let config = RunConfig::from_file(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            let summary = run(&config)?;
            print_summaries(&[summary], json)
        }
        Commands::Sample {
            distribution,
            count,
            name,
            common,
        } => {
            let config = common.config(SamplingPlan::Random { distribution, count }, name);
            print_summaries(&[run_validated(&config)?], json)
        }
        Commands::Sweep {
            params,
            count,
            fixed_value,
            fixed_interaction,
            distribution,
            name,
            common,
        } => {
            let sampling = match params.as_slice() {
                [parameter] => SamplingPlan::Sweep1d {
                    parameter: *parameter,
                    count,
                    fixed_value,
                    fixed_interaction,
                    distribution,
                    exclude_zero: false,
                },
                [first, second] => SamplingPlan::Sweep2d {
                    parameters: [*first, *second],
                    count,
                    fixed_value,
                    fixed_interaction,
                    distribution,
                },
                _ => bail!("--params takes one or two parameters, got {}", params.len()),
            };
            let config = common.config(sampling, name);
            print_summaries(&[run_validated(&config)?], json)
        }
        Commands::SweepAll {
            count,
            pairs,
            fixed_value,
            fixed_interaction,
            distribution,
            include_zero,
            common,
        } => {
            let variant: ModelVariant = common.model.into();
            let shape = SweepShape {
                count,
                fixed_value,
                fixed_interaction,
                distribution,
                exclude_zero: !include_zero,
            };
            // Placeholder plan; batch_configs replaces it per sweep.
            let base = common.config(SamplingPlan::Random { distribution, count }, None);
            let configs = batch_configs(&base, sweep_plans(variant, shape, pairs));
            for config in &configs {
                config.validate()?;
            }
            let summaries = run_batch(&configs)?;
            print_summaries(&summaries, json)
        }
        Commands::Classify {
            name,
            eps,
            normalize,
            force,
            categories,
            output_dir,
        } => {
            let section = ClassifySection {
                categories: if categories.is_empty() {
                    Category::ALL.to_vec()
                } else {
                    categories
                },
                tolerance: eps,
                normalize,
                force,
            };
            section.validate()?;
            let store = DatasetStore::new(output_dir);
            let analysis = classify_dataset(&store, &name, &section)
                .with_context(|| format!("classifying dataset '{name}'"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis.manifest)?);
            } else {
                println!("Classified {} rows of '{name}' (ε = {})", analysis.manifest.total, eps);
                for entry in &analysis.manifest.categories {
                    let note = if entry.written { "" } else { " (kept existing file)" };
                    println!("  {:<6} {:>8}{note}", entry.category.name(), entry.count);
                }
                if !analysis.manifest.excluded.is_empty() {
                    println!("  excluded {:>6}", analysis.manifest.excluded.len());
                }
                if !analysis.manifest_written {
                    println!("Kept existing manifest.json (use --force to overwrite)");
                }
                println!("Output: {}", store.analysed_dir(&name).display());
            }
            Ok(())
        }
        Commands::Simulate {
            t_max,
            distribution,
            name,
            model,
            seed,
            output_dir,
        } => {
            let name = name.unwrap_or_else(|| distribution.name().to_string());
            let section = SimulateSection {
                t_max,
                params: None,
                distribution,
            };
            let store = DatasetStore::new(output_dir);
            let sim = run_simulation(&store, &name, model.into(), &section, seed)?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "params": sim.params,
                        "steps": t_max,
                        "occupancy": sim.series.occupancy(),
                        "path": sim.path,
                    })
                );
            } else {
                println!("Simulated {t_max} steps with {}", sim.params);
                println!("Occupancy (00, 01, 10, 11): {:?}", sim.series.occupancy());
                println!("Output: {}", sim.path.display());
            }
            Ok(())
        }
    }
}

fn run_validated(config: &RunConfig) -> Result<RunSummary> {
    config.validate()?;
    Ok(run(config)?)
}

fn print_summaries(summaries: &[RunSummary], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summaries)?);
        return Ok(());
    }
    for summary in summaries {
        println!(
            "{:<12} {} model: {} of {} rows written, {} skipped -> {}",
            summary.dataset,
            summary.model,
            summary.written,
            summary.requested,
            summary.skipped,
            summary.raw_path.display()
        );
        if let Some(manifest) = &summary.classification {
            let counts: Vec<String> = manifest
                .categories
                .iter()
                .map(|c| format!("{}={}", c.category, c.count))
                .collect();
            println!("  categories: {}", counts.join(" "));
        }
        if let Some(path) = &summary.simulation_path {
            println!("  simulation: {}", path.display());
        }
    }
    Ok(())
}
