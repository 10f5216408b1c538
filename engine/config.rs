use crate::optimize::GmcaOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

// --- Run Configuration ---
// The human-editable description of one separation run, stored as TOML.

/// Where the matrices of a run come from and where the results go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPaths {
    /// Observed matrix X, channels as rows and samples as columns.
    pub observations: PathBuf,
    /// Starting mixing matrix; falls back to the prior, then to unit-norm ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_mixing: Option<PathBuf>,
    /// Prior mixing matrix A_p; an all-zero prior is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_mixing: Option<PathBuf>,
    #[serde(default = "default_mixing_output")]
    pub mixing_output: PathBuf,
    #[serde(default = "default_sources_output")]
    pub sources_output: PathBuf,
}

fn default_mixing_output() -> PathBuf {
    PathBuf::from("mixing.tsv")
}

fn default_sources_output() -> PathBuf {
    PathBuf::from("sources.tsv")
}

/// Prior weights given either once for every source or one per source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriorWeights {
    Uniform(f64),
    PerSource(Vec<f64>),
}

impl Default for PriorWeights {
    fn default() -> Self {
        Self::Uniform(0.0)
    }
}

impl PriorWeights {
    /// Expands to exactly `n_sources` weights.
    pub fn resolve(&self, n_sources: usize) -> Result<Vec<f64>, ConfigError> {
        match self {
            Self::Uniform(weight) => Ok(vec![*weight; n_sources]),
            Self::PerSource(weights) if weights.len() == n_sources => Ok(weights.clone()),
            Self::PerSource(weights) => Err(ConfigError::Invalid(format!(
                "lam_p lists {} weights but the run has {} sources",
                weights.len(),
                n_sources
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub n_sources: usize,
    pub n_iterations: usize,
    #[serde(default)]
    pub lam_p: PriorWeights,
}

/// The top-level run file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: DataPaths,
    pub solver: SolverConfig,
    #[serde(default)]
    pub options: GmcaOptions,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read or write config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML config file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Invalid run configuration: {0}")]
    Invalid(String),
}

impl RunConfig {
    /// A runnable template pointing at `observations.tsv`.
    pub fn template() -> Self {
        Self {
            data: DataPaths {
                observations: PathBuf::from("observations.tsv"),
                initial_mixing: None,
                prior_mixing: None,
                mixing_output: default_mixing_output(),
                sources_output: default_sources_output(),
            },
            solver: SolverConfig {
                n_sources: 2,
                n_iterations: 100,
                lam_p: PriorWeights::default(),
            },
            options: GmcaOptions {
                ret_min_rmse: true,
                seed: Some(0),
                ..GmcaOptions::default()
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solver.n_sources == 0 {
            return Err(ConfigError::Invalid(
                "solver.n_sources must be at least 1".to_string(),
            ));
        }
        self.solver.lam_p.resolve(self.solver.n_sources)?;
        Ok(())
    }

    /// Saves the configuration in a human-readable TOML format.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        Ok(())
    }

    /// Loads and validates a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let toml_string = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&toml_string)?;
        config.validate()?;
        Ok(config)
    }
}
