// ========================================================================================
//
//                        THE SEPARATION ORCHESTRATOR: GMCA
//
// ========================================================================================
//
// Thin command-line shell around the engine. It owns file handling only: the run
// configuration, the tab-separated input matrices, and the output files. Every
// numerical decision lives in the library.

use clap::{Parser, Subcommand};
use gmca::{GmcaOptions, RunConfig, normalize_columns, optimize};
use matrix_io::{read_matrix, write_matrix};
use ndarray::Array2;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

mod matrix_io;

#[derive(Parser)]
#[command(
    name = "gmca",
    version,
    about = "Sparse blind source separation with Generalized Morphological Component Analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Separate the observations described by a run configuration
    #[command(about = "Run GMCA (outputs: mixing and sources TSV files)")]
    Separate {
        /// Path to the run configuration (.toml)
        #[arg(long)]
        config: PathBuf,

        /// Override the seed of the sweep order
        #[arg(long)]
        seed: Option<u64>,

        /// Override the number of iterations
        #[arg(long, value_name = "N")]
        iterations: Option<usize>,
    },

    /// Write a template run configuration
    InitConfig {
        /// Destination of the template (.toml)
        path: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Separate {
            config,
            seed,
            iterations,
        } => separate_command(&config, seed, iterations),
        Commands::InitConfig { path } => init_config_command(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn separate_command(
    config_path: &Path,
    seed: Option<u64>,
    iterations: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = RunConfig::load(config_path)?;
    if seed.is_some() {
        config.options.seed = seed;
    }
    if let Some(n) = iterations {
        config.solver.n_iterations = n;
    }

    let observations = read_matrix(&config.data.observations)?;
    let (n_channels, n_samples) = observations.dim();
    let n_sources = config.solver.n_sources;
    log::info!(
        "Loaded observations {:?}: {} channels x {} samples",
        config.data.observations,
        n_channels,
        n_samples
    );

    let prior_mixing = match &config.data.prior_mixing {
        Some(path) => read_matrix(path)?,
        None => Array2::zeros((n_channels, n_sources)),
    };
    let mut mixing = match (&config.data.initial_mixing, &config.data.prior_mixing) {
        (Some(path), _) => read_matrix(path)?,
        (None, Some(_)) => prior_mixing.clone(),
        (None, None) => Array2::ones((n_channels, n_sources)),
    };
    normalize_columns(&mut mixing);
    let mut sources = Array2::zeros((n_sources, n_samples));
    let lam_p = config.solver.lam_p.resolve(n_sources)?;

    let started = Instant::now();
    let report = optimize(
        observations.view(),
        n_sources,
        config.solver.n_iterations,
        &mut mixing,
        &mut sources,
        prior_mixing.view(),
        &lam_p,
        &config.options,
    )?;
    log_summary(&config.options, &report, started);

    write_matrix(&config.data.mixing_output, mixing.view())?;
    write_matrix(&config.data.sources_output, sources.view())?;
    println!(
        "Mixing matrix saved to: {}",
        config.data.mixing_output.display()
    );
    println!(
        "Sources saved to: {}",
        config.data.sources_output.display()
    );
    Ok(())
}

fn log_summary(options: &GmcaOptions, report: &gmca::OptimizeReport, started: Instant) {
    log::info!(
        "{} iterations in {:.2?} (lam_s {:.4e}, final threshold {:.4e})",
        report.iterations,
        started.elapsed(),
        options.lam_s,
        report.final_threshold
    );
    if !report.dead_sources.is_empty() {
        log::warn!(
            "Dead sources with zero mixing columns: {:?}",
            report.dead_sources
        );
    }
}

fn init_config_command(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    RunConfig::template().save(path)?;
    println!("Template configuration written to: {}", path.display());
    Ok(())
}
