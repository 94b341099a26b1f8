//! Classifies a directory-per-class image set and reports accuracy.
//!
//! Run with:
//!   cargo run --release -- --params extern/parameters.txt extern/test_data

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use monkey_cnn::params::{init, text};
use monkey_cnn::{eval, ArchitectureSpec, LabelSet, Network};

#[derive(Debug, Parser)]
#[command(about = "Convolutional network inference over a labelled image directory")]
struct Args {
    /// Image root; every sub-directory is named after the class it holds.
    #[arg(default_value = "extern/test_data")]
    dataset: PathBuf,
    /// `deep`, `shallow`, or a path to an architecture JSON file.
    #[arg(long, default_value = "deep")]
    arch: String,
    /// Parameter file, one line per weight or bias group.
    #[arg(long, default_value = "extern/parameters.txt")]
    params: PathBuf,
    /// JSON array of class names; defaults to the ten monkey species.
    #[arg(long)]
    labels: Option<String>,
    /// Ignore `--params` and use He-initialised weights from this seed.
    #[arg(long)]
    random_params: Option<u64>,
}

fn architecture(arch: &str) -> Result<ArchitectureSpec> {
    Ok(match arch {
        "deep" => ArchitectureSpec::deep(),
        "shallow" => ArchitectureSpec::shallow(),
        path => ArchitectureSpec::load_json(path).with_context(|| format!("reading architecture {path}"))?,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let spec = architecture(&args.arch)?;
    let plan = spec.plan().context("invalid architecture")?;

    let params = match args.random_params {
        Some(seed) => init::he(&plan, &mut StdRng::seed_from_u64(seed)),
        None => text::read_file(&plan, &args.params)?,
    };
    let labels = match &args.labels {
        Some(path) => LabelSet::load_json(path).with_context(|| format!("reading labels {path}"))?,
        None => LabelSet::monkeys(),
    };

    let network = Network::new(spec, params)?;
    network
        .check_labels(&labels)
        .with_context(|| format!("architecture {:?} cannot be evaluated against these labels", args.arch))?;
    let samples = eval::discover(&args.dataset)
        .with_context(|| format!("scanning {}", args.dataset.display()))?;
    info!(images = samples.len(), architecture = %network.plan().name, "starting evaluation");

    let stats = eval::evaluate(&network, &labels, &samples);
    info!(elapsed_ms = stats.elapsed_ms, "evaluation finished");
    println!("{stats}");
    Ok(())
}
