use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Command-line interface of the Lasso experiment.
#[derive(Parser, Debug)]
#[command(
    name = "lasso-experiment",
    version,
    about = "Fit a Lasso on synthetic sparse regression data and track the run"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the experiment and record it in the tracking store.
    Run(ExperimentArgs),
    /// Print the resolved configuration without running anything.
    PrintConfig(ExperimentArgs),
}

#[derive(Args, Debug)]
pub struct ExperimentArgs {
    /// JSON file with config values; omitted keys keep their defaults.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override a config value, e.g. `-w alpha=0.5`. Applied after --config.
    #[arg(short = 'w', long = "with", value_name = "KEY=VALUE")]
    pub updates: Vec<String>,

    /// Directory for logs and model artifacts.
    #[arg(long, value_name = "DIR", default_value = "./output")]
    pub output: PathBuf,

    /// Tracking store directory [default: <OUTPUT>/runs].
    #[arg(long, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Experiment name recorded with each run and used as the logger name.
    #[arg(long, default_value = "test")]
    pub name: String,

    /// Free-form note stored on the run record.
    #[arg(short, long)]
    pub comment: Option<String>,
}
