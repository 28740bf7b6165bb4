mod cli;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands, ExperimentArgs};
use lasso_experiment::logging::init_run_logger;
use lasso_experiment::{Experiment, ExperimentConfig, ExperimentPaths};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => handle_run(args),
        Commands::PrintConfig(args) => handle_print_config(args),
    }
}

fn resolve_config(args: &ExperimentArgs) -> Result<ExperimentConfig> {
    let mut config = match &args.config {
        Some(path) => ExperimentConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ExperimentConfig::default(),
    };

    for update in &args.updates {
        config
            .apply_update(update)
            .with_context(|| format!("bad config update '{}'", update))?;
    }

    Ok(config)
}

fn handle_print_config(args: ExperimentArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    println!("Configuration ({}):\n{}", args.name, config.summary());
    Ok(())
}

fn handle_run(args: ExperimentArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    config.validate()?;

    let mut paths = ExperimentPaths::new(&args.output);
    if let Some(store) = &args.store {
        paths = paths.with_store(store);
    }

    let log_path = init_run_logger(&paths.logs_dir(), &args.name)?;
    println!("--> Configuration\n{}", config.summary());

    let outcome = Experiment::new(args.name, config, paths)
        .comment(args.comment)
        .run()
        .with_context(|| format!("experiment failed; see {}", log_path.display()))?;

    println!(
        concat!(
            "\n--> Run {}\n",
            "rmse_y = {}\n",
            "rmse_coef = {}\n",
            "score (R2) = {}\n",
            "model = {}\n",
            "log = {}"
        ),
        outcome.run_id,
        outcome.rmse_y,
        outcome.rmse_coef,
        outcome.score,
        outcome.model_path.display(),
        log_path.display()
    );

    Ok(())
}
