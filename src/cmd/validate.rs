use crate::reports;
use clap::Args;
use patgen_tuner::config::Config;
use patgen_tuner::error::TunerResult;
use patgen_tuner::validator::{NFoldCrossValidator, Validator};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: Config,

    #[arg(long, default_value_t = 10)]
    pub folds: usize,

    /// Also writes the fold results as JSON.
    #[arg(long)]
    pub report_json: Option<PathBuf>,
}

pub fn run(args: &ValidateArgs, config: Config) -> TunerResult<()> {
    config.paths.validate()?;

    let combiner = super::build_engine(&config)?;
    let mut validator = NFoldCrossValidator::new(
        combiner,
        args.folds,
        config.paths.marker,
        config.paths.out_dir.clone(),
    )?;
    let report = validator.validate(&config.paths.wordlist)?;

    reports::print_fold_report(&report);
    if let Some(path) = &args.report_json {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!("Fold report written to {}", path.display());
    }
    Ok(())
}
