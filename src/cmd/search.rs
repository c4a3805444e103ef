use crate::reports;
use clap::Args;
use patgen_tuner::config::Config;
use patgen_tuner::error::TunerResult;
use patgen_tuner::stats::{DatasetInfo, PatternsInfo};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub config: Config,

    /// File name of the final patterns inside the output directory.
    #[arg(long)]
    pub name: Option<String>,

    /// Writes the population of every level as CSV.
    #[arg(long)]
    pub history_csv: Option<PathBuf>,

    /// Writes the population of every level as JSON.
    #[arg(long)]
    pub history_json: Option<PathBuf>,
}

pub fn run(args: &SearchArgs, config: Config) -> TunerResult<()> {
    config.paths.validate()?;
    info!("{}", DatasetInfo::from_file(&config.paths.wordlist)?);

    fs::create_dir_all(&config.paths.out_dir)?;
    let mut combiner = super::build_engine(&config)?;
    let patterns = combiner.run(&config.paths.out_dir, args.name.as_deref())?;

    let state = combiner.meta().state();
    reports::print_population(&state.population, config.search.f_weight);
    if let Some(best) = combiner.best() {
        println!("{}", PatternsInfo::new(&patterns, best)?);
    }

    if let Some(path) = &args.history_csv {
        state.history.write_csv(path, config.search.f_weight)?;
        info!("Learning history written to {}", path.display());
    }
    if let Some(path) = &args.history_json {
        fs::write(path, state.history.to_json()?)?;
        info!("Learning history written to {}", path.display());
    }
    Ok(())
}
