pub mod hyphenate;
pub mod search;
pub mod translate;
pub mod validate;

use patgen_tuner::combiner::{build_combiner, Combiner};
use patgen_tuner::config::{Config, SamplerKind};
use patgen_tuner::error::TunerResult;
use patgen_tuner::metaheuristic::build_metaheuristic;
use patgen_tuner::patgen::PatgenCommand;
use patgen_tuner::sampler::{FileSampler, RandomSampler, Sampler};
use patgen_tuner::scorer::Scorer;
use tracing::info;

pub fn build_sampler(config: &Config) -> TunerResult<Box<dyn Sampler>> {
    Ok(match config.search.sampler {
        SamplerKind::Random => Box::new(RandomSampler::new(
            config.ranges.clone(),
            config.search.seed,
        )?),
        SamplerKind::File => Box::new(
            FileSampler::open(&config.paths.params, config.search.repeat)?
                .with_ranges(config.ranges.clone()),
        ),
    })
}

/// Sampler, scorer, metaheuristic and combiner wired as `config` asks.
pub fn build_engine(config: &Config) -> TunerResult<Box<dyn Combiner>> {
    info!(
        "Engine: {} sampler, {} metaheuristic, {} combiner, population {}",
        config.search.sampler,
        config.search.metaheuristic,
        config.search.combiner,
        config.search.population_size
    );
    let sampler = build_sampler(config)?;
    let scorer = Scorer::new(
        Box::new(PatgenCommand::new(config.paths.patgen.clone())),
        &config.paths.wordlist,
        &config.paths.translate,
    )?;
    let meta = build_metaheuristic(
        config.search.metaheuristic,
        scorer,
        sampler,
        config.search.population_size,
    );
    Ok(build_combiner(
        config.search.combiner,
        meta,
        config.search.n_levels,
    ))
}
