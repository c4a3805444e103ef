mod common;

use common::{Behaviour, Fixture};
use patgen_tuner::combiner::{build_combiner, AllWithAllCombiner, Combiner, SimpleCombiner};
use patgen_tuner::config::{CombinerKind, MetaheuristicKind, ParamRanges, PATGEN_MAX_LEVELS};
use patgen_tuner::error::TunerError;
use patgen_tuner::metaheuristic::{build_metaheuristic, HillClimbing, NoMetaheuristic};
use patgen_tuner::sampler::{FileSampler, RandomSampler};
use patgen_tuner::setting::rank;
use std::collections::BTreeSet;
use std::fs;

const WORDS: [&str; 3] = ["ab-cd", "ef-gh", "ij-kl"];

#[test]
fn test_simple_combiner_chains_levels() {
    let fx = Fixture::new(&WORDS, "");
    let (scorer, calls) = fx.scorer(Behaviour::Landscape);
    let sampler = FileSampler::from_content(
        "# start end good bad thr\n1 2 1 1 3\n2 3 1 2 2\n2 4 2 1 1\n",
        false,
    );
    let meta = NoMetaheuristic::new(scorer, Box::new(sampler), 1);
    let mut combiner = SimpleCombiner::new(Box::new(meta));

    let out = fx.out_dir();
    let path = combiner.run(&out, Some("final.pat")).unwrap();

    assert_eq!(combiner.level(), 3);
    assert_eq!(path, out.join("final.pat"));
    assert!(path.is_file());

    let calls = calls.borrow();
    let lineage: Vec<(u32, u64)> = calls.iter().map(|r| (r.level, r.run_id)).collect();
    assert_eq!(lineage, vec![(1, 1), (2, 2), (3, 3)]);
    let prevs: Vec<_> = calls
        .iter()
        .map(|r| r.input_patterns.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(prevs, vec!["0.pat", "1.pat", "2.pat"]);

    let state = combiner.meta().state();
    assert_eq!(state.history.level_outputs.len(), 3);
    assert_eq!(state.history.level_outputs[2][0].prev, 2);
    assert_eq!(state.scorer.workspace().runs().unwrap(), BTreeSet::from([0]));

    // patterns accumulate across levels
    let lines = fs::read_to_string(&path).unwrap().lines().count();
    assert_eq!(Some(lines), state.population[0].n_patterns);
}

#[test]
fn test_simple_combiner_stops_at_patgen_level_limit() {
    let fx = Fixture::new(&WORDS, "");
    let (scorer, _) = fx.scorer(Behaviour::Landscape);
    let sampler = RandomSampler::new(ParamRanges::default(), Some(11)).unwrap();
    let meta = NoMetaheuristic::new(scorer, Box::new(sampler), 1);
    let mut combiner = SimpleCombiner::new(Box::new(meta));

    combiner.run(&fx.out_dir(), None).unwrap();
    assert_eq!(combiner.level(), PATGEN_MAX_LEVELS);
    assert_eq!(combiner.meta().state().history.level_outputs.len(), 9);
}

#[test]
fn test_level_limit_leaves_remaining_samples_unread() {
    let fx = Fixture::new(&WORDS, "");
    let (scorer, _) = fx.scorer(Behaviour::Landscape);
    let params: String = (1..=10).map(|t| format!("1 2 1 1 {}\n", t)).collect();
    let sampler = FileSampler::from_content(&params, false);
    let meta = NoMetaheuristic::new(scorer, Box::new(sampler), 1);
    let mut combiner = SimpleCombiner::new(Box::new(meta));

    combiner.run(&fx.out_dir(), None).unwrap();
    assert_eq!(combiner.level(), PATGEN_MAX_LEVELS);

    let next = combiner.meta_mut().state_mut().sampler.sample().unwrap();
    assert_eq!(next.map(|s| s.threshold), Some(10));
}

#[test]
fn test_exhausted_sampler_leaves_nothing_to_finalize() {
    let fx = Fixture::new(&WORDS, "");
    let (scorer, calls) = fx.scorer(Behaviour::Landscape);
    let sampler = FileSampler::from_content("# only a comment\n", false);
    let meta = NoMetaheuristic::new(scorer, Box::new(sampler), 1);
    let mut combiner = SimpleCombiner::new(Box::new(meta));

    let err = combiner.run(&fx.out_dir(), None).unwrap_err();
    assert!(matches!(err, TunerError::EmptyPopulation));
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_simple_combiner_with_hill_climbing_improves_each_level() {
    let fx = Fixture::new(&WORDS, "");
    let (scorer, _) = fx.scorer(Behaviour::Landscape);
    let sampler = FileSampler::from_content("1 2 1 1 12\n1 2 1 1 13\n", false);
    let meta = HillClimbing::new(scorer, Box::new(sampler), 1);
    let mut combiner = SimpleCombiner::new(Box::new(meta));

    combiner.run(&fx.out_dir(), None).unwrap();

    let history = &combiner.meta().state().history;
    assert_eq!(history.level_outputs.len(), 2);
    for level in &history.level_outputs {
        assert_eq!(level[0].threshold, 15);
    }
}

#[test]
fn test_all_with_all_crosses_survivors_with_samples() {
    let fx = Fixture::new(&WORDS, "");
    let (scorer, calls) = fx.scorer(Behaviour::Landscape);
    let sampler = RandomSampler::new(ParamRanges::default(), Some(42)).unwrap();
    let meta = NoMetaheuristic::new(scorer, Box::new(sampler), 2);
    let mut combiner = AllWithAllCombiner::new(Box::new(meta), 3);

    combiner.run(&fx.out_dir(), Some("aa.pat")).unwrap();
    assert_eq!(combiner.level(), 3);

    let history = &combiner.meta().state().history.level_outputs;
    assert_eq!(history.len(), 3);
    for pair in history.windows(2) {
        let survivors: BTreeSet<u64> = pair[0].iter().filter_map(|s| s.run_id).collect();
        for s in &pair[1] {
            assert!(survivors.contains(&s.prev));
        }
    }
    for level in history {
        assert!(level.len() <= 2);
        assert!(level.windows(2).all(|w| rank(&w[0], &w[1]).is_le()));
    }

    // level 1 starts from the root only, later levels from up to two survivors
    let calls = calls.borrow();
    assert!(calls.iter().filter(|r| r.level == 1).count() <= 2);
    assert!(calls.iter().filter(|r| r.level == 2).count() <= 4);
}

#[test]
fn test_all_with_all_without_search_keeps_population_size() {
    let fx = Fixture::new(&WORDS, "");
    let (scorer, calls) = fx.scorer(Behaviour::Landscape);
    let sampler = RandomSampler::new(ParamRanges::default(), Some(5)).unwrap();
    let meta = build_metaheuristic(MetaheuristicKind::NoOp, scorer, Box::new(sampler), 3);
    let mut combiner = build_combiner(CombinerKind::AllWithAll, meta, 2);

    combiner.run(&fx.out_dir(), None).unwrap();

    let sizes: Vec<usize> = combiner
        .meta()
        .state()
        .history
        .level_outputs
        .iter()
        .map(Vec::len)
        .collect();
    assert_eq!(sizes, vec![3, 3]);
    assert!(calls.borrow().len() > 3);
}

#[test]
fn test_all_with_all_caps_levels() {
    let fx = Fixture::new(&WORDS, "");
    let (scorer, _) = fx.scorer(Behaviour::Landscape);
    let sampler = RandomSampler::new(ParamRanges::default(), Some(3)).unwrap();
    let meta = NoMetaheuristic::new(scorer, Box::new(sampler), 1);
    let mut combiner = AllWithAllCombiner::new(Box::new(meta), 40);

    combiner.run(&fx.out_dir(), None).unwrap();
    assert_eq!(combiner.level(), PATGEN_MAX_LEVELS);
}

#[test]
fn test_reset_restarts_from_level_zero() {
    let fx = Fixture::new(&WORDS, "");
    let (scorer, calls) = fx.scorer(Behaviour::Landscape);
    let sampler = FileSampler::from_content("1 2 1 1 3\n", false);
    let meta = NoMetaheuristic::new(scorer, Box::new(sampler), 1);
    let mut combiner = SimpleCombiner::new(Box::new(meta));

    combiner.run(&fx.out_dir(), Some("first.pat")).unwrap();
    combiner.reset().unwrap();
    assert_eq!(combiner.level(), 0);
    assert!(combiner.meta().state().history.level_outputs.is_empty());

    combiner.run(&fx.out_dir(), Some("second.pat")).unwrap();
    assert_eq!(combiner.level(), 1);
    // the cache was dropped by the reset, so the setting is generated again
    assert_eq!(calls.borrow().len(), 2);
    assert!(fx.out_dir().join("second.pat").is_file());
}
