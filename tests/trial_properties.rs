use dicelab::application::simulation::{
    AggregatorSettings, ExecutionMode, TrialAggregator, TrialLimits, TrialRunner, aggregate,
};
use dicelab::domain::simulation::{CancelToken, HeadlineStat, SimParams, TrialOutcome};
use dicelab::infrastructure::rng::{FastRng, ProvablyFairRng, RngKind};

fn coin_flip_params(n_trials: usize) -> SimParams {
    // m = 2 with one-bet profit target; busts within a handful of cycles
    SimParams::new(20.0, 4.0, 1.0, 0.0, 2, 1.0, n_trials).unwrap()
}

#[test]
fn test_peak_never_below_start() {
    let params = coin_flip_params(1);
    for seed in 0..200 {
        let result = TrialRunner::new(params).run(&mut FastRng::seeded(seed));
        assert!(result.highest_balance >= params.starting_balance);
        assert!(result.rounds >= 1);
        assert!(result.cycles <= result.rounds);
        assert_eq!(result.outcome, TrialOutcome::Busted);
    }
}

#[test]
fn test_same_seeds_replay_identically() {
    let params = coin_flip_params(1);
    let run = || {
        let mut rng = ProvablyFairRng::new("a1b2c3", "d4e5f6", 42).unwrap();
        TrialRunner::new(params).run(&mut rng)
    };
    assert_eq!(run(), run());
}

#[test]
fn test_martingale_with_progression_terminates() {
    // W = 78%, L = 5, buffer 25% with a short profit target
    let params = SimParams::from_percentages(20.0, 50.0, 2.0, 78.0, 5, 25.0, 1).unwrap();
    let limits = TrialLimits {
        roll_batch: 256,
        max_rounds: Some(2_000_000),
    };
    for seed in 0..20 {
        let result = TrialRunner::new(params)
            .with_limits(limits)
            .run(&mut FastRng::seeded(seed));
        assert!(result.highest_balance >= 20.0);
        assert!(matches!(
            result.outcome,
            TrialOutcome::Busted | TrialOutcome::RoundLimit
        ));
    }
}

#[test]
fn test_bust_rate_matches_zero_cycle_share() {
    let aggregator = TrialAggregator::new(AggregatorSettings {
        rng: RngKind::Fast,
        ..AggregatorSettings::default()
    });
    let results = aggregator
        .run_many(&coin_flip_params(300), &CancelToken::new(), |_, _| {})
        .unwrap();
    assert_eq!(results.len(), 300);

    let stats = aggregate(&results, HeadlineStat::Median);
    let zero_cycles = results.iter().filter(|r| r.cycles == 0).count();
    assert!((stats.bust_rate - 100.0 * zero_cycles as f64 / 300.0).abs() < 1e-9);
    assert!((0.0..=100.0).contains(&stats.cycle_success_rate));
    assert!(stats.max_high >= stats.avg_high);
    assert!(stats.std_high >= 0.0);
}

#[test]
fn test_cancel_mid_run_keeps_finished_trials() {
    let aggregator = TrialAggregator::new(AggregatorSettings {
        mode: ExecutionMode::Sequential,
        rng: RngKind::Fast,
        ..AggregatorSettings::default()
    });
    let cancel = CancelToken::new();
    let trip = cancel.clone();

    let results = aggregator
        .run_many(&coin_flip_params(50), &cancel, |done, _| {
            if done == 7 {
                trip.cancel();
            }
        })
        .unwrap();

    assert_eq!(results.len(), 7);
}
