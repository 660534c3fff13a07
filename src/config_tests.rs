use crate::application::simulation::ExecutionMode;
use crate::config::{Config, DEFAULT_LARGE_SWEEP};
use crate::domain::simulation::HeadlineStat;
use crate::infrastructure::rng::RngKind;
use std::collections::HashMap;

fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn test_config_defaults() {
    let config = config_from(&[]).unwrap();

    assert_eq!(config.simulation.headline, HeadlineStat::Median);
    assert_eq!(config.simulation.rng, RngKind::ProvablyFair);
    assert_eq!(config.simulation.roll_batch, 1024);
    assert_eq!(config.simulation.max_rounds, None);
    assert_eq!(config.optimizer.max_workers, 32);
    assert_eq!(config.optimizer.large_sweep_threshold, DEFAULT_LARGE_SWEEP);
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_overrides() {
    let config = config_from(&[
        ("DICELAB_HEADLINE_STAT", "mean"),
        ("DICELAB_RNG", "fast"),
        ("DICELAB_ROLL_BATCH", "256"),
        ("DICELAB_MAX_ROUNDS", "100000"),
        ("DICELAB_MAX_WORKERS", "4"),
        ("DICELAB_LARGE_SWEEP", "10"),
        ("DICELAB_OUTPUT_DIR", "results"),
    ])
    .unwrap();

    assert_eq!(config.simulation.headline, HeadlineStat::Mean);
    assert_eq!(config.simulation.rng, RngKind::Fast);
    assert_eq!(config.simulation.max_rounds, Some(100_000));
    assert_eq!(config.optimizer.large_sweep_threshold, 10);
    assert_eq!(config.optimizer.output_dir, "results");

    let settings = config.optimizer_settings();
    assert_eq!(settings.max_workers, 4);
    assert_eq!(settings.limits.roll_batch, 256);
    assert_eq!(settings.headline, HeadlineStat::Mean);

    let aggregator = config.aggregator_settings(ExecutionMode::Sequential);
    assert_eq!(aggregator.mode, ExecutionMode::Sequential);
    assert_eq!(aggregator.rng, RngKind::Fast);
}

#[test]
fn test_zero_round_cap_disables_it() {
    let config = config_from(&[("DICELAB_MAX_ROUNDS", "0")]).unwrap();
    assert_eq!(config.simulation.max_rounds, None);
}

#[test]
fn test_invalid_values_are_errors() {
    for (key, value) in [
        ("DICELAB_HEADLINE_STAT", "mode"),
        ("DICELAB_RNG", "lcg"),
        ("DICELAB_ROLL_BATCH", "0"),
        ("DICELAB_MAX_WORKERS", "many"),
        ("DICELAB_MAX_ROUNDS", "-1"),
    ] {
        let err = config_from(&[(key, value)]).unwrap_err();
        assert!(
            format!("{err:#}").contains(key) || format!("{err:#}").contains(value),
            "{key}={value} gave: {err:#}"
        );
    }
}
