use crate::domain::errors::SimulationError;
use crate::domain::ports::RollSource;
use crate::domain::simulation::{CyclePlan, SimParams, TrialOutcome, TrialResult};
use crate::infrastructure::rng::RngKind;

pub const DEFAULT_ROLL_BATCH: usize = 1024;

/// Knobs that bound a single trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialLimits {
    /// Rolls fetched from the generator per refill
    pub roll_batch: usize,
    /// Stop after this many rounds; `None` runs until bust
    pub max_rounds: Option<u64>,
}

impl Default for TrialLimits {
    fn default() -> Self {
        Self {
            roll_batch: DEFAULT_ROLL_BATCH,
            max_rounds: None,
        }
    }
}

/// Plays one martingale trial against any [`RollSource`].
///
/// Each cycle re-derives bet, target and win chance from the balance on
/// hand, then rolls until the balance reaches the target or drops to zero.
/// Completed cycles chain into the next one; the trial ends on bust.
#[derive(Debug, Clone, Copy)]
pub struct TrialRunner {
    params: SimParams,
    limits: TrialLimits,
}

impl TrialRunner {
    pub fn new(params: SimParams) -> Self {
        Self {
            params,
            limits: TrialLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: TrialLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn run<R: RollSource + ?Sized>(&self, rolls: &mut R) -> TrialResult {
        let params = &self.params;
        let roll_batch = self.limits.roll_batch.max(1);

        let mut balance = params.starting_balance;
        let mut highest_balance = balance;
        let mut cycles = 0u64;
        let mut rounds = 0u64;

        // Leftover rolls carry over into the next cycle
        let mut batch: Vec<f64> = Vec::with_capacity(roll_batch);
        let mut cursor = 0usize;

        let outcome = 'trial: loop {
            let plan = CyclePlan::derive(balance, params);
            // A target that rounds back to the balance can never be reached by rolling
            if plan.target <= balance || plan.target.is_nan() {
                break TrialOutcome::Saturated;
            }
            let mut stake = plan.bet;
            let mut loss_streak = 0u32;

            while balance > 0.0 && balance < plan.target {
                if self.limits.max_rounds.is_some_and(|cap| rounds >= cap) {
                    break 'trial TrialOutcome::RoundLimit;
                }

                if cursor == batch.len() {
                    batch.clear();
                    rolls.fill_rolls(&mut batch, roll_batch);
                    cursor = 0;
                }
                let roll = batch[cursor];
                cursor += 1;
                rounds += 1;

                if plan.is_win(roll) {
                    balance += plan.win_payout(stake);
                    stake *= 1.0 + params.w;
                    loss_streak = 0;
                } else {
                    balance -= stake;
                    loss_streak += 1;
                    if loss_streak >= params.l {
                        stake = plan.bet;
                        loss_streak = 0;
                    }
                }

                if balance > highest_balance {
                    highest_balance = balance;
                }
            }

            if balance >= plan.target {
                cycles += 1;
                if !balance.is_finite() {
                    break TrialOutcome::Saturated;
                }
                continue;
            }
            if balance.is_nan() {
                break TrialOutcome::Saturated;
            }
            break TrialOutcome::Busted;
        };

        TrialResult {
            highest_balance,
            cycles,
            rounds,
            outcome,
        }
    }
}

/// Runs one trial with freshly seeded provably-fair rolls.
pub fn run_trial(params: &SimParams) -> Result<TrialResult, SimulationError> {
    run_trial_with(params, RngKind::ProvablyFair, TrialLimits::default())
}

pub fn run_trial_with(
    params: &SimParams,
    rng: RngKind,
    limits: TrialLimits,
) -> Result<TrialResult, SimulationError> {
    params.validate()?;
    let mut rolls = rng.fresh()?;
    Ok(TrialRunner::new(*params).with_limits(limits).run(&mut rolls))
}
