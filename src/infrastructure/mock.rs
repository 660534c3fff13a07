use crate::domain::ports::RollSource;
use std::collections::VecDeque;

/// Deterministic roll source: replays a script, then repeats `fallback`.
#[derive(Debug, Clone)]
pub struct ScriptedRolls {
    script: VecDeque<f64>,
    fallback: f64,
    drawn: u64,
}

impl ScriptedRolls {
    pub fn new(script: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback,
            drawn: 0,
        }
    }

    /// Same roll forever
    pub fn constant(roll: f64) -> Self {
        Self::new([], roll)
    }

    /// Rolls handed out so far, prefetched ones included
    pub fn drawn(&self) -> u64 {
        self.drawn
    }
}

impl RollSource for ScriptedRolls {
    fn fill_rolls(&mut self, buf: &mut Vec<f64>, count: usize) {
        buf.reserve(count);
        for _ in 0..count {
            buf.push(self.script.pop_front().unwrap_or(self.fallback));
        }
        self.drawn += count as u64;
    }
}
