use thiserror::Error;

/// Errors raised before or while running simulations and sweeps
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    #[error("Worker pool unavailable: {0}")]
    WorkerPool(String),

    #[error("Roll generator could not be keyed: {0}")]
    Rng(String),
}

impl SimulationError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        SimulationError::InvalidParameters {
            reason: reason.into(),
        }
    }
}

/// Errors produced by the range grammar
#[derive(Debug, Error, PartialEq)]
pub enum RangeParseError {
    #[error("Malformed range '{input}': {reason}")]
    Malformed { input: String, reason: String },

    #[error("Range '{input}' expands to {len} values (max {max})")]
    TooLarge { input: String, len: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameters_formatting() {
        let err = SimulationError::invalid("bet_div must be positive, got -2");
        let msg = err.to_string();
        assert!(msg.starts_with("Invalid parameters"));
        assert!(msg.contains("-2"));
    }

    #[test]
    fn test_range_error_formatting() {
        let err = RangeParseError::TooLarge {
            input: "1-9999999".to_string(),
            len: 9_999_999,
            max: 1_000_000,
        };

        let msg = err.to_string();
        assert!(msg.contains("1-9999999"));
        assert!(msg.contains("1000000"));
    }
}
