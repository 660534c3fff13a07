pub mod combo_result;
pub mod params;

pub use combo_result::{ComboResult, ResultColumn, risk_adjusted_score, round2, sort_by_column};
pub use params::{Combo, OptParams, ParameterGrid};
