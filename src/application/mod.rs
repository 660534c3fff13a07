// Trial execution and aggregation
pub mod simulation;

// Parameter sweeps, range parsing and reporting
pub mod optimization;
