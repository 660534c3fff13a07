// Single-trial data model
pub mod simulation;

// Grid search data model
pub mod optimization;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
