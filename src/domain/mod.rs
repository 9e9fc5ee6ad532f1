// Market time model: zones, sessions, timeframes, candles
pub mod market;

// Indicator definitions and outputs
pub mod indicators;

// Aligned frames and export rows
pub mod frame;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
