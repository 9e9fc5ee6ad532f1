// Export pipeline: service, row serialization, market views
pub mod export;

// Local indicator computation
pub mod indicators;

// Candle placement onto time grids
pub mod market_data;
