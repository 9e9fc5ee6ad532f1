// Market time model
pub mod candle;
pub mod clock;
pub mod session;
pub mod timeframe;
