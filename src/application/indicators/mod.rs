pub mod engine;
pub mod smoothing;

pub use engine::{compute_indicator, compute_on_closes, fill_close_gaps};
