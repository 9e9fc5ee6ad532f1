pub mod client;
pub mod common;

pub use client::{DEFAULT_POLYGON_BASE_URL, PolygonMarketDataService};
