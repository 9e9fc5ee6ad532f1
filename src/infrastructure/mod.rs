pub mod core;
pub mod mock;
pub mod polygon;

pub use mock::MockCandleSource;
pub use polygon::PolygonMarketDataService;
