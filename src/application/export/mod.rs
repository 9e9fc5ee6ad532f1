pub mod export_service;
pub mod market_views;
pub mod row_exporter;

pub use export_service::{
    EXPORT_VERSION, ExportDocument, ExportFailure, ExportRequest, ExportService, Frames,
};
pub use market_views::{MarketSnapshot, TimeGrid};
pub use row_exporter::{export_rows, merge_indicators, round_or_none};
