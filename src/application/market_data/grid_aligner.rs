//! Left-joins sparse candles onto a fixed grid.

use crate::domain::frame::AlignedFrame;
use crate::domain::market::candle::Candle;
use crate::domain::market::clock::Instant;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Builds one frame row per grid timestamp.
///
/// Rows without a candle keep absent prices and zero volume. Candles that do
/// not sit on a grid timestamp are ignored. When two candles share a
/// timestamp the later one in `candles` wins.
pub fn align_candles_to_grid(grid: &[Instant], candles: &[Candle]) -> AlignedFrame {
    let mut by_ts: HashMap<i64, &Candle> = HashMap::with_capacity(candles.len());
    for candle in candles {
        if by_ts.insert(candle.instant.timestamp(), candle).is_some() {
            warn!(
                "GridAligner: duplicate candle at {}, keeping the later one",
                candle.instant
            );
        }
    }

    let mut frame = AlignedFrame::empty(grid.to_vec());
    let mut matched = 0;
    for (row, ts) in grid.iter().enumerate() {
        let Some(candle) = by_ts.get(&ts.timestamp()) else {
            continue;
        };
        matched += 1;
        frame.open[row] = candle.open;
        frame.high[row] = candle.high;
        frame.low[row] = candle.low;
        frame.close[row] = candle.close;
        frame.volume[row] = candle.volume.unwrap_or(0.0);
    }

    debug!(
        "GridAligner: {} grid rows, {} candles supplied, {} matched, {} gaps",
        grid.len(),
        candles.len(),
        matched,
        grid.len() - matched
    );

    frame
}
