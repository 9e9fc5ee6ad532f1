//! Local indicator computation over an aligned close series.
//!
//! Closes are gap-filled forward, then backward, before any recurrence runs,
//! so a single missing bar never poisons the rest of the series.

use super::smoothing::ExponentialSmoother;
use crate::domain::errors::ExportError;
use crate::domain::frame::AlignedFrame;
use crate::domain::indicators::{
    IndicatorKind, IndicatorSeries, MACD_HISTOGRAM, MACD_SIGNAL, MACD_VALUE,
};
use ta::Next;
use ta::indicators::{ExponentialMovingAverage, MovingAverageConvergenceDivergence};

/// Computes `kind` over the frame's close column.
pub fn compute_indicator(
    kind: &IndicatorKind,
    frame: &AlignedFrame,
) -> Result<IndicatorSeries, ExportError> {
    let closes = fill_close_gaps(&frame.close).ok_or_else(|| ExportError::MissingFallbackData {
        indicator: kind.label().to_string(),
    })?;
    compute_on_closes(kind, &closes)
}

/// Computes `kind` over an already gap-free close series.
pub fn compute_on_closes(
    kind: &IndicatorKind,
    closes: &[f64],
) -> Result<IndicatorSeries, ExportError> {
    match *kind {
        IndicatorKind::Momentum { window } => Ok(IndicatorSeries::Single {
            name: kind.default_column(),
            values: rsi(closes, window),
        }),
        IndicatorKind::MovingAverage { window } => Ok(IndicatorSeries::Single {
            name: kind.default_column(),
            values: ema(closes, window, kind)?.into_iter().map(Some).collect(),
        }),
        IndicatorKind::ConvergenceDivergence {
            short_window,
            long_window,
            signal_window,
        } => {
            let mut macd =
                MovingAverageConvergenceDivergence::new(short_window, long_window, signal_window)
                    .map_err(|e| invalid(kind, e))?;

            let mut value = Vec::with_capacity(closes.len());
            let mut signal = Vec::with_capacity(closes.len());
            let mut histogram = Vec::with_capacity(closes.len());
            for close in closes {
                let out = macd.next(*close);
                value.push(Some(out.macd));
                signal.push(Some(out.signal));
                histogram.push(Some(out.histogram));
            }

            Ok(IndicatorSeries::Bundle {
                columns: vec![
                    (MACD_VALUE.to_string(), value),
                    (MACD_SIGNAL.to_string(), signal),
                    (MACD_HISTOGRAM.to_string(), histogram),
                ],
            })
        }
    }
}

/// Forward-fills then backward-fills missing closes.
///
/// Returns `None` when the column holds no usable price at all.
pub fn fill_close_gaps(closes: &[Option<f64>]) -> Option<Vec<f64>> {
    let first = closes.iter().flatten().copied().find(|c| c.is_finite())?;

    let mut last = first;
    let filled = closes
        .iter()
        .map(|c| {
            if let Some(v) = c.filter(|v| v.is_finite()) {
                last = v;
            }
            last
        })
        .collect();
    Some(filled)
}

fn ema(closes: &[f64], window: usize, kind: &IndicatorKind) -> Result<Vec<f64>, ExportError> {
    let mut ema = ExponentialMovingAverage::new(window).map_err(|e| invalid(kind, e))?;
    Ok(closes.iter().map(|c| ema.next(*c)).collect())
}

/// RSI with Wilder smoothing of gains and losses.
///
/// The first row has no delta and rows whose smoothed loss is exactly zero
/// have no defined ratio; both are `None`.
fn rsi(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    if closes.is_empty() {
        return Vec::new();
    }

    let mut gains = ExponentialSmoother::wilder(window);
    let mut losses = ExponentialSmoother::wilder(window);
    let mut out = Vec::with_capacity(closes.len());
    out.push(None);

    for pair in closes.windows(2) {
        let delta = pair[1] - pair[0];
        let gain = gains.next(delta.max(0.0));
        let loss = losses.next((-delta).max(0.0));

        if loss == 0.0 {
            out.push(None);
        } else {
            let rs = gain / loss;
            out.push(Some(100.0 - 100.0 / (1.0 + rs)));
        }
    }
    out
}

fn invalid(kind: &IndicatorKind, e: ta::errors::TaError) -> ExportError {
    ExportError::InvalidParameter {
        indicator: kind.label().to_string(),
        reason: format!("{:?}", e),
    }
}
