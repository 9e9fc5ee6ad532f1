use crate::domain::frame::{AlignedFrame, ExportRow, TimestampLabel};
use crate::domain::indicators::IndicatorSeries;
use crate::domain::market::clock::{Instant, ReferenceZone};

/// Rounds to 3 decimal places; missing and non-finite values become `None`.
pub fn round_or_none(value: Option<f64>) -> Option<f64> {
    let v = value.filter(|v| v.is_finite())?;
    let rounded = (v * 1000.0).round() / 1000.0;
    // avoid exporting "-0.0"
    Some(if rounded == 0.0 { 0.0 } else { rounded })
}

pub fn format_timestamp(instant: &Instant, zone: &ReferenceZone, label: TimestampLabel) -> String {
    match label {
        TimestampLabel::Utc => ReferenceZone::format_utc(instant),
        TimestampLabel::Offset => zone.format_with_offset(instant),
    }
}

/// Attaches every series to the frame in order; later names overwrite earlier ones.
pub fn merge_indicators(frame: &mut AlignedFrame, series: impl IntoIterator<Item = IndicatorSeries>) {
    for s in series {
        frame.attach(s);
    }
}

/// Serializes each frame row: timestamp, OHLCV, then indicator columns in attach order.
pub fn export_rows(frame: &AlignedFrame, zone: &ReferenceZone, label: TimestampLabel) -> Vec<ExportRow> {
    let columns = frame.indicator_columns();

    frame
        .timestamps
        .iter()
        .enumerate()
        .map(|(i, ts)| {
            let mut fields = Vec::with_capacity(5 + columns.len());
            fields.push(("open".to_string(), round_or_none(frame.open[i])));
            fields.push(("high".to_string(), round_or_none(frame.high[i])));
            fields.push(("low".to_string(), round_or_none(frame.low[i])));
            fields.push(("close".to_string(), round_or_none(frame.close[i])));
            fields.push(("volume".to_string(), round_or_none(Some(frame.volume[i]))));
            for (name, values) in columns {
                fields.push((name.clone(), round_or_none(values.get(i).copied().flatten())));
            }

            ExportRow {
                timestamp: format_timestamp(ts, zone, label),
                fields,
            }
        })
        .collect()
}
