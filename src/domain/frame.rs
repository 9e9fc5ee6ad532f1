use crate::domain::indicators::IndicatorSeries;
use crate::domain::market::clock::Instant;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

pub const BASE_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Grid-keyed table of base OHLCV columns plus ordered indicator columns.
///
/// Every column has exactly one entry per grid timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedFrame {
    pub timestamps: Vec<Instant>,
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub volume: Vec<f64>,
    indicators: Vec<(String, Vec<Option<f64>>)>,
}

impl AlignedFrame {
    /// Frame of gap rows: prices absent, volume zero.
    pub fn empty(timestamps: Vec<Instant>) -> Self {
        let n = timestamps.len();
        Self {
            timestamps,
            open: vec![None; n],
            high: vec![None; n],
            low: vec![None; n],
            close: vec![None; n],
            volume: vec![0.0; n],
            indicators: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn indicator_columns(&self) -> &[(String, Vec<Option<f64>>)] {
        &self.indicators
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.indicators
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Attaches an indicator output.
    ///
    /// Values are right-aligned: the last value lines up with the last row and
    /// missing head rows stay `None`. A column whose name already exists is
    /// overwritten in place, base OHLCV columns included; missing volume
    /// becomes zero.
    pub fn attach(&mut self, series: IndicatorSeries) {
        match series {
            IndicatorSeries::Single { name, values } => self.set_column(name, values),
            IndicatorSeries::Bundle { columns } => {
                for (name, values) in columns {
                    self.set_column(name, values);
                }
            }
        }
    }

    fn set_column(&mut self, name: String, values: Vec<Option<f64>>) {
        let aligned = right_align(values, self.len());
        match name.as_str() {
            "open" => self.open = aligned,
            "high" => self.high = aligned,
            "low" => self.low = aligned,
            "close" => self.close = aligned,
            "volume" => self.volume = aligned.into_iter().map(|v| v.unwrap_or(0.0)).collect(),
            _ => match self.indicators.iter_mut().find(|(n, _)| *n == name) {
                Some((_, existing)) => *existing = aligned,
                None => self.indicators.push((name, aligned)),
            },
        }
    }

    /// Drops all but the last `n` rows of every column.
    pub fn keep_last(&mut self, n: usize) {
        if self.len() <= n {
            return;
        }
        let cut = self.len() - n;
        self.timestamps.drain(..cut);
        self.open.drain(..cut);
        self.high.drain(..cut);
        self.low.drain(..cut);
        self.close.drain(..cut);
        self.volume.drain(..cut);
        for (_, values) in self.indicators.iter_mut() {
            values.drain(..cut);
        }
    }
}

fn right_align(mut values: Vec<Option<f64>>, len: usize) -> Vec<Option<f64>> {
    if values.len() >= len {
        values.drain(..values.len() - len);
        return values;
    }
    let mut aligned = vec![None; len - values.len()];
    aligned.append(&mut values);
    aligned
}

/// How export timestamps carry their zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampLabel {
    /// Converted to UTC with a literal ` UTC` suffix
    Utc,
    /// Reference-zone wall clock with a signed `+-HHMM` offset
    Offset,
}

/// One serialized frame row.
///
/// Serializes as a JSON object: `timestamp`, then fields in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub timestamp: String,
    pub fields: Vec<(String, Option<f64>)>,
}

impl ExportRow {
    pub fn get(&self, field: &str) -> Option<Option<f64>> {
        self.fields.iter().find(|(n, _)| n == field).map(|(_, v)| *v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once("timestamp").chain(self.fields.iter().map(|(n, _)| n.as_str()))
    }
}

impl Serialize for ExportRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("timestamp", &self.timestamp)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::clock::ReferenceZone;

    fn frame(n: usize) -> AlignedFrame {
        let zone = ReferenceZone::default();
        let ts = (0..n)
            .map(|i| zone.from_epoch_seconds(1_761_832_800 + 60 * i as i64).unwrap())
            .collect();
        AlignedFrame::empty(ts)
    }

    #[test]
    fn test_attach_right_aligns_short_series() {
        let mut f = frame(4);
        f.attach(IndicatorSeries::Single {
            name: "ema2".to_string(),
            values: vec![Some(1.0), Some(2.0)],
        });
        assert_eq!(f.column("ema2").unwrap(), &[None, None, Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_attach_long_series_keeps_tail() {
        let mut f = frame(2);
        f.attach(IndicatorSeries::Single {
            name: "x".to_string(),
            values: vec![Some(1.0), Some(2.0), Some(3.0)],
        });
        assert_eq!(f.column("x").unwrap(), &[Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_collision_overwrites_in_place() {
        let mut f = frame(1);
        f.attach(IndicatorSeries::Single {
            name: "a".to_string(),
            values: vec![Some(1.0)],
        });
        f.attach(IndicatorSeries::Single {
            name: "b".to_string(),
            values: vec![Some(2.0)],
        });
        f.attach(IndicatorSeries::Single {
            name: "a".to_string(),
            values: vec![Some(3.0)],
        });
        let names: Vec<&str> = f.indicator_columns().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(f.column("a").unwrap(), &[Some(3.0)]);
    }

    #[test]
    fn test_base_column_names_overwrite_base_columns() {
        let mut f = frame(3);
        f.attach(IndicatorSeries::Single {
            name: "close".to_string(),
            values: vec![Some(7.0), Some(8.0)],
        });
        f.attach(IndicatorSeries::Bundle {
            columns: vec![
                ("volume".to_string(), vec![Some(5.0), None]),
                ("extra".to_string(), vec![Some(1.0)]),
            ],
        });

        assert_eq!(f.close, vec![None, Some(7.0), Some(8.0)]);
        assert_eq!(f.volume, vec![0.0, 5.0, 0.0]);
        assert_eq!(f.open, vec![None; 3]);
        let names: Vec<&str> = f.indicator_columns().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["extra"]);
    }

    #[test]
    fn test_keep_last_trims_all_columns() {
        let mut f = frame(5);
        f.attach(IndicatorSeries::Single {
            name: "x".to_string(),
            values: (0..5).map(|i| Some(i as f64)).collect(),
        });
        let last_ts = f.timestamps[4];
        f.keep_last(2);
        assert_eq!(f.len(), 2);
        assert_eq!(f.volume.len(), 2);
        assert_eq!(f.timestamps[1], last_ts);
        assert_eq!(f.column("x").unwrap(), &[Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_export_row_serializes_in_field_order() {
        let row = ExportRow {
            timestamp: "2025-10-30 10:00:00 -0400".to_string(),
            fields: vec![
                ("open".to_string(), Some(1.5)),
                ("volume".to_string(), Some(0.0)),
                ("rsi14".to_string(), None),
            ],
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":"2025-10-30 10:00:00 -0400","open":1.5,"volume":0.0,"rsi14":null}"#
        );
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["timestamp", "open", "volume", "rsi14"]);
    }
}
