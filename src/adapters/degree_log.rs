//! Tab-separated phone log adapter
//!
//! Parses logs exported as `time, ax, ay, az, rx, ry, rz` with rotation rates
//! in degrees per second, encoded as Windows-1252 text with one header row.

use super::{RowOutcome, SensorLogAdapter, SkipReason};
use crate::types::{CanonicalRecord, Vec3};
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::WINDOWS_1252;

/// Populated cells a usable row must carry
pub const REQUIRED_CELLS: usize = 7;

/// Adapter for tab-separated logs with rotation in degrees
#[derive(Debug, Clone, Copy, Default)]
pub struct DegreeLogAdapter;

impl SensorLogAdapter for DegreeLogAdapter {
    fn name(&self) -> &'static str {
        "degree_log"
    }

    fn parse(&self, raw: &[u8]) -> Vec<RowOutcome> {
        let (text, _, _) = WINDOWS_1252.decode(raw);

        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        reader
            .records()
            .map(|result| match result {
                Ok(row) => convert_row(&row),
                Err(e) => RowOutcome::Skipped {
                    line: e.position().map(|p| p.line()),
                    reason: SkipReason::Malformed {
                        detail: e.to_string(),
                    },
                },
            })
            .collect()
    }
}

fn convert_row(row: &StringRecord) -> RowOutcome {
    let line = row.position().map(|p| p.line());
    let skipped = |reason| RowOutcome::Skipped { line, reason };

    let cells: Vec<&str> = row
        .iter()
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .collect();

    if cells.is_empty() {
        return skipped(SkipReason::Blank);
    }
    if cells.len() < REQUIRED_CELLS {
        return skipped(SkipReason::TooFewCells { found: cells.len() });
    }

    let mut values = [0.0; REQUIRED_CELLS];
    for (column, (slot, cell)) in values.iter_mut().zip(&cells).enumerate() {
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => *slot = v,
            _ => return skipped(SkipReason::NotNumeric { column }),
        }
    }

    let [time_s, ax, ay, az, rx_deg, ry_deg, rz_deg] = values;
    let gyro = Vec3::new(rx_deg, ry_deg, rz_deg).to_radians();
    let record = CanonicalRecord::new(time_s, Vec3::new(ax, ay, az), gyro);
    if !(record.accel_magnitude.is_finite() && record.gyro_magnitude.is_finite()) {
        return skipped(SkipReason::Malformed {
            detail: "magnitude exceeds the f64 range".to_string(),
        });
    }
    RowOutcome::Record(record)
}
