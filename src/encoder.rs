//! Canonical CSV encoding
//!
//! This module renders [`CanonicalRecord`]s into the shared tab-separated
//! layout that the downstream detector reads, and reads that layout back.
//! Both producers go through [`CanonicalEncoder`]; they differ only in the
//! decimal [`Precision`] they render with.

use crate::error::FallTraceError;
use crate::types::{CanonicalRecord, Vec3};

/// Fixed header line shared by every producer
pub const CANONICAL_HEADER: &str = "Time (s)\tAcceleration x (m/s^2)\tAcceleration y (m/s^2)\t\
Acceleration z (m/s^2)\tAbsolute acceleration (m/s^2)\t\
Gyroscope x (rad/s)\tGyroscope y (rad/s)\tGyroscope z (rad/s)\t\
Gyroscope magnitude (rad/s)";

/// Number of fields in a canonical row
pub const FIELD_COUNT: usize = 9;

/// Decimal places used when rendering a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    /// Decimals for the time column
    pub time: usize,
    /// Decimals for every acceleration and gyroscope column
    pub value: usize,
}

impl Precision {
    /// Precision of synthesized traces
    pub const SYNTHESIZED: Precision = Precision { time: 2, value: 4 };

    /// Precision of normalized sensor logs
    pub const NORMALIZED: Precision = Precision { time: 3, value: 6 };

    /// Largest rounding error a rendered value field can carry
    pub fn value_tolerance(&self) -> f64 {
        0.5 * 10f64.powi(-(self.value as i32))
    }
}

/// Encoder for the canonical tab-separated layout
#[derive(Debug, Clone, Copy)]
pub struct CanonicalEncoder {
    precision: Precision,
}

impl CanonicalEncoder {
    pub fn new(precision: Precision) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Render one record as a tab-joined row (no line terminator)
    pub fn encode_row(&self, record: &CanonicalRecord) -> String {
        let t = self.precision.time;
        let v = self.precision.value;
        format!(
            "{:.t$}\t{:.v$}\t{:.v$}\t{:.v$}\t{:.v$}\t{:.v$}\t{:.v$}\t{:.v$}\t{:.v$}",
            record.time_s,
            record.accel.x,
            record.accel.y,
            record.accel.z,
            record.accel_magnitude,
            record.gyro.x,
            record.gyro.y,
            record.gyro.z,
            record.gyro_magnitude,
        )
    }

    /// Render a full document: header followed by newline-joined rows.
    ///
    /// Fails on any non-finite component or magnitude, so every rendered
    /// field is a plain decimal number.
    pub fn encode_document(&self, records: &[CanonicalRecord]) -> Result<String, FallTraceError> {
        let mut lines = Vec::with_capacity(records.len() + 1);
        lines.push(CANONICAL_HEADER.to_string());
        for (index, record) in records.iter().enumerate() {
            if !is_finite(record) {
                return Err(FallTraceError::Encoding(format!(
                    "record {index} contains a non-finite value"
                )));
            }
            lines.push(self.encode_row(record));
        }

        Ok(lines.join("\n"))
    }
}

fn is_finite(record: &CanonicalRecord) -> bool {
    [
        record.time_s,
        record.accel.x,
        record.accel.y,
        record.accel.z,
        record.accel_magnitude,
        record.gyro.x,
        record.gyro.y,
        record.gyro.z,
        record.gyro_magnitude,
    ]
    .iter()
    .all(|v| v.is_finite())
}

/// Parse the nine numeric fields of a canonical data row
pub fn parse_fields(line: &str) -> Option<[f64; FIELD_COUNT]> {
    let mut fields = [0.0; FIELD_COUNT];
    let mut cells = line.split('\t');
    for slot in fields.iter_mut() {
        *slot = cells.next()?.trim().parse().ok()?;
    }
    if cells.next().is_some() {
        return None;
    }
    Some(fields)
}

/// Read a canonical document back into records.
///
/// The header line is skipped. Magnitude columns are ignored and
/// recomputed from the components; rows that do not carry nine numeric
/// fields are skipped.
pub fn decode_document(text: &str) -> Vec<CanonicalRecord> {
    text.lines()
        .skip(1)
        .filter_map(parse_fields)
        .map(|f| {
            CanonicalRecord::new(
                f[0],
                Vec3::new(f[1], f[2], f[3]),
                Vec3::new(f[5], f[6], f[7]),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_record() -> CanonicalRecord {
        CanonicalRecord::new(
            8.8,
            Vec3::new(15.0, 35.0, 20.0),
            Vec3::new(4.0, 4.5, 5.0),
        )
    }

    #[test]
    fn test_header_has_nine_columns() {
        assert_eq!(CANONICAL_HEADER.split('\t').count(), FIELD_COUNT);
        assert!(CANONICAL_HEADER.starts_with("Time (s)\tAcceleration x (m/s^2)"));
        assert!(CANONICAL_HEADER.ends_with("\tGyroscope magnitude (rad/s)"));
    }

    #[test]
    fn test_encode_row_synthesized_precision() {
        let encoder = CanonicalEncoder::new(Precision::SYNTHESIZED);
        let row = encoder.encode_row(&sample_record());

        assert_eq!(
            row,
            "8.80\t15.0000\t35.0000\t20.0000\t43.0116\t4.0000\t4.5000\t5.0000\t7.8262"
        );
    }

    #[test]
    fn test_encode_row_normalized_precision() {
        let encoder = CanonicalEncoder::new(Precision::NORMALIZED);
        let record = CanonicalRecord::new(0.001, Vec3::new(0.0, 9.81, 0.0), Vec3::ZERO);

        assert_eq!(
            encoder.encode_row(&record),
            "0.001\t0.000000\t9.810000\t0.000000\t9.810000\t0.000000\t0.000000\t0.000000\t0.000000"
        );
    }

    #[test]
    fn test_document_layout() {
        let encoder = CanonicalEncoder::new(Precision::SYNTHESIZED);
        let records = vec![sample_record(), sample_record()];
        let document = encoder.encode_document(&records).unwrap();

        let lines: Vec<&str> = document.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CANONICAL_HEADER);
        assert!(!document.ends_with('\n'));
        assert!(document.is_ascii());
    }

    #[test]
    fn test_non_finite_record_rejected() {
        let encoder = CanonicalEncoder::new(Precision::SYNTHESIZED);
        let record = CanonicalRecord::new(0.0, Vec3::new(f64::NAN, 0.0, 0.0), Vec3::ZERO);

        assert!(encoder.encode_document(&[record]).is_err());
    }

    #[test]
    fn test_overflowing_magnitude_rejected() {
        let encoder = CanonicalEncoder::new(Precision::NORMALIZED);
        let record = CanonicalRecord::new(0.0, Vec3::new(f64::MAX, f64::MAX, 0.0), Vec3::ZERO);

        assert!(record.accel_magnitude.is_infinite());
        assert!(matches!(
            encoder.encode_document(&[record]),
            Err(FallTraceError::Encoding(_))
        ));
    }

    #[test]
    fn test_decode_recomputes_magnitudes() {
        let text = format!(
            "{CANONICAL_HEADER}\n0.00\t3.0000\t4.0000\t0.0000\t99.0000\t0.0000\t0.0000\t2.0000\t0.0000\nnot a row"
        );
        let records = decode_document(&text);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].accel_magnitude, 5.0);
        assert_eq!(records[0].gyro_magnitude, 2.0);
    }

    #[test]
    fn test_parse_fields_rejects_wrong_width() {
        assert!(parse_fields("1\t2\t3").is_none());
        assert!(parse_fields("1\t2\t3\t4\t5\t6\t7\t8\t9\t10").is_none());
        assert!(parse_fields("1\t2\t3\t4\t5\t6\t7\t8\t9").is_some());
    }
}
