//! Raw log normalization
//!
//! This module turns raw sensor logs into canonical records.
//! - Rows go through a [`SensorLogAdapter`]; unusable rows are dropped
//! - Rotation rates are converted to rad/s by the adapter
//! - Both magnitudes are recomputed for every kept row
//! - A [`NormalizationReport`] counts what was kept and why rows were dropped

use crate::adapters::{DegreeLogAdapter, RowOutcome, SensorLogAdapter, SkipReason};
use crate::types::CanonicalRecord;
use serde::Serialize;

/// Row accounting for one normalized file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub skipped_blank: usize,
    pub skipped_too_few_cells: usize,
    pub skipped_not_numeric: usize,
    pub skipped_malformed: usize,
    /// Line of the first dropped row, for diagnostics
    pub first_skipped_line: Option<u64>,
}

impl NormalizationReport {
    pub fn rows_skipped(&self) -> usize {
        self.rows_read - self.rows_kept
    }

    fn record_skip(&mut self, line: Option<u64>, reason: &SkipReason) {
        match reason {
            SkipReason::Blank => self.skipped_blank += 1,
            SkipReason::TooFewCells { .. } => self.skipped_too_few_cells += 1,
            SkipReason::NotNumeric { .. } => self.skipped_not_numeric += 1,
            SkipReason::Malformed { .. } => self.skipped_malformed += 1,
        }
        if self.first_skipped_line.is_none() {
            self.first_skipped_line = line;
        }
    }
}

/// Records recovered from one raw log, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLog {
    pub records: Vec<CanonicalRecord>,
    pub report: NormalizationReport,
}

/// Normalizer for converting raw logs to canonical records
pub struct Normalizer;

impl Normalizer {
    /// Normalize a raw log in the tab-separated degrees layout
    pub fn normalize(raw: &[u8]) -> NormalizedLog {
        Self::normalize_with(&DegreeLogAdapter, raw)
    }

    /// Normalize a raw log with a specific adapter
    pub fn normalize_with(adapter: &dyn SensorLogAdapter, raw: &[u8]) -> NormalizedLog {
        let mut report = NormalizationReport::default();
        let mut records = Vec::new();

        for outcome in adapter.parse(raw) {
            report.rows_read += 1;
            match outcome {
                RowOutcome::Record(record) => {
                    report.rows_kept += 1;
                    records.push(record);
                }
                RowOutcome::Skipped { line, reason } => {
                    tracing::trace!(adapter = adapter.name(), ?line, %reason, "dropping row");
                    report.record_skip(line, &reason);
                }
            }
        }

        NormalizedLog { records, report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{decode_document, CanonicalEncoder, Precision};
    use crate::types::Vec3;
    use pretty_assertions::assert_eq;

    fn sample_log() -> String {
        [
            "Time (s)\tAx\tAy\tAz\tRx\tRy\tRz",
            "0.000\t0.12\t9.79\t0.30\t1.5\t-2.0\t0.5",
            "0.010\t0.10\t9.81",
            "0.020\t0.08\t9.83\t0.28\t180.0\t0.0\t0.0",
            "0.030\tx\t9.80\t0.29\t1.0\t1.0\t1.0",
            "0.040\t-3.50\t22.10\t4.75\t45.0\t90.0\t-30.0",
        ]
        .join("\n")
    }

    #[test]
    fn test_report_counts() {
        let log = Normalizer::normalize(sample_log().as_bytes());

        assert_eq!(
            log.report,
            NormalizationReport {
                rows_read: 5,
                rows_kept: 3,
                skipped_blank: 0,
                skipped_too_few_cells: 1,
                skipped_not_numeric: 1,
                skipped_malformed: 0,
                first_skipped_line: Some(3),
            }
        );
        assert_eq!(log.report.rows_skipped(), 2);
    }

    #[test]
    fn test_order_preserved_around_bad_rows() {
        let log = Normalizer::normalize(sample_log().as_bytes());
        let times: Vec<f64> = log.records.iter().map(|r| r.time_s).collect();
        assert_eq!(times, vec![0.0, 0.02, 0.04]);
    }

    #[test]
    fn test_half_turn_is_pi() {
        let log = Normalizer::normalize(sample_log().as_bytes());
        let gyro = log.records[1].gyro;
        assert!((gyro.x - std::f64::consts::PI).abs() < 1e-6);
        assert!((log.records[1].gyro_magnitude - std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_magnitudes_hold_after_rendering() {
        let log = Normalizer::normalize(sample_log().as_bytes());
        let document = CanonicalEncoder::new(Precision::NORMALIZED)
            .encode_document(&log.records)
            .unwrap();
        let tolerance = 4.0 * Precision::NORMALIZED.value_tolerance();

        for line in document.lines().skip(1) {
            let f = crate::encoder::parse_fields(line).unwrap();
            let svm = (f[1] * f[1] + f[2] * f[2] + f[3] * f[3]).sqrt();
            let gyro = (f[5] * f[5] + f[6] * f[6] + f[7] * f[7]).sqrt();
            assert!((f[4] - svm).abs() <= tolerance);
            assert!((f[8] - gyro).abs() <= tolerance);
        }
    }

    #[test]
    fn test_second_pass_reproduces_values() {
        let encoder = CanonicalEncoder::new(Precision::NORMALIZED);
        let first = Normalizer::normalize(sample_log().as_bytes());
        let second = Normalizer::normalize(sample_log().as_bytes());
        assert_eq!(
            encoder.encode_document(&first.records).unwrap(),
            encoder.encode_document(&second.records).unwrap()
        );

        // Re-reading the canonical output recovers the same samples up to precision
        let document = encoder.encode_document(&first.records).unwrap();
        let reread = decode_document(&document);
        assert_eq!(reread.len(), first.records.len());
        for (a, b) in reread.iter().zip(&first.records) {
            assert!((a.time_s - b.time_s).abs() < 1e-3);
            assert!((a.accel_magnitude - b.accel_magnitude).abs() < 1e-5);
            assert!((a.gyro_magnitude - b.gyro_magnitude).abs() < 1e-5);
        }
    }

    #[test]
    fn test_header_only_log() {
        let log = Normalizer::normalize(b"Time (s)\tAx\tAy\tAz\tRx\tRy\tRz\n");
        assert!(log.records.is_empty());
        assert_eq!(log.report, NormalizationReport::default());
    }

    #[test]
    fn test_accel_passed_through_unchanged() {
        let log = Normalizer::normalize(sample_log().as_bytes());
        assert_eq!(log.records[2].accel, Vec3::new(-3.5, 22.1, 4.75));
    }
}
