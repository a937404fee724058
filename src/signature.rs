//! Fall signature measurement
//!
//! Summarizes a trace in terms of the three signatures a fall detector keys
//! on: a sustained vertical deceleration ramp, a sustained low-SVM interval
//! and an impact spike. Used to check that synthesized scenarios carry (or
//! deliberately miss) those signatures, and by `falltrace inspect`.
//!
//! The thresholds are parameters, not constants of the data.

use crate::types::CanonicalRecord;
use serde::{Deserialize, Serialize};

/// Thresholds the signatures are measured against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignatureThresholds {
    /// Vertical rate of change (m/s² per s) a braking ramp must stay below
    pub deceleration_slope: f64,
    /// SVM (m/s²) a freefall sample must stay below
    pub freefall_ceiling: f64,
    /// SVM (m/s²) an impact sample must exceed
    pub impact_floor: f64,
    /// Minimum duration (s) of a sustained deceleration or freefall
    pub min_event_duration_s: f64,
}

impl Default for SignatureThresholds {
    fn default() -> Self {
        Self {
            deceleration_slope: -15.0,
            freefall_ceiling: 2.0,
            impact_floor: 25.0,
            min_event_duration_s: 0.2,
        }
    }
}

/// A run of consecutive qualifying samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub start_index: usize,
    pub start_s: f64,
    pub end_s: f64,
}

impl Interval {
    pub fn duration_s(&self) -> f64 {
        self.end_s - self.start_s
    }
}

/// Signature summary of one trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallSignatures {
    pub samples: usize,
    /// Row index of the largest SVM
    pub peak_index: Option<usize>,
    pub peak_time_s: Option<f64>,
    pub peak_magnitude: Option<f64>,
    /// Most negative vertical rate of change
    pub steepest_vertical_rate: Option<f64>,
    pub longest_deceleration: Option<Interval>,
    pub longest_low_interval: Option<Interval>,
    pub longest_low_interval_s: f64,
    pub impact_count: usize,
    pub deceleration_detected: bool,
    pub freefall_detected: bool,
}

impl FallSignatures {
    /// Measure a trace against `thresholds`
    pub fn measure(records: &[CanonicalRecord], thresholds: &SignatureThresholds) -> Self {
        let peak = records
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.accel_magnitude.total_cmp(&b.1.accel_magnitude));

        let rates: Vec<Option<f64>> = records
            .iter()
            .enumerate()
            .map(|(i, current)| {
                let previous = records.get(i.checked_sub(1)?)?;
                let dt = current.time_s - previous.time_s;
                (dt != 0.0).then(|| (current.accel.y - previous.accel.y) / dt)
            })
            .collect();

        let steepest_vertical_rate = rates.iter().flatten().copied().reduce(f64::min);

        let longest_deceleration = longest_run(records, |i| {
            rates[i].is_some_and(|rate| rate < thresholds.deceleration_slope)
        });
        let longest_low_interval = longest_run(records, |i| {
            records[i].accel_magnitude < thresholds.freefall_ceiling
        });

        let impact_count = records
            .iter()
            .filter(|r| r.accel_magnitude > thresholds.impact_floor)
            .count();

        let sustained = |interval: &Option<Interval>| {
            interval.is_some_and(|iv| iv.duration_s() >= thresholds.min_event_duration_s)
        };

        Self {
            samples: records.len(),
            peak_index: peak.map(|(i, _)| i),
            peak_time_s: peak.map(|(_, r)| r.time_s),
            peak_magnitude: peak.map(|(_, r)| r.accel_magnitude),
            steepest_vertical_rate,
            deceleration_detected: sustained(&longest_deceleration),
            freefall_detected: sustained(&longest_low_interval),
            longest_low_interval_s: longest_low_interval.map_or(0.0, |iv| iv.duration_s()),
            longest_deceleration,
            longest_low_interval,
            impact_count,
        }
    }

    /// All three signatures are present
    pub fn is_fall_pattern(&self) -> bool {
        self.deceleration_detected && self.freefall_detected && self.impact_count > 0
    }
}

/// Longest run of consecutive indices satisfying `qualifies`.
///
/// A run ends at the time of the first sample that no longer qualifies, or
/// at the last sample if it reaches the end of the trace.
fn longest_run<F>(records: &[CanonicalRecord], qualifies: F) -> Option<Interval>
where
    F: Fn(usize) -> bool,
{
    let mut best: Option<Interval> = None;
    let mut open: Option<usize> = None;

    let close = |start: usize, end_index: usize, best: &mut Option<Interval>| {
        let interval = Interval {
            start_index: start,
            start_s: records[start].time_s,
            end_s: records[end_index].time_s,
        };
        if best.map_or(true, |b| interval.duration_s() > b.duration_s()) {
            *best = Some(interval);
        }
    };

    for index in 0..records.len() {
        match (qualifies(index), open) {
            (true, None) => open = Some(index),
            (false, Some(start)) => {
                close(start, index, &mut best);
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        close(start, records.len() - 1, &mut best);
    }

    best
}
