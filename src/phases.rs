//! Motion phases and their signal models
//!
//! A scenario is an ordered [`PhaseTable`]: contiguous, half-open sample
//! ranges that together cover `[0, sample_count)`. Each [`PhaseSpan`] carries
//! an acceleration model and a gyroscope model. The table is validated once
//! at construction, so lookup during synthesis cannot miss.

use crate::error::FallTraceError;
use crate::types::{Vec3, GRAVITY};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Label of a motion phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    /// Normal, non-eventful motion
    Baseline,
    /// Sustained braking ramp on the vertical axis
    Deceleration,
    /// Short acceleration bump of a look-alike event
    Spike,
    /// Near-weightlessness
    Freefall,
    /// Ground contact, exactly one sample
    Impact,
    /// Everything after the impact
    PostImpact,
}

impl PhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Baseline => "baseline",
            PhaseKind::Deceleration => "deceleration",
            PhaseKind::Spike => "spike",
            PhaseKind::Freefall => "freefall",
            PhaseKind::Impact => "impact",
            PhaseKind::PostImpact => "post_impact",
        }
    }
}

/// Shape of a deceleration ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RampShape {
    #[default]
    Linear,
    /// Quarter-sine ease from the start value to the end value
    Smooth,
}

/// Acceleration model of a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum AccelModel {
    /// Gravity on the vertical axis plus Gaussian noise on every axis
    Baseline { noise_std: f64 },
    /// Vertical axis ramps from `start` to `end` over the phase
    Deceleration {
        start: f64,
        end: f64,
        #[serde(default)]
        shape: RampShape,
        lateral_noise_std: f64,
    },
    /// Half-sine bump of `amplitude` on top of gravity
    Bump {
        amplitude: f64,
        lateral_noise_std: f64,
    },
    /// Zero-mean noise on every axis, kept strictly below `ceiling` in norm
    Freefall { noise_std: f64, ceiling: f64 },
    /// Gaussian spike per axis, kept strictly above `floor` in norm
    Impact { mean: Vec3, std: Vec3, floor: f64 },
    /// Per-axis sinusoids around gravity (recovering person)
    Active {
        amplitude: f64,
        frequencies_hz: Vec3,
        phases_rad: Vec3,
    },
}

/// Gyroscope model of a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum GyroModel {
    Gaussian { mean: Vec3, std: Vec3 },
    Sinusoid {
        amplitude: Vec3,
        frequencies_hz: Vec3,
        phases_rad: Vec3,
    },
}

/// Position of a sample inside its phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseContext {
    /// `(index - start) / (end - start)`, in `[0, 1)`
    pub progress: f64,
    /// Seconds since the first sample of the phase
    pub elapsed_s: f64,
}

fn gauss<R: Rng + ?Sized>(rng: &mut R, mean: f64, std: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mean + std * z
}

fn sinusoid(amplitude: f64, frequency_hz: f64, phase_rad: f64, t: f64) -> f64 {
    amplitude * (TAU * frequency_hz * t + phase_rad).sin()
}

impl AccelModel {
    /// Draw one acceleration sample
    pub fn sample<R: Rng + ?Sized>(&self, ctx: PhaseContext, rng: &mut R) -> Vec3 {
        match *self {
            AccelModel::Baseline { noise_std } => Vec3::new(
                gauss(rng, 0.0, noise_std),
                GRAVITY + gauss(rng, 0.0, noise_std),
                gauss(rng, 0.0, noise_std),
            ),
            AccelModel::Deceleration {
                start,
                end,
                shape,
                lateral_noise_std,
            } => {
                let weight = match shape {
                    RampShape::Linear => ctx.progress,
                    RampShape::Smooth => (ctx.progress * FRAC_PI_2).sin(),
                };
                let x = gauss(rng, 0.0, lateral_noise_std);
                let z = gauss(rng, 0.0, lateral_noise_std);
                Vec3::new(x, start + (end - start) * weight, z)
            }
            AccelModel::Bump {
                amplitude,
                lateral_noise_std,
            } => {
                let x = gauss(rng, 0.0, lateral_noise_std);
                let z = gauss(rng, 0.0, lateral_noise_std);
                Vec3::new(x, GRAVITY + amplitude * (ctx.progress * PI).sin(), z)
            }
            AccelModel::Freefall { noise_std, ceiling } => {
                let v = Vec3::new(
                    gauss(rng, 0.0, noise_std),
                    gauss(rng, 0.0, noise_std),
                    gauss(rng, 0.0, noise_std),
                );
                let limit = ceiling * 0.9;
                let m = v.magnitude();
                if m > limit {
                    v.scaled(limit / m)
                } else {
                    v
                }
            }
            AccelModel::Impact { mean, std, floor } => {
                let v = Vec3::new(
                    gauss(rng, mean.x, std.x),
                    gauss(rng, mean.y, std.y),
                    gauss(rng, mean.z, std.z),
                );
                let target = floor * 1.1;
                let m = v.magnitude();
                if m >= target {
                    v
                } else if m > 0.0 {
                    v.scaled(target / m)
                } else {
                    Vec3::new(0.0, target, 0.0)
                }
            }
            AccelModel::Active {
                amplitude,
                frequencies_hz,
                phases_rad,
            } => {
                let t = ctx.elapsed_s;
                Vec3::new(
                    sinusoid(amplitude, frequencies_hz.x, phases_rad.x, t),
                    GRAVITY + sinusoid(amplitude, frequencies_hz.y, phases_rad.y, t),
                    sinusoid(amplitude, frequencies_hz.z, phases_rad.z, t),
                )
            }
        }
    }

    fn validate(&self) -> Result<(), String> {
        let ok = match self {
            AccelModel::Baseline { noise_std } => valid_std(*noise_std),
            AccelModel::Deceleration {
                start,
                end,
                lateral_noise_std,
                ..
            } => start.is_finite() && end.is_finite() && valid_std(*lateral_noise_std),
            AccelModel::Bump {
                amplitude,
                lateral_noise_std,
            } => amplitude.is_finite() && valid_std(*lateral_noise_std),
            AccelModel::Freefall { noise_std, ceiling } => {
                valid_std(*noise_std) && ceiling.is_finite() && *ceiling > 0.0
            }
            AccelModel::Impact { mean, std, floor } => {
                finite(mean) && valid_std3(std) && floor.is_finite() && *floor >= 0.0
            }
            AccelModel::Active {
                amplitude,
                frequencies_hz,
                phases_rad,
            } => amplitude.is_finite() && finite(frequencies_hz) && finite(phases_rad),
        };
        if ok {
            Ok(())
        } else {
            Err(format!("invalid acceleration parameters: {self:?}"))
        }
    }
}

impl GyroModel {
    /// Draw one angular-rate sample
    pub fn sample<R: Rng + ?Sized>(&self, ctx: PhaseContext, rng: &mut R) -> Vec3 {
        match *self {
            GyroModel::Gaussian { mean, std } => Vec3::new(
                gauss(rng, mean.x, std.x),
                gauss(rng, mean.y, std.y),
                gauss(rng, mean.z, std.z),
            ),
            GyroModel::Sinusoid {
                amplitude,
                frequencies_hz,
                phases_rad,
            } => {
                let t = ctx.elapsed_s;
                Vec3::new(
                    sinusoid(amplitude.x, frequencies_hz.x, phases_rad.x, t),
                    sinusoid(amplitude.y, frequencies_hz.y, phases_rad.y, t),
                    sinusoid(amplitude.z, frequencies_hz.z, phases_rad.z, t),
                )
            }
        }
    }

    fn validate(&self) -> Result<(), String> {
        let ok = match self {
            GyroModel::Gaussian { mean, std } => finite(mean) && valid_std3(std),
            GyroModel::Sinusoid {
                amplitude,
                frequencies_hz,
                phases_rad,
            } => finite(amplitude) && finite(frequencies_hz) && finite(phases_rad),
        };
        if ok {
            Ok(())
        } else {
            Err(format!("invalid gyroscope parameters: {self:?}"))
        }
    }
}

fn valid_std(std: f64) -> bool {
    std.is_finite() && std >= 0.0
}

fn valid_std3(std: &Vec3) -> bool {
    valid_std(std.x) && valid_std(std.y) && valid_std(std.z)
}

fn finite(v: &Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// One named interval `[start, end)` of sample indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpan {
    pub kind: PhaseKind,
    pub start: usize,
    pub end: usize,
    pub accel: AccelModel,
    pub gyro: GyroModel,
}

impl PhaseSpan {
    pub fn new(kind: PhaseKind, start: usize, end: usize, accel: AccelModel, gyro: GyroModel) -> Self {
        Self {
            kind,
            start,
            end,
            accel,
            gyro,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Position of `index` inside this span
    pub fn context(&self, index: usize, delta_t: f64) -> PhaseContext {
        let offset = index - self.start;
        PhaseContext {
            progress: offset as f64 / self.len() as f64,
            elapsed_s: offset as f64 * delta_t,
        }
    }
}

/// Ordered, gap-free, non-overlapping partition of `[0, sample_count)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTable {
    spans: Vec<PhaseSpan>,
    sample_count: usize,
}

impl PhaseTable {
    /// Build a table, rejecting any layout that is not an exact partition
    pub fn new(spans: Vec<PhaseSpan>, sample_count: usize) -> Result<Self, FallTraceError> {
        if spans.is_empty() {
            return Err(FallTraceError::InvalidPhaseTable(
                "a scenario needs at least one phase".to_string(),
            ));
        }

        let mut cursor = 0;
        for span in &spans {
            let label = span.kind.as_str();
            if span.start != cursor {
                return Err(FallTraceError::InvalidPhaseTable(format!(
                    "{label} starts at {} but the previous phase ends at {cursor}",
                    span.start
                )));
            }
            if span.is_empty() {
                return Err(FallTraceError::InvalidPhaseTable(format!(
                    "{label} has an empty range [{}, {})",
                    span.start, span.end
                )));
            }
            if span.kind == PhaseKind::Impact && span.len() != 1 {
                return Err(FallTraceError::InvalidPhaseTable(format!(
                    "impact must be exactly one sample wide, got {}",
                    span.len()
                )));
            }
            span.accel
                .validate()
                .and_then(|_| span.gyro.validate())
                .map_err(|e| FallTraceError::InvalidPhaseTable(format!("{label}: {e}")))?;
            cursor = span.end;
        }

        if cursor != sample_count {
            return Err(FallTraceError::InvalidPhaseTable(format!(
                "phases cover [0, {cursor}) but the scenario has {sample_count} samples"
            )));
        }

        Ok(Self {
            spans,
            sample_count,
        })
    }

    pub fn spans(&self) -> &[PhaseSpan] {
        &self.spans
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Phase containing `index`; first match in declared order
    pub fn lookup(&self, index: usize) -> Option<&PhaseSpan> {
        self.spans.iter().find(|span| span.contains(index))
    }

    /// First span of the given kind
    pub fn find(&self, kind: PhaseKind) -> Option<&PhaseSpan> {
        self.spans.iter().find(|span| span.kind == kind)
    }
}

impl<'de> Deserialize<'de> for PhaseTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RawTable {
            spans: Vec<PhaseSpan>,
            sample_count: usize,
        }

        let raw = RawTable::deserialize(deserializer)?;
        PhaseTable::new(raw.spans, raw.sample_count).map_err(serde::de::Error::custom)
    }
}
