//! Scenario configuration
//!
//! A [`ScenarioConfig`] is everything the synthesizer needs: a seed, the
//! sampling grid and the phase table. Three scenarios are built in; custom
//! ones can be loaded from JSON and are validated the same way.

use crate::error::FallTraceError;
use crate::phases::{AccelModel, GyroModel, PhaseKind, PhaseSpan, PhaseTable, RampShape};
use crate::types::{Vec3, GRAVITY};
use serde::{Deserialize, Serialize};

/// Samples per built-in trace
pub const SAMPLE_COUNT: usize = 1000;

/// Sampling interval of built-in traces (50 Hz)
pub const DELTA_T: f64 = 0.02;

/// Vertical acceleration reached at the end of the braking ramp
pub const DECELERATION_TARGET: f64 = -20.0;

/// Norm ceiling enforced on freefall samples
pub const FREEFALL_CEILING: f64 = 2.0;

/// Norm floor enforced on impact samples
pub const IMPACT_FLOOR: f64 = 25.0;

// Real fall: 8 s riding, 0.5 s braking, 0.3 s freefall, impact at 8.8 s
const FALL_BASELINE_END: usize = 400;
const FALL_DECELERATION_END: usize = 425;
const FALL_FREEFALL_END: usize = 440;

// Look-alike: 0.1 s bump, 0.1 s low interval, impact at 8.2 s
const LOOKALIKE_BASELINE_END: usize = 400;
const LOOKALIKE_SPIKE_END: usize = 405;
const LOOKALIKE_LOW_END: usize = 410;

/// Full description of one synthesized trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub seed: u64,
    /// Sampling interval in seconds
    pub delta_t: f64,
    pub phases: PhaseTable,
}

impl ScenarioConfig {
    pub fn new(
        name: impl Into<String>,
        seed: u64,
        delta_t: f64,
        phases: PhaseTable,
    ) -> Result<Self, FallTraceError> {
        let config = Self {
            name: name.into(),
            seed,
            delta_t,
            phases,
        };
        config.validate()?;
        Ok(config)
    }

    /// Same scenario with a different seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn sample_count(&self) -> usize {
        self.phases.sample_count()
    }

    /// Check the parts a phase table cannot check on its own
    pub fn validate(&self) -> Result<(), FallTraceError> {
        if self.name.trim().is_empty() {
            return Err(FallTraceError::InvalidScenario(
                "scenario name must not be empty".to_string(),
            ));
        }
        if !self.delta_t.is_finite() || self.delta_t <= 0.0 {
            return Err(FallTraceError::InvalidScenario(format!(
                "delta_t must be positive, got {}",
                self.delta_t
            )));
        }
        Ok(())
    }

    /// Load and validate a scenario from JSON
    pub fn from_json(json: &str) -> Result<Self, FallTraceError> {
        let config: ScenarioConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, FallTraceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Built-in scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Deceleration, freefall, impact, then lying still
    RealFall,
    /// Same fall, but the person gets up and moves
    RecoveredFall,
    /// Dropped device: bump, too-short low interval, impact, calm
    LookAlike,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [
        Scenario::RealFall,
        Scenario::RecoveredFall,
        Scenario::LookAlike,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::RealFall => "real_fall",
            Scenario::RecoveredFall => "recovered_fall",
            Scenario::LookAlike => "look_alike",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, FallTraceError> {
        Scenario::ALL
            .into_iter()
            .find(|s| s.as_str() == name)
            .ok_or_else(|| FallTraceError::UnknownScenario(name.to_string()))
    }

    pub fn seed(&self) -> u64 {
        match self {
            Scenario::RealFall => 42,
            Scenario::RecoveredFall => 1337,
            Scenario::LookAlike => 7,
        }
    }

    /// File name the scenario is written under
    pub fn file_name(&self) -> &'static str {
        match self {
            Scenario::RealFall => "mock_crash_positive.csv",
            Scenario::RecoveredFall => "mock_crash_false_positive.csv",
            Scenario::LookAlike => "mock_drop_lookalike.csv",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::RealFall => "real fall, person stays down",
            Scenario::RecoveredFall => "real fall, person recovers and moves",
            Scenario::LookAlike => "dropped device, impact without braking or freefall",
        }
    }

    /// Build the scenario configuration
    pub fn config(&self) -> Result<ScenarioConfig, FallTraceError> {
        let spans = match self {
            Scenario::RealFall => fall_spans(calm_post_impact()),
            Scenario::RecoveredFall => fall_spans(active_post_impact()),
            Scenario::LookAlike => lookalike_spans(),
        };
        let phases = PhaseTable::new(spans, SAMPLE_COUNT)?;
        ScenarioConfig::new(self.as_str(), self.seed(), DELTA_T, phases)
    }
}

fn gyro_gaussian(mean: (f64, f64, f64), std: f64) -> GyroModel {
    GyroModel::Gaussian {
        mean: Vec3::new(mean.0, mean.1, mean.2),
        std: Vec3::new(std, std, std),
    }
}

fn baseline_span(end: usize) -> PhaseSpan {
    PhaseSpan::new(
        PhaseKind::Baseline,
        0,
        end,
        AccelModel::Baseline { noise_std: 0.15 },
        gyro_gaussian((0.02, 0.02, 0.02), 0.01),
    )
}

fn impact_span(index: usize) -> PhaseSpan {
    PhaseSpan::new(
        PhaseKind::Impact,
        index,
        index + 1,
        AccelModel::Impact {
            mean: Vec3::new(15.0, 35.0, 20.0),
            std: Vec3::new(3.0, 5.0, 3.0),
            floor: IMPACT_FLOOR,
        },
        gyro_gaussian((4.0, 4.5, 5.0), 0.5),
    )
}

fn calm_post_impact() -> (AccelModel, GyroModel) {
    (
        AccelModel::Baseline { noise_std: 0.05 },
        gyro_gaussian((0.01, 0.01, 0.01), 0.005),
    )
}

fn active_post_impact() -> (AccelModel, GyroModel) {
    (
        AccelModel::Active {
            amplitude: 3.0,
            frequencies_hz: Vec3::new(1.2, 1.5, 1.8),
            phases_rad: Vec3::new(0.0, 0.5, 1.0),
        },
        GyroModel::Sinusoid {
            amplitude: Vec3::new(0.6, 0.7, 0.8),
            frequencies_hz: Vec3::new(1.3, 1.5, 1.1),
            phases_rad: Vec3::new(0.0, 0.5, 1.0),
        },
    )
}

fn fall_spans(post_impact: (AccelModel, GyroModel)) -> Vec<PhaseSpan> {
    let (post_accel, post_gyro) = post_impact;
    vec![
        baseline_span(FALL_BASELINE_END),
        PhaseSpan::new(
            PhaseKind::Deceleration,
            FALL_BASELINE_END,
            FALL_DECELERATION_END,
            AccelModel::Deceleration {
                start: GRAVITY,
                end: DECELERATION_TARGET,
                shape: RampShape::Linear,
                lateral_noise_std: 0.5,
            },
            gyro_gaussian((0.5, 0.6, 0.7), 0.2),
        ),
        PhaseSpan::new(
            PhaseKind::Freefall,
            FALL_DECELERATION_END,
            FALL_FREEFALL_END,
            AccelModel::Freefall {
                noise_std: 0.3,
                ceiling: FREEFALL_CEILING,
            },
            gyro_gaussian((1.5, 1.8, 2.0), 0.5),
        ),
        impact_span(FALL_FREEFALL_END),
        PhaseSpan::new(
            PhaseKind::PostImpact,
            FALL_FREEFALL_END + 1,
            SAMPLE_COUNT,
            post_accel,
            post_gyro,
        ),
    ]
}

fn lookalike_spans() -> Vec<PhaseSpan> {
    let (calm_accel, calm_gyro) = calm_post_impact();
    vec![
        baseline_span(LOOKALIKE_BASELINE_END),
        PhaseSpan::new(
            PhaseKind::Spike,
            LOOKALIKE_BASELINE_END,
            LOOKALIKE_SPIKE_END,
            AccelModel::Bump {
                amplitude: 6.0,
                lateral_noise_std: 0.5,
            },
            gyro_gaussian((0.3, 0.3, 0.3), 0.1),
        ),
        PhaseSpan::new(
            PhaseKind::Freefall,
            LOOKALIKE_SPIKE_END,
            LOOKALIKE_LOW_END,
            AccelModel::Freefall {
                noise_std: 0.3,
                ceiling: FREEFALL_CEILING,
            },
            gyro_gaussian((1.0, 1.0, 1.0), 0.3),
        ),
        impact_span(LOOKALIKE_LOW_END),
        PhaseSpan::new(
            PhaseKind::PostImpact,
            LOOKALIKE_LOW_END + 1,
            SAMPLE_COUNT,
            calm_accel,
            calm_gyro,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtins_cover_every_sample() {
        for scenario in Scenario::ALL {
            let config = scenario.config().unwrap();
            let spans = config.phases.spans();

            assert_eq!(spans.first().unwrap().start, 0);
            assert_eq!(spans.last().unwrap().end, SAMPLE_COUNT);
            assert!(spans.windows(2).all(|w| w[0].end == w[1].start));

            let covered: usize = spans.iter().map(|s| s.len()).sum();
            assert_eq!(covered, SAMPLE_COUNT);
            for index in 0..SAMPLE_COUNT {
                let matches = spans.iter().filter(|s| s.contains(index)).count();
                assert_eq!(matches, 1, "index {index} in {}", scenario.as_str());
            }
        }
    }

    #[test]
    fn test_real_fall_impact_index() {
        let config = Scenario::RealFall.config().unwrap();
        let impact = config.phases.find(PhaseKind::Impact).unwrap();
        assert_eq!(impact.start, 440);
        assert_eq!(impact.len(), 1);
    }

    #[test]
    fn test_lookalike_low_interval_is_brief() {
        let config = Scenario::LookAlike.config().unwrap();
        let low = config.phases.find(PhaseKind::Freefall).unwrap();
        assert!((low.len() as f64) * config.delta_t < 0.2);
        assert!(config.phases.find(PhaseKind::Deceleration).is_none());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Scenario::from_name("real_fall").unwrap(), Scenario::RealFall);
        assert_eq!(Scenario::from_name("look_alike").unwrap(), Scenario::LookAlike);
        assert!(matches!(
            Scenario::from_name("cartwheel"),
            Err(FallTraceError::UnknownScenario(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_preserves_config() {
        let config = Scenario::RecoveredFall.config().unwrap();
        let json = config.to_json_pretty().unwrap();
        let loaded = ScenarioConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_delta_t_rejected() {
        let config = Scenario::RealFall.config().unwrap();
        let mut value = serde_json::to_value(&config).unwrap();
        value["delta_t"] = serde_json::json!(0.0);

        let result = ScenarioConfig::from_json(&value.to_string());
        assert!(matches!(result, Err(FallTraceError::InvalidScenario(_))));
    }

    #[test]
    fn test_json_with_gap_rejected() {
        let config = Scenario::RealFall.config().unwrap();
        let mut value = serde_json::to_value(&config).unwrap();
        value["phases"]["spans"][1]["start"] = serde_json::json!(401);

        assert!(ScenarioConfig::from_json(&value.to_string()).is_err());
    }
}
