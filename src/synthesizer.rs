//! Phase-based trace synthesis
//!
//! Walks every sample index of a scenario, resolves its phase in the
//! [`PhaseTable`](crate::phases::PhaseTable) and asks that phase's models for
//! an acceleration and a gyroscope sample. The random generator is seeded from
//! the scenario, so output depends on nothing but the configuration.

use crate::error::FallTraceError;
use crate::scenario::ScenarioConfig;
use crate::types::CanonicalRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Synthesizer for canonical sensor traces
pub struct Synthesizer;

impl Synthesizer {
    /// Generate the full trace of a scenario from its own seed
    pub fn synthesize(config: &ScenarioConfig) -> Result<Vec<CanonicalRecord>, FallTraceError> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        Self::synthesize_with_rng(config, &mut rng)
    }

    /// Generate a trace drawing randomness from `rng`.
    ///
    /// The configuration is validated again here since its fields are public.
    pub fn synthesize_with_rng<R: Rng + ?Sized>(
        config: &ScenarioConfig,
        rng: &mut R,
    ) -> Result<Vec<CanonicalRecord>, FallTraceError> {
        config.validate()?;
        let table = &config.phases;
        debug!(
            scenario = %config.name,
            seed = config.seed,
            samples = table.sample_count(),
            phases = table.spans().len(),
            "synthesizing trace"
        );

        let mut records = Vec::with_capacity(table.sample_count());
        for index in 0..table.sample_count() {
            let Some(span) = table.lookup(index) else {
                return Err(FallTraceError::InvalidPhaseTable(format!(
                    "no phase covers sample {index}"
                )));
            };
            if index == span.start {
                debug!(phase = span.kind.as_str(), start = span.start, end = span.end, "entering phase");
            }

            let time_s = index as f64 * config.delta_t;
            let ctx = span.context(index, config.delta_t);
            let accel = span.accel.sample(ctx, rng);
            let gyro = span.gyro.sample(ctx, rng);
            records.push(CanonicalRecord::new(time_s, accel, gyro));
        }

        Ok(records)
    }
}
