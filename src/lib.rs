//! fall-trace - Labeled motion-sensor traces for fall-detection validation
//!
//! Two producers share one canonical 9-column record layout:
//! scenario synthesis (phase table → seeded signal models → canonical rows)
//! and log normalization (raw tab-separated log → adapter → canonical rows).
//!
//! ## Modules
//!
//! - **Synthesis**: [`phases`], [`scenario`], [`synthesizer`]
//! - **Normalization**: [`adapters`], [`normalizer`]
//! - **Shared**: [`types`], [`encoder`], [`signature`], [`pipeline`]

pub mod adapters;
pub mod encoder;
pub mod error;
pub mod normalizer;
pub mod phases;
pub mod pipeline;
pub mod scenario;
pub mod signature;
pub mod synthesizer;
pub mod types;

pub use encoder::{CanonicalEncoder, Precision, CANONICAL_HEADER};
pub use error::FallTraceError;
pub use normalizer::{NormalizationReport, Normalizer};
pub use pipeline::{normalize_file, write_builtin_scenarios, write_scenario, TreeNormalizer};
pub use scenario::{Scenario, ScenarioConfig};
pub use signature::{FallSignatures, SignatureThresholds};
pub use synthesizer::Synthesizer;
pub use types::{CanonicalRecord, Vec3};

/// Crate version reported by the CLI
pub const FALL_TRACE_VERSION: &str = env!("CARGO_PKG_VERSION");
