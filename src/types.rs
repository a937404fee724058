//! Core types shared by both producers
//!
//! Every trace this crate emits, synthesized or normalized, is a sequence of
//! [`CanonicalRecord`]s. The two magnitude fields are derived inside the
//! constructor and cannot be supplied by a caller.

use serde::{Deserialize, Serialize};

/// Standard gravity (m/s²), applied to the vertical axis
pub const GRAVITY: f64 = 9.80665;

/// Tri-axis sample (m/s² for acceleration, rad/s for angular rate)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm, without overflow for large finite components
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y).hypot(self.z)
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    /// Convert each component from degrees to radians
    pub fn to_radians(&self) -> Self {
        Self {
            x: self.x.to_radians(),
            y: self.y.to_radians(),
            z: self.z.to_radians(),
        }
    }
}

/// One sample of the canonical 9-field layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Seconds from the start of the trace
    pub time_s: f64,
    /// Raw acceleration including gravity (m/s²)
    pub accel: Vec3,
    /// Euclidean norm of `accel` (the SVM)
    pub accel_magnitude: f64,
    /// Angular rate (rad/s)
    pub gyro: Vec3,
    /// Euclidean norm of `gyro`
    pub gyro_magnitude: f64,
}

impl CanonicalRecord {
    /// Build a record, computing both magnitudes from the components
    pub fn new(time_s: f64, accel: Vec3, gyro: Vec3) -> Self {
        Self {
            time_s,
            accel,
            accel_magnitude: accel.magnitude(),
            gyro,
            gyro_magnitude: gyro.magnitude(),
        }
    }
}
