use std::cmp::Ordering;
use std::fmt;
use std::ops::Mul;

use serde::{Deserialize, Serialize};

/// A fitness value constrained to the range [0.0, 1.0].
///
/// NaN is mapped to zero, so values are totally ordered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct FitnessValue(f64);

impl FitnessValue {
    /// Fitness of an individual that cannot be selected.
    pub const LETHAL_FITNESS: Self = Self(0.0);

    /// Fitness of an individual matching every criterion.
    pub const MAX_FITNESS: Self = Self(1.0);

    /// Creates a new FitnessValue, clamping the input to [0.0, 1.0].
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Returns the inner f64 value.
    pub fn get(self) -> f64 {
        self.0
    }

    /// Returns true if this individual can never be drawn by fitness-weighted sampling.
    pub fn is_lethal(self) -> bool {
        self.0 == 0.0
    }
}

impl From<FitnessValue> for f64 {
    fn from(fitness: FitnessValue) -> Self {
        fitness.0
    }
}

impl From<f64> for FitnessValue {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl PartialEq for FitnessValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FitnessValue {}

impl PartialOrd for FitnessValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FitnessValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for FitnessValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*}", p, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Mul for FitnessValue {
    type Output = Self;

    /// Product of two fitness values; stays in [0.0, 1.0].
    fn mul(self, rhs: Self) -> Self::Output {
        FitnessValue::new(self.0 * rhs.0)
    }
}
