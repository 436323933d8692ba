use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Single control point of a [`ResponseCurve`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Input coordinate of the key.
    pub time: f32,
    /// Output value at `time`.
    pub value: f32,
}

impl CurveKey {
    /// Creates a new key.
    #[must_use]
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Reasons a set of keys cannot form a monotonic response curve.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CurveError {
    /// Fewer than two keys were supplied.
    #[error("a response curve needs at least two keys, found {0}")]
    TooFewKeys(usize),
    /// A key contained NaN or an infinite coordinate.
    #[error("curve key {index} is not finite")]
    NonFinite {
        /// Position of the offending key.
        index: usize,
    },
    /// A key did not advance past its predecessor's time.
    #[error("curve key {index} does not advance in time")]
    UnorderedTime {
        /// Position of the offending key.
        index: usize,
    },
    /// A key's value was lower than its predecessor's.
    #[error("curve key {index} decreases in value")]
    Decreasing {
        /// Position of the offending key.
        index: usize,
    },
}

/// Monotonic, piecewise-linear mapping from an input to an output value.
///
/// Inputs outside the key range evaluate to the first or last key's value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct ResponseCurve {
    keys: Vec<CurveKey>,
}

impl ResponseCurve {
    /// Builds a curve from keys sorted by time with non-decreasing values.
    pub fn new(keys: Vec<CurveKey>) -> Result<Self, CurveError> {
        if keys.len() < 2 {
            return Err(CurveError::TooFewKeys(keys.len()));
        }

        for (index, key) in keys.iter().enumerate() {
            if !key.time.is_finite() || !key.value.is_finite() {
                return Err(CurveError::NonFinite { index });
            }
        }

        for (index, pair) in keys.windows(2).enumerate() {
            if pair[1].time <= pair[0].time {
                return Err(CurveError::UnorderedTime { index: index + 1 });
            }
            if pair[1].value < pair[0].value {
                return Err(CurveError::Decreasing { index: index + 1 });
            }
        }

        Ok(Self { keys })
    }

    /// Identity curve over 0.0..=1.0.
    #[must_use]
    pub fn linear() -> Self {
        Self {
            keys: vec![CurveKey::new(0.0, 0.0), CurveKey::new(1.0, 1.0)],
        }
    }

    /// Keys defining the curve.
    #[must_use]
    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Evaluates the curve at `input`.
    #[must_use]
    pub fn evaluate(&self, input: f32) -> f32 {
        let first = self.keys[0];
        let last = self.keys[self.keys.len() - 1];

        if input.is_nan() || input <= first.time {
            return first.value;
        }
        if input >= last.time {
            return last.value;
        }

        let upper = self
            .keys
            .iter()
            .position(|key| key.time >= input)
            .unwrap_or(self.keys.len() - 1);
        let lower = self.keys[upper - 1];
        let upper = self.keys[upper];
        let span = upper.time - lower.time;
        let t = (input - lower.time) / span;
        lower.value + (upper.value - lower.value) * t
    }
}

impl TryFrom<Vec<CurveKey>> for ResponseCurve {
    type Error = CurveError;

    fn try_from(keys: Vec<CurveKey>) -> Result<Self, Self::Error> {
        Self::new(keys)
    }
}

impl From<ResponseCurve> for Vec<CurveKey> {
    fn from(curve: ResponseCurve) -> Self {
        curve.keys
    }
}
