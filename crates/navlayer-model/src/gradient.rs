//! Score-to-color gradient
//!
//! The curve is tabulated once per construction, so every lookup is O(1).
//! Ranges wider than [`MAX_GRADIENT_STEPS`] are rejected.

use crate::color::Rgb;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Widest accepted `maxValue - minValue`
pub const MAX_GRADIENT_STEPS: usize = 10_000;

/// Serialized gradient shape (`{colors, minValue, maxValue}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradientSpec {
    /// Color stops, first to last
    pub colors: Vec<String>,
    /// Inclusive lower bound
    pub min_value: i64,
    /// Inclusive upper bound
    pub max_value: i64,
}

/// Piecewise-linear RGB gradient over an inclusive integer range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GradientSpec", into = "GradientSpec")]
pub struct Gradient {
    /// Stops as written in the document
    colors: Vec<String>,
    stops: Vec<Rgb>,
    min_value: i64,
    max_value: i64,
    curve: Vec<Rgb>,
}

impl Gradient {
    /// Create gradient from color stops and an inclusive range
    ///
    /// # Errors
    /// - `ModelError::InvalidColor` if a stop is not `#rgb` / `#rrggbb`
    /// - `ModelError::InvalidGradient` if fewer than two stops, `min > max`,
    ///   or the range is wider than [`MAX_GRADIENT_STEPS`]
    pub fn new<S: AsRef<str>>(
        colors: &[S],
        min_value: i64,
        max_value: i64,
    ) -> Result<Self, ModelError> {
        let colors: Vec<String> = colors.iter().map(|c| c.as_ref().to_string()).collect();
        let stops = parse_stops(&colors)?;
        let range = check_range(min_value, max_value)?;
        let curve = compute_curve(&stops, range);
        Ok(Self {
            colors,
            stops,
            min_value,
            max_value,
            curve,
        })
    }

    /// Color for a score, as lowercase `#rrggbb`
    ///
    /// Scores at or below `min_value` take the first stop, scores at or
    /// above `max_value` the last; anything between reads the tabulated
    /// curve at `trunc(score) - min_value`.
    #[must_use]
    pub fn compute_color(&self, score: f64) -> String {
        self.compute_rgb(score).to_hex()
    }

    /// Color for a score as RGB
    #[must_use]
    pub fn compute_rgb(&self, score: f64) -> Rgb {
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];
        if score.is_nan() || score <= self.min_value as f64 {
            return first;
        }
        if score >= self.max_value as f64 {
            return last;
        }
        let index = (score.trunc() as i64 - self.min_value) as usize;
        self.curve.get(index).copied().unwrap_or(last)
    }

    /// Replace the color stops and rebuild the curve
    pub fn set_colors<S: AsRef<str>>(&mut self, colors: &[S]) -> Result<(), ModelError> {
        let colors: Vec<String> = colors.iter().map(|c| c.as_ref().to_string()).collect();
        let stops = parse_stops(&colors)?;
        let range = check_range(self.min_value, self.max_value)?;
        self.curve = compute_curve(&stops, range);
        self.colors = colors;
        self.stops = stops;
        Ok(())
    }

    /// Replace the lower bound and rebuild the curve
    pub fn set_min_value(&mut self, min_value: i64) -> Result<(), ModelError> {
        let range = check_range(min_value, self.max_value)?;
        self.min_value = min_value;
        self.curve = compute_curve(&self.stops, range);
        Ok(())
    }

    /// Replace the upper bound and rebuild the curve
    pub fn set_max_value(&mut self, max_value: i64) -> Result<(), ModelError> {
        let range = check_range(self.min_value, max_value)?;
        self.max_value = max_value;
        self.curve = compute_curve(&self.stops, range);
        Ok(())
    }

    /// Stops as written
    #[inline]
    #[must_use]
    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    #[inline]
    #[must_use]
    pub fn min_value(&self) -> i64 {
        self.min_value
    }

    #[inline]
    #[must_use]
    pub fn max_value(&self) -> i64 {
        self.max_value
    }

    /// Tabulated curve, `max_value - min_value + 1` entries
    #[inline]
    #[must_use]
    pub fn curve(&self) -> &[Rgb] {
        &self.curve
    }
}

impl TryFrom<GradientSpec> for Gradient {
    type Error = ModelError;

    fn try_from(spec: GradientSpec) -> Result<Self, Self::Error> {
        Self::new(&spec.colors, spec.min_value, spec.max_value)
    }
}

impl From<Gradient> for GradientSpec {
    fn from(gradient: Gradient) -> Self {
        Self {
            colors: gradient.colors,
            min_value: gradient.min_value,
            max_value: gradient.max_value,
        }
    }
}

fn parse_stops(colors: &[String]) -> Result<Vec<Rgb>, ModelError> {
    if colors.len() < 2 {
        return Err(ModelError::InvalidGradient(format!(
            "at least 2 colors required, got {}",
            colors.len()
        )));
    }
    colors.iter().map(|c| Rgb::parse_hex(c)).collect()
}

/// Width of a valid range
fn check_range(min_value: i64, max_value: i64) -> Result<usize, ModelError> {
    if min_value > max_value {
        return Err(ModelError::InvalidGradient(format!(
            "minValue {min_value} exceeds maxValue {max_value}"
        )));
    }
    max_value
        .checked_sub(min_value)
        .and_then(|range| usize::try_from(range).ok())
        .filter(|&range| range <= MAX_GRADIENT_STEPS)
        .ok_or_else(|| {
            ModelError::InvalidGradient(format!(
                "range {min_value}..={max_value} is wider than {MAX_GRADIENT_STEPS} steps"
            ))
        })
}

/// Split the range into `n - 1` equal segments, the last absorbing the
/// remainder, and interpolate each from its start stop toward the next.
fn compute_curve(stops: &[Rgb], range: usize) -> Vec<Rgb> {
    let segments = stops.len() - 1;
    let chunk = range / segments;

    let mut curve = Vec::with_capacity(range + 1);
    for (i, pair) in stops.windows(2).enumerate() {
        let len = if i + 1 == segments {
            range - chunk * (segments - 1)
        } else {
            chunk
        };
        for step in 0..len {
            let t = step as f64 / len as f64;
            curve.push(pair[0].lerp(pair[1], t));
        }
    }
    curve.push(stops[segments]);
    curve
}
