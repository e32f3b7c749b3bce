// SPDX-License-Identifier: MIT OR Apache-2.0
//! Two-point falloff curves sampled over a discrete position domain.
//!
//! A [`FalloffCurve`] maps a position in `[0, input_max]` to a multiplier
//! in `[0, output_max]` through two control points pinned at normalized
//! positions 0 and 1. All samplers of one curve share both points, so a
//! single edit reshapes every sampled multiplier at once.

use serde::{Deserialize, Serialize};

/// Interpolation mode between the two control points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CurveInterpolation {
    /// Hold the first point's value
    Step,
    /// Straight line between the values
    Linear,
    /// Smoothstep easing between the values
    #[default]
    Smooth,
}

/// A control point on a falloff curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    /// Normalized position in `[0, 1]`
    pub position: f32,
    /// Normalized value in `[0, 1]`, scaled by the curve's output range
    pub value: f32,
    /// Interpolation towards the next point
    pub interpolation: CurveInterpolation,
}

impl ControlPoint {
    /// Create a smooth control point
    pub fn new(position: f32, value: f32) -> Self {
        Self {
            position,
            value,
            interpolation: CurveInterpolation::Smooth,
        }
    }

    /// Set the interpolation mode
    pub fn with_interpolation(mut self, interpolation: CurveInterpolation) -> Self {
        self.interpolation = interpolation;
        self
    }
}

/// A two-point weighting profile over link positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FalloffCurve {
    points: [ControlPoint; 2],
    input_max: f32,
    output_max: f32,
}

impl FalloffCurve {
    /// Create a curve from two control points and its domain/range
    pub fn new(start: ControlPoint, end: ControlPoint, input_max: f32, output_max: f32) -> Self {
        Self {
            points: [start, end],
            input_max: input_max.max(0.0),
            output_max,
        }
    }

    /// The master rotation-weighting profile for a chain of `link_count`
    /// links: domain `[0, k - 1]`, range `[0, 2]`, both points at 0.5 with
    /// smooth easing. Sampled over the link indices this averages to 1 and
    /// is symmetric about the chain's midpoint.
    pub fn rotation_falloff(link_count: usize) -> Self {
        Self::new(
            ControlPoint::new(0.0, 0.5),
            ControlPoint::new(1.0, 0.5),
            link_count.saturating_sub(1) as f32,
            2.0,
        )
    }

    /// Sample the curve at a position in `[0, input_max]`.
    ///
    /// A degenerate domain (`input_max == 0`, single-link chains) always
    /// samples the start point.
    pub fn sample(&self, position: f32) -> Result<f32, CurveError> {
        if !position.is_finite() || position < 0.0 || position > self.input_max {
            return Err(CurveError::OutOfDomain {
                position,
                max: self.input_max,
            });
        }
        let t = if self.input_max > 0.0 {
            position / self.input_max
        } else {
            0.0
        };

        let [start, end] = &self.points;
        let normalized = if t <= start.position {
            start.value
        } else if t >= end.position {
            end.value
        } else {
            let span = end.position - start.position;
            let u = (t - start.position) / span;
            let u = match start.interpolation {
                CurveInterpolation::Step => 0.0,
                CurveInterpolation::Linear => u,
                CurveInterpolation::Smooth => u * u * (3.0 - 2.0 * u),
            };
            start.value + (end.value - start.value) * u
        };

        Ok(normalized * self.output_max)
    }

    /// Replace both control point values, keeping positions and modes
    pub fn set_values(&mut self, start: f32, end: f32) {
        self.points[0].value = start;
        self.points[1].value = end;
    }

    /// Set the interpolation mode of both control points
    pub fn set_interpolation(&mut self, interpolation: CurveInterpolation) {
        for point in &mut self.points {
            point.interpolation = interpolation;
        }
    }

    /// The two control point values, start then end
    pub fn values(&self) -> (f32, f32) {
        (self.points[0].value, self.points[1].value)
    }

    /// The two control points
    pub fn points(&self) -> &[ControlPoint; 2] {
        &self.points
    }

    /// Upper bound of the input domain
    pub fn input_max(&self) -> f32 {
        self.input_max
    }

    /// Upper bound of the output range
    pub fn output_max(&self) -> f32 {
        self.output_max
    }
}

/// Error when sampling a curve
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CurveError {
    /// Sample position outside the curve's input domain
    #[error("sample position {position} outside curve domain [0, {max}]")]
    OutOfDomain {
        /// Requested position
        position: f32,
        /// Upper domain bound
        max: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_unit_multiplier() {
        let curve = FalloffCurve::rotation_falloff(5);
        for i in 0..5 {
            assert_eq!(curve.sample(i as f32).unwrap(), 1.0);
        }
    }

    #[test]
    fn test_symmetric_sampling() {
        let curve = FalloffCurve::rotation_falloff(7);
        let k = 7;
        for i in 0..k {
            let a = curve.sample(i as f32).unwrap();
            let b = curve.sample((k - 1 - i) as f32).unwrap();
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_out_of_domain() {
        let curve = FalloffCurve::rotation_falloff(3);
        assert!(matches!(
            curve.sample(-0.5),
            Err(CurveError::OutOfDomain { .. })
        ));
        assert!(matches!(
            curve.sample(2.5),
            Err(CurveError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn test_degenerate_domain_samples_start() {
        let curve = FalloffCurve::rotation_falloff(1);
        assert_eq!(curve.input_max(), 0.0);
        assert_eq!(curve.sample(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_smooth_easing_between_distinct_values() {
        let mut curve = FalloffCurve::rotation_falloff(3);
        curve.set_values(0.0, 1.0);
        // positions 0, 1, 2 normalize to t = 0, 0.5, 1
        assert_eq!(curve.sample(0.0).unwrap(), 0.0);
        assert!((curve.sample(1.0).unwrap() - 1.0).abs() < 1e-6);
        assert_eq!(curve.sample(2.0).unwrap(), 2.0);
    }

    #[test]
    fn test_step_holds_start_value() {
        let mut curve = FalloffCurve::rotation_falloff(3);
        curve.set_values(0.25, 1.0);
        curve.set_interpolation(CurveInterpolation::Step);
        assert_eq!(curve.sample(0.0).unwrap(), 0.5);
        assert_eq!(curve.sample(1.0).unwrap(), 0.5);
        // the end point itself still reports its own value
        assert_eq!(curve.sample(2.0).unwrap(), 2.0);
    }

    #[test]
    fn test_linear_midpoint() {
        let mut curve = FalloffCurve::rotation_falloff(3);
        curve.set_values(0.0, 1.0);
        curve.set_interpolation(CurveInterpolation::Linear);
        assert!((curve.sample(1.0).unwrap() - 1.0).abs() < 1e-6);
    }
}
