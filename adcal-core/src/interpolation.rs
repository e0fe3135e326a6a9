//! Temperature Correction Engine
//!
//! ## Motivation
//!
//! The ADS1256 gain drifts with board temperature. During calibration the
//! gain error is measured at a handful of temperatures, and at run time the
//! correction for the live temperature is interpolated from those points.
//!
//! ## Algorithm
//!
//! Piecewise linear over points sorted by ascending temperature:
//!
//! ```text
//! factor(T) = f[i] + (f[i+1] - f[i]) * (T - T[i]) / (T[i+1] - T[i])
//!             where T[i] <= T <= T[i+1]
//!
//! T <  T[0]     -> f[0]       (clamped, no extrapolation)
//! T >  T[n-1]   -> f[n-1]     (clamped, no extrapolation)
//! n == 1        -> f[0]
//! n == 0        -> 1.0        (no correction)
//! ```
//!
//! Two points at the same temperature form a zero-width segment; the lower
//! point's factor wins, avoiding a division by zero.
//!
//! Ascending order is the caller's responsibility. With unordered points the
//! result is still finite and deterministic, but meaningless; the table
//! refuses to mark itself valid in that state.

use crate::constants::DEFAULT_CORRECTION_FACTOR;
use crate::entries::TemperaturePoint;

/// Correction curve of one calibration entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionCurve<const N: usize> {
    points: [TemperaturePoint; N],
}

impl<const N: usize> CorrectionCurve<N> {
    /// Build a curve from ready-made points
    pub const fn new(points: [TemperaturePoint; N]) -> Self {
        Self { points }
    }

    /// Pair shared calibration temperatures with an entry's factors
    pub fn from_parts(temperatures: &[f32; N], factors: &[f32; N]) -> Self {
        let mut points = [TemperaturePoint::new(0.0, DEFAULT_CORRECTION_FACTOR); N];
        for (point, (&temperature, &factor)) in
            points.iter_mut().zip(temperatures.iter().zip(factors.iter()))
        {
            *point = TemperaturePoint::new(temperature, factor);
        }
        Self { points }
    }

    /// Curve points
    pub fn points(&self) -> &[TemperaturePoint] {
        &self.points
    }

    /// Interpolated correction factor at `temperature`
    pub fn factor_at(&self, temperature: f32) -> f32 {
        correction_factor(&self.points, temperature)
    }
}

/// Interpolate a correction factor from points sorted by temperature
pub fn correction_factor(points: &[TemperaturePoint], temperature: f32) -> f32 {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return DEFAULT_CORRECTION_FACTOR,
    };

    if points.len() == 1 {
        return first.correction_factor;
    }

    if temperature.is_nan() {
        log_warn!("Correction lookup: temperature is NaN, using lowest point");
        return first.correction_factor;
    }

    if temperature <= first.temperature {
        if temperature < first.temperature {
            log_debug!(
                "Correction lookup: {} clamped to {}",
                temperature, first.temperature
            );
        }
        return first.correction_factor;
    }

    if temperature >= last.temperature {
        if temperature > last.temperature {
            log_debug!(
                "Correction lookup: {} clamped to {}",
                temperature, last.temperature
            );
        }
        return last.correction_factor;
    }

    for pair in points.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        if temperature >= lower.temperature && temperature <= upper.temperature {
            return interpolate_segment(lower, upper, temperature);
        }
    }

    // Only reachable when the points are not ascending.
    log_warn!("Correction lookup: temperatures out of order");
    last.correction_factor
}

/// Linear interpolation inside one bracketing segment
fn interpolate_segment(lower: TemperaturePoint, upper: TemperaturePoint, temperature: f32) -> f32 {
    let span = upper.temperature - lower.temperature;
    if span <= 0.0 {
        return lower.correction_factor;
    }
    let frac = (temperature - lower.temperature) / span;
    lower.correction_factor + (upper.correction_factor - lower.correction_factor) * frac
}

/// Scale a raw gain register value by a correction factor
///
/// Rounds to nearest. Results outside `u32` saturate; a NaN factor gives 0.
pub fn apply_correction(raw: u32, factor: f32) -> u32 {
    let scaled = f64::from(raw) * f64::from(factor);
    (scaled + 0.5) as u32
}

/// Check that temperatures never decrease
pub fn is_ascending(temperatures: &[f32]) -> bool {
    temperatures
        .windows(2)
        .all(|pair| pair[0] <= pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correction_rounds_and_saturates() {
        assert_eq!(apply_correction(1000, 1.0015), 1002);
        assert_eq!(apply_correction(0x0040_0000, 1.0), 0x0040_0000);
        assert_eq!(apply_correction(u32::MAX, 2.0), u32::MAX);
        assert_eq!(apply_correction(1000, -1.0), 0);
        assert_eq!(apply_correction(1000, f32::NAN), 0);
    }

    fn two_point() -> [TemperaturePoint; 2] {
        [TemperaturePoint::new(0.0, 1.0), TemperaturePoint::new(100.0, 2.0)]
    }

    #[test]
    fn midpoint_interpolation() {
        assert_eq!(correction_factor(&two_point(), 50.0), 1.5);
        assert_eq!(correction_factor(&two_point(), 25.0), 1.25);
    }

    #[test]
    fn clamps_outside_range() {
        assert_eq!(correction_factor(&two_point(), -10.0), 1.0);
        assert_eq!(correction_factor(&two_point(), 150.0), 2.0);
    }

    #[test]
    fn exact_points() {
        assert_eq!(correction_factor(&two_point(), 0.0), 1.0);
        assert_eq!(correction_factor(&two_point(), 100.0), 2.0);
    }

    #[test]
    fn single_point_is_unconditional() {
        let points = [TemperaturePoint::new(20.0, 0.98)];
        assert_eq!(correction_factor(&points, -40.0), 0.98);
        assert_eq!(correction_factor(&points, 20.0), 0.98);
        assert_eq!(correction_factor(&points, 85.0), 0.98);
    }

    #[test]
    fn empty_curve_means_no_correction() {
        assert_eq!(correction_factor(&[], 30.0), 1.0);
    }

    #[test]
    fn picks_the_bracketing_segment() {
        let points = [
            TemperaturePoint::new(0.0, 1.0),
            TemperaturePoint::new(10.0, 1.1),
            TemperaturePoint::new(20.0, 1.3),
            TemperaturePoint::new(40.0, 1.3),
        ];
        let factor = correction_factor(&points, 15.0);
        assert!((factor - 1.2).abs() < 1e-6);
        assert_eq!(correction_factor(&points, 30.0), 1.3);
    }

    #[test]
    fn coincident_points_do_not_divide_by_zero() {
        let points = [TemperaturePoint::new(25.0, 1.0); 5];
        assert_eq!(correction_factor(&points, 25.0), 1.0);
        assert_eq!(correction_factor(&points, 10.0), 1.0);
        assert_eq!(correction_factor(&points, 60.0), 1.0);
    }

    #[test]
    fn nan_temperature_uses_lowest_point() {
        assert_eq!(correction_factor(&two_point(), f32::NAN), 1.0);
    }

    #[test]
    fn curve_from_parts() {
        let curve = CorrectionCurve::from_parts(&[0.0, 100.0], &[1.0, 2.0]);
        assert_eq!(curve.points(), &two_point()[..]);
        assert_eq!(curve.factor_at(75.0), 1.75);
    }

    #[test]
    fn ascending_check() {
        assert!(is_ascending(&[0.0, 10.0, 10.0, 30.0]));
        assert!(!is_ascending(&[0.0, 30.0, 10.0]));
        assert!(is_ascending(&[]));
    }
}
