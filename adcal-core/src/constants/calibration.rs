//! Calibration Table Dimensions and Defaults
//!
//! The entry dimensions come from the ADC driver enumerations (see
//! [`crate::adc`]); the rest are properties of the table itself.

use crate::adc::{BufferState, Gain, SampleRate};
use crate::scale::Scale;

// ===== ENTRY DIMENSIONS =====

/// Number of sample rates the ADS1256 driver exposes.
pub const SAMPLE_RATE_COUNT: usize = SampleRate::ALL.len();

/// Number of PGA settings the ADS1256 driver exposes.
pub const GAIN_COUNT: usize = Gain::ALL.len();

/// Number of input buffer states (enabled, disabled).
pub const BUFFER_STATE_COUNT: usize = BufferState::ALL.len();

/// Number of selectable full-scale input ranges.
pub const SCALE_COUNT: usize = Scale::ALL.len();

/// Entries held for a single full-scale range.
///
/// Dense over the full rate × gain × buffer cross-product.
pub const ENTRIES_PER_SCALE: usize = SAMPLE_RATE_COUNT * GAIN_COUNT * BUFFER_STATE_COUNT;

/// Total entries across every full-scale range.
pub const TOTAL_ENTRIES: usize = ENTRIES_PER_SCALE * SCALE_COUNT;

// ===== TEMPERATURE CORRECTION =====

/// Number of calibration temperatures.
///
/// Every entry carries one gain correction factor per temperature; the
/// temperatures themselves are shared by the whole table.
pub const CAL_TEMP_POINTS: usize = 5;

/// Correction factor of an uncalibrated entry (no correction).
pub const DEFAULT_CORRECTION_FACTOR: f32 = 1.0;

/// Temperature assigned to every point of a blank table (°C).
///
/// All points coincide, so any lookup returns the default factor until the
/// temperatures are written.
pub const DEFAULT_CALIBRATION_TEMPERATURE_C: f32 = 25.0;

// ===== METADATA =====

/// Maximum serial number length in bytes.
///
/// Longer input is truncated on a character boundary.
pub const SERIAL_NUMBER_LEN: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_space_matches_driver_enumerations() {
        assert_eq!(SAMPLE_RATE_COUNT, 16);
        assert_eq!(GAIN_COUNT, 7);
        assert_eq!(BUFFER_STATE_COUNT, 2);
        assert_eq!(ENTRIES_PER_SCALE, 224);
        assert_eq!(TOTAL_ENTRIES, 448);
    }
}
