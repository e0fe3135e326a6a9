//! Calibration records held by the table
//!
//! Plain `Copy` data; all access rules live in [`crate::table`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::{CAL_TEMP_POINTS, DEFAULT_CORRECTION_FACTOR};

/// ADC correction constants for one (rate, gain, buffer, scale) combination
///
/// Values are raw ADS1256 register contents (OFC and FSC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationEntry {
    /// Offset calibration (OFC register)
    pub offset: u32,
    /// Field gain calibration (FSC register)
    pub gain: u32,
    /// Self-calibration gain, the baseline of `gain`
    pub base_gain: u32,
}

/// One point of a temperature correction curve
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TemperaturePoint {
    /// Board temperature in °C
    pub temperature: f32,
    /// Gain correction factor at that temperature
    pub correction_factor: f32,
}

impl TemperaturePoint {
    /// Create a point
    pub const fn new(temperature: f32, correction_factor: f32) -> Self {
        Self { temperature, correction_factor }
    }
}

/// Cold-junction sensor constants used for thermocouple compensation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ColdJunctionCalibration {
    /// Offset calibration
    pub offset: u32,
    /// Gain calibration
    pub gain: u32,
}

/// Storage slot: an entry and its per-temperature gain corrections
///
/// `corrections[i]` pairs with the table's `i`-th calibration temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryRecord {
    /// Correction constants
    pub entry: CalibrationEntry,
    /// Gain correction factor per calibration temperature
    pub corrections: [f32; CAL_TEMP_POINTS],
}

impl EntryRecord {
    /// Blank record: zero constants, unity corrections
    pub const BLANK: Self = Self {
        entry: CalibrationEntry { offset: 0, gain: 0, base_gain: 0 },
        corrections: [DEFAULT_CORRECTION_FACTOR; CAL_TEMP_POINTS],
    };
}

impl Default for EntryRecord {
    fn default() -> Self {
        Self::BLANK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_record_has_unity_corrections() {
        let record = EntryRecord::default();
        assert_eq!(record.entry, CalibrationEntry::default());
        assert!(record.corrections.iter().all(|&c| c == 1.0));
    }

    #[cfg(feature = "std")]
    #[test]
    fn entry_serializes_to_json() {
        let entry = CalibrationEntry { offset: 1, gain: 2, base_gain: 3 };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"offset":1,"gain":2,"base_gain":3}"#);

        let back: CalibrationEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
