//! ADC driver enumerations
//!
//! The ADS1256 driver owns these settings; the calibration table only needs
//! to enumerate them. Each type maps onto a dense index through an explicit
//! `match`, so the entry space is known at compile time and no cast from an
//! arbitrary integer can reach the table.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// ADS1256 output data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleRate {
    /// 30 000 samples/s
    Sps30000,
    /// 15 000 samples/s
    Sps15000,
    /// 7 500 samples/s
    Sps7500,
    /// 3 750 samples/s
    Sps3750,
    /// 2 000 samples/s
    Sps2000,
    /// 1 000 samples/s
    Sps1000,
    /// 500 samples/s
    Sps500,
    /// 100 samples/s
    Sps100,
    /// 60 samples/s
    Sps60,
    /// 50 samples/s
    Sps50,
    /// 30 samples/s
    Sps30,
    /// 25 samples/s
    Sps25,
    /// 15 samples/s
    Sps15,
    /// 10 samples/s
    Sps10,
    /// 5 samples/s
    Sps5,
    /// 2.5 samples/s
    Sps2_5,
}

impl SampleRate {
    /// Every rate, in index order
    pub const ALL: [SampleRate; 16] = [
        Self::Sps30000, Self::Sps15000, Self::Sps7500, Self::Sps3750,
        Self::Sps2000, Self::Sps1000, Self::Sps500, Self::Sps100,
        Self::Sps60, Self::Sps50, Self::Sps30, Self::Sps25,
        Self::Sps15, Self::Sps10, Self::Sps5, Self::Sps2_5,
    ];

    /// Dense index in `0..ALL.len()`
    pub const fn index(self) -> usize {
        match self {
            Self::Sps30000 => 0,
            Self::Sps15000 => 1,
            Self::Sps7500 => 2,
            Self::Sps3750 => 3,
            Self::Sps2000 => 4,
            Self::Sps1000 => 5,
            Self::Sps500 => 6,
            Self::Sps100 => 7,
            Self::Sps60 => 8,
            Self::Sps50 => 9,
            Self::Sps30 => 10,
            Self::Sps25 => 11,
            Self::Sps15 => 12,
            Self::Sps10 => 13,
            Self::Sps5 => 14,
            Self::Sps2_5 => 15,
        }
    }

    /// DRATE register code
    pub const fn register(self) -> u8 {
        match self {
            Self::Sps30000 => 0xF0,
            Self::Sps15000 => 0xE0,
            Self::Sps7500 => 0xD0,
            Self::Sps3750 => 0xC0,
            Self::Sps2000 => 0xB0,
            Self::Sps1000 => 0xA1,
            Self::Sps500 => 0x92,
            Self::Sps100 => 0x82,
            Self::Sps60 => 0x72,
            Self::Sps50 => 0x63,
            Self::Sps30 => 0x53,
            Self::Sps25 => 0x43,
            Self::Sps15 => 0x33,
            Self::Sps10 => 0x23,
            Self::Sps5 => 0x13,
            Self::Sps2_5 => 0x03,
        }
    }

    /// Nominal rate in samples per second
    pub const fn hz(self) -> f32 {
        match self {
            Self::Sps30000 => 30_000.0,
            Self::Sps15000 => 15_000.0,
            Self::Sps7500 => 7_500.0,
            Self::Sps3750 => 3_750.0,
            Self::Sps2000 => 2_000.0,
            Self::Sps1000 => 1_000.0,
            Self::Sps500 => 500.0,
            Self::Sps100 => 100.0,
            Self::Sps60 => 60.0,
            Self::Sps50 => 50.0,
            Self::Sps30 => 30.0,
            Self::Sps25 => 25.0,
            Self::Sps15 => 15.0,
            Self::Sps10 => 10.0,
            Self::Sps5 => 5.0,
            Self::Sps2_5 => 2.5,
        }
    }
}

/// ADS1256 programmable gain amplifier setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// Gain 1
    X1,
    /// Gain 2
    X2,
    /// Gain 4
    X4,
    /// Gain 8
    X8,
    /// Gain 16
    X16,
    /// Gain 32
    X32,
    /// Gain 64
    X64,
}

impl Gain {
    /// Every gain, in index order
    pub const ALL: [Gain; 7] = [
        Self::X1, Self::X2, Self::X4, Self::X8, Self::X16, Self::X32, Self::X64,
    ];

    /// Dense index in `0..ALL.len()`, equal to the PGA register code
    pub const fn index(self) -> usize {
        match self {
            Self::X1 => 0,
            Self::X2 => 1,
            Self::X4 => 2,
            Self::X8 => 3,
            Self::X16 => 4,
            Self::X32 => 5,
            Self::X64 => 6,
        }
    }

    /// Amplification factor
    pub const fn factor(self) -> u8 {
        1 << self.index()
    }
}

/// ADS1256 analog input buffer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferState {
    /// Input buffer bypassed
    Disabled,
    /// Input buffer enabled (high input impedance)
    Enabled,
}

impl BufferState {
    /// Both states, in index order
    pub const ALL: [BufferState; 2] = [Self::Disabled, Self::Enabled];

    /// Dense index in `0..ALL.len()`
    pub const fn index(self) -> usize {
        match self {
            Self::Disabled => 0,
            Self::Enabled => 1,
        }
    }
}

impl From<bool> for BufferState {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_all_order() {
        for (i, rate) in SampleRate::ALL.iter().enumerate() {
            assert_eq!(rate.index(), i);
        }
        for (i, gain) in Gain::ALL.iter().enumerate() {
            assert_eq!(gain.index(), i);
        }
        for (i, buffer) in BufferState::ALL.iter().enumerate() {
            assert_eq!(buffer.index(), i);
        }
    }

    #[test]
    fn rates_descend() {
        for pair in SampleRate::ALL.windows(2) {
            assert!(pair[0].hz() > pair[1].hz());
        }
    }

    #[test]
    fn gain_factors() {
        assert_eq!(Gain::X1.factor(), 1);
        assert_eq!(Gain::X8.factor(), 8);
        assert_eq!(Gain::X64.factor(), 64);
    }

    #[test]
    fn buffer_from_flag() {
        assert_eq!(BufferState::from(true), BufferState::Enabled);
        assert_eq!(BufferState::from(false), BufferState::Disabled);
    }
}
