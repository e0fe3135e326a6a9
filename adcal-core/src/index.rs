//! Entry index resolver
//!
//! Maps `(rate, gain, buffer, scale)` to a unique slot of the table. The
//! mapping is a pure function of the four keys, dense over their full
//! cross-product, and collision free:
//!
//! ```text
//! slot(scale, rate, gain, buffer) =
//!     ((scale * RATES + rate) * GAINS + gain) * BUFFERS + buffer
//! ```
//!
//! Every key is an exhaustive enum, so an out-of-range slot cannot be
//! constructed.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::adc::{BufferState, Gain, SampleRate};
use crate::constants::calibration::{
    BUFFER_STATE_COUNT, ENTRIES_PER_SCALE, GAIN_COUNT, TOTAL_ENTRIES,
};
use crate::scale::Scale;

/// ADC configuration identifying a calibration entry within one scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EntryKey {
    /// Output data rate
    pub rate: SampleRate,
    /// PGA setting
    pub gain: Gain,
    /// Input buffer state
    pub buffer: BufferState,
}

impl EntryKey {
    /// Create a key
    pub const fn new(rate: SampleRate, gain: Gain, buffer: BufferState) -> Self {
        Self { rate, gain, buffer }
    }

    /// Slot within a single scale's entry set, in `0..ENTRIES_PER_SCALE`
    pub const fn slot(self) -> usize {
        (self.rate.index() * GAIN_COUNT + self.gain.index()) * BUFFER_STATE_COUNT
            + self.buffer.index()
    }

    /// Slot across all scales, in `0..TOTAL_ENTRIES`
    pub const fn slot_in(self, scale: Scale) -> usize {
        scale.index() * ENTRIES_PER_SCALE + self.slot()
    }

    /// Every key, in slot order
    pub fn all() -> impl Iterator<Item = EntryKey> {
        SampleRate::ALL.into_iter().flat_map(|rate| {
            Gain::ALL.into_iter().flat_map(move |gain| {
                BufferState::ALL
                    .into_iter()
                    .map(move |buffer| EntryKey::new(rate, gain, buffer))
            })
        })
    }
}

const _: () = assert!(
    EntryKey::new(SampleRate::Sps2_5, Gain::X64, BufferState::Enabled)
        .slot_in(Scale::FourHundredVolt)
        == TOTAL_ENTRIES - 1
);
