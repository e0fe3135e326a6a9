//! Shared fixtures for calibration table integration tests
//!
//! - store and table constructors
//! - a power-cycle helper (release the store, build a new table, `init`)
//! - a fully calibrated reference session

#![allow(dead_code)]

use adcal_core::{
    adc::{BufferState, Gain, SampleRate},
    store::MemoryStore,
    CalResult, CalibrationTable, EntryKey, LoadState, Scale, TableConfig, IMAGE_PAGES,
};

/// Store exactly the size of one image
pub type Store = MemoryStore<IMAGE_PAGES>;

/// Table over a [`Store`]
pub type Table = CalibrationTable<Store>;

/// Temperatures of a typical oven run
pub const OVEN_TEMPERATURES: [f32; 5] = [0.0, 25.0, 50.0, 75.0, 100.0];

/// Serial number used by the reference session
pub const SERIAL: &str = "TQ-ADC-000731";

/// Entry exercised by most tests
pub fn key() -> EntryKey {
    EntryKey::new(SampleRate::Sps1000, Gain::X4, BufferState::Enabled)
}

/// Entry on the far end of the slot range
pub fn last_key() -> EntryKey {
    EntryKey::new(SampleRate::Sps2_5, Gain::X64, BufferState::Enabled)
}

/// Freshly initialised table over a blank store
pub fn blank_table() -> Table {
    let mut table = CalibrationTable::new(Store::new(), TableConfig::default());
    assert_eq!(table.init().expect("blank store readable"), LoadState::Blank);
    table
}

/// Simulate a reset: drop the table and reload from the same store
pub fn power_cycle(table: Table) -> (Table, LoadState) {
    let config = *table.config();
    let store = table.release();
    let mut table = CalibrationTable::new(store, config);
    let state = table.init().expect("store readable after reset");
    (table, state)
}

/// Distinct gain value for every slot so mix-ups show
pub fn gain_for(key: EntryKey, scale: Scale) -> u32 {
    0x0040_0000 + (key.slot_in(scale) as u32) * 0x11
}

/// Run a complete calibration session and leave the table locked
pub fn calibrate(table: &mut Table) -> CalResult<()> {
    table.enter_calibration_mode()?;
    for (point, t) in OVEN_TEMPERATURES.iter().enumerate() {
        table.set_calibration_temperature(*t, point)?;
    }
    for scale in Scale::ALL {
        for key in [key(), last_key()] {
            table.set_offset_calibration(key, scale, 0x0000_0100)?;
            table.set_gain_calibration(key, scale, gain_for(key, scale))?;
            table.set_base_gain_calibration(key, scale, 0x0040_0000)?;
            table.set_gain_correction(key, scale, 4, 1.004)?;
        }
    }
    table.set_cold_junction_offset_calibration(0x0000_0042)?;
    table.set_cold_junction_gain_calibration(0x0040_1000, true)?;
    table.set_serial_number(SERIAL)?;
    table.set_calibration_valid()?;
    table.exit_calibration_mode();
    Ok(())
}
