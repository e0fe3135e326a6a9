//! Calibration Session Example
//!
//! Walks through a factory calibration run against an in-memory store and
//! then reads the constants back the way the acquisition loop would.
//!
//! ## What You'll Learn
//!
//! - Loading a table and interpreting the load outcome
//! - Entering calibration mode and writing entries per scale
//! - Recording temperature points and per-entry gain corrections
//! - Marking the calibration valid and surviving a reset
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example calibration_session
//! ```

use adcal_core::{
    adc::{BufferState, Gain, SampleRate},
    store::MemoryStore,
    CalError, CalibrationTable, EntryKey, Scale, TableConfig, IMAGE_PAGES,
};

fn main() -> Result<(), CalError> {
    println!("ADC Calibration Session");
    println!("=======================\n");

    let store: MemoryStore<IMAGE_PAGES> = MemoryStore::new().with_lock_enforced();
    let mut table = CalibrationTable::new(store, TableConfig::default());
    println!("Load outcome: {:?}", table.init()?);
    println!("Valid: {}\n", table.is_valid());

    // Writes are refused until calibration mode is entered.
    let key = EntryKey::new(SampleRate::Sps100, Gain::X16, BufferState::Enabled);
    match table.set_gain_calibration(key, Scale::FiveVolt, 1) {
        Err(e) => println!("Locked write rejected: {}", e),
        Ok(()) => println!("Unexpected: locked write accepted"),
    }

    table.enter_calibration_mode()?;
    println!("Calibration mode: {:?}\n", table.calibration_mode());

    // Oven points shared by every entry.
    let oven = [-20.0, 0.0, 25.0, 50.0, 85.0];
    for (point, temperature) in oven.iter().enumerate() {
        table.set_calibration_temperature(*temperature, point)?;
    }

    // Measured constants for one configuration on both scales.
    let measured = [
        (Scale::FiveVolt, 0x0000_0031, 0x0040_12A0, [0.9991, 0.9996, 1.0, 1.0004, 1.0011]),
        (Scale::FourHundredVolt, 0x0000_0027, 0x0041_0F10, [0.9987, 0.9994, 1.0, 1.0006, 1.0015]),
    ];
    for (scale, offset, gain, corrections) in measured {
        table.set_offset_calibration(key, scale, offset)?;
        table.set_gain_calibration(key, scale, gain)?;
        table.set_base_gain_calibration(key, scale, 0x0040_0000)?;
        for (point, factor) in corrections.iter().enumerate() {
            table.set_gain_correction(key, scale, point, *factor)?;
        }
        println!("{:>4}: offset {:#010x}, gain {:#010x}", scale, offset, gain);
    }

    table.set_cold_junction_offset_calibration(0x0000_0012)?;
    table.set_cold_junction_gain_calibration(0x0040_0800, true)?;
    table.set_serial_number("TQ-ADC-001024")?;
    table.set_calibration_valid()?;
    table.exit_calibration_mode();
    println!("\nCalibration committed and locked");

    // Simulate a reset.
    let store = table.release();
    let mut table = CalibrationTable::new(store, TableConfig::default());
    println!("\nAfter reset: {:?}", table.init()?);
    println!("Serial: {}", table.serial_number());
    println!("Valid: {}", table.is_valid());

    for scale in Scale::ALL {
        table.set_scale(scale);
        println!("\nScale {}:", scale);
        for temperature in [-30.0, 10.0, 25.0, 40.0, 100.0] {
            println!(
                "  {:>6.1}°C  factor {:.5}  gain {:#010x}",
                temperature,
                table.gain_correction_factor(key, temperature),
                table.corrected_gain(key, temperature),
            );
        }
    }

    Ok(())
}
