//! Constants for the calibration table
//!
//! All sizes and offsets of the persisted image are fixed at build time and
//! live here, next to the default values loaded into a blank table.
//!
//! ## Organization
//!
//! - **Calibration**: table dimensions and factory defaults
//! - **Layout**: byte offsets of every region in the persisted image
//!
//! Layout constants are derived from the calibration constants, so changing
//! a dimension moves every region after it. Bump
//! [`layout::LAYOUT_VERSION`] whenever that happens.

/// Table dimensions, string limits and default values.
pub mod calibration;

/// Persisted image layout (offsets, sizes, markers).
pub mod layout;

pub use calibration::{
    CAL_TEMP_POINTS, SERIAL_NUMBER_LEN,
    DEFAULT_CORRECTION_FACTOR, DEFAULT_CALIBRATION_TEMPERATURE_C,
};

pub use layout::{
    PAGE_SIZE, IMAGE_LEN, IMAGE_PAGES, IMAGE_MAGIC, LAYOUT_VERSION,
};
