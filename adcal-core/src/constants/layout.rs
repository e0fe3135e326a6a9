//! Persisted Image Layout
//!
//! The calibration image is a single contiguous little-endian record:
//!
//! ```text
//! offset        size   region
//! ------------  -----  ------------------------------------------------
//! 0             8      header: magic (u32), layout version (u16), reserved
//! 8             14336  entries: scale-major, then rate, gain, buffer
//!                      each: offset u32, gain u32, base gain u32,
//!                            CAL_TEMP_POINTS x correction factor f32
//! 14344         20     calibration temperatures (f32 each)
//! 14364         8      cold junction: offset u32, gain u32
//! 14372         32     serial number, zero padded
//! 14404         4      validity marker (u32)
//! 14408         4      CRC-32 of bytes [0, 14408)
//! ```
//!
//! The image spans [`IMAGE_PAGES`] store pages; the CRC always lives in the
//! last one.

use super::calibration::{CAL_TEMP_POINTS, SERIAL_NUMBER_LEN, TOTAL_ENTRIES};

/// Store page size in bytes (erase and program granularity).
pub const PAGE_SIZE: usize = 256;

/// Identifies a calibration image ("CALT").
pub const IMAGE_MAGIC: u32 = 0x5441_4C43;

/// Layout revision. A stored image with another revision is not loaded.
pub const LAYOUT_VERSION: u16 = 1;

/// Marker written to the validity word once calibration is complete.
///
/// Any other value (including erased flash) reads as "not valid".
pub const VALID_MARKER: u32 = 0xA5A5_5A5A;

/// Value of an erased flash byte.
pub const ERASED_BYTE: u8 = 0xFF;

// ===== REGION SIZES =====

/// Header size: magic, version, reserved.
pub const HEADER_LEN: usize = 8;

/// Serialized size of one calibration entry including its correction factors.
pub const ENTRY_LEN: usize = 12 + 4 * CAL_TEMP_POINTS;

/// Serialized size of the temperature list.
pub const TEMPERATURES_LEN: usize = 4 * CAL_TEMP_POINTS;

/// Serialized size of the cold-junction constants.
pub const COLD_JUNCTION_LEN: usize = 8;

/// Serialized size of the validity marker.
pub const VALID_LEN: usize = 4;

/// Serialized size of the trailing checksum.
pub const CRC_LEN: usize = 4;

// ===== REGION OFFSETS =====

/// Offset of the first calibration entry.
pub const ENTRIES_OFFSET: usize = HEADER_LEN;

/// Offset of the calibration temperature list.
pub const TEMPERATURES_OFFSET: usize = ENTRIES_OFFSET + ENTRY_LEN * TOTAL_ENTRIES;

/// Offset of the cold-junction constants.
pub const COLD_JUNCTION_OFFSET: usize = TEMPERATURES_OFFSET + TEMPERATURES_LEN;

/// Offset of the serial number.
pub const SERIAL_OFFSET: usize = COLD_JUNCTION_OFFSET + COLD_JUNCTION_LEN;

/// Offset of the validity marker.
pub const VALID_OFFSET: usize = SERIAL_OFFSET + SERIAL_NUMBER_LEN;

/// Offset of the CRC-32 trailer.
pub const CRC_OFFSET: usize = VALID_OFFSET + VALID_LEN;

/// Total image length in bytes.
pub const IMAGE_LEN: usize = CRC_OFFSET + CRC_LEN;

/// Store pages occupied by the image.
pub const IMAGE_PAGES: usize = (IMAGE_LEN + PAGE_SIZE - 1) / PAGE_SIZE;

/// Page holding the CRC trailer, relative to the start of the image.
pub const CRC_PAGE: usize = CRC_OFFSET / PAGE_SIZE;

const _: () = assert!(CRC_OFFSET + CRC_LEN <= IMAGE_PAGES * PAGE_SIZE);
const _: () = assert!(CRC_PAGE == IMAGE_PAGES - 1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_follow_documented_offsets() {
        assert_eq!(ENTRY_LEN, 32);
        assert_eq!(TEMPERATURES_OFFSET, 14344);
        assert_eq!(COLD_JUNCTION_OFFSET, 14364);
        assert_eq!(SERIAL_OFFSET, 14372);
        assert_eq!(VALID_OFFSET, 14404);
        assert_eq!(CRC_OFFSET, 14408);
        assert_eq!(IMAGE_LEN, 14412);
    }

    #[test]
    fn image_fits_its_pages() {
        assert_eq!(IMAGE_PAGES, 57);
        assert!(IMAGE_LEN <= IMAGE_PAGES * PAGE_SIZE);
        assert!(IMAGE_LEN > (IMAGE_PAGES - 1) * PAGE_SIZE);
    }
}
