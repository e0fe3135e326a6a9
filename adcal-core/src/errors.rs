//! Error Types for Calibration Table Operations
//!
//! ## Design Philosophy
//!
//! Errors follow the same rules as the rest of the firmware:
//!
//! 1. **Small Size**: every variant is a few bytes; errors are returned from
//!    every write accessor.
//!
//! 2. **No Heap Allocation**: no `String` payloads. The raw store error is
//!    logged at the failure site and reduced to the operation and page here.
//!
//! 3. **Copy Semantics**: errors are `Copy` so the command layer can stash and
//!    report them freely.
//!
//! ## Error Categories
//!
//! - `StoreFailure`: erase/program/read failed, never retried by the table
//! - `AccessDenied`: write attempted while the calibration gate is locked
//! - `InvalidIndex`: temperature point index outside the table
//! - `UnorderedTemperatures`: temperatures not ascending when marking valid
//! - `StoreTooSmall`: the image does not fit the store at its base page
//! - `NotLoaded`: calibration mode requested before a successful `init`
//!
//! Unknown scale names are not an error of the table: [`crate::Scale::from_name`]
//! returns `None`. [`UnrecognizedScale`] exists only for `FromStr`.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use adcal_core::CalError;
//!
//! fn report(result: Result<(), CalError>) -> &'static str {
//!     match result {
//!         Ok(()) => "OK",
//!         Err(CalError::AccessDenied) => "enter calibration mode first",
//!         Err(CalError::InvalidIndex { .. }) => "bad temperature index",
//!         Err(CalError::StoreFailure { .. }) => "flash failure",
//!         Err(_) => "rejected",
//!     }
//! }
//! # assert_eq!(report(Err(CalError::AccessDenied)), "enter calibration mode first");
//! ```

use thiserror_no_std::Error;

use crate::store::StoreOp;

/// Result type for calibration table operations
pub type CalResult<T> = Result<T, CalError>;

/// Calibration table errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalError {
    /// The underlying store operation failed
    #[error("Store {op:?} failed at page {page}")]
    StoreFailure {
        /// Operation that failed
        op: StoreOp,
        /// Absolute store page
        page: usize,
    },

    /// Write attempted while calibration mode is not enabled
    #[error("Calibration table is write protected")]
    AccessDenied,

    /// Index outside the fixed range of the table
    #[error("Index {index} outside [0, {limit})")]
    InvalidIndex {
        /// Requested index
        index: usize,
        /// Exclusive upper bound
        limit: usize,
    },

    /// Calibration temperatures are not in ascending order
    #[error("Calibration temperatures are not ascending")]
    UnorderedTemperatures,

    /// Store cannot hold the calibration image at the configured position
    #[error("Store has {available} pages, image needs {required}")]
    StoreTooSmall {
        /// Pages needed up to the end of the image
        required: usize,
        /// Pages the store provides
        available: usize,
    },

    /// The table has not been loaded from the store
    #[error("Calibration table not loaded")]
    NotLoaded,
}

/// Scale name did not match any defined scale
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Unrecognized analog input scale")]
pub struct UnrecognizedScale;

#[cfg(feature = "defmt")]
impl defmt::Format for CalError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::StoreFailure { op, page } =>
                defmt::write!(fmt, "Store {} failed at page {}", op, page),
            Self::AccessDenied =>
                defmt::write!(fmt, "Write protected"),
            Self::InvalidIndex { index, limit } =>
                defmt::write!(fmt, "Index {} outside [0, {})", index, limit),
            Self::UnorderedTemperatures =>
                defmt::write!(fmt, "Temperatures not ascending"),
            Self::StoreTooSmall { required, available } =>
                defmt::write!(fmt, "Store has {} pages, need {}", available, required),
            Self::NotLoaded =>
                defmt::write!(fmt, "Not loaded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CalError::InvalidIndex { index: 7, limit: 5 };
        assert_eq!(format!("{}", err), "Index 7 outside [0, 5)");

        let err = CalError::StoreFailure { op: StoreOp::Program, page: 12 };
        assert_eq!(format!("{}", err), "Store Program failed at page 12");
    }

    #[test]
    fn errors_stay_small() {
        assert!(core::mem::size_of::<CalError>() <= 24);
    }
}
