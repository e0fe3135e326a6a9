//! Runtime configuration of a calibration table
//!
//! The image layout is fixed at build time (see [`crate::constants`]); only
//! its placement in the store and the scale selected at start-up are chosen
//! at run time.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::layout::IMAGE_PAGES;
use crate::scale::Scale;

/// Table placement and start-up settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TableConfig {
    /// First store page of the calibration image
    pub base_page: usize,
    /// Active scale after [`crate::CalibrationTable::init`]
    pub default_scale: Scale,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            base_page: 0,
            default_scale: Scale::FiveVolt,
        }
    }
}

impl TableConfig {
    /// Place the image at `page`
    pub fn with_base_page(mut self, page: usize) -> Self {
        self.base_page = page;
        self
    }

    /// Select the scale used after start-up
    pub fn with_default_scale(mut self, scale: Scale) -> Self {
        self.default_scale = scale;
        self
    }

    /// Store pages the image needs, counting from page zero
    ///
    /// `None` when the end of the image does not fit in `usize`.
    pub fn required_pages(&self) -> Option<usize> {
        self.base_page.checked_add(IMAGE_PAGES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = TableConfig::default()
            .with_base_page(64)
            .with_default_scale(Scale::FourHundredVolt);
        assert_eq!(config.base_page, 64);
        assert_eq!(config.default_scale, Scale::FourHundredVolt);
        assert_eq!(config.required_pages(), Some(64 + IMAGE_PAGES));
    }

    #[test]
    fn base_page_near_usize_max_does_not_overflow() {
        let config = TableConfig::default().with_base_page(usize::MAX - 1);
        assert_eq!(config.required_pages(), None);
    }
}
