//! Full-scale input ranges of the analog front end
//!
//! The active scale selects which entry set the rate/gain/buffer accessors
//! read. Scale names arrive from host commands, so parsing never fails hard:
//! an unknown name maps to `None`, never to a defined scale.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::UnrecognizedScale;

/// Selectable full-scale input range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scale {
    /// ±5 V direct input
    #[default]
    FiveVolt,
    /// ±400 V through the high-voltage divider
    FourHundredVolt,
}

impl Scale {
    /// Every scale, in index order
    pub const ALL: [Scale; 2] = [Self::FiveVolt, Self::FourHundredVolt];

    /// Dense index in `0..ALL.len()`
    pub const fn index(self) -> usize {
        match self {
            Self::FiveVolt => 0,
            Self::FourHundredVolt => 1,
        }
    }

    /// Human readable name, as used by host commands
    pub const fn name(self) -> &'static str {
        match self {
            Self::FiveVolt => "5V",
            Self::FourHundredVolt => "400V",
        }
    }

    /// Parse a human readable name
    ///
    /// Surrounding whitespace and ASCII case are ignored. Returns `None` for
    /// anything that is not a defined scale.
    pub fn from_name(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|scale| scale.name().eq_ignore_ascii_case(text))
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Scale {
    type Err = UnrecognizedScale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or(UnrecognizedScale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for scale in Scale::ALL {
            assert_eq!(Scale::from_name(scale.name()), Some(scale));
        }
    }

    #[test]
    fn parsing_is_lenient() {
        assert_eq!(Scale::from_name(" 400v "), Some(Scale::FourHundredVolt));
        assert_eq!(Scale::from_name("5v"), Some(Scale::FiveVolt));
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(Scale::from_name("garbage"), None);
        assert_eq!(Scale::from_name(""), None);
        assert_eq!(Scale::from_name("50V"), None);
        assert!("10V".parse::<Scale>().is_err());
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(format!("{}", Scale::FourHundredVolt), "400V");
    }
}
