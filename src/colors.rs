//! Color classification helpers.
//!
//! The color sensor reports three raw channel intensities. Classification is a
//! plain arg-max over those channels; when two or more channels share the
//! maximum, the first one in Red, Green, Blue order wins.
//!
//! Readings use `palette::Srgb<T>` so any component type works (`u8`, `u16`,
//! normalized `f32`, ...).

use crate::types::BlockColor;
use palette::Srgb;

/// Classifies a raw sensor reading by its strongest channel.
///
/// Ties resolve in Red, Green, Blue priority order.
#[inline]
pub fn classify<T: PartialOrd>(reading: Srgb<T>) -> BlockColor {
    if reading.red >= reading.green && reading.red >= reading.blue {
        BlockColor::Red
    } else if reading.green >= reading.blue {
        BlockColor::Green
    } else {
        BlockColor::Blue
    }
}

impl<T: PartialOrd> From<Srgb<T>> for BlockColor {
    fn from(reading: Srgb<T>) -> Self {
        classify(reading)
    }
}
