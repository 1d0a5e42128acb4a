extern crate serde;

use serde::{Serialize, Deserialize};

/// Character fonts selectable with `ESC M`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, PartialEq)]
pub enum Font {
    Standard,
    Compressed
}

impl Eq for Font{}

impl Font {
    /// Byte representation of each font.
    pub fn as_byte(&self) -> u8 {
        match self {
            Font::Standard => 0x00,
            Font::Compressed => 0x01
        }
    }
}

/// Character size levels selectable with `GS !`
///
/// The two middle levels take twice the horizontal room of [Small](FontSize::Small), the largest one four times.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, PartialEq)]
pub enum FontSize {
    Small,
    Medium,
    MediumLarge,
    Large
}

impl Eq for FontSize{}

impl FontSize {
    /// Byte representation of each size.
    pub fn as_byte(&self) -> u8 {
        match self {
            FontSize::Small => 0x00,
            FontSize::Medium => 0x01,
            FontSize::MediumLarge => 0x02,
            FontSize::Large => 0x03
        }
    }

    /// How many columns of the smallest size one column of this size spans
    pub fn width_multiplier(&self) -> usize {
        match self {
            FontSize::Small => 1,
            FontSize::Medium | FontSize::MediumLarge => 2,
            FontSize::Large => 4
        }
    }
}

impl Default for FontSize {
    fn default() -> FontSize {
        FontSize::Small
    }
}
