extern crate serde;

use serde::{Serialize, Deserialize};

/// Horizontal alignment of text, images and codes
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Justification {
    Left,
    Center,
    Right
}

impl Justification {
    /// Argument byte for `ESC a n`
    pub fn as_byte(&self) -> u8 {
        match self {
            Justification::Left => 0x00,
            Justification::Center => 0x01,
            Justification::Right => 0x02
        }
    }
}

impl Default for Justification {
    fn default() -> Justification {
        Justification::Left
    }
}
