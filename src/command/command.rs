extern crate serde;

use super::{Font, FontSize, ImageMode, Justification};
use serde::{Serialize, Deserialize};

/// Error correction levels for the printer-side qr code generator (`GS ( k`, function 169)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum QrErrorCorrection {
    /// Recovers ~7% of the symbol
    L,
    /// Recovers ~15% of the symbol
    M,
    /// Recovers ~25% of the symbol
    Q,
    /// Recovers ~30% of the symbol
    H
}

impl QrErrorCorrection {
    pub fn as_byte(&self) -> u8 {
        match self {
            QrErrorCorrection::L => 48,
            QrErrorCorrection::M => 49,
            QrErrorCorrection::Q => 50,
            QrErrorCorrection::H => 51
        }
    }
}

/// Where the human readable interpretation of a barcode is printed
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HriPosition {
    NotPrinted,
    Above,
    Below,
    Both
}

impl HriPosition {
    pub fn as_byte(&self) -> u8 {
        match self {
            HriPosition::NotPrinted => 0x00,
            HriPosition::Above => 0x01,
            HriPosition::Below => 0x02,
            HriPosition::Both => 0x03
        }
    }
}

/// Paper cutting modes
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CutMode {
    /// Feeds the paper `feed` units, then cuts it through
    Full {
        feed: u8
    },
    /// Cuts leaving one point uncut
    Partial
}

/// Working modes of printers that can handle both receipts and labels
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkMode {
    Mode1,
    Mode2
}

impl WorkMode {
    pub fn as_byte(&self) -> u8 {
        match self {
            WorkMode::Mode1 => 0x01,
            WorkMode::Mode2 => 0x02
        }
    }
}

/// Raw escape-protocol commands
///
/// Variable length payloads (qr data, barcode data, bit images) are not part of the command, only the opcode header that announces them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Command {
    /// Equivalent to ESC @
    Reset,
    /// Line spacing back to 1/6 inch. Equivalent to ESC 2
    DefaultLineSpacing,
    /// Line spacing in dots. Equivalent to ESC 3 n
    LineSpacing {
        dots: u8
    },
    /// Sets up a font. Equivalent to ESC M
    SelectFont {
        font: Font
    },
    /// Equivalent to ESC a n
    Justify {
        justification: Justification
    },
    /// Equivalent to GS ! n
    SelectSize {
        size: FontSize
    },
    /// Equivalent to ESC E 1
    BoldOn,
    /// Equivalent to ESC E 0
    BoldOff,
    LineFeed,
    CarriageReturn,
    /// Prints and feeds n lines. Equivalent to ESC d n
    FeedLines {
        lines: u8
    },
    /// Absolute horizontal print position. Equivalent to ESC $ nL nH
    HorizontalOffset {
        dots: u16
    },
    /// QR module size, 1 to 16 dots
    QrModuleSize {
        size: u8
    },
    QrErrorCorrection {
        level: QrErrorCorrection
    },
    /// Header announcing `length - 3` bytes of qr data to store in the symbol area
    QrStore {
        length: u16
    },
    /// Prints the qr symbol previously stored
    QrPrint,
    Cut {
        mode: CutMode
    },
    BarcodeHriPosition {
        position: HriPosition
    },
    BarcodeHriFont,
    /// Barcode height in dots
    BarcodeHeight {
        dots: u8
    },
    /// Barcode module width, 2 to 6
    BarcodeWidth {
        width: u8
    },
    /// Header announcing `length - 2` bytes of CODE128 (code set A) data
    Code128 {
        length: u8
    },
    /// Bit image header without the width. Equivalent to ESC * m
    Bitmap {
        image_mode: ImageMode
    },
    /// Zero line spacing, so that consecutive bands join. Equivalent to ESC 3 0
    NoLine,
    WorkMode {
        mode: WorkMode
    },
    /// Real time status transmission. Equivalent to DLE EOT 2
    StatusQuery
}

impl Command {
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            Command::Reset => vec![0x1b, 0x40],
            Command::DefaultLineSpacing => vec![0x1b, 0x32],
            Command::LineSpacing{dots} => vec![0x1b, 0x33, *dots],
            Command::SelectFont{font} => vec![0x1b, 0x4d, font.as_byte()],
            Command::Justify{justification} => vec![0x1b, 0x61, justification.as_byte()],
            Command::SelectSize{size} => vec![0x1d, 0x21, size.as_byte()],
            Command::BoldOn => vec![0x1b, 0x45, 0x01],
            Command::BoldOff => vec![0x1b, 0x45, 0x00],
            Command::LineFeed => vec![0x0a],
            Command::CarriageReturn => vec![0x0d],
            Command::FeedLines{lines} => vec![0x1b, 0x64, *lines],
            Command::HorizontalOffset{dots} => {
                let (low, high) = split_u16(*dots);
                vec![0x1b, 0x24, low, high]
            },
            Command::QrModuleSize{size} => vec![0x1d, 0x28, 0x6b, 0x03, 0x00, 0x31, 0x43, *size],
            Command::QrErrorCorrection{level} => vec![0x1d, 0x28, 0x6b, 0x03, 0x00, 0x31, 0x45, level.as_byte()],
            Command::QrStore{length} => {
                let (low, high) = split_u16(*length);
                vec![0x1d, 0x28, 0x6b, low, high, 0x31, 0x50, 0x30]
            },
            Command::QrPrint => vec![0x1d, 0x28, 0x6b, 0x03, 0x00, 0x31, 0x51, 0x30],
            Command::Cut{mode} => match mode {
                CutMode::Full{feed} => vec![0x1d, 0x56, 0x42, *feed],
                CutMode::Partial => vec![0x1d, 0x56, 0x43]
            },
            Command::BarcodeHriPosition{position} => vec![0x1d, 0x48, position.as_byte()],
            Command::BarcodeHriFont => vec![0x1d, 0x66, 0x48],
            Command::BarcodeHeight{dots} => vec![0x1d, 0x68, *dots],
            Command::BarcodeWidth{width} => vec![0x1d, 0x77, *width],
            Command::Code128{length} => vec![0x1d, 0x6b, 0x49, *length, 0x7b, 0x41],
            Command::Bitmap{image_mode} => vec![0x1b, 0x2a, image_mode.as_byte()],
            Command::NoLine => vec![0x1b, 0x33, 0x00],
            Command::WorkMode{mode} => vec![0x1f, 0x1b, 0x1f, 0xfc, 0x01, 0x02, 0x03, mode.as_byte()],
            Command::StatusQuery => vec![0x10, 0x04, 0x02]
        }
    }
}

/// Splits a 16 bit quantity in the (low, high) byte pair used by the length and position arguments
///
/// ```rust
/// # use bleprint::command::split_u16;
/// let (low, high) = split_u16(7092);
/// assert_eq!(7092, low as u16 + 256 * high as u16);
/// ```
pub fn split_u16(value: u16) -> (u8, u8) {
    ((value % 256) as u8, (value / 256) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_split_reconstructs_every_value() {
        for offset in 0..=u16::MAX {
            let (remainder, quotient) = split_u16(offset);
            assert_eq!(offset as u32, remainder as u32 + 256 * quotient as u32);
        }
    }

    #[test]
    fn horizontal_offset_is_little_endian() {
        assert_eq!(vec![0x1b, 0x24, 0x2c, 0x01], Command::HorizontalOffset{dots: 300}.as_bytes());
    }

    #[test]
    fn cut_modes() {
        assert_eq!(vec![0x1d, 0x56, 66, 5], Command::Cut{mode: CutMode::Full{feed: 5}}.as_bytes());
        assert_eq!(vec![0x1d, 0x56, 67], Command::Cut{mode: CutMode::Partial}.as_bytes());
    }

    #[test]
    fn qr_store_header_carries_length_pair() {
        let bytes = Command::QrStore{length: 7092}.as_bytes();
        assert_eq!(7092, bytes[3] as u16 + 256 * bytes[4] as u16);
        assert_eq!(&[0x31, 0x50, 48], &bytes[5..]);
    }
}
