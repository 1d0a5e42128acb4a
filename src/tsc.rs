extern crate hex;

use crate::command::Charset;
use log::warn;
use serde::{Serialize, Deserialize};

/// Clockwise rotation of a label element
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    None,
    Quarter,
    Half,
    ThreeQuarters
}

impl Rotation {
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarters => 270
        }
    }
}

impl Default for Rotation {
    fn default() -> Rotation {
        Rotation::None
    }
}

/// How bitmap data is combined with what is already on the label
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitmapMode {
    Overwrite,
    Or,
    Xor
}

impl BitmapMode {
    pub fn as_arg(&self) -> u8 {
        match self {
            BitmapMode::Overwrite => 0,
            BitmapMode::Or => 1,
            BitmapMode::Xor => 2
        }
    }
}

/// One dimensional barcode symbologies
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarcodeType {
    Ean13,
    Ean8,
    Upca,
    Itf14,
    Code39,
    Code128
}

impl BarcodeType {
    /// Type tag the firmware expects
    pub fn tag(&self) -> &'static str {
        match self {
            BarcodeType::Ean13 => "EAN13",
            BarcodeType::Ean8 => "EAN8",
            BarcodeType::Upca => "UPCA",
            BarcodeType::Itf14 => "ITF14",
            BarcodeType::Code39 => "39",
            BarcodeType::Code128 => "128"
        }
    }
}

/// Qr error correction, from ~7% (`L`) to ~30% (`H`) of the symbol
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum QrEcc {
    L,
    M,
    Q,
    H
}

impl QrEcc {
    pub fn as_arg(&self) -> char {
        match self {
            QrEcc::L => 'L',
            QrEcc::M => 'M',
            QrEcc::Q => 'Q',
            QrEcc::H => 'H'
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum QrMode {
    Auto,
    Manual
}

impl QrMode {
    pub fn as_arg(&self) -> char {
        match self {
            QrMode::Auto => 'A',
            QrMode::Manual => 'M'
        }
    }
}

/// When the printer reports its status on its own
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TscResponse {
    /// After every label
    On,
    Off,
    /// Once the whole batch is printed
    Batch
}

impl TscResponse {
    pub fn as_arg(&self) -> &'static str {
        match self {
            TscResponse::On => "ON",
            TscResponse::Off => "OFF",
            TscResponse::Batch => "BATCH"
        }
    }
}

/// Command buffer builder for tsc label printers
///
/// Every call appends one self-contained, CRLF terminated command line. Label geometry is given in millimeters, positions in dots (8 dots per millimeter on 203 dpi heads).
///
/// ```rust
/// use bleprint::{TscEncoder, tsc::{Rotation, QrEcc, QrMode}};
///
/// let mut encoder = TscEncoder::new();
/// encoder.add_size(40, 30);
/// encoder.add_gap(2, 0);
/// encoder.add_cls();
/// encoder.add_text(10, 10, "TSS24.BF2", Rotation::None, 1, 1, "Hello");
/// encoder.add_qr_code(10, 60, QrEcc::M, 4, QrMode::Auto, Rotation::None, "https://example.com");
/// encoder.add_print(1, 1);
/// assert!(encoder.as_bytes().starts_with(b"SIZE 40 mm,30 mm\r\nGAP 2 mm,0 mm\r\nCLS\r\n"));
/// ```
#[derive(Clone, Debug)]
pub struct TscEncoder {
    buffer: Vec<u8>,
    /// Encoding of the strings placed with `TEXT`
    charset: Charset
}

impl TscEncoder {
    pub fn new() -> TscEncoder {
        TscEncoder::with_charset(Charset::Gb18030)
    }

    pub fn with_charset(charset: Charset) -> TscEncoder {
        TscEncoder {
            buffer: Vec::new(),
            charset
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Label width and height, in millimeters
    pub fn add_size(&mut self, width: u32, height: u32) {
        self.line(format!("SIZE {} mm,{} mm", width, height));
    }

    /// Gap between labels and its offset, in millimeters
    pub fn add_gap(&mut self, gap: u32, offset: u32) {
        self.line(format!("GAP {} mm,{} mm", gap, offset));
    }

    /// Black mark height and the extra feed after each label, for black mark media. Not to be combined with a gap
    pub fn add_bline(&mut self, height: u32, extra_feed: u32) {
        self.line(format!("BLINE {} mm,{} mm", height, extra_feed));
    }

    /// Origin of the label coordinate system
    pub fn add_reference(&mut self, x: u32, y: u32) {
        self.line(format!("REFERENCE {},{}", x, y));
    }

    /// Print speed, in inches per second
    pub fn add_speed(&mut self, speed: u32) {
        self.line(format!("SPEED {}", speed));
    }

    /// Darkness, from 0 (lightest) to 15
    pub fn add_density(&mut self, density: u8) {
        self.line(format!("DENSITY {}", density.min(15)));
    }

    pub fn add_direction(&mut self, direction: u8) {
        self.line(format!("DIRECTION {}", direction));
    }

    /// Clears the image buffer
    pub fn add_cls(&mut self) {
        self.line("CLS");
    }

    /// Places a string
    ///
    /// Scale factors are clamped to 1..=10. The whole line goes out in the encoder's charset; if the text can not be represented, the line is dropped with a warning.
    pub fn add_text<A: AsRef<str>, B: AsRef<str>>(&mut self, x: u32, y: u32, font: A, rotation: Rotation, x_scale: u8, y_scale: u8, text: B) {
        let line = format!("TEXT {},{},{},{},{},{},{}",
            x, y,
            quote(font.as_ref()),
            rotation.degrees(),
            clamp_scale(x_scale),
            clamp_scale(y_scale),
            quote(text.as_ref())
        );
        match self.charset.encode(&line) {
            Ok(encoded) => {
                self.buffer.extend_from_slice(&encoded);
                self.terminate();
            },
            Err(e) => warn!("Dropping text command: {}", e)
        }
    }

    /// Places raw bitmap data
    ///
    /// `width_bytes` is the row length in bytes (8 dots each) and `height` the number of rows, in dots. The data is passed through as lowercase hex.
    pub fn add_bitmap(&mut self, x: u32, y: u32, width_bytes: u32, height: u32, mode: BitmapMode, data: &[u8]) {
        self.line(format!("BITMAP {},{},{},{},{},{}", x, y, width_bytes, height, mode.as_arg(), hex::encode(data)));
    }

    /// Places a one dimensional barcode
    ///
    /// `narrow` and `wide` are the bar widths in dots, the printer defaults being 2 and 4.
    pub fn add_barcode<A: AsRef<str>>(&mut self, x: u32, y: u32, barcode_type: BarcodeType, height: u32, readable: bool, rotation: Rotation, narrow: u8, wide: u8, content: A) {
        self.line(format!("BARCODE {},{},{},{},{},{},{},{},{}",
            x, y,
            quote(barcode_type.tag()),
            height,
            readable as u8,
            rotation.degrees(),
            narrow,
            wide,
            quote(content.as_ref())
        ));
    }

    /// Places a qr code, `cell_width` being clamped to 1..=10
    pub fn add_qr_code<A: AsRef<str>>(&mut self, x: u32, y: u32, ecc: QrEcc, cell_width: u8, mode: QrMode, rotation: Rotation, content: A) {
        self.line(format!("QRCODE {},{},{},{},{},{},{}",
            x, y,
            ecc.as_arg(),
            clamp_scale(cell_width),
            mode.as_arg(),
            rotation.degrees(),
            quote(content.as_ref())
        ));
    }

    /// Filled rectangle
    pub fn add_bar(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.line(format!("BAR {},{},{},{}", x, y, width, height));
    }

    /// Rectangle outline
    pub fn add_box(&mut self, x_start: u32, y_start: u32, x_end: u32, y_end: u32, thickness: u32) {
        self.line(format!("BOX {},{},{},{},{}", x_start, y_start, x_end, y_end, thickness));
    }

    /// Inverts the colors of a region
    pub fn add_reverse(&mut self, x_start: u32, y_start: u32, width: u32, height: u32) {
        self.line(format!("REVERSE {},{},{},{}", x_start, y_start, width, height));
    }

    /// Prints the buffer: `copies` labels, each repeated `repeat` times. Both are at least 1
    pub fn add_print(&mut self, copies: u16, repeat: u16) {
        self.line(format!("PRINT {},{}", copies.max(1), repeat.max(1)));
    }

    pub fn add_peel(&mut self, enabled: bool) {
        self.line(format!("SET PEEL {}", on_off(enabled)));
    }

    pub fn add_tear(&mut self, enabled: bool) {
        self.line(format!("SET TEAR {}", on_off(enabled)));
    }

    /// Cash drawer pulse on pin `pin`, `on_time` and `off_time` in units of the firmware
    pub fn add_cash_drawer(&mut self, pin: u8, on_time: u8, off_time: u8) {
        self.line(format!("CASHDRAWER {},{},{}", pin, on_time, off_time));
    }

    /// Feeds one label
    pub fn add_form_feed(&mut self) {
        self.line("FORMFEED");
    }

    /// Feeds up to the start of the next label
    pub fn add_home(&mut self) {
        self.line("HOME");
    }

    /// Beep with a tone level (0..=9) for `interval` milliseconds (1..=4095)
    pub fn add_sound(&mut self, level: u8, interval: u16) {
        self.line(format!("SOUND {},{}", level.min(9), interval.max(1).min(4095)));
    }

    pub fn add_self_test(&mut self) {
        self.line("SELFTEST");
    }

    /// Immediate status request, answered with a single byte (0 when the printer is fine)
    pub fn add_status_query(&mut self) {
        self.buffer.extend_from_slice(&[0x1b, b'!', b'?']);
        self.terminate();
    }

    /// Automatic status reports
    pub fn add_response(&mut self, response: TscResponse) {
        self.line(format!("SET RESPONSE {}", response.as_arg()));
    }

    fn line<A: AsRef<str>>(&mut self, line: A) {
        self.buffer.extend_from_slice(line.as_ref().as_bytes());
        self.terminate();
    }

    fn terminate(&mut self) {
        self.buffer.extend_from_slice(b"\r\n");
    }
}

impl Default for TscEncoder {
    fn default() -> TscEncoder {
        TscEncoder::new()
    }
}

/// Quotes a string argument, escaping inner quotes the way the firmware expects
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\[\"]"))
}

fn clamp_scale(scale: u8) -> u8 {
    scale.max(1).min(10)
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {"ON"} else {"OFF"}
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(encoder: TscEncoder) -> String {
        String::from_utf8(encoder.into_bytes()).unwrap()
    }

    #[test]
    fn label_setup_lines() {
        let mut encoder = TscEncoder::new();
        encoder.add_size(40, 30);
        encoder.add_gap(2, 0);
        encoder.add_bline(3, 1);
        encoder.add_reference(0, 0);
        encoder.add_speed(4);
        encoder.add_density(30);
        encoder.add_direction(1);
        encoder.add_cls();
        assert_eq!(
            "SIZE 40 mm,30 mm\r\nGAP 2 mm,0 mm\r\nBLINE 3 mm,1 mm\r\nREFERENCE 0,0\r\nSPEED 4\r\nDENSITY 15\r\nDIRECTION 1\r\nCLS\r\n",
            lines(encoder)
        );
    }

    #[test]
    fn text_scales_are_clamped() {
        let mut encoder = TscEncoder::new();
        encoder.add_text(10, 20, "3", Rotation::Quarter, 0, 12, "abc");
        assert_eq!("TEXT 10,20,\"3\",90,1,10,\"abc\"\r\n", lines(encoder));
    }

    #[test]
    fn text_uses_the_charset() {
        let mut encoder = TscEncoder::new();
        encoder.add_text(0, 0, "TSS24.BF2", Rotation::None, 1, 1, "中");
        let bytes = encoder.into_bytes();
        let expected: &[u8] = b"\",0,1,1,\"\xd6\xd0\"\r\n";
        assert!(bytes.ends_with(expected));
    }

    #[test]
    fn inner_quotes_are_escaped() {
        let mut encoder = TscEncoder::new();
        encoder.add_barcode(100, 100, BarcodeType::Code39, 40, true, Rotation::None, 2, 4, "A\"B");
        assert_eq!("BARCODE 100,100,\"39\",40,1,0,2,4,\"A\\[\"]B\"\r\n", lines(encoder));
    }

    #[test]
    fn bitmap_data_is_lowercase_hex() {
        let mut encoder = TscEncoder::new();
        encoder.add_bitmap(5, 6, 2, 1, BitmapMode::Xor, &[0xab, 0x0f]);
        assert_eq!("BITMAP 5,6,2,1,2,ab0f\r\n", lines(encoder));
    }

    #[test]
    fn qr_code_line() {
        let mut encoder = TscEncoder::new();
        encoder.add_qr_code(20, 24, QrEcc::L, 4, QrMode::Auto, Rotation::None, "www.example.com");
        assert_eq!("QRCODE 20,24,L,4,A,0,\"www.example.com\"\r\n", lines(encoder));
    }

    #[test]
    fn shapes_and_peripherals() {
        let mut encoder = TscEncoder::new();
        encoder.add_bar(1, 2, 3, 4);
        encoder.add_box(1, 2, 30, 40, 2);
        encoder.add_reverse(1, 2, 3, 4);
        encoder.add_cash_drawer(0, 50, 50);
        encoder.add_sound(5, 100);
        encoder.add_self_test();
        encoder.add_form_feed();
        encoder.add_home();
        encoder.add_peel(true);
        encoder.add_tear(false);
        encoder.add_response(TscResponse::Batch);
        encoder.add_print(0, 2);
        assert_eq!(
            concat!(
                "BAR 1,2,3,4\r\nBOX 1,2,30,40,2\r\nREVERSE 1,2,3,4\r\nCASHDRAWER 0,50,50\r\n",
                "SOUND 5,100\r\nSELFTEST\r\nFORMFEED\r\nHOME\r\nSET PEEL ON\r\nSET TEAR OFF\r\n",
                "SET RESPONSE BATCH\r\nPRINT 1,2\r\n"
            ),
            lines(encoder)
        );
    }

    #[test]
    fn status_query_uses_the_escape_byte() {
        let mut encoder = TscEncoder::new();
        encoder.add_status_query();
        assert_eq!(vec![0x1b, 0x21, 0x3f, 0x0d, 0x0a], encoder.into_bytes());
    }
}
