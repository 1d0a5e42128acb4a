extern crate barcoders;
extern crate image;
extern crate log;
extern crate qrcode;

use crate::{
    Error,
    command::{Charset, Command, CutMode, Font, FontSize, HriPosition, Justification, QrErrorCorrection, WorkMode},
    formatter::Formatter,
    raster::RasterImage
};
use barcoders::sym::code128::Code128;
use image::{DynamicImage, ImageBuffer, Luma, imageops::FilterType};
use log::warn;
use qrcode::{EcLevel, QrCode};

/// Largest `k = payload + 3` the qr symbol storage function accepts
pub const QR_STORE_MAX: usize = 7092;
/// Print dots across a 58mm head
pub const DEFAULT_IMAGE_WIDTH: u32 = 384;
/// Default width for qr codes rendered as images
pub const DEFAULT_QR_IMAGE_WIDTH: u32 = 264;
/// Default width for barcodes rendered as images
pub const DEFAULT_BARCODE_IMAGE_WIDTH: u32 = 300;

/// Blank modules on each side of a rendered barcode
const BARCODE_QUIET_ZONE: u32 = 10;
/// Bar height of a rendered barcode, in modules
const BARCODE_HEIGHT: u32 = 32;

const LINE_SPACING: u8 = 36;
const COMPACT_LINE_SPACING: u8 = 8;

/// Command buffer builder for esc/pos receipt printers
///
/// The encoder keeps the bytes until [into_bytes](EscEncoder::into_bytes) hands them off, usually to a [PrinterSession](crate::PrinterSession). Every composite method (`append_*`) sets the attributes it needs and restores the non-bold, small font state afterwards, so calls can be chained without manual resets.
///
/// ```rust
/// use bleprint::{EscEncoder, command::{FontSize, Justification}};
///
/// let mut encoder = EscEncoder::new();
/// encoder.append_text("Receipt", Justification::Center, FontSize::MediumLarge, true);
/// encoder.append_key_value("Total", "88.00", FontSize::Small, true, true);
/// encoder.append_qr_code("https://example.com", 7, Justification::Center).unwrap();
/// let buffer = encoder.into_bytes();
/// assert_eq!(&[0x1b, 0x40], &buffer[..2]);
/// ```
#[derive(Clone, Debug)]
pub struct EscEncoder {
    buffer: Vec<u8>,
    charset: Charset,
    /// Every newline uses the compact line spacing
    compact_spacing: bool,
    /// Overrides the bold flag of every composite text
    force_bold: bool,
    formatter: Formatter
}

impl EscEncoder {
    /// Creates an encoder using GB18030 for text
    ///
    /// The buffer starts with a printer reset, the default line spacing and the standard font.
    pub fn new() -> EscEncoder {
        EscEncoder::with_charset(Charset::Gb18030)
    }

    pub fn with_charset(charset: Charset) -> EscEncoder {
        EscEncoder::with_formatter(charset, Formatter::new())
    }

    /// Creates an encoder laying out columns for another paper geometry
    ///
    /// ```rust
    /// use bleprint::{EscEncoder, command::Charset, formatter::Formatter};
    ///
    /// // 80mm paper, 48 columns of the smallest font
    /// let encoder = EscEncoder::with_formatter(Charset::Gb18030, Formatter::with_geometry(572, 48));
    /// assert_eq!(48, encoder.formatter().columns());
    /// ```
    pub fn with_formatter(charset: Charset, formatter: Formatter) -> EscEncoder {
        let mut encoder = EscEncoder {
            buffer: Vec::new(),
            charset,
            compact_spacing: false,
            force_bold: false,
            formatter
        };
        encoder.command(Command::Reset);
        encoder.command(Command::DefaultLineSpacing);
        encoder.command(Command::SelectFont{font: Font::Standard});
        encoder
    }

    pub fn set_compact_spacing(&mut self, compact_spacing: bool) {
        self.compact_spacing = compact_spacing;
    }

    pub fn set_force_bold(&mut self, force_bold: bool) {
        self.force_bold = force_bold;
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Bytes encoded so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Hands off the finished buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Appends a raw command
    pub fn command(&mut self, command: Command) {
        self.buffer.extend_from_slice(&command.as_bytes());
    }

    /// Appends bytes as they are
    pub fn raw<A: AsRef<[u8]>>(&mut self, bytes: A) {
        self.buffer.extend_from_slice(bytes.as_ref());
    }

    /// Line feed, preceded by the compact line spacing when it is enabled
    pub fn new_line(&mut self) {
        if self.compact_spacing {
            self.set_line_spacing(COMPACT_LINE_SPACING);
        }
        self.command(Command::LineFeed);
    }

    pub fn set_line_spacing(&mut self, dots: u8) {
        self.command(Command::LineSpacing{dots});
    }

    pub fn carriage_return(&mut self) {
        self.command(Command::CarriageReturn);
    }

    pub fn set_alignment(&mut self, justification: Justification) {
        self.command(Command::Justify{justification});
    }

    pub fn set_font_size(&mut self, size: FontSize) {
        self.command(Command::SelectSize{size});
    }

    pub fn set_bold(&mut self, bold: bool) {
        self.command(if bold {Command::BoldOn} else {Command::BoldOff});
    }

    /// Appends text in the encoder's charset
    ///
    /// With a `max_bytes` budget, text whose encoding is longer than the budget is cut to `max_bytes - 1` bytes (at a character boundary) and followed by `...`. The ellipsis is not accounted in the budget. Text that the charset can not represent is dropped with a warning.
    pub fn set_text<A: AsRef<str>>(&mut self, text: A, max_bytes: Option<usize>) {
        let text = text.as_ref();
        let encoded = match self.charset.encode(text) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Dropping text field: {}", e);
                return;
            }
        };
        match max_bytes {
            Some(budget) if budget > 0 && encoded.len() > budget => {
                let truncated = self.charset.prefix_within(text, budget - 1) + "...";
                self.set_text(truncated, None);
            },
            _ => self.buffer.extend_from_slice(&encoded)
        }
    }

    /// Text placed so that its right edge lands on the right edge of the printable area
    pub fn set_offset_text<A: AsRef<str>>(&mut self, text: A, font_size: FontSize) {
        let offset = self.formatter.right_aligned_offset(text.as_ref(), font_size);
        self.set_offset(offset);
        self.set_text(text, None);
    }

    /// Absolute horizontal position, in dots from the left margin
    pub fn set_offset(&mut self, dots: u16) {
        self.command(Command::HorizontalOffset{dots});
    }

    /// Qr module size, clamped to 1..=16
    pub fn set_qr_module_size(&mut self, size: u8) {
        self.command(Command::QrModuleSize{size: size.max(1).min(16)});
    }

    pub fn set_qr_error_correction(&mut self, level: QrErrorCorrection) {
        self.command(Command::QrErrorCorrection{level});
    }

    /// Stores the qr payload (UTF-8) in the printer's symbol area
    ///
    /// Nothing gets printed until [print_stored_qr](EscEncoder::print_stored_qr) is called.
    pub fn store_qr_data<A: AsRef<str>>(&mut self, payload: A) -> Result<(), Error> {
        let data = payload.as_ref().as_bytes();
        let length = data.len() + 3;
        if length > QR_STORE_MAX {
            return Err(Error::PayloadTooLong{length, max: QR_STORE_MAX});
        }
        self.command(Command::QrStore{length: length as u16});
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    pub fn print_stored_qr(&mut self) {
        self.command(Command::QrPrint);
    }

    /// Prints and feeds `lines` lines
    pub fn feed_lines(&mut self, lines: u8) {
        self.command(Command::FeedLines{lines});
    }

    pub fn cut_paper(&mut self, mode: CutMode) {
        self.command(Command::Cut{mode});
    }

    pub fn set_barcode_hri_position(&mut self, position: HriPosition) {
        self.command(Command::BarcodeHriPosition{position});
    }

    pub fn set_barcode_hri_font(&mut self) {
        self.command(Command::BarcodeHriFont);
    }

    /// Barcode height in dots, the printer default is 40
    pub fn set_barcode_height(&mut self, dots: u8) {
        self.command(Command::BarcodeHeight{dots});
    }

    /// Barcode module width, clamped to 2..=6
    pub fn set_barcode_width(&mut self, width: u8) {
        self.command(Command::BarcodeWidth{width: width.max(2).min(6)});
    }

    /// Printer-generated CODE128 barcode, code set A
    pub fn append_code128<A: AsRef<str>>(&mut self, payload: A) -> Result<(), Error> {
        let data = self.charset.encode(payload.as_ref())?;
        let length = data.len() + 2;
        if length > u8::MAX as usize {
            return Err(Error::PayloadTooLong{length, max: u8::MAX as usize});
        }
        self.command(Command::Code128{length: length as u8});
        self.buffer.extend_from_slice(&data);
        Ok(())
    }

    /// Rasterizes the image and appends its bands
    ///
    /// The image ends with a newline and the default line spacing, as bit images leave the printer with a zero line spacing.
    pub fn append_image(&mut self, image: &DynamicImage, justification: Justification, max_width: u32) -> Result<(), Error> {
        let raster = RasterImage::from_image(image, max_width)?;
        self.append_raster(&raster, justification);
        Ok(())
    }

    /// Appends an already rasterized image
    pub fn append_raster(&mut self, raster: &RasterImage, justification: Justification) {
        self.set_alignment(justification);
        raster.write_to(&mut self.buffer);
        self.new_line();
        self.command(Command::DefaultLineSpacing);
    }

    /// Qr code generated by the printer firmware
    ///
    /// The symbol is first stored, then printed: the device protocol requires both steps.
    pub fn append_qr_code<A: AsRef<str>>(&mut self, payload: A, size: u8, justification: Justification) -> Result<(), Error> {
        self.set_alignment(justification);
        self.set_qr_module_size(size);
        self.set_qr_error_correction(QrErrorCorrection::L);
        self.store_qr_data(payload)?;
        self.print_stored_qr();
        self.new_line();
        Ok(())
    }

    /// Qr code rendered locally and printed as a bit image, for printers without qr support
    ///
    /// A `logo` is drawn over the center of the symbol, a quarter of its side wide. Symbols carrying a logo use the highest error correction level so the covered modules can be recovered.
    pub fn append_qr_image<A: AsRef<str>>(&mut self, payload: A, logo: Option<&DynamicImage>, justification: Justification, max_width: u32) -> Result<(), Error> {
        let data = payload.as_ref().as_bytes();
        let code = match logo {
            Some(_) => QrCode::with_error_correction_level(data, EcLevel::H),
            None => QrCode::new(data)
        }.map_err(Error::QrError)?;
        let mut rendered = DynamicImage::ImageLuma8(code.render::<Luma<u8>>()
            .min_dimensions(max_width, max_width)
            .max_dimensions(max_width, max_width)
            .build()).to_rgba8();
        if let Some(logo) = logo {
            let (width, height) = rendered.dimensions();
            let side = (width / 4).max(1);
            let logo = image::imageops::resize(&logo.to_rgba8(), side, side, FilterType::Triangle);
            image::imageops::overlay(&mut rendered, &logo, (width - side) / 2, (height - side) / 2);
        }
        self.append_image(&DynamicImage::ImageRgba8(rendered), justification, max_width)
    }

    /// CODE128 barcode rendered locally and printed as a bit image
    ///
    /// Uses code set B, which covers printable ASCII. Unlike [append_code128](EscEncoder::append_code128), no human readable text is printed.
    pub fn append_barcode_image<A: AsRef<str>>(&mut self, payload: A, justification: Justification, max_width: u32) -> Result<(), Error> {
        let image = barcode_image(payload.as_ref(), max_width)?;
        self.append_image(&image, justification, max_width)
    }

    /// A single line of text
    pub fn append_text<A: AsRef<str>>(&mut self, text: A, justification: Justification, font_size: FontSize, bold: bool) {
        self.set_alignment(justification);
        self.set_text_line_spacing();
        self.set_font_size(font_size);
        self.set_bold(self.force_bold || bold);
        self.set_text(text, None);
        self.restore_text_style();
        self.new_line();
    }

    /// Title on the left, value right aligned on the same line
    ///
    /// If both would collide, the value goes to the next line.
    pub fn append_key_value<A: AsRef<str>, B: AsRef<str>>(&mut self, title: A, value: B, font_size: FontSize, title_bold: bool, value_bold: bool) {
        let (title, value) = (title.as_ref(), value.as_ref());
        self.set_alignment(Justification::Left);
        self.set_font_size(font_size);
        self.set_bold(self.force_bold || title_bold);
        self.set_text_line_spacing();
        self.set_text(title, None);
        if self.formatter.key_value_collides(title, value, font_size) {
            self.new_line();
        }
        self.set_bold(self.force_bold || value_bold);
        self.set_offset_text(value, font_size);
        self.restore_text_style();
        self.new_line();
    }

    /// Title on the left, value starting at an absolute offset
    ///
    /// Larger fonts get an extra blank line below.
    pub fn append_key_value_at<A: AsRef<str>, B: AsRef<str>>(&mut self, title: A, value: B, value_offset: u16, font_size: FontSize) {
        self.set_alignment(Justification::Left);
        self.set_font_size(font_size);
        self.set_text(title, None);
        self.set_offset(value_offset);
        self.set_text(value, None);
        self.restore_text_style();
        self.new_line();
        if font_size != FontSize::Small {
            self.new_line();
        }
    }

    /// Three column row: left text, middle text at `middle_offset`, right aligned value
    ///
    /// Non-title rows shift the middle column 15 dots further right. When the left text fills its last line past 17 columns, the rest of the row moves to the next line.
    pub fn append_columns<A: AsRef<str>, B: AsRef<str>, C: AsRef<str>>(&mut self, left: A, middle: B, right: C, options: ColumnOptions) {
        let left = left.as_ref();
        self.set_alignment(Justification::Left);
        self.set_font_size(options.font_size);
        self.set_bold(self.force_bold || options.bold);
        let shift = if options.is_title {0} else {15};
        self.set_text(left, None);
        if self.formatter.left_column_overruns(left, options.font_size) {
            self.new_line();
        }
        self.set_offset(options.middle_offset.saturating_add(shift));
        self.set_text(middle, None);
        self.set_offset_text(right, options.font_size);
        self.restore_text_style();
        self.new_line();
    }

    /// `--------------------------------`, centered
    pub fn append_separator_line(&mut self) {
        self.rule(Justification::Center, &"-".repeat(32));
    }

    /// `— —— —— —— —— —— ——`, centered
    pub fn append_split_line(&mut self) {
        self.rule(Justification::Center, "— —— —— —— —— —— ——");
    }

    /// `===============================`, centered
    pub fn append_dotted_line(&mut self) {
        self.rule(Justification::Center, &"=".repeat(31));
    }

    /// A full width line of `—`
    pub fn append_solid_line(&mut self) {
        self.rule(Justification::Left, &"—".repeat(16));
    }

    /// `———— caption ————`
    ///
    /// No newline is appended, callers end the line themselves.
    pub fn append_solid_line_with_text<A: AsRef<str>>(&mut self, caption: A) {
        let caption = caption.as_ref();
        self.set_alignment(Justification::Left);
        self.set_font_size(FontSize::Small);
        let (left, right) = self.formatter.rule_runs(caption);
        self.set_text("—".repeat(left), None);
        self.set_text(caption, None);
        self.set_text("—".repeat(right), None);
    }

    /// `#### caption ####` with any repeated symbol
    pub fn append_symbol_line_with_text<A: AsRef<str>, B: AsRef<str>>(&mut self, caption: A, symbol: B) {
        let (caption, symbol) = (caption.as_ref(), symbol.as_ref());
        self.set_alignment(Justification::Left);
        self.set_font_size(FontSize::Small);
        let (left, right) = self.formatter.symbol_runs(caption, symbol);
        self.set_text(symbol.repeat(left), None);
        self.set_text(caption, None);
        self.set_text(symbol.repeat(right), None);
    }

    /// Switches printers that handle both receipts and labels. Sent on its own, outside of a receipt
    pub fn work_mode_command(mode: WorkMode) -> Vec<u8> {
        Command::WorkMode{mode}.as_bytes()
    }

    /// Real time printer status request. Sent on its own, outside of a receipt
    pub fn status_query_command() -> Vec<u8> {
        Command::StatusQuery.as_bytes()
    }

    fn rule(&mut self, justification: Justification, line: &str) {
        self.set_alignment(justification);
        self.set_font_size(FontSize::Small);
        self.set_text(line, None);
        self.command(Command::LineFeed);
    }

    fn set_text_line_spacing(&mut self) {
        self.set_line_spacing(if self.compact_spacing {COMPACT_LINE_SPACING} else {LINE_SPACING});
    }

    fn restore_text_style(&mut self) {
        self.set_bold(false);
        self.set_font_size(FontSize::Small);
    }
}

/// Bars one pixel per module or more, with quiet zones on both sides
fn barcode_image(payload: &str, max_width: u32) -> Result<DynamicImage, Error> {
    let barcode = Code128::new(format!("\u{0181}{}", payload)).map_err(Error::BarcodeError)?;
    let modules = barcode.encode();
    let total = modules.len() as u32 + 2 * BARCODE_QUIET_ZONE;
    let scale = (max_width / total).max(1);
    let image = ImageBuffer::from_fn(total * scale, BARCODE_HEIGHT * scale, |x, _| {
        let module = (x / scale).checked_sub(BARCODE_QUIET_ZONE).and_then(|index| modules.get(index as usize));
        if module == Some(&1) { Luma([0u8]) } else { Luma([255u8]) }
    });
    Ok(DynamicImage::ImageLuma8(image))
}

impl Default for EscEncoder {
    fn default() -> EscEncoder {
        EscEncoder::new()
    }
}

/// Layout options for [append_columns](EscEncoder::append_columns)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnOptions {
    /// Header rows keep the middle column at `middle_offset`
    pub is_title: bool,
    pub font_size: FontSize,
    pub bold: bool,
    /// Dots from the left margin where the middle column starts
    pub middle_offset: u16
}

impl Default for ColumnOptions {
    fn default() -> ColumnOptions {
        ColumnOptions {
            is_title: false,
            font_size: FontSize::Small,
            bold: false,
            middle_offset: 220
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PREAMBLE: [u8; 7] = [0x1b, 0x40, 0x1b, 0x32, 0x1b, 0x4d, 0x00];

    fn body(encoder: EscEncoder) -> Vec<u8> {
        encoder.into_bytes()[PREAMBLE.len()..].to_vec()
    }

    #[test]
    fn starts_with_reset_spacing_and_font() {
        assert_eq!(PREAMBLE.to_vec(), EscEncoder::new().into_bytes());
    }

    #[test]
    fn consecutive_texts_are_independent_groups() {
        let mut encoder = EscEncoder::new();
        encoder.append_text("A", Justification::Left, FontSize::Small, false);
        encoder.append_text("B", Justification::Left, FontSize::Small, false);
        let group = |c: u8| vec![
            0x1b, 0x61, 0x00,
            0x1b, 0x33, 36,
            0x1d, 0x21, 0x00,
            0x1b, 0x45, 0x00,
            c,
            0x1b, 0x45, 0x00,
            0x1d, 0x21, 0x00,
            0x0a
        ];
        let mut expected = group(b'A');
        expected.extend(group(b'B'));
        assert_eq!(expected, body(encoder));
    }

    #[test]
    fn bold_large_text_is_reset_afterwards() {
        let mut encoder = EscEncoder::new();
        encoder.append_text("T", Justification::Center, FontSize::Large, true);
        let bytes = body(encoder);
        assert_eq!(&[0x1d, 0x21, 0x03, 0x1b, 0x45, 0x01, b'T', 0x1b, 0x45, 0x00, 0x1d, 0x21, 0x00, 0x0a], &bytes[6..]);
    }

    #[test]
    fn compact_spacing_prefixes_newlines() {
        let mut encoder = EscEncoder::new();
        encoder.set_compact_spacing(true);
        encoder.new_line();
        assert_eq!(vec![0x1b, 0x33, 8, 0x0a], body(encoder));
    }

    #[test]
    fn truncation_appends_ellipsis() {
        let mut encoder = EscEncoder::with_charset(Charset::Cp437);
        encoder.set_text("abcdefgh", Some(5));
        assert_eq!(b"abcd...".to_vec(), body(encoder));

        let mut encoder = EscEncoder::with_charset(Charset::Cp437);
        encoder.set_text("abc", Some(5));
        assert_eq!(b"abc".to_vec(), body(encoder));
    }

    #[test]
    fn truncation_keeps_whole_ideographs() {
        let mut encoder = EscEncoder::new();
        // 6 bytes in GB18030, budget 5 leaves room for 4 bytes
        encoder.set_text("一二三", Some(5));
        let mut expected = Charset::Gb18030.encode("一二").unwrap();
        expected.extend_from_slice(b"...");
        assert_eq!(expected, body(encoder));
    }

    #[test]
    fn unencodable_text_is_dropped() {
        let mut encoder = EscEncoder::with_charset(Charset::Cp437);
        encoder.set_text("票", None);
        encoder.set_text("ok", None);
        assert_eq!(b"ok".to_vec(), body(encoder));
    }

    #[test]
    fn qr_is_stored_then_printed() {
        let mut encoder = EscEncoder::new();
        encoder.append_qr_code("hello", 7, Justification::Center).unwrap();
        let expected = vec![
            0x1b, 0x61, 0x01,
            0x1d, 0x28, 0x6b, 0x03, 0x00, 0x31, 0x43, 7,
            0x1d, 0x28, 0x6b, 0x03, 0x00, 0x31, 0x45, 48,
            0x1d, 0x28, 0x6b, 8, 0, 0x31, 0x50, 48, b'h', b'e', b'l', b'l', b'o',
            0x1d, 0x28, 0x6b, 0x03, 0x00, 0x31, 0x51, 48,
            0x0a
        ];
        assert_eq!(expected, body(encoder));
    }

    #[test]
    fn qr_store_length_prefix() {
        for len in &[0usize, 1, 252, 253, 1000, 7089] {
            let mut encoder = EscEncoder::new();
            encoder.store_qr_data("x".repeat(*len)).unwrap();
            let bytes = body(encoder);
            assert_eq!(len + 3, bytes[3] as usize + 256 * bytes[4] as usize);
            assert_eq!(8 + len, bytes.len());
        }
        assert!(EscEncoder::new().store_qr_data("x".repeat(7090)).is_err());
    }

    #[test]
    fn qr_module_size_is_clamped() {
        let mut encoder = EscEncoder::new();
        encoder.set_qr_module_size(0);
        encoder.set_qr_module_size(40);
        let bytes = body(encoder);
        assert_eq!(1, bytes[7]);
        assert_eq!(16, bytes[15]);
    }

    #[test]
    fn key_value_right_aligns_the_value() {
        let mut encoder = EscEncoder::new();
        encoder.append_key_value("Total", "88", FontSize::Small, false, true);
        let bytes = body(encoder);
        // 380 - ceil(2 * 380 / 32) = 356
        let offset = [0x1b, 0x24, (356 % 256) as u8, (356 / 256) as u8];
        let position = bytes.windows(4).position(|w| w == offset).unwrap();
        assert_eq!(&[0x1b, 0x45, 0x01], &bytes[position - 3..position]);
        assert_eq!(b"88", &bytes[position + 4..position + 6]);
        assert_eq!(&[0x1b, 0x45, 0x00, 0x1d, 0x21, 0x00, 0x0a], &bytes[position + 6..]);
    }

    #[test]
    fn key_value_wraps_long_titles() {
        let mut encoder = EscEncoder::new();
        encoder.append_key_value("a".repeat(29), "12", FontSize::Small, false, false);
        let bytes = body(encoder);
        let title_end = bytes.windows(29).position(|w| w == "a".repeat(29).as_bytes()).unwrap() + 29;
        assert_eq!(0x0a, bytes[title_end]);
    }

    #[test]
    fn columns_wrap_after_long_left_text() {
        let mut short = EscEncoder::new();
        short.append_columns("Rice", "2", "28", ColumnOptions::default());
        assert_eq!(1, body(short).iter().filter(|b| **b == 0x0a).count());

        let mut long = EscEncoder::new();
        long.append_columns("a".repeat(18), "2", "28", ColumnOptions::default());
        assert_eq!(2, body(long).iter().filter(|b| **b == 0x0a).count());
    }

    #[test]
    fn columns_shift_non_title_rows() {
        let mut encoder = EscEncoder::new();
        encoder.append_columns("Item", "Qty", "Sum", ColumnOptions{is_title: true, ..ColumnOptions::default()});
        encoder.append_columns("Rice", "2", "28", ColumnOptions::default());
        let bytes = body(encoder);
        assert!(bytes.windows(4).any(|w| w == [0x1b, 0x24, 220, 0]));
        assert!(bytes.windows(4).any(|w| w == [0x1b, 0x24, 235, 0]));
    }

    #[test]
    fn image_ends_with_spacing_reset() {
        let source = DynamicImage::ImageLuma8(image::ImageBuffer::from_pixel(48, 24, Luma([0u8])));
        let mut encoder = EscEncoder::new();
        encoder.append_image(&source, Justification::Center, 48).unwrap();
        let bytes = body(encoder);
        assert_eq!(&[0x1b, 0x61, 0x01, 0x1b, 0x33, 0x00, 0x1b, 0x2a, 0x21, 48, 0], &bytes[..11]);
        assert_eq!(&[0x0d, 0x0a, 0x0a, 0x1b, 0x32], &bytes[bytes.len() - 5..]);
        assert_eq!(3 + 8 + 48 * 3 + 2 + 1 + 2, bytes.len());
    }

    #[test]
    fn qr_image_is_a_bit_image() {
        let mut encoder = EscEncoder::new();
        encoder.append_qr_image("https://example.com", None, Justification::Center, DEFAULT_QR_IMAGE_WIDTH).unwrap();
        let bytes = body(encoder);
        assert_eq!(&[0x1b, 0x33, 0x00, 0x1b, 0x2a, 0x21], &bytes[3..9]);
        assert_eq!(264, bytes[9] as u32 + 256 * bytes[10] as u32);
    }

    #[test]
    fn qr_image_logo_covers_the_center() {
        let logo = DynamicImage::ImageLuma8(ImageBuffer::from_pixel(10, 10, Luma([0u8])));
        let mut encoder = EscEncoder::new();
        encoder.append_qr_image("https://example.com", Some(&logo), Justification::Center, DEFAULT_QR_IMAGE_WIDTH).unwrap();
        let bytes = body(encoder);
        let band_len = 8 + 264 * 3 + 2;
        // 264 dots across and down, eleven bands
        assert_eq!(3 + 11 * band_len + 1 + 2, bytes.len());
        // Band 5 spans rows 120..144, well inside the logo
        let band = &bytes[3 + 5 * band_len + 8..3 + 6 * band_len - 2];
        for column in 120..144 {
            assert_eq!(&[0xff, 0xff, 0xff], &band[column * 3..column * 3 + 3]);
        }
    }

    #[test]
    fn barcode_image_is_a_bit_image_of_whole_bars() {
        let mut encoder = EscEncoder::new();
        encoder.append_barcode_image("12345", Justification::Center, DEFAULT_BARCODE_IMAGE_WIDTH).unwrap();
        let bytes = body(encoder);
        assert_eq!(&[0x1b, 0x61, 0x01, 0x1b, 0x33, 0x00, 0x1b, 0x2a, 0x21], &bytes[..9]);
        // 300 snaps down to 288 dots
        assert_eq!(288, bytes[9] as u32 + 256 * bytes[10] as u32);
        let band = &bytes[11..11 + 288 * 3];
        let columns: Vec<&[u8]> = band.chunks(3).collect();
        // Bars run from the top of the band to the bottom
        assert!(columns.iter().all(|column| *column == [0, 0, 0] || *column == [0xff, 0xff, 0xff]));
        assert_eq!(&[0, 0, 0], columns[0]);
        assert_eq!(&[0, 0, 0], columns[287]);
        assert!(columns.iter().any(|column| *column == [0xff, 0xff, 0xff]));
    }

    #[test]
    fn barcode_image_rejects_characters_outside_code_set_b() {
        match EscEncoder::new().append_barcode_image("票据", Justification::Center, DEFAULT_BARCODE_IMAGE_WIDTH) {
            Err(Error::BarcodeError(_)) => (),
            other => panic!("expected a barcode error, got {:?}", other)
        }
    }

    #[test]
    fn wider_paper_moves_values_and_wraps_later() {
        let formatter = Formatter::with_geometry(572, 48);
        let mut encoder = EscEncoder::with_formatter(Charset::Gb18030, formatter);
        encoder.append_key_value("a".repeat(29), "88", FontSize::Small, false, false);
        assert_eq!(48, encoder.formatter().columns());
        let bytes = body(encoder);
        // 572 - ceil(2 * 572 / 48) = 548
        assert!(bytes.windows(4).any(|w| w == [0x1b, 0x24, (548 % 256) as u8, (548 / 256) as u8]));
        assert_eq!(1, bytes.iter().filter(|b| **b == 0x0a).count());
    }

    #[test]
    fn code128_prefix() {
        let mut encoder = EscEncoder::new();
        encoder.append_code128("12345").unwrap();
        assert_eq!(vec![0x1d, 0x6b, 73, 7, 123, 65, b'1', b'2', b'3', b'4', b'5'], body(encoder));
    }

    #[test]
    fn solid_line_with_caption() {
        let mut encoder = EscEncoder::with_charset(Charset::Gb18030);
        encoder.append_solid_line_with_text("二维");
        let bytes = body(encoder);
        let rule = Charset::Gb18030.encode(&"—".repeat(7)).unwrap();
        let caption = Charset::Gb18030.encode("二维").unwrap();
        let mut expected = vec![0x1b, 0x61, 0x00, 0x1d, 0x21, 0x00];
        expected.extend(&rule);
        expected.extend(&caption);
        expected.extend(&rule);
        assert_eq!(expected, bytes);
    }
}
