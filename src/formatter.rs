use crate::command::FontSize;

/// Print dots across a 58mm head
pub const PAGE_WIDTH: u16 = 384;
/// Width units the layout helpers work in, slightly narrower than the page to keep a margin
pub const PREVIEW_WIDTH: u16 = 380;
/// Columns of the smallest font that fit in one line
pub const COLUMNS: usize = 32;

/// Display width of a text in columns of the smallest font
///
/// Ideographs (U+4E00..U+9FFF), CJK symbols and punctuation (U+3000..U+303F) and fullwidth forms (U+FF00..U+FFEF) take two columns, every other UTF-16 unit takes one. The middle font sizes double the result, the largest one quadruples it.
///
/// ```rust
/// use bleprint::{formatter::display_width, command::FontSize};
///
/// assert_eq!(5, display_width("Total", FontSize::Small));
/// assert_eq!(4, display_width("合计", FontSize::Small));
/// assert_eq!(16, display_width("合计", FontSize::Large));
/// ```
pub fn display_width<A: AsRef<str>>(text: A, font_size: FontSize) -> usize {
    let units: usize = text.as_ref().encode_utf16().map(|unit| {
        match unit {
            0x4e00..=0x9fff | 0x3000..=0x303f | 0xff00..=0xffef => 2,
            _ => 1
        }
    }).sum();
    units * font_size.width_multiplier()
}

/// Helper structure to lay out columns on the paper
///
/// The escape protocol has no notion of right alignment inside a line, so values are placed with an absolute horizontal offset computed from their display width.
#[derive(Clone, Debug)]
pub struct Formatter {
    /// Width, in layout units, of the printable area
    preview_width: u16,
    /// Smallest-font columns across the printable area
    columns: usize
}

impl Formatter {
    /// Creates a formatter for a 58mm printer
    pub fn new() -> Formatter {
        Formatter {
            preview_width: PREVIEW_WIDTH,
            columns: COLUMNS
        }
    }

    /// Creates a formatter with a custom geometry
    pub fn with_geometry(preview_width: u16, columns: usize) -> Formatter {
        Formatter {
            preview_width,
            columns: columns.max(1)
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Width, in layout units, that the text takes when printed
    ///
    /// ```rust
    /// # use bleprint::{formatter::Formatter, command::FontSize};
    /// let formatter = Formatter::new();
    /// // ceil(3 * 380 / 32)
    /// assert_eq!(36, formatter.value_width("100", FontSize::Small));
    /// ```
    pub fn value_width<A: AsRef<str>>(&self, text: A, font_size: FontSize) -> u16 {
        let width = display_width(text, font_size) as f64;
        let pixels = (width * (self.preview_width as f64) / (self.columns as f64)).ceil();
        pixels.min(u16::MAX as f64) as u16
    }

    /// Offset that makes the right edge of the text land on the right edge of the printable area
    ///
    /// Values wider than the printable area start at the left margin.
    pub fn right_aligned_offset<A: AsRef<str>>(&self, text: A, font_size: FontSize) -> u16 {
        self.preview_width.saturating_sub(self.value_width(text, font_size))
    }

    /// A title and its value collide if they need 31 columns or more together
    pub fn key_value_collides<A: AsRef<str>, B: AsRef<str>>(&self, title: A, value: B, font_size: FontSize) -> bool {
        display_width(title, font_size) + display_width(value, font_size) + 1 >= self.columns
    }

    /// The left column of a three column row overruns the middle one when the last line it occupies is filled past 17 columns
    pub fn left_column_overruns<A: AsRef<str>>(&self, left: A, font_size: FontSize) -> bool {
        display_width(left, font_size) % self.columns > 17
    }

    /// Number of `—` glyphs on each side of a caption centered in a solid rule
    ///
    /// The left run gets the rounding up, so that odd remainders lean right.
    pub fn rule_runs<A: AsRef<str>>(&self, caption: A) -> (usize, usize) {
        let count = self.rule_count(caption, 2.0);
        (count.ceil() as usize, count.floor() as usize)
    }

    /// Number of `symbol` repetitions on each side of a caption centered in a symbol rule
    pub fn symbol_runs<A: AsRef<str>, B: AsRef<str>>(&self, caption: A, symbol: B) -> (usize, usize) {
        let symbol_width = display_width(symbol, FontSize::Small);
        if symbol_width == 0 {
            return (0, 0);
        }
        let count = self.rule_count(caption, symbol_width as f64);
        (count.round() as usize, count.floor() as usize)
    }

    fn rule_count<A: AsRef<str>>(&self, caption: A, divisor: f64) -> f64 {
        let caption_width = self.value_width(caption, FontSize::Small) as f64;
        let page_width = PAGE_WIDTH as f64;
        let count = (page_width - caption_width) * 16.0 / page_width / divisor;
        count.max(0.0)
    }
}

impl Default for Formatter {
    fn default() -> Formatter {
        Formatter::new()
    }
}
