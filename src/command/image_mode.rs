use serde::{Serialize, Deserialize};

/// Specifies the density of the bit image bands
///
/// Both modes print 24 dot tall bands, which is what the rasterizer produces. Not all densities are supported by all printers
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Hash)]
pub enum ImageMode {
    TwentyfourDotSingleDensity,
    TwentyfourDotDoubleDensity
}

impl Eq for ImageMode{}

impl ImageMode {
    /// Returns the `m` argument of `ESC * m`
    pub fn as_byte(&self) -> u8 {
        match self {
            ImageMode::TwentyfourDotSingleDensity => 0x20,
            ImageMode::TwentyfourDotDoubleDensity => 0x21
        }
    }
}

impl Default for ImageMode {
    fn default() -> ImageMode {
        ImageMode::TwentyfourDotDoubleDensity
    }
}
