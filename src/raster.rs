use crate::{Error, command::{Command, ImageMode}};
use image::{DynamicImage, GenericImageView, Pixel, imageops::FilterType};
use serde::{Serialize, Deserialize};
use std::convert::TryFrom;

/// Height, in dots, of one printed band
pub const BAND_HEIGHT: u32 = 24;
/// Pixels whose luminance is below this value get inked
pub const INK_THRESHOLD: f64 = 127.0;

/// Monochrome image packed in the printer's native 24 dot band format
///
/// Each band holds, for every column from left to right, three bytes covering 8 vertically stacked pixels each, most significant bit on top. The width is always a multiple of 24 and the height a whole number of bands.
///
/// ```rust
/// use bleprint::raster::RasterImage;
/// use image::{DynamicImage, ImageBuffer, Rgb};
///
/// let source = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(100, 30, Rgb([0, 0, 0])));
/// let raster = RasterImage::from_image(&source, 100).unwrap();
/// assert_eq!(96, raster.width());
/// assert_eq!(48, raster.height());
/// assert_eq!(2, raster.band_count());
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "RawRaster")]
pub struct RasterImage {
    /// Dots across, the band header can not describe more than `u16::MAX`
    width: u16,
    height: u32,
    image_mode: ImageMode,
    /// Packed bit plane, band after band
    #[serde(with = "base64_bytes")]
    bands: Vec<u8>
}

/// Serialized form of a [RasterImage], checked before it becomes one
#[derive(Deserialize)]
struct RawRaster {
    width: u16,
    height: u32,
    image_mode: ImageMode,
    #[serde(with = "base64_bytes")]
    bands: Vec<u8>
}

impl TryFrom<RawRaster> for RasterImage {
    type Error = Error;

    fn try_from(raw: RawRaster) -> Result<RasterImage, Error> {
        if raw.width == 0 || (raw.width as u32) % BAND_HEIGHT != 0 {
            return Err(Error::InvalidImage(format!("a width of {} dots is not a whole multiple of {}", raw.width, BAND_HEIGHT)));
        }
        if raw.height == 0 || raw.height % BAND_HEIGHT != 0 {
            return Err(Error::InvalidImage(format!("a height of {} dots is not a whole number of bands", raw.height)));
        }
        let expected = (raw.width as usize) * 3 * ((raw.height / BAND_HEIGHT) as usize);
        if raw.bands.len() != expected {
            return Err(Error::InvalidImage(format!("the bit plane holds {} bytes, {} expected", raw.bands.len(), expected)));
        }
        Ok(RasterImage {
            width: raw.width,
            height: raw.height,
            image_mode: raw.image_mode,
            bands: raw.bands
        })
    }
}

impl RasterImage {
    /// Scales and thresholds a color image
    ///
    /// The width becomes the largest multiple of 24 not exceeding `max_width`, the height follows the aspect ratio and is rounded up to a whole band. Transparent pixels are composed over white paper. Widths the band header can not encode (over 65535 dots) are rejected.
    pub fn from_image(image: &DynamicImage, max_width: u32) -> Result<RasterImage, Error> {
        let width = max_width / BAND_HEIGHT * BAND_HEIGHT;
        if width == 0 {
            return Err(Error::InvalidImage(format!("a maximum width of {} dots can not hold a single band", max_width)));
        }
        if width > u16::MAX as u32 {
            return Err(Error::InvalidImage(format!("a width of {} dots does not fit in a band header", width)));
        }
        let (im_width, im_height) = image.dimensions();
        if im_width == 0 || im_height == 0 {
            return Err(Error::InvalidImage("the source image is empty".to_string()));
        }

        let scaled_height = (width as f64) * (im_height as f64) / (im_width as f64);
        let band_count = ((scaled_height / BAND_HEIGHT as f64).ceil() as u32).max(1);
        let height = band_count * BAND_HEIGHT;

        let resized = image::imageops::resize(&image.to_rgba8(), width, height, FilterType::Triangle);

        let mut bands = Vec::with_capacity((band_count * width * 3) as usize);
        for band in 0..band_count {
            for x in 0..width {
                for slice in 0..3 {
                    let mut value = 0u8;
                    for bit in 0..8 {
                        let y = band * BAND_HEIGHT + slice * 8 + bit;
                        if is_ink(resized.get_pixel(x, y).channels()) {
                            value |= 0x80 >> bit;
                        }
                    }
                    bands.push(value);
                }
            }
        }

        log::debug!("Rasterized a {}x{} image into {} bands of {} dots", im_width, im_height, band_count, width);

        Ok(RasterImage {
            width: width as u16,
            height,
            image_mode: ImageMode::default(),
            bands
        })
    }

    /// Changes the bit image density announced in every band header
    pub fn with_image_mode(mut self, image_mode: ImageMode) -> RasterImage {
        self.image_mode = image_mode;
        self
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn image_mode(&self) -> ImageMode {
        self.image_mode
    }

    pub fn band_count(&self) -> usize {
        (self.height / BAND_HEIGHT) as usize
    }

    /// Packed columns of a single band, `3 * width` bytes
    pub fn band(&self, index: usize) -> Option<&[u8]> {
        self.bands.chunks(self.band_len()).nth(index)
    }

    fn band_len(&self) -> usize {
        self.width as usize * 3
    }

    /// Appends the escape-protocol rendition of the image
    ///
    /// Every band is prefixed by `ESC 3 0` and `ESC * m nL nH`, and terminated with a carriage return and line feed.
    pub fn write_to(&self, feed: &mut Vec<u8>) {
        let (low, high) = crate::command::split_u16(self.width);
        for band in self.bands.chunks(self.band_len()) {
            feed.extend_from_slice(&Command::NoLine.as_bytes());
            feed.extend_from_slice(&Command::Bitmap{image_mode: self.image_mode}.as_bytes());
            feed.push(low);
            feed.push(high);
            feed.extend_from_slice(band);
            feed.extend_from_slice(&Command::CarriageReturn.as_bytes());
            feed.extend_from_slice(&Command::LineFeed.as_bytes());
        }
    }

    /// The escape-protocol rendition of the image as a new buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut feed = Vec::with_capacity(self.band_count() * (10 + self.band_len()));
        self.write_to(&mut feed);
        feed
    }
}

/// Luminance of an RGB triplet, with the usual 0.299/0.587/0.114 weights
pub fn luminance(red: u8, green: u8, blue: u8) -> f64 {
    0.299 * (red as f64) + 0.587 * (green as f64) + 0.114 * (blue as f64)
}

fn is_ink(channels: &[u8]) -> bool {
    let alpha = channels[3] as f64 / 255.0;
    // Over white paper
    let compose = |c: u8| ((c as f64) * alpha + 255.0 * (1.0 - alpha)).round() as u8;
    luminance(compose(channels[0]), compose(channels[1]), compose(channels[2])) < INK_THRESHOLD
}

mod base64_bytes {
    use serde::{Serializer, Deserialize, Deserializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        serializer.serialize_str(&base64::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where D: Deserializer<'de> {
        let encoded = String::deserialize(deserializer)?;
        base64::decode(&encoded).map_err(|_| serde::de::Error::custom("string is not a valid base64 sequence"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb(color)))
    }

    #[test]
    fn width_snaps_down_to_band_multiple() {
        let raster = RasterImage::from_image(&solid(500, 500, [0, 0, 0]), 384).unwrap();
        assert_eq!(384, raster.width());
        let raster = RasterImage::from_image(&solid(500, 500, [0, 0, 0]), 300).unwrap();
        assert_eq!(288, raster.width());
    }

    #[test]
    fn height_rounds_up_to_whole_bands() {
        // 240 wide scaled to 96: 25 * 96 / 240 = 10 rows, one band
        let raster = RasterImage::from_image(&solid(240, 25, [0, 0, 0]), 96).unwrap();
        assert_eq!(24, raster.height());
        // 100 rows at 96/96 need ceil(100 / 24) = 5 bands
        let raster = RasterImage::from_image(&solid(96, 100, [0, 0, 0]), 96).unwrap();
        assert_eq!(5, raster.band_count());
        assert_eq!(120, raster.height());
    }

    #[test]
    fn band_layout_and_headers() {
        let raster = RasterImage::from_image(&solid(264, 48, [0, 0, 0]), 264).unwrap();
        let bytes = raster.to_bytes();
        let band_len = 8 + 264 * 3 + 2;
        assert_eq!(2 * band_len, bytes.len());
        for band in 0..2 {
            let start = band * band_len;
            assert_eq!(&[0x1b, 0x33, 0x00, 0x1b, 0x2a, 0x21], &bytes[start..start + 6]);
            assert_eq!(264, bytes[start + 6] as u32 + 256 * bytes[start + 7] as u32);
            assert!(bytes[start + 8..start + band_len - 2].iter().all(|b| *b == 0xff));
            assert_eq!(&[0x0d, 0x0a], &bytes[start + band_len - 2..start + band_len]);
        }
    }

    #[test]
    fn luminance_threshold() {
        assert!(RasterImage::from_image(&solid(24, 24, [255, 255, 255]), 24).unwrap().band(0).unwrap().iter().all(|b| *b == 0));
        // 0.299 * 200 + 0.587 * 100 + 0.114 * 50 = 124.2, inked
        assert!(RasterImage::from_image(&solid(24, 24, [200, 100, 50]), 24).unwrap().band(0).unwrap().iter().all(|b| *b == 0xff));
        // 0.299 * 130 + 0.587 * 130 + 0.114 * 130 = 130, not inked
        assert!(RasterImage::from_image(&solid(24, 24, [130, 130, 130]), 24).unwrap().band(0).unwrap().iter().all(|b| *b == 0));
    }

    #[test]
    fn columns_are_packed_msb_first_top_down() {
        // Only the very first row is black
        let source = DynamicImage::ImageRgb8(ImageBuffer::from_fn(24, 24, |_, y| {
            if y == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        }));
        let raster = RasterImage::from_image(&source, 24).unwrap();
        let band = raster.band(0).unwrap();
        for column in band.chunks(3) {
            assert_eq!(&[0x80, 0x00, 0x00], column);
        }
    }

    #[test]
    fn transparent_pixels_stay_blank() {
        let source = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(24, 24, Rgba([0, 0, 0, 0])));
        let raster = RasterImage::from_image(&source, 24).unwrap();
        assert!(raster.band(0).unwrap().iter().all(|b| *b == 0));
    }

    #[test]
    fn too_narrow_is_rejected() {
        assert!(RasterImage::from_image(&solid(10, 10, [0, 0, 0]), 23).is_err());
    }

    #[test]
    fn widest_band_header() {
        let raster = RasterImage::from_image(&solid(65520, 1, [0, 0, 0]), u16::MAX as u32).unwrap();
        assert_eq!(65520, raster.width());
        let bytes = raster.to_bytes();
        assert_eq!(&[0xf0, 0xff], &bytes[6..8]);
        assert_eq!(8 + 65520 * 3 + 2, bytes.len());

        match RasterImage::from_image(&solid(1, 1, [0, 0, 0]), 65560) {
            Err(Error::InvalidImage(_)) => (),
            other => panic!("expected an invalid image, got {:?}", other)
        }
    }

    #[test]
    fn inconsistent_serialized_rasters_are_rejected() {
        let raster = RasterImage::from_image(&solid(48, 48, [0, 0, 0]), 48).unwrap();
        let valid = serde_json::to_value(&raster).unwrap();

        let mut narrow = valid.clone();
        narrow["width"] = serde_json::json!(25);
        assert!(serde_json::from_value::<RasterImage>(narrow).is_err());

        let mut short = valid.clone();
        short["height"] = serde_json::json!(40);
        assert!(serde_json::from_value::<RasterImage>(short).is_err());

        let mut truncated = valid.clone();
        truncated["bands"] = serde_json::json!(base64::encode(vec![0xffu8; 12]));
        assert!(serde_json::from_value::<RasterImage>(truncated).is_err());

        let mut oversized = valid.clone();
        oversized["width"] = serde_json::json!(65544);
        assert!(serde_json::from_value::<RasterImage>(oversized).is_err());

        let restored: RasterImage = serde_json::from_value(valid).unwrap();
        assert_eq!(2 * (8 + 48 * 3 + 2), restored.to_bytes().len());
    }

    #[test]
    fn serde_keeps_the_bit_plane() {
        let raster = RasterImage::from_image(&solid(48, 24, [0, 0, 0]), 48).unwrap();
        let json = serde_json::to_string(&raster).unwrap();
        let restored: RasterImage = serde_json::from_str(&json).unwrap();
        assert_eq!(raster, restored);
    }
}
