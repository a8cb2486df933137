use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use std::io::Cursor;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error("Image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

impl From<image::ImageError> for ImageError {
    fn from(err: image::ImageError) -> Self {
        ImageError::Decode(err.to_string())
    }
}

/// A non-empty 3-channel 8-bit image, always held in RGB order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorImage {
    rgb: RgbImage,
}

impl ColorImage {
    pub fn new(rgb: RgbImage) -> Result<Self, ImageError> {
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageError::Empty { width, height });
        }
        Ok(Self { rgb })
    }

    /// Decodes an encoded image (format is sniffed from the bytes), applies
    /// its EXIF orientation and drops any alpha channel.
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ImageError::Decode(e.to_string()))?;
        let mut decoder = reader.into_decoder()?;
        let orientation = decoder.orientation()?;
        let mut decoded = DynamicImage::from_decoder(decoder)?;
        decoded.apply_orientation(orientation);
        Self::new(decoded.to_rgb8())
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.rgb.pixels().map(|p| p.0)
    }
}
