//! Thumbnail derivation with JPEG output.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::config::ThumbnailConfig;

/// Produces bounded-size JPEG previews of decoded originals.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailGenerator {
    config: ThumbnailConfig,
}

impl ThumbnailGenerator {
    pub fn new(config: ThumbnailConfig) -> Self {
        Self { config }
    }

    /// Thumbnail at the configured maximum dimension.
    pub fn generate(&self, image: &DynamicImage) -> image::ImageResult<Vec<u8>> {
        self.resize(image, self.config.max_dimension)
    }

    /// Scale `image` so its longer edge is at most `max_dimension` and encode
    /// it as JPEG. Smaller images keep their size.
    pub fn resize(&self, image: &DynamicImage, max_dimension: u32) -> image::ImageResult<Vec<u8>> {
        let (width, height) = fit_within(image.width(), image.height(), max_dimension);
        let scaled = if (width, height) == (image.width(), image.height()) {
            image.to_rgb8()
        } else {
            image
                .resize_exact(width, height, FilterType::Triangle)
                .to_rgb8()
        };

        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.config.quality);
        scaled.write_with_encoder(encoder)?;
        Ok(buffer)
    }
}

/// Target dimensions for a thumbnail: aspect-preserving, never upscaled,
/// never below one pixel on either edge.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dimension || longest == 0 {
        return (width, height);
    }
    let scale = max_dimension as f64 / longest as f64;
    let scaled = |edge: u32| ((edge as f64 * scale).round() as u32).clamp(1, max_dimension);
    (scaled(width), scaled(height))
}
