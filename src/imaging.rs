use image::{DynamicImage, Rgb, RgbImage, imageops, imageops::FilterType};
use ndarray::Array4;
use thiserror::Error;

/// Grey used by YOLO exporters to pad letterboxed inputs.
const PAD_VALUE: u8 = 114;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is empty")]
    EmptyData,

    #[error("Cannot identify image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),
}

/// Decodes raw upload bytes, guessing the format from the content.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let format = image::guess_format(bytes).map_err(|_| ImageError::UnsupportedFormat)?;

    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))
}

/// Geometry of an aspect-preserving resize into a square canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub source_width: u32,
    pub source_height: u32,
}

impl Letterbox {
    pub fn new(source_width: u32, source_height: u32, size: u32) -> Self {
        let scale = (size as f32 / source_width.max(1) as f32)
            .min(size as f32 / source_height.max(1) as f32);
        let (width, height) = scaled_dims(source_width, source_height, scale, size);

        Self {
            scale,
            pad_x: (size - width) / 2,
            pad_y: (size - height) / 2,
            source_width,
            source_height,
        }
    }

    /// Maps a point in model input space back to source pixels, clamped to
    /// the source image.
    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        let sx = (x - self.pad_x as f32) / self.scale;
        let sy = (y - self.pad_y as f32) / self.scale;
        (
            sx.clamp(0.0, self.source_width as f32),
            sy.clamp(0.0, self.source_height as f32),
        )
    }
}

fn scaled_dims(width: u32, height: u32, scale: f32, size: u32) -> (u32, u32) {
    let w = ((width as f32 * scale).round() as u32).clamp(1, size);
    let h = ((height as f32 * scale).round() as u32).clamp(1, size);
    (w, h)
}

/// Letterboxes `image` to `size`×`size` and lays it out as a `[1, 3, H, W]`
/// RGB tensor scaled to `[0, 1]`.
pub fn to_input_tensor(image: &DynamicImage, size: u32) -> (Array4<f32>, Letterbox) {
    let rgb = image.to_rgb8();
    let letterbox = Letterbox::new(rgb.width(), rgb.height(), size);
    let (width, height) = scaled_dims(rgb.width(), rgb.height(), letterbox.scale, size);

    let resized = imageops::resize(&rgb, width, height, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));
    imageops::replace(
        &mut canvas,
        &resized,
        letterbox.pad_x as i64,
        letterbox.pad_y as i64,
    );

    let side = size as usize;
    let mut input = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        input[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
        input[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
        input[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
    }

    (input, letterbox)
}
