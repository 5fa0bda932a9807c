//! Image encoding and OCR preprocessing.
//!
//! Providers receive images as PNG bytes ([`PngImage`]). Before a retry the
//! orchestrator runs an [`ImagePreprocessor`] which, in the standard
//! implementation, converts to grayscale, stretches contrast and sharpens.

use std::io::Cursor;

use base64::Engine;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};

use super::backend::OcrError;

/// PIL-style 3x3 sharpen kernel. Normalized by its sum (16).
const SHARPEN_KERNEL: [i32; 9] = [-2, -2, -2, -2, 32, -2, -2, -2, -2];
const SHARPEN_DIVISOR: f32 = 16.0;

/// Decode uploaded bytes into an image.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, OcrError> {
    image::load_from_memory(bytes).map_err(|e| OcrError::Image(e.to_string()))
}

/// A PNG-encoded image ready to send to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngImage {
    bytes: Vec<u8>,
}

impl PngImage {
    /// Encode an image as PNG.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self, OcrError> {
        let mut cursor = Cursor::new(Vec::new());
        image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| OcrError::Image(format!("PNG encoding failed: {}", e)))?;
        Ok(Self {
            bytes: cursor.into_inner(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Standard base64 of the PNG bytes.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// `data:` URL for APIs that take image URLs.
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.to_base64())
    }
}

/// Deterministic image transform applied before an OCR retry.
pub trait ImagePreprocessor: Send + Sync {
    /// Return a new, preprocessed image. The input is left untouched.
    fn preprocess(&self, image: &DynamicImage) -> DynamicImage;
}

/// Grayscale, auto-contrast, sharpen.
#[derive(Debug, Clone, Copy)]
pub struct StandardPreprocessor {
    /// Percentage of pixels clipped at each end of the histogram.
    pub cutoff_percent: f64,
}

impl Default for StandardPreprocessor {
    fn default() -> Self {
        Self { cutoff_percent: 1.0 }
    }
}

impl ImagePreprocessor for StandardPreprocessor {
    fn preprocess(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        let stretched = autocontrast(&gray, self.cutoff_percent);
        DynamicImage::ImageLuma8(sharpen(&stretched))
    }
}

/// Remap the darkest/lightest `cutoff_percent` of pixels to full black/white
/// and stretch everything in between linearly.
pub fn autocontrast(image: &GrayImage, cutoff_percent: f64) -> GrayImage {
    let total = image.width() as u64 * image.height() as u64;
    if total == 0 {
        return image.clone();
    }

    let mut histogram = [0u64; 256];
    for Luma([v]) in image.pixels() {
        histogram[*v as usize] += 1;
    }

    let cut = ((total as f64) * cutoff_percent.clamp(0.0, 49.0) / 100.0) as u64;

    let mut low = 0usize;
    let mut seen = 0u64;
    for (value, count) in histogram.iter().enumerate() {
        seen += count;
        if seen > cut {
            low = value;
            break;
        }
    }

    let mut high = 255usize;
    seen = 0;
    for (value, count) in histogram.iter().enumerate().rev() {
        seen += count;
        if seen > cut {
            high = value;
            break;
        }
    }

    if high <= low {
        return image.clone();
    }

    let span = (high - low) as u32;
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        *slot = if value <= low {
            0
        } else if value >= high {
            255
        } else {
            let offset = (value - low) as u32;
            ((offset * 255 + span / 2) / span).min(255) as u8
        };
    }

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = lut[pixel.0[0] as usize];
    }
    out
}

/// 3x3 sharpening convolution. Edge pixels reuse their nearest neighbour.
pub fn sharpen(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    GrayImage::from_fn(width, height, |x, y| {
        let mut acc: i32 = 0;
        let mut k = 0;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let sx = (x as i64 + dx).clamp(0, max_x) as u32;
                let sy = (y as i64 + dy).clamp(0, max_y) as u32;
                acc += SHARPEN_KERNEL[k] * image.get_pixel(sx, sy).0[0] as i32;
                k += 1;
            }
        }
        let value = (acc as f32 / SHARPEN_DIVISOR).round().clamp(0.0, 255.0);
        Luma([value as u8])
    })
}
