//! Captured image type handed to the recognizers

use image::{DynamicImage, GrayImage, RgbaImage};

use super::CaptureError;

/// A decoded camera frame
#[derive(Clone, Debug)]
pub struct CapturedImage {
    pub rgba: RgbaImage,
}

impl CapturedImage {
    /// Decode an encoded image (PNG, JPEG, ...) from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CaptureError> {
        if bytes.is_empty() {
            return Err(CaptureError::Decode("empty image data".to_string()));
        }
        let decoded =
            image::load_from_memory(bytes).map_err(|e| CaptureError::Decode(e.to_string()))?;
        let rgba = decoded.to_rgba8();
        log::debug!(
            "CapturedImage decoded: {}x{} pixels",
            rgba.width(),
            rgba.height()
        );
        Ok(Self { rgba })
    }

    pub fn from_rgba(rgba: RgbaImage) -> Self {
        Self { rgba }
    }

    /// Get the width of the image
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    /// Get the height of the image
    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    /// Upscale by an integer factor with a cubic filter; factors below 2 return a copy
    pub fn upscaled(&self, factor: u32) -> DynamicImage {
        let dynamic = DynamicImage::ImageRgba8(self.rgba.clone());
        if factor < 2 {
            return dynamic;
        }
        let (w, h) = (self.width() * factor, self.height() * factor);
        log::debug!("Upscaling image {}x to {}x{}", factor, w, h);
        dynamic.resize_exact(w, h, image::imageops::FilterType::CatmullRom)
    }

    /// Grayscale copy, downsampled so the longest side is at most `max_dim`
    /// (0 = no downsampling). Returns the image and the downsample factor.
    pub fn luma_within(&self, max_dim: u32) -> (GrayImage, f32) {
        let (w, h) = (self.width(), self.height());
        if max_dim > 0 && (w > max_dim || h > max_dim) {
            let factor = w.max(h) as f32 / max_dim as f32;
            let new_w = ((w as f32 / factor) as u32).max(1);
            let new_h = ((h as f32 / factor) as u32).max(1);
            let resized = image::imageops::resize(
                &self.rgba,
                new_w,
                new_h,
                image::imageops::FilterType::Nearest,
            );
            (DynamicImage::ImageRgba8(resized).to_luma8(), factor)
        } else {
            (DynamicImage::ImageRgba8(self.rgba.clone()).to_luma8(), 1.0)
        }
    }
}
