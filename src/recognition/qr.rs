//! QR code decoding using rqrr

use rqrr::PreparedImage;

use super::{BarcodeHit, BarcodeReader};
use crate::capture::CapturedImage;

pub const QR_SYMBOLOGY: &str = "QRCODE";

/// Barcode reader for QR symbols
#[derive(Debug, Clone, Copy)]
pub struct QrReader {
    /// Maximum dimension to downsample to before detection (0 = no downsampling)
    max_dim: u32,
}

impl QrReader {
    pub fn new(max_dim: u32) -> Self {
        Self { max_dim }
    }
}

impl Default for QrReader {
    fn default() -> Self {
        Self::new(1600)
    }
}

impl BarcodeReader for QrReader {
    fn decode(&self, image: &CapturedImage) -> Vec<BarcodeHit> {
        let (gray, downsample_factor) = image.luma_within(self.max_dim);
        log::debug!(
            "Scanning {}x{} frame for QR codes (downsampled {:.2}x)",
            gray.width(),
            gray.height(),
            downsample_factor
        );

        let mut prepared = PreparedImage::prepare(gray);
        let grids = prepared.detect_grids();

        let mut results: Vec<BarcodeHit> = Vec::new();
        for grid in grids {
            match grid.decode() {
                Ok((_, content)) => {
                    if !results.iter().any(|r| r.payload == content) {
                        results.push(BarcodeHit {
                            payload: content,
                            symbology: QR_SYMBOLOGY.to_string(),
                        });
                    }
                }
                Err(e) => log::debug!("QR grid found but not decodable: {}", e),
            }
        }

        log::info!("Decoded {} QR code(s)", results.len());
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Luma, RgbaImage};
    use qrcode::QrCode;

    fn qr_image(payload: &str) -> CapturedImage {
        let code = QrCode::new(payload.as_bytes()).unwrap();
        let luma = code
            .render::<Luma<u8>>()
            .module_dimensions(8, 8)
            .build();
        CapturedImage::from_rgba(DynamicImage::ImageLuma8(luma).to_rgba8())
    }

    #[test]
    fn test_decodes_rendered_qr() {
        let hits = QrReader::default().decode(&qr_image("ABC1234567"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload, "ABC1234567");
        assert_eq!(hits[0].symbology, QR_SYMBOLOGY);
    }

    #[test]
    fn test_blank_frame_has_no_codes() {
        let blank = CapturedImage::from_rgba(RgbaImage::from_pixel(
            64,
            64,
            image::Rgba([255, 255, 255, 255]),
        ));
        assert!(QrReader::default().decode(&blank).is_empty());
    }
}
