//! Multi-format barcode decoding using rxing (1D symbologies and 2D codes)

use super::{BarcodeHit, BarcodeReader};
use crate::capture::CapturedImage;

/// Barcode reader for the symbologies rxing knows: EAN/UPC, Code 128, Code 39,
/// ITF, Codabar, QR, Data Matrix, PDF417 and Aztec
#[derive(Debug, Clone, Copy)]
pub struct SymbolReader {
    /// Maximum dimension to downsample to before detection (0 = no downsampling)
    max_dim: u32,
}

impl SymbolReader {
    pub fn new(max_dim: u32) -> Self {
        Self { max_dim }
    }
}

impl Default for SymbolReader {
    fn default() -> Self {
        Self::new(1600)
    }
}

impl BarcodeReader for SymbolReader {
    fn decode(&self, image: &CapturedImage) -> Vec<BarcodeHit> {
        let (gray, downsample_factor) = image.luma_within(self.max_dim);
        let (width, height) = gray.dimensions();
        log::debug!(
            "Scanning {}x{} frame for barcodes (downsampled {:.2}x)",
            width,
            height,
            downsample_factor
        );

        let decoded = match rxing::helpers::detect_multiple_in_luma(gray.into_raw(), width, height)
        {
            Ok(decoded) => decoded,
            Err(e) => {
                log::debug!("No barcode found: {}", e);
                return Vec::new();
            }
        };

        let mut results: Vec<BarcodeHit> = Vec::new();
        for symbol in decoded {
            let payload = symbol.getText().to_string();
            if payload.is_empty() || results.iter().any(|r| r.payload == payload) {
                continue;
            }
            results.push(BarcodeHit {
                payload,
                symbology: format!("{:?}", symbol.getBarcodeFormat()),
            });
        }

        log::info!("Decoded {} barcode(s)", results.len());
        results
    }
}

/// Runs several readers over the same frame and merges their hits in order,
/// dropping payloads an earlier reader already reported
pub struct ReaderChain {
    readers: Vec<Box<dyn BarcodeReader>>,
}

impl ReaderChain {
    pub fn new(readers: Vec<Box<dyn BarcodeReader>>) -> Self {
        Self { readers }
    }
}

impl BarcodeReader for ReaderChain {
    fn decode(&self, image: &CapturedImage) -> Vec<BarcodeHit> {
        let mut results: Vec<BarcodeHit> = Vec::new();
        for hit in self.readers.iter().flat_map(|r| r.decode(image)) {
            if !results.iter().any(|r| r.payload == hit.payload) {
                results.push(hit);
            }
        }
        results
    }
}
