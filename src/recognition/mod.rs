//! Recognition adapters
//!
//! Barcode decoding (barcode.rs, qr.rs) and label text recognition (ocr.rs)
//! behind two small traits so the session can run against any backend.

pub mod barcode;
pub mod ocr;
pub mod qr;

pub use barcode::{ReaderChain, SymbolReader};
pub use ocr::TesseractRecognizer;
pub use qr::QrReader;

use crate::capture::CapturedImage;

/// One decoded barcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeHit {
    pub payload: String,
    pub symbology: String,
}

/// One line of recognized text
#[derive(Debug, Clone, PartialEq)]
pub struct TextHit {
    pub text: String,
    /// Engine confidence, 0-100
    pub confidence: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("image could not be prepared for recognition: {0}")]
    Prepare(String),

    #[error("text recognition failed: {0}")]
    Engine(String),
}

/// Decodes barcodes from an image. An empty list means nothing was found.
pub trait BarcodeReader {
    fn decode(&self, image: &CapturedImage) -> Vec<BarcodeHit>;
}

/// Reads printed text from an image, in engine order
pub trait TextRecognizer {
    fn recognize(
        &self,
        image: &CapturedImage,
        allowlist: Option<&str>,
    ) -> Result<Vec<TextHit>, RecognitionError>;
}
