//! Label text recognition using rusty-tesseract

use std::collections::{BTreeMap, HashMap};

use rusty_tesseract::{Args, Image};

use super::{RecognitionError, TextHit, TextRecognizer};
use crate::capture::CapturedImage;

/// A single word reported by tesseract, reduced to what line grouping needs
#[derive(Debug, Clone)]
struct Word {
    block_num: i32,
    par_num: i32,
    line_num: i32,
    word_num: i32,
    conf: f32,
    text: String,
}

/// Text recognizer backed by the system tesseract binary
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    lang: String,
    /// Integer upscale applied before recognition (1 = none)
    upscale_factor: u32,
}

impl TesseractRecognizer {
    pub fn new(lang: impl Into<String>, upscale_factor: u32) -> Self {
        Self {
            lang: lang.into(),
            upscale_factor,
        }
    }

    fn args(&self, allowlist: Option<&str>) -> Args {
        let mut config_variables = HashMap::new();
        if let Some(chars) = allowlist {
            config_variables.insert("tessedit_char_whitelist".to_string(), chars.to_string());
        }
        Args {
            lang: self.lang.clone(),
            config_variables,
            dpi: Some(300),
            psm: Some(11), // Sparse text: labels rarely form paragraphs
            oem: Some(3),
        }
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new("eng", 2)
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(
        &self,
        image: &CapturedImage,
        allowlist: Option<&str>,
    ) -> Result<Vec<TextHit>, RecognitionError> {
        log::info!(
            "Running OCR with rusty-tesseract on {}x{} image...",
            image.width(),
            image.height()
        );

        let processed = image.upscaled(self.upscale_factor);
        let tess_img = Image::from_dynamic_image(&processed)
            .map_err(|e| RecognitionError::Prepare(e.to_string()))?;

        let data = rusty_tesseract::image_to_data(&tess_img, &self.args(allowlist))
            .map_err(|e| RecognitionError::Engine(e.to_string()))?;
        log::debug!("Tesseract returned {} data entries", data.data.len());

        let words = data.data.into_iter().map(|d| Word {
            block_num: d.block_num,
            par_num: d.par_num,
            line_num: d.line_num,
            word_num: d.word_num,
            conf: d.conf,
            text: d.text,
        });
        let hits = group_lines(words);
        log::info!("OCR produced {} line candidate(s)", hits.len());
        Ok(hits)
    }
}

/// Join words into line candidates, ordered by block, paragraph and line.
/// Confidence is the mean of the word confidences.
fn group_lines(words: impl IntoIterator<Item = Word>) -> Vec<TextHit> {
    let mut lines: BTreeMap<(i32, i32, i32), Vec<Word>> = BTreeMap::new();
    for w in words
        .into_iter()
        .filter(|w| !w.text.trim().is_empty() && w.conf > 0.0)
    {
        lines
            .entry((w.block_num, w.par_num, w.line_num))
            .or_default()
            .push(w);
    }

    lines
        .into_values()
        .map(|mut words| {
            words.sort_by_key(|w| w.word_num);
            let text = words
                .iter()
                .map(|w| w.text.trim())
                .collect::<Vec<_>>()
                .join(" ");
            let confidence = words.iter().map(|w| w.conf).sum::<f32>() / words.len() as f32;
            TextHit { text, confidence }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(block: i32, line: i32, word_num: i32, conf: f32, text: &str) -> Word {
        Word {
            block_num: block,
            par_num: 1,
            line_num: line,
            word_num,
            conf,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_words_join_into_lines_in_spatial_order() {
        let hits = group_lines(vec![
            word(2, 1, 1, 90.0, "1234567"),
            word(1, 1, 2, 80.0, "0042"),
            word(1, 1, 1, 60.0, "No"),
        ]);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "No 0042");
        assert!((hits[0].confidence - 70.0).abs() < 1e-4);
        assert_eq!(hits[1].text, "1234567");
    }

    #[test]
    fn test_empty_and_unconfident_words_are_dropped() {
        let hits = group_lines(vec![
            word(1, 1, 1, -1.0, ""),
            word(1, 2, 1, 0.0, "777"),
            word(1, 3, 1, 95.0, "  "),
        ]);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_allowlist_becomes_whitelist_variable() {
        let rec = TesseractRecognizer::default();
        let args = rec.args(Some("0123456789"));
        assert_eq!(
            args.config_variables.get("tessedit_char_whitelist"),
            Some(&"0123456789".to_string())
        );
        assert!(rec.args(None).config_variables.is_empty());
        assert_eq!(args.lang, "eng");
    }
}
