//! Capture sources: where step images come from

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use super::{CaptureError, CapturedImage};

/// Produces one image per capture step
pub trait CaptureSource {
    /// Ask for the image of a step.
    ///
    /// `Ok(None)` means the operator has not provided one yet; the caller may
    /// ask again. Repeated calls are not guaranteed to return a new image.
    fn capture(&mut self, step_label: &str) -> Result<Option<CapturedImage>, CaptureError>;
}

fn load_file(path: &Path) -> Result<CapturedImage, CaptureError> {
    let bytes = std::fs::read(path)
        .map_err(|e| CaptureError::Unavailable(format!("{}: {}", path.display(), e)))?;
    log::info!("Loaded {} bytes from {}", bytes.len(), path.display());
    CapturedImage::from_bytes(&bytes)
}

/// Interactive capture: the operator types the path of each photo
pub struct PromptCapture<R, W> {
    input: R,
    output: W,
}

impl PromptCapture<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptCapture<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask a free-form question on the same terminal. `None` when input is closed.
    pub fn ask(&mut self, question: &str) -> std::io::Result<Option<String>> {
        write!(self.output, "{question} ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> CaptureSource for PromptCapture<R, W> {
    fn capture(&mut self, step_label: &str) -> Result<Option<CapturedImage>, CaptureError> {
        write!(self.output, "{step_label} (image path, blank to wait): ")
            .and_then(|_| self.output.flush())
            .map_err(|e| CaptureError::Unavailable(e.to_string()))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| CaptureError::Unavailable(e.to_string()))?;
        if read == 0 {
            return Err(CaptureError::Closed);
        }

        let path = line.trim();
        if path.is_empty() {
            return Ok(None);
        }
        load_file(Path::new(path)).map(Some)
    }
}

/// Batch capture from image paths given up front, one per step
pub struct FileQueueCapture {
    paths: VecDeque<PathBuf>,
}

impl FileQueueCapture {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl CaptureSource for FileQueueCapture {
    fn capture(&mut self, step_label: &str) -> Result<Option<CapturedImage>, CaptureError> {
        let Some(path) = self.paths.pop_front() else {
            return Err(CaptureError::Unavailable(format!(
                "no image left for \"{step_label}\""
            )));
        };
        log::debug!("{}: using {}", step_label, path.display());
        load_file(&path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        DynamicImage::ImageRgba8(RgbaImage::new(4, 4))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn test_prompt_blank_line_waits() {
        let mut out = Vec::new();
        let mut cap = PromptCapture::new(Cursor::new("\n"), &mut out);
        assert!(cap.capture("Step 1").unwrap().is_none());
        assert!(String::from_utf8(out).unwrap().starts_with("Step 1"));
    }

    #[test]
    fn test_prompt_loads_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png");
        let input = format!("{}\n", path.display());
        let mut cap = PromptCapture::new(Cursor::new(input), Vec::new());
        let img = cap.capture("Step 1").unwrap().unwrap();
        assert_eq!(img.width(), 4);
    }

    #[test]
    fn test_prompt_missing_file_is_unavailable() {
        let mut cap = PromptCapture::new(Cursor::new("/nonexistent/x.png\n"), Vec::new());
        assert!(matches!(
            cap.capture("Step 1"),
            Err(CaptureError::Unavailable(_))
        ));
    }

    #[test]
    fn test_prompt_closed_input() {
        let mut cap = PromptCapture::new(Cursor::new(""), Vec::new());
        assert!(matches!(cap.capture("Step 1"), Err(CaptureError::Closed)));
    }

    #[test]
    fn test_ask_reads_trimmed_answer() {
        let mut cap = PromptCapture::new(Cursor::new(" y \n"), Vec::new());
        assert_eq!(cap.ask("Start over?").unwrap(), Some("y".to_string()));
        assert_eq!(cap.ask("Start over?").unwrap(), None);
    }

    #[test]
    fn test_queue_runs_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "b.png");
        let mut cap = FileQueueCapture::new(vec![path]);
        assert_eq!(cap.remaining(), 1);
        assert!(cap.capture("Step 1").unwrap().is_some());
        assert!(matches!(
            cap.capture("Step 2"),
            Err(CaptureError::Unavailable(_))
        ));
    }
}
