//! Terminal rendering of a verification result

use std::io::Write;

use super::ResultSink;
use crate::domain::VerificationResult;

pub struct ConsoleSink<W> {
    out: W,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn write_result(&mut self, result: &VerificationResult) -> std::io::Result<()> {
        writeln!(self.out, "Comparison of results:")?;
        for (i, key) in result.keys.keys().iter().enumerate() {
            writeln!(self.out, "  Source {}: {}", i + 1, key)?;
        }
        if result.matched {
            writeln!(self.out, "The numbers from all sources match!")?;
        } else {
            writeln!(self.out, "The numbers do not match.")?;
        }
        self.out.flush()
    }
}

impl<W: Write> ResultSink for ConsoleSink<W> {
    fn render(&mut self, result: &VerificationResult) {
        if let Err(e) = self.write_result(result) {
            log::error!("Failed to render result: {}", e);
        }
    }
}
