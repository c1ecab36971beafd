use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use tagmatch::capture::{CaptureError, FileQueueCapture, PromptCapture};
use tagmatch::config::AppConfig;
use tagmatch::domain::{Variant, VariantKind};
use tagmatch::recognition::{QrReader, ReaderChain, SymbolReader, TesseractRecognizer};
use tagmatch::session::{Orchestrator, PersistStatus, Progress, Session, WorkflowError};
use tagmatch::sink::{ConsoleSink, CsvSheet, GoogleSheet, GoogleSheetConfig, RecordStore};
use tagmatch::verify::Normalizer;

#[derive(Debug, Parser)]
#[command(name = "tagmatch", version, about = "Check that two barcodes and a printed label carry the same number")]
struct Cli {
    /// Capture workflow to run
    #[arg(long, value_enum, default_value_t = VariantKind::BarcodeLabel)]
    variant: VariantKind,

    /// Config file (defaults to <config dir>/tagmatch/config.json)
    #[arg(long, env = "TAGMATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Number of trailing characters compared (at least 1)
    #[arg(long)]
    trailing_digits: Option<NonZeroUsize>,

    /// Append results to this CSV file
    #[arg(long, conflicts_with = "google_sheet")]
    csv: Option<PathBuf>,

    /// Append results to the Google sheet named by TAGMATCH_SHEET_ID
    #[arg(long)]
    google_sheet: bool,

    /// Persist results even if the workflow does not by default
    #[arg(long)]
    persist: bool,

    /// Images for each step, in order; prompts interactively when omitted
    images: Vec<PathBuf>,
}

/// How a run ended, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Matched,
    Mismatched,
    /// Input ran out before every step was captured
    Unfinished,
}

impl Outcome {
    fn from_match(matched: bool) -> Self {
        if matched { Outcome::Matched } else { Outcome::Mismatched }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Matched => ExitCode::SUCCESS,
            Outcome::Mismatched => ExitCode::from(1),
            Outcome::Unfinished => ExitCode::from(2),
        }
    }
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref());
    if let Some(digits) = cli.trailing_digits {
        config.trailing_digits = digits.get();
    }
    if let Some(path) = &cli.csv {
        config.csv_path = Some(path.clone());
    }

    let mut variant = Variant::from_kind(cli.variant);
    variant.persist |= cli.persist;
    log::info!(
        "Running {} with {} trailing digits",
        variant.name,
        config.trailing_digits
    );

    let barcodes = ReaderChain::new(vec![
        Box::new(SymbolReader::new(config.barcode_max_dimension)),
        Box::new(QrReader::new(config.barcode_max_dimension)),
    ]);
    let mut orchestrator = Orchestrator::new(
        Box::new(barcodes),
        Box::new(TesseractRecognizer::new(
            config.ocr_language.clone(),
            config.upscale_factor,
        )),
        Box::new(ConsoleSink::stdout()),
        Normalizer::new(config.trailing_digits),
    )
    .with_zone(config.zone());

    match record_store(&cli, &config) {
        Some(store) => orchestrator = orchestrator.with_store(store),
        None if variant.persist => {
            log::warn!("{} persists results but no --csv or --google-sheet was given", variant.name)
        }
        None => {}
    }

    let mut session = Session::new(variant);
    let outcome = if cli.images.is_empty() {
        run_interactive(&mut orchestrator, &mut session)?
    } else {
        run_batch(&mut orchestrator, &mut session, cli.images)?
    };
    Ok(outcome.into())
}

fn record_store(cli: &Cli, config: &AppConfig) -> Option<Box<dyn RecordStore>> {
    if cli.google_sheet {
        let sheet_config = GoogleSheetConfig::from_env(config.sheet_range.clone());
        return Some(Box::new(GoogleSheet::new(sheet_config)));
    }
    config
        .csv_path
        .clone()
        .map(|path| Box::new(CsvSheet::new(path)) as Box<dyn RecordStore>)
}

fn report_persist(status: &PersistStatus) {
    match status {
        PersistStatus::NotRequired => {}
        PersistStatus::Saved => println!("Results saved."),
        PersistStatus::Failed(reason) => eprintln!("Results were not saved: {reason}"),
    }
}

fn run_batch(
    orchestrator: &mut Orchestrator,
    session: &mut Session,
    images: Vec<PathBuf>,
) -> Result<Outcome> {
    let mut capture = FileQueueCapture::new(images);
    loop {
        match orchestrator.run(session, &mut capture) {
            Ok(Progress::Verified { result, persist }) => {
                report_persist(&persist);
                if capture.remaining() > 0 {
                    log::warn!("{} image(s) were not used", capture.remaining());
                }
                return Ok(Outcome::from_match(result.matched));
            }
            Err(WorkflowError::CaptureUnavailable { step, source }) => {
                eprintln!("Step {step} has no image: {source}");
                return Ok(Outcome::Unfinished);
            }
            Err(e) => {
                return Err(e).context("Batch run stopped before all steps were captured");
            }
            Ok(Progress::Retry { step }) => {
                log::warn!("Step {}: nothing usable recognized, trying the next image", step)
            }
            Ok(Progress::Waiting { .. }) | Ok(Progress::Recorded { .. }) => {}
        }
    }
}

fn run_interactive(orchestrator: &mut Orchestrator, session: &mut Session) -> Result<Outcome> {
    let mut prompt = PromptCapture::stdio();
    loop {
        match orchestrator.run(session, &mut prompt) {
            Ok(Progress::Verified { result, mut persist }) => {
                report_persist(&persist);
                while matches!(persist, PersistStatus::Failed(_))
                    && answered_yes(&mut prompt, "Retry saving? [y/N]")?
                {
                    persist = orchestrator.retry_persist(session);
                    report_persist(&persist);
                }
                if !answered_yes(&mut prompt, "Start over? [y/N]")? {
                    return Ok(Outcome::from_match(result.matched));
                }
                session.reset();
            }
            Ok(Progress::Retry { step }) => {
                println!("Nothing usable was recognized for step {step}. Please capture it again.")
            }
            Ok(Progress::Waiting { .. }) | Ok(Progress::Recorded { .. }) => {}
            Err(WorkflowError::CaptureUnavailable {
                source: CaptureError::Closed,
                ..
            }) => {
                log::info!("Input closed, leaving unfinished session");
                return Ok(Outcome::Unfinished);
            }
            Err(e) => eprintln!("{e}. Please try again."),
        }
    }
}

fn answered_yes<R, W>(prompt: &mut PromptCapture<R, W>, question: &str) -> Result<bool>
where
    R: std::io::BufRead,
    W: std::io::Write,
{
    let answer = prompt
        .ask(question)
        .context("Failed to read operator input")?;
    Ok(answer.is_some_and(|a| a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagmatch::capture::CapturedImage;
    use tagmatch::domain::VerificationResult;
    use tagmatch::recognition::{BarcodeHit, BarcodeReader, RecognitionError, TextHit, TextRecognizer};
    use tagmatch::sink::ResultSink;

    struct NoBarcodes;

    impl BarcodeReader for NoBarcodes {
        fn decode(&self, _image: &CapturedImage) -> Vec<BarcodeHit> {
            Vec::new()
        }
    }

    struct NoText;

    impl TextRecognizer for NoText {
        fn recognize(
            &self,
            _image: &CapturedImage,
            _allowlist: Option<&str>,
        ) -> Result<Vec<TextHit>, RecognitionError> {
            Ok(Vec::new())
        }
    }

    struct Silent;

    impl ResultSink for Silent {
        fn render(&mut self, _result: &VerificationResult) {}
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(
            Box::new(NoBarcodes),
            Box::new(NoText),
            Box::new(Silent),
            Normalizer::default(),
        )
    }

    #[test]
    fn test_batch_without_enough_images_is_unfinished() {
        let mut session = Session::new(Variant::from_kind(VariantKind::TripleLabel));
        let outcome = run_batch(&mut orchestrator(), &mut session, Vec::new()).unwrap();
        assert_eq!(outcome, Outcome::Unfinished);
    }

    #[test]
    fn test_zero_trailing_digits_is_rejected() {
        assert!(Cli::try_parse_from(["tagmatch", "--trailing-digits", "0"]).is_err());
        let cli = Cli::try_parse_from(["tagmatch", "--trailing-digits", "5"]).unwrap();
        assert_eq!(cli.trailing_digits.map(NonZeroUsize::get), Some(5));
    }

    #[test]
    fn test_outcome_from_match() {
        assert_eq!(Outcome::from_match(true), Outcome::Matched);
        assert_eq!(Outcome::from_match(false), Outcome::Mismatched);
    }
}
