//! Per-file and per-batch processing: extract, parse, route, commit.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::models::config::ScanrouteConfig;
use crate::models::document::{Classification, Destination, DocumentFields, FieldMatch, RoutingDecision};
use crate::routing::{decide, is_image, is_supported, Executor, OutputDirs, Placement, RetryPolicy, Router};
use crate::text::TextExtractor;

/// What happened to one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub source: PathBuf,
    pub classification: Classification,
    pub name: Option<FieldMatch>,
    pub account: Option<FieldMatch>,
    /// Folder the document was planned for.
    pub destination: Destination,
    /// Where the file actually is now, if it moved.
    pub final_path: Option<PathBuf>,
    /// Whether it reached the planned folder.
    pub committed: bool,
    pub processing_time_ms: u64,
}

/// Extraction and decision for a file, without touching the filesystem.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub text: String,
    pub fields: DocumentFields,
    pub decision: RoutingDecision,
}

/// Summary of one batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub reports: Vec<FileReport>,
    /// Files given up on after exhausting per-file retries.
    pub abandoned: Vec<PathBuf>,
    /// The stop flag was raised before every file was processed.
    pub stopped_early: bool,
}

impl BatchReport {
    fn count(&self, destination: Destination) -> usize {
        self.reports
            .iter()
            .filter(|r| r.destination == destination)
            .count()
    }

    pub fn fully_indexed(&self) -> usize {
        self.count(Destination::FullyIndexed)
    }

    pub fn partially_indexed(&self) -> usize {
        self.count(Destination::PartiallyIndexed)
    }

    pub fn failed(&self) -> usize {
        self.count(Destination::Failed)
    }
}

/// Files in `dir` (not recursive) with a recognised extension, sorted by name.
pub fn scan_candidates(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_supported)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The routing pipeline for one set of folders.
pub struct Pipeline {
    extractor: Arc<dyn TextExtractor>,
    router: Router,
    executor: Executor,
    file_attempts: u32,
    file_backoff: Duration,
}

impl Pipeline {
    /// Build a pipeline from configuration and a text extractor.
    pub fn new(config: &ScanrouteConfig, extractor: Arc<dyn TextExtractor>) -> Self {
        let dirs = OutputDirs::from_paths(&config.paths);
        let executor = Executor::new(RetryPolicy::from_config(&config.retry), dirs.failed.clone())
            .with_convert_dpi(config.ocr.convert_dpi);

        Self {
            extractor,
            router: Router::new(dirs),
            executor,
            file_attempts: config.retry.file_attempts.max(1),
            file_backoff: config.retry.file_backoff(),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Read the file and its text, decoding images.
    ///
    /// An image that cannot be decoded yields empty text so it routes to
    /// the failed folder; only I/O errors are returned for retrying.
    fn load(&self, path: &Path) -> Result<(String, Option<image::DynamicImage>)> {
        fs::File::open(path)?;
        if !is_image(&file_name_of(path)) {
            return Ok((self.extractor.extract(path), None));
        }
        match image::open(path) {
            Ok(image) => Ok((self.extractor.extract(path), Some(image))),
            Err(image::ImageError::IoError(e)) => Err(e.into()),
            Err(e) => {
                warn!("Cannot decode {}: {}", path.display(), e);
                Ok((String::new(), None))
            }
        }
    }

    /// Extract and decide without moving anything.
    pub fn preview(&self, path: &Path) -> Result<Preview> {
        let (text, image) = self.load(path)?;
        let fields = self.router.parser().parse(&text, image.as_ref());
        let decision = decide(&file_name_of(path), &fields);
        Ok(Preview {
            text,
            fields,
            decision,
        })
    }

    /// Process one file end to end.
    pub fn process_file(&self, path: &Path) -> Result<FileReport> {
        let start = Instant::now();
        let (text, image) = self.load(path)?;
        let fields = self.router.parser().parse(&text, image.as_ref());
        drop(image);

        if fields.is_empty() {
            error!("No name or account found in {}", path.display());
        }

        let outcome = self.router.plan(path, &fields);
        let placement = self.executor.place(&outcome);

        let (final_path, committed) = match placement {
            Placement::Routed(p) => (Some(p), true),
            Placement::FellBack(p) => (Some(p), false),
            Placement::Stuck => (None, false),
        };

        info!(
            "{} -> {} ({})",
            path.display(),
            outcome.destination.as_str(),
            if committed { "committed" } else { "not committed" }
        );

        Ok(FileReport {
            source: path.to_path_buf(),
            classification: outcome.classification,
            name: fields.name,
            account: fields.account,
            destination: outcome.destination,
            final_path,
            committed,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Process one file, retrying while it is missing or unreadable.
    ///
    /// Returns `None` once retries are exhausted; the error is logged.
    pub fn process_with_retry(&self, path: &Path) -> Option<FileReport> {
        for attempt in 1..=self.file_attempts {
            match self.process_file(path) {
                Ok(report) => return Some(report),
                Err(e) if e.is_transient() && attempt < self.file_attempts => {
                    debug!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        self.file_attempts,
                        path.display(),
                        e
                    );
                    thread::sleep(self.file_backoff);
                }
                Err(e) => {
                    error!(
                        "Giving up on {} after {} attempts: {}",
                        path.display(),
                        attempt,
                        e
                    );
                    return None;
                }
            }
        }
        None
    }

    /// Process `files` one at a time, checking `stop` between files.
    pub fn run_batch(&self, files: &[PathBuf], stop: &AtomicBool) -> BatchReport {
        self.run_batch_with(files, stop, |_| {})
    }

    /// Like [`Pipeline::run_batch`], calling `on_file` after each file is handled.
    pub fn run_batch_with<F>(&self, files: &[PathBuf], stop: &AtomicBool, mut on_file: F) -> BatchReport
    where
        F: FnMut(&Path),
    {
        let mut batch = BatchReport::default();

        for path in files {
            if stop.load(Ordering::Relaxed) {
                let done = batch.reports.len() + batch.abandoned.len();
                warn!("Stop requested, leaving {} files unprocessed", files.len() - done);
                batch.stopped_early = true;
                break;
            }
            match self.process_with_retry(path) {
                Some(report) => batch.reports.push(report),
                None => batch.abandoned.push(path.clone()),
            }
            on_file(path);
        }

        info!(
            "Batch done: {} fully, {} partial, {} failed, {} abandoned",
            batch.fully_indexed(),
            batch.partially_indexed(),
            batch.failed(),
            batch.abandoned.len()
        );
        batch
    }

    /// Process every candidate currently in `scan_dir`.
    pub fn sweep(&self, scan_dir: &Path, stop: &AtomicBool) -> io::Result<BatchReport> {
        let files = scan_candidates(scan_dir)?;
        debug!("Found {} candidates in {}", files.len(), scan_dir.display());
        Ok(self.run_batch(&files, stop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::PathsConfig;
    use image::RgbImage;
    use pretty_assertions::assert_eq;

    struct Fixture {
        _root: tempfile::TempDir,
        config: ScanrouteConfig,
    }

    fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let mut config = ScanrouteConfig::default();
        config.paths = PathsConfig {
            scan_dir: root.path().join("scan"),
            fully_indexed_dir: root.path().join("fully"),
            partial_indexed_dir: root.path().join("partial"),
            failed_dir: root.path().join("failed"),
            log_dir: root.path().join("logs"),
        };
        config.paths.ensure_dirs().unwrap();
        config.retry.retry_delay_secs = 0.01;
        config.retry.file_attempts = 2;
        config.retry.file_backoff_secs = 0.01;
        Fixture {
            _root: root,
            config,
        }
    }

    /// Extractor that answers by file stem.
    fn canned() -> Arc<dyn TextExtractor> {
        Arc::new(|path: &Path| {
            match path.file_stem().and_then(|s| s.to_str()).unwrap_or("") {
                "both" => "Surname: John Smith\nAccount Number: 1234567890123".to_string(),
                "name_only" => "Surname: John\nAccount Number: AB".to_string(),
                _ => String::new(),
            }
        })
    }

    #[test]
    fn test_process_file_fully_indexed_pdf() {
        let f = fixture();
        let src = f.config.paths.scan_dir.join("both.pdf");
        fs::write(&src, b"%PDF-1.4").unwrap();

        let pipeline = Pipeline::new(&f.config, canned());
        let report = pipeline.process_file(&src).unwrap();

        assert!(report.committed);
        assert_eq!(report.destination, Destination::FullyIndexed);
        assert_eq!(
            report.final_path,
            Some(f.config.paths.fully_indexed_dir.join("John Smith_1234567890123.pdf"))
        );
        assert!(!src.exists());
    }

    #[test]
    fn test_process_file_image_partial_is_converted() {
        let f = fixture();
        let src = f.config.paths.scan_dir.join("name_only.png");
        RgbImage::new(16, 16).save(&src).unwrap();

        let pipeline = Pipeline::new(&f.config, canned());
        let report = pipeline.process_file(&src).unwrap();

        let target = f.config.paths.partial_indexed_dir.join("John.pdf");
        assert_eq!(report.final_path, Some(target.clone()));
        assert!(fs::read(target).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_process_file_without_text_goes_to_failed() {
        let f = fixture();
        let src = f.config.paths.scan_dir.join("blank.pdf");
        fs::write(&src, b"%PDF-1.4").unwrap();
        fs::write(f.config.paths.failed_dir.join("blank.pdf"), b"older").unwrap();

        let pipeline = Pipeline::new(&f.config, canned());
        let report = pipeline.process_file(&src).unwrap();

        assert_eq!(report.classification, Classification::Failed);
        assert_eq!(
            report.final_path,
            Some(f.config.paths.failed_dir.join("blank_1.pdf"))
        );
    }

    #[test]
    fn test_missing_file_is_abandoned_without_stopping_batch() {
        let f = fixture();
        let present = f.config.paths.scan_dir.join("both.pdf");
        fs::write(&present, b"%PDF-1.4").unwrap();
        let missing = f.config.paths.scan_dir.join("vanished.pdf");

        let pipeline = Pipeline::new(&f.config, canned());
        let batch = pipeline.run_batch(&[missing.clone(), present], &AtomicBool::new(false));

        assert_eq!(batch.abandoned, vec![missing]);
        assert_eq!(batch.fully_indexed(), 1);
    }

    #[test]
    fn test_undecodable_image_reaches_failed() {
        let f = fixture();
        let src = f.config.paths.scan_dir.join("broken.jpg");
        fs::write(&src, b"not really a jpeg").unwrap();

        let pipeline = Pipeline::new(&f.config, canned());
        let stop = AtomicBool::new(false);
        let first = pipeline.sweep(&f.config.paths.scan_dir, &stop).unwrap();
        let second = pipeline.sweep(&f.config.paths.scan_dir, &stop).unwrap();

        assert!(first.abandoned.is_empty());
        assert_eq!(first.failed(), 1);
        assert!(second.reports.is_empty());
        assert!(!src.exists());
        assert!(f.config.paths.failed_dir.join("broken.jpg").exists());
    }

    #[test]
    fn test_run_batch_with_reports_each_file() {
        let f = fixture();
        let a = f.config.paths.scan_dir.join("both.pdf");
        let b = f.config.paths.scan_dir.join("name_only.pdf");
        fs::write(&a, b"%PDF-1.4").unwrap();
        fs::write(&b, b"%PDF-1.4").unwrap();

        let pipeline = Pipeline::new(&f.config, canned());
        let mut seen = Vec::new();
        let batch = pipeline.run_batch_with(&[a.clone(), b.clone()], &AtomicBool::new(false), |p| {
            seen.push(p.to_path_buf())
        });

        assert_eq!(seen, vec![a, b]);
        assert_eq!(batch.fully_indexed(), 1);
        assert_eq!(batch.partially_indexed(), 1);
    }

    #[test]
    fn test_stop_flag_halts_between_files() {
        let f = fixture();
        let src = f.config.paths.scan_dir.join("both.pdf");
        fs::write(&src, b"%PDF-1.4").unwrap();

        let pipeline = Pipeline::new(&f.config, canned());
        let batch = pipeline.run_batch(&[src.clone()], &AtomicBool::new(true));

        assert!(batch.stopped_early);
        assert!(batch.reports.is_empty());
        assert!(src.exists());
    }

    #[test]
    fn test_scan_candidates_filters_and_sorts() {
        let f = fixture();
        let scan = &f.config.paths.scan_dir;
        for name in ["b.PDF", "a.jpg", "notes.txt", "c.tiff"] {
            fs::write(scan.join(name), b"x").unwrap();
        }
        fs::create_dir(scan.join("nested.pdf")).unwrap();

        let names: Vec<String> = scan_candidates(scan)
            .unwrap()
            .iter()
            .map(|p| file_name_of(p))
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PDF"]);
    }

    #[test]
    fn test_preview_does_not_move() {
        let f = fixture();
        let src = f.config.paths.scan_dir.join("both.pdf");
        fs::write(&src, b"%PDF-1.4").unwrap();

        let preview = Pipeline::new(&f.config, canned()).preview(&src).unwrap();
        assert_eq!(preview.decision.desired_filename, "John Smith_1234567890123.pdf");
        assert!(src.exists());
    }
}
