//! Side-effecting half of routing: moves and image conversions.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::convert::convert_image_to_pdf;
use super::namer::resolve;
use crate::models::config::RetryConfig;
use crate::models::document::{Destination, RoutingOutcome};

/// Bounded retry policy for a single move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, at least one.
    pub attempts: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Result of [`move_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReport {
    pub moved: bool,
    /// Attempts actually started.
    pub attempts: u32,
}

/// Rename, falling back to copy-and-delete across filesystems.
fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if !src.exists() || dst.exists() {
                return Err(rename_err);
            }
            fs::copy(src, dst)?;
            fs::remove_file(src)
        }
    }
}

/// Move `src` to `dst` under `policy`.
///
/// A missing source ends the loop at once: the file cannot come back.
pub fn move_with_retry(src: &Path, dst: &Path, policy: RetryPolicy) -> MoveReport {
    for attempt in 1..=policy.attempts {
        if !src.exists() {
            warn!(
                "Attempt {}/{}: source {} no longer exists",
                attempt,
                policy.attempts,
                src.display()
            );
            return MoveReport {
                moved: false,
                attempts: attempt,
            };
        }

        match move_file(src, dst) {
            Ok(()) => {
                debug!("Moved {} -> {}", src.display(), dst.display());
                return MoveReport {
                    moved: true,
                    attempts: attempt,
                };
            }
            Err(e) => {
                warn!(
                    "Attempt {}/{} to move {} failed: {}",
                    attempt,
                    policy.attempts,
                    src.display(),
                    e
                );
                if attempt < policy.attempts {
                    thread::sleep(policy.delay);
                }
            }
        }
    }

    warn!(
        "Giving up on moving {} after {} attempts",
        src.display(),
        policy.attempts
    );
    MoveReport {
        moved: false,
        attempts: policy.attempts,
    }
}

/// Where a committed document ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Written to the planned destination.
    Routed(PathBuf),
    /// Conversion failed; the original went to the failed folder instead.
    FellBack(PathBuf),
    /// Nothing could be moved; the source is left where it was.
    Stuck,
}

/// Performs the filesystem side of a [`RoutingOutcome`].
pub struct Executor {
    policy: RetryPolicy,
    failed_dir: PathBuf,
    convert_dpi: u32,
}

impl Executor {
    pub fn new(policy: RetryPolicy, failed_dir: impl Into<PathBuf>) -> Self {
        Self {
            policy,
            failed_dir: failed_dir.into(),
            convert_dpi: 300,
        }
    }

    /// Set the resolution assumed when converting images.
    pub fn with_convert_dpi(mut self, dpi: u32) -> Self {
        self.convert_dpi = dpi;
        self
    }

    /// Commit `outcome`; true when the document reached its planned folder.
    ///
    /// Failures are logged, never raised.
    pub fn commit(&self, outcome: &RoutingOutcome) -> bool {
        matches!(self.place(outcome), Placement::Routed(_))
    }

    /// Commit `outcome` and report where the document landed.
    pub fn place(&self, outcome: &RoutingOutcome) -> Placement {
        let target = outcome.destination_path();

        if outcome.destination == Destination::Failed || !outcome.convert_to_pdf {
            let report = move_with_retry(&outcome.source, &target, self.policy);
            return if report.moved {
                info!("Routed {} -> {}", outcome.source.display(), target.display());
                Placement::Routed(target)
            } else {
                Placement::Stuck
            };
        }

        match convert_image_to_pdf(&outcome.source, &target, self.convert_dpi) {
            Ok(()) => {
                if let Err(e) = fs::remove_file(&outcome.source) {
                    warn!(
                        "Converted {} but could not remove it: {}",
                        outcome.source.display(),
                        e
                    );
                }
                info!(
                    "Converted {} -> {}",
                    outcome.source.display(),
                    target.display()
                );
                Placement::Routed(target)
            }
            Err(e) => {
                warn!(
                    "Conversion of {} failed, moving original to failed: {}",
                    outcome.source.display(),
                    e
                );
                // A partial write must not linger in the indexed folder
                if let Err(e) = fs::remove_file(&target) {
                    if e.kind() != io::ErrorKind::NotFound {
                        warn!("Could not remove partial output {}: {}", target.display(), e);
                    }
                }
                self.fall_back(&outcome.source)
            }
        }
    }

    fn fall_back(&self, source: &Path) -> Placement {
        let original = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target = self.failed_dir.join(resolve(&self.failed_dir, &original));

        if move_with_retry(source, &target, self.policy).moved {
            Placement::FellBack(target)
        } else {
            Placement::Stuck
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{Classification, PartialSource};
    use image::RgbImage;
    use std::time::Instant;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(10))
    }

    fn outcome(
        source: PathBuf,
        destination: Destination,
        dir: &Path,
        name: &str,
        convert: bool,
    ) -> RoutingOutcome {
        let classification = match destination {
            Destination::Failed => Classification::Failed,
            _ => Classification::Partial {
                value: "John".into(),
                source: PartialSource::Name,
            },
        };
        RoutingOutcome {
            source,
            classification,
            destination,
            destination_dir: dir.to_path_buf(),
            final_filename: name.to_string(),
            convert_to_pdf: convert,
        }
    }

    #[test]
    fn test_missing_source_fails_after_one_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let start = Instant::now();
        let report = move_with_retry(
            &dir.path().join("gone.pdf"),
            &dir.path().join("dest.pdf"),
            RetryPolicy::new(3, Duration::from_secs(5)),
        );
        assert_eq!(
            report,
            MoveReport {
                moved: false,
                attempts: 1
            }
        );
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_move_retries_until_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.pdf");
        fs::write(&src, b"x").unwrap();

        // Destination parent does not exist, so every attempt fails
        let report = move_with_retry(&src, &dir.path().join("nope/a.pdf"), fast_policy());
        assert_eq!(
            report,
            MoveReport {
                moved: false,
                attempts: 3
            }
        );
        assert!(src.exists());
    }

    #[test]
    fn test_commit_plain_move() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let src = dir.path().join("scan.pdf");
        fs::write(&src, b"%PDF").unwrap();

        let executor = Executor::new(fast_policy(), out.path());
        let o = outcome(src.clone(), Destination::PartiallyIndexed, out.path(), "John.pdf", false);

        assert!(executor.commit(&o));
        assert!(!src.exists());
        assert_eq!(fs::read(out.path().join("John.pdf")).unwrap(), b"%PDF");
    }

    #[test]
    fn test_commit_converts_image() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let src = dir.path().join("scan.png");
        RgbImage::new(20, 10).save(&src).unwrap();

        let executor = Executor::new(fast_policy(), out.path());
        let o = outcome(src.clone(), Destination::PartiallyIndexed, out.path(), "John.pdf", true);

        assert_eq!(
            executor.place(&o),
            Placement::Routed(out.path().join("John.pdf"))
        );
        assert!(!src.exists());
        assert!(fs::read(out.path().join("John.pdf")).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_conversion_failure_falls_back_to_failed() {
        let dir = tempfile::tempdir().unwrap();
        let indexed = tempfile::tempdir().unwrap();
        let failed = tempfile::tempdir().unwrap();
        let src = dir.path().join("scan.jpg");
        fs::write(&src, b"garbage").unwrap();

        let executor = Executor::new(fast_policy(), failed.path());
        let o = outcome(src.clone(), Destination::FullyIndexed, indexed.path(), "A_1234567890.pdf", true);

        assert_eq!(
            executor.place(&o),
            Placement::FellBack(failed.path().join("scan.jpg"))
        );
        assert!(!executor.commit(&outcome(
            dir.path().join("scan.jpg"),
            Destination::FullyIndexed,
            indexed.path(),
            "A_1234567890.pdf",
            true
        )));
        assert!(!indexed.path().join("A_1234567890.pdf").exists());
    }

    #[test]
    fn test_unremovable_partial_output_still_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let indexed = tempfile::tempdir().unwrap();
        let failed = tempfile::tempdir().unwrap();
        let src = dir.path().join("scan.png");
        RgbImage::new(8, 8).save(&src).unwrap();
        // The write fails and the leftover cannot be removed as a file
        fs::create_dir(indexed.path().join("John.pdf")).unwrap();

        let executor = Executor::new(fast_policy(), failed.path());
        let o = outcome(src.clone(), Destination::PartiallyIndexed, indexed.path(), "John.pdf", true);

        assert_eq!(
            executor.place(&o),
            Placement::FellBack(failed.path().join("scan.png"))
        );
        assert!(!src.exists());
        assert!(indexed.path().join("John.pdf").is_dir());
    }

    #[test]
    fn test_failed_destination_moves_without_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let failed = tempfile::tempdir().unwrap();
        let src = dir.path().join("photo.jpeg");
        fs::write(&src, b"not decoded").unwrap();

        let executor = Executor::new(fast_policy(), failed.path());
        let o = outcome(src, Destination::Failed, failed.path(), "photo.jpeg", false);
        assert!(executor.commit(&o));
        assert_eq!(fs::read(failed.path().join("photo.jpeg")).unwrap(), b"not decoded");
    }
}
