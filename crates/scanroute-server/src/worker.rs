//! The batch worker thread and the debounce actor that feeds it.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use scanroute_core::Pipeline;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Ask the worker to run a batch over the scan folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBatch;

/// Cloneable handle for queueing batches on the worker.
#[derive(Debug, Clone)]
pub struct BatchTrigger {
    tx: std_mpsc::Sender<RunBatch>,
}

impl BatchTrigger {
    pub fn new(tx: std_mpsc::Sender<RunBatch>) -> Self {
        Self { tx }
    }

    /// Queue a batch. Returns `false` once the worker has exited.
    pub fn request(&self) -> bool {
        self.tx.send(RunBatch).is_ok()
    }
}

/// Spawn the thread that owns batch processing.
///
/// Requests arriving while a batch runs are coalesced into the next one.
/// The thread exits when every [`BatchTrigger`] is dropped.
pub fn spawn_worker(
    pipeline: Arc<Pipeline>,
    scan_dir: PathBuf,
    process_delay: Duration,
    stop: Arc<AtomicBool>,
) -> io::Result<(BatchTrigger, JoinHandle<()>)> {
    let (tx, rx) = std_mpsc::channel();

    let handle = thread::Builder::new()
        .name("scanroute-batch".into())
        .spawn(move || {
            while rx.recv().is_ok() {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                thread::sleep(process_delay);

                let coalesced = rx.try_iter().count();
                if coalesced > 0 {
                    debug!("Coalesced {} queued batch requests", coalesced);
                }

                match pipeline.sweep(&scan_dir, &stop) {
                    Ok(report) if report.reports.is_empty() && report.abandoned.is_empty() => {
                        debug!("Nothing to process in {}", scan_dir.display());
                    }
                    Ok(_) => {}
                    Err(e) => error!("Cannot list {}: {}", scan_dir.display(), e),
                }
            }
            info!("Batch worker stopped");
        })?;

    Ok((BatchTrigger::new(tx), handle))
}

/// Spawn the debounce actor.
///
/// Every `()` sent on the returned channel restarts a `window` long quiet
/// period; when it lapses one batch is requested. Closing the channel flushes
/// a pending window immediately.
pub fn spawn_debouncer(
    window: Duration,
    trigger: BatchTrigger,
) -> (mpsc::UnboundedSender<()>, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(debounce(rx, window, trigger));
    (tx, handle)
}

async fn debounce(mut resets: mpsc::UnboundedReceiver<()>, window: Duration, trigger: BatchTrigger) {
    while resets.recv().await.is_some() {
        loop {
            tokio::select! {
                msg = resets.recv() => {
                    if msg.is_none() {
                        trigger.request();
                        return;
                    }
                }
                _ = tokio::time::sleep(window) => {
                    debug!("Scan folder quiet for {:?}, requesting batch", window);
                    if !trigger.request() {
                        return;
                    }
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WINDOW: Duration = Duration::from_millis(500);

    fn trigger() -> (BatchTrigger, std_mpsc::Receiver<RunBatch>) {
        let (tx, rx) = std_mpsc::channel();
        (BatchTrigger::new(tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_yields_one_batch() {
        let (trigger, requests) = trigger();
        let (resets, _task) = spawn_debouncer(WINDOW, trigger);

        for _ in 0..5 {
            resets.send(()).unwrap();
        }
        tokio::time::sleep(WINDOW * 2).await;

        assert_eq!(requests.try_iter().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_restarts_window() {
        let (trigger, requests) = trigger();
        let (resets, _task) = spawn_debouncer(WINDOW, trigger);

        resets.send(()).unwrap();
        tokio::time::sleep(WINDOW / 2).await;
        resets.send(()).unwrap();
        tokio::time::sleep(WINDOW / 2).await;
        assert_eq!(requests.try_iter().count(), 0);

        tokio::time::sleep(WINDOW).await;
        assert_eq!(requests.try_iter().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closing_flushes_pending_window() {
        let (trigger, requests) = trigger();
        let (resets, task) = spawn_debouncer(WINDOW, trigger);

        resets.send(()).unwrap();
        drop(resets);
        task.await.unwrap();

        assert_eq!(requests.try_iter().count(), 1);
    }

    struct Layout {
        _root: tempfile::TempDir,
        config: scanroute_core::ScanrouteConfig,
        calls: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl Layout {
        fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            let mut config = scanroute_core::ScanrouteConfig::default();
            config.paths.scan_dir = root.path().join("scan");
            config.paths.fully_indexed_dir = root.path().join("fully");
            config.paths.partial_indexed_dir = root.path().join("partial");
            config.paths.failed_dir = root.path().join("failed");
            config.paths.log_dir = root.path().join("logs");
            config.paths.ensure_dirs().unwrap();
            Self {
                _root: root,
                config,
                calls: Arc::default(),
            }
        }

        fn pipeline(&self) -> Arc<Pipeline> {
            let calls = self.calls.clone();
            let extractor: Arc<dyn scanroute_core::TextExtractor> =
                Arc::new(move |_: &std::path::Path| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    "Surname: John Smith\nAccount Number: 1234567890123".to_string()
                });
            Arc::new(Pipeline::new(&self.config, extractor))
        }

        fn drop_scan(&self, name: &str) -> PathBuf {
            let path = self.config.paths.scan_dir.join(name);
            std::fs::write(&path, b"%PDF-1.4").unwrap();
            path
        }

        fn extractions(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_worker_waits_then_coalesces_requests() {
        let folders = Layout::new();
        let src = folders.drop_scan("form.pdf");
        let delay = Duration::from_millis(300);
        let stop = Arc::new(AtomicBool::new(false));

        let start = std::time::Instant::now();
        let (trigger, handle) = spawn_worker(
            folders.pipeline(),
            folders.config.paths.scan_dir.clone(),
            delay,
            stop,
        )
        .unwrap();
        for _ in 0..3 {
            assert!(trigger.request());
        }
        drop(trigger);
        handle.join().unwrap();
        let elapsed = start.elapsed();

        // One grace delay, not one per request
        assert!(elapsed >= delay);
        assert!(elapsed < delay * 2);
        assert!(!src.exists());
        assert_eq!(folders.extractions(), 1);
        assert_eq!(
            std::fs::read_dir(&folders.config.paths.fully_indexed_dir).unwrap().count(),
            1
        );
        assert!(folders
            .config
            .paths
            .fully_indexed_dir
            .join("John Smith_1234567890123.pdf")
            .exists());
    }

    #[test]
    fn test_worker_exits_when_triggers_dropped() {
        let folders = Layout::new();
        let src = folders.drop_scan("idle.pdf");

        let (trigger, handle) = spawn_worker(
            folders.pipeline(),
            folders.config.paths.scan_dir.clone(),
            Duration::from_millis(10),
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        let copy = trigger.clone();
        drop(trigger);
        drop(copy);
        handle.join().unwrap();

        assert!(src.exists());
        assert_eq!(folders.extractions(), 0);
    }

    #[test]
    fn test_request_after_stop_does_no_work() {
        let folders = Layout::new();
        let src = folders.drop_scan("late.pdf");
        let stop = Arc::new(AtomicBool::new(false));

        let (trigger, handle) = spawn_worker(
            folders.pipeline(),
            folders.config.paths.scan_dir.clone(),
            Duration::from_millis(10),
            stop.clone(),
        )
        .unwrap();
        stop.store(true, Ordering::Relaxed);
        assert!(trigger.request());
        handle.join().unwrap();

        assert!(!trigger.request());
        assert!(src.exists());
        assert_eq!(folders.extractions(), 0);
    }

    #[test]
    fn test_trigger_reports_dead_worker() {
        let (trigger, requests) = trigger();
        assert!(trigger.request());
        drop(requests);
        assert!(!trigger.request());
    }
}
