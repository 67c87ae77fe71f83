//! The long-running service: startup sweep, watch loop and HTTP listener.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use scanroute_core::{check_tools, Pipeline, ScanrouteConfig, TextExtractor};

use crate::files::Folders;
use crate::http::{router, AppState};
use crate::watcher::watch_scan_dir;
use crate::worker::{spawn_debouncer, spawn_worker};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("invalid listen address {0}")]
    Address(String),
}

/// Which parts of the service to run.
#[derive(Debug, Clone, Copy)]
pub struct ServeOptions {
    /// React to new files in the scan folder.
    pub watch: bool,
    /// Process what is already in the scan folder before listening.
    pub startup_sweep: bool,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            watch: true,
            startup_sweep: true,
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Run until Ctrl-C.
pub async fn serve(
    config: ScanrouteConfig,
    extractor: Arc<dyn TextExtractor>,
    options: ServeOptions,
) -> Result<(), ServeError> {
    config.paths.ensure_dirs()?;

    let tools = check_tools(&config.ocr);
    if !tools.is_ready() {
        warn!(
            "OCR tools incomplete (tesseract: {}, pdftoppm: {})",
            tools.tesseract.is_some(),
            tools.pdftoppm.is_some()
        );
    }

    let pipeline = Arc::new(Pipeline::new(&config, extractor));
    let stop = Arc::new(AtomicBool::new(false));
    let scan_dir = config.paths.scan_dir.clone();

    if options.startup_sweep {
        let (pipeline, stop, dir) = (pipeline.clone(), stop.clone(), scan_dir.clone());
        match tokio::task::spawn_blocking(move || pipeline.sweep(&dir, &stop)).await {
            Ok(Ok(report)) => info!("Startup sweep processed {} files", report.reports.len()),
            Ok(Err(e)) => warn!("Startup sweep skipped: {}", e),
            Err(e) => error!("Startup sweep panicked: {}", e),
        }
    }

    let (trigger, worker) = spawn_worker(
        pipeline.clone(),
        scan_dir.clone(),
        config.watch.process_delay(),
        stop.clone(),
    )?;

    let watch = if options.watch {
        let (resets, debouncer) = spawn_debouncer(config.watch.batch_delay(), trigger.clone());
        let watcher = watch_scan_dir(&scan_dir, resets)?;
        Some((watcher, debouncer))
    } else {
        None
    };

    let state = AppState {
        folders: Arc::new(Folders::new(config.paths.clone())),
        pipeline,
        trigger,
        profile: config.profile,
        tesseract_available: tools.tesseract.is_some(),
        max_upload_bytes: config.server.max_upload_bytes,
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|_| ServeError::Address(format!("{}:{}", config.server.host, config.server.port)))?;
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping the watcher closes the reset channel; the debouncer then exits
    // and releases its trigger, leaving the worker with no senders.
    stop.store(true, Ordering::Relaxed);
    if let Some((watcher, debouncer)) = watch {
        drop(watcher);
        if let Err(e) = debouncer.await {
            warn!("Debouncer ended abnormally: {}", e);
        }
    }

    match tokio::task::spawn_blocking(move || worker.join()).await {
        Ok(Ok(())) => info!("Stopped"),
        _ => error!("Batch worker panicked"),
    }
    Ok(())
}
