//! Filesystem notifications for the scan folder.

use std::path::Path;

use notify::event::{EventKind, ModifyKind};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Whether an event may mean a new document arrived.
pub fn is_arrival(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_))
    )
}

/// Watch `dir` (non-recursive) and send a reset for every arrival event.
///
/// The returned watcher must be kept alive for events to flow.
pub fn watch_scan_dir(
    dir: &Path,
    resets: mpsc::UnboundedSender<()>,
) -> notify::Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
        Ok(event) if is_arrival(&event.kind) => {
            debug!("Arrival event for {:?}", event.paths);
            if resets.send(()).is_err() {
                debug!("Debouncer gone, dropping event");
            }
        }
        Ok(_) => {}
        Err(e) => warn!("Watch error: {:?}", e),
    })?;

    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    info!("Watching {} for new documents", dir.display());
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind, RenameMode};

    #[test]
    fn test_is_arrival() {
        assert!(is_arrival(&EventKind::Create(CreateKind::File)));
        assert!(is_arrival(&EventKind::Modify(ModifyKind::Name(RenameMode::To))));
        assert!(!is_arrival(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
        assert!(!is_arrival(&EventKind::Remove(RemoveKind::File)));
    }
}
