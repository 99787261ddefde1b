use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher, recommended_watcher};
use tracing::{debug, warn};

/// Watches the directory holding `path` and sends a unit message whenever
/// the file is modified, created or renamed into place. Watching the parent
/// keeps working after editors replace the file atomically.
pub fn setup(path: &Path, tx: Sender<()>) -> Result<impl Watcher> {
    let target = path.to_path_buf();
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut watcher = recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if touches(&event, &target) => {
            debug!(kind = ?event.kind, "document changed");
            let _ = tx.send(());
        }
        Ok(_) => {}
        Err(err) => warn!(%err, "file watcher error"),
    })?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Cannot watch {}", dir.display()))?;
    Ok(watcher)
}

fn touches(event: &Event, target: &Path) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event.paths.iter().any(|p| p == target)
}
