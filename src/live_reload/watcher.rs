use log::{debug, warn};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::Broadcast;

/// Payload pushed to every live client on a qualifying change.
pub const REFRESH_MESSAGE: &str = "refresh";

struct ActiveWatch {
    dir: PathBuf,
    // Dropping this tears down the underlying OS watch.
    _watcher: RecommendedWatcher,
}

/// Watches the most recently listed directory for entry-level changes and
/// broadcasts `refresh` to the live clients when one happens.
///
/// At most one watch is live per process: arming a different directory
/// replaces the previous watch (last-armed-wins), re-arming the current one
/// keeps it. Content edits to existing files are deliberately ignored; a
/// listing page only changes when an entry appears or disappears.
pub struct ChangeWatcher {
    subscribers: Arc<dyn Broadcast>,
    active: Mutex<Option<ActiveWatch>>,
}

impl ChangeWatcher {
    pub fn new(subscribers: Arc<dyn Broadcast>) -> Self {
        Self {
            subscribers,
            active: Mutex::new(None),
        }
    }

    /// Point the watch at `dir`. Watch setup failure is non-fatal: the
    /// request that triggered it is unaffected, live reload just stays inert
    /// until the next successful arm.
    pub fn arm(&self, dir: &Path) {
        let mut active = self.active.lock().unwrap();
        if active.as_ref().is_some_and(|watch| watch.dir.as_path() == dir) {
            return;
        }

        match self.spawn_watch(dir) {
            Ok(watcher) => {
                debug!("Watching {}", dir.display());
                *active = Some(ActiveWatch {
                    dir: dir.to_path_buf(),
                    _watcher: watcher,
                });
            }
            Err(e) => {
                warn!("Cannot watch {}: {}", dir.display(), e);
                *active = None;
            }
        }
    }

    /// Directory the watch currently tracks, if any.
    pub fn watched(&self) -> Option<PathBuf> {
        self.active
            .lock()
            .unwrap()
            .as_ref()
            .map(|watch| watch.dir.clone())
    }

    fn spawn_watch(&self, dir: &Path) -> notify::Result<RecommendedWatcher> {
        let subscribers = Arc::clone(&self.subscribers);
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<Event>| match res {
                Ok(event) if is_rename_class(&event.kind) => {
                    debug!("Entry change: {:?}", event.paths);
                    subscribers.broadcast(REFRESH_MESSAGE);
                }
                Ok(_) => {}
                Err(e) => warn!("Watch error: {}", e),
            })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        Ok(watcher)
    }
}

/// An entry was added to, removed from, or renamed within the watched
/// directory. Data and metadata changes to existing files do not qualify.
fn is_rename_class(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    )
}
