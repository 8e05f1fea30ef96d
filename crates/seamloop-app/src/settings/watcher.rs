use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use notify::Watcher;
use notify_debouncer_mini::{DebouncedEventKind, Debouncer, new_debouncer};

/// Watches the settings file and reports when it changes on disk.
///
/// The parent directory is watched rather than the file, so editors that
/// save by rename are still picked up.
pub struct SettingsWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    receiver: Receiver<()>,
    path: PathBuf,
}

impl SettingsWatcher {
    pub fn new(path: &Path) -> Result<Self> {
        let dir = path
            .parent()
            .context("settings path has no parent directory")?
            .to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating {}", dir.display()))?;

        let (tx, rx): (Sender<()>, Receiver<()>) = crossbeam_channel::unbounded();
        let target = path.file_name().map(ToOwned::to_owned);

        let mut debouncer = new_debouncer(
            Duration::from_millis(150),
            move |res: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                if let Ok(events) = res {
                    let touched = events
                        .iter()
                        .any(|e| {
                            e.kind == DebouncedEventKind::Any
                                && e.path.file_name() == target.as_deref()
                        });
                    if touched {
                        let _ = tx.send(());
                    }
                }
            },
        )?;

        debouncer
            .watcher()
            .watch(&dir, notify::RecursiveMode::NonRecursive)?;
        log::info!("Watching {} for settings changes", path.display());

        Ok(Self {
            _debouncer: debouncer,
            receiver: rx,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain pending notifications; true if the file changed since the last call.
    pub fn changed(&self) -> bool {
        let mut any = false;
        while self.receiver.try_recv().is_ok() {
            any = true;
        }
        any
    }
}
