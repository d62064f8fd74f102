//! File watching for out-of-band refreshes.
//!
//! Uses `notify-debouncer-full` to watch the content, attachment and theme
//! directories and the config file. Changes are batched, classified and
//! turned into a [`RefreshPlan`] the server applies.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{
    Config as NotifyConfig, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher,
};
use notify_debouncer_full::{
    DebounceEventResult, Debouncer, RecommendedCache, new_debouncer, new_debouncer_opt,
};

use crate::config::WatchConfig;
use crate::content::Format;

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),
}

// =============================================================================
// Changes
// =============================================================================

/// The kind of file that changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// A page document was added, modified, or deleted.
    Content { path: PathBuf },
    /// An attachment changed. Attachments are read per request.
    Attachment { path: PathBuf },
    /// A template or stylesheet in the theme changed.
    Template { path: PathBuf },
    /// The config file changed.
    Config,
}

/// Events sent from the file watcher.
#[derive(Debug)]
pub enum WatchEvent {
    FilesChanged(Vec<ChangeKind>),
    Error(String),
}

/// What a batch of changes requires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshPlan {
    /// Re-scan the document store
    pub rescan: bool,
    /// Reload templates from the theme
    pub reload_templates: bool,
    /// The config changed; only a restart applies it
    pub config_changed: bool,
}

impl RefreshPlan {
    pub fn from_changes(changes: &[ChangeKind]) -> Self {
        let mut plan = Self::default();
        for change in changes {
            match change {
                ChangeKind::Content { .. } => plan.rescan = true,
                ChangeKind::Template { .. } => plan.reload_templates = true,
                ChangeKind::Config => plan.config_changed = true,
                ChangeKind::Attachment { .. } => {}
            }
        }
        plan
    }

    /// Whether rendered responses may now be stale.
    pub fn flushes_cache(&self) -> bool {
        self.rescan || self.reload_templates
    }
}

// =============================================================================
// Path classification
// =============================================================================

/// Paths to watch for changes.
pub struct WatchPaths {
    pub content_dir: PathBuf,
    pub attachments_dir: PathBuf,
    pub theme_dir: PathBuf,
    pub config_path: PathBuf,
}

/// Classifies file paths into change types.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    content_dir: PathBuf,
    attachments_dir: PathBuf,
    theme_dir: PathBuf,
    config_path: PathBuf,
}

impl PathClassifier {
    pub fn new(paths: &WatchPaths) -> Self {
        // Canonicalize so paths match what the watcher reports
        let canonical = |p: &Path| p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
        Self {
            content_dir: canonical(&paths.content_dir),
            attachments_dir: canonical(&paths.attachments_dir),
            theme_dir: canonical(&paths.theme_dir),
            config_path: canonical(&paths.config_path),
        }
    }

    /// Classify a changed path into a ChangeKind.
    pub fn classify(&self, path: &Path) -> Option<ChangeKind> {
        // Skip hidden files and editor droppings
        if path
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        {
            return None;
        }

        if path == self.config_path {
            return Some(ChangeKind::Config);
        }

        // Attachments may live under the content dir, so check them first
        if path.starts_with(&self.attachments_dir) {
            return Some(ChangeKind::Attachment {
                path: path.to_path_buf(),
            });
        }

        if path.starts_with(&self.content_dir) {
            // Removed directories have no extension but may have held pages
            let is_page = Format::from_path(path).is_some() || path.extension().is_none();
            return is_page.then(|| ChangeKind::Content {
                path: path.to_path_buf(),
            });
        }

        if path.starts_with(self.theme_dir.join("templates")) {
            return Some(ChangeKind::Template {
                path: path.to_path_buf(),
            });
        }

        None
    }
}

// =============================================================================
// File watcher
// =============================================================================

/// A file watcher that can use either native or polling backend.
pub enum FileWatcher {
    /// Native file system watcher (recommended for local development).
    Native {
        _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
        rx: Receiver<WatchEvent>,
    },
    /// Polling-based watcher (for network filesystems, Docker, etc.).
    Polling {
        _debouncer: Debouncer<PollWatcher, RecommendedCache>,
        rx: Receiver<WatchEvent>,
    },
}

impl FileWatcher {
    pub fn new(config: &WatchConfig, paths: &WatchPaths) -> Result<Self, WatchError> {
        let debounce_timeout = Duration::from_millis(config.debounce_ms);
        let classifier = PathClassifier::new(paths);
        let (tx, rx) = mpsc::channel();

        let callback = move |result: DebounceEventResult| match result {
            Ok(events) => {
                let changes: Vec<ChangeKind> = events
                    .iter()
                    .filter(|event| is_relevant_event(&event.kind))
                    .flat_map(|event| event.paths.iter())
                    .filter_map(|path| classifier.classify(path))
                    .collect();

                if !changes.is_empty() {
                    let _ = tx.send(WatchEvent::FilesChanged(changes));
                }
            }
            Err(errors) => {
                for e in errors {
                    let _ = tx.send(WatchEvent::Error(e.to_string()));
                }
            }
        };

        if config.poll {
            let poll_interval = Duration::from_millis(config.poll_interval_ms);
            let notify_config = NotifyConfig::default().with_poll_interval(poll_interval);

            let mut debouncer = new_debouncer_opt::<_, PollWatcher, RecommendedCache>(
                debounce_timeout,
                None,
                callback,
                RecommendedCache::default(),
                notify_config,
            )?;
            watch_paths(&mut debouncer, paths)?;

            Ok(FileWatcher::Polling {
                _debouncer: debouncer,
                rx,
            })
        } else {
            let mut debouncer = new_debouncer(debounce_timeout, None, callback)?;
            watch_paths(&mut debouncer, paths)?;

            Ok(FileWatcher::Native {
                _debouncer: debouncer,
                rx,
            })
        }
    }

    /// Receive the next watch event (blocking).
    pub fn recv(&self) -> Option<WatchEvent> {
        match self {
            FileWatcher::Native { rx, .. } => rx.recv().ok(),
            FileWatcher::Polling { rx, .. } => rx.recv().ok(),
        }
    }
}

fn watch_paths<W: Watcher, C: notify_debouncer_full::FileIdCache>(
    debouncer: &mut Debouncer<W, C>,
    paths: &WatchPaths,
) -> Result<(), WatchError> {
    for dir in [&paths.content_dir, &paths.attachments_dir, &paths.theme_dir] {
        if dir.exists() {
            debouncer.watch(dir, RecursiveMode::Recursive)?;
        }
    }

    // Watch the config file's directory to catch editors that replace it
    if let Some(parent) = paths.config_path.parent()
        && parent.exists()
    {
        debouncer.watch(parent, RecursiveMode::NonRecursive)?;
    }

    Ok(())
}

fn is_relevant_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Remove(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
    )
}
