//! Selection State
//!
//! The most recently resolved model, kept for display. Shared by reference
//! between the resolver (the only writer) and any number of readers.
//!
//! Concurrent resolutions race: the state reflects whichever finished last,
//! not necessarily the most recently issued request. Only the display name is
//! affected; each caller still gets its own resolution result.

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

/// Shown before any selection has been made.
pub const AUTO_LABEL: &str = "Auto";

/// Display name for an auto-selected model.
pub fn display_name_for(model_name: &str) -> String {
    format!("{AUTO_LABEL} ({model_name})")
}

#[derive(Debug, Clone)]
struct Selected {
    display_name: String,
    model_name: String,
}

pub struct SelectionState {
    current: RwLock<Option<Selected>>,
    changes: broadcast::Sender<String>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(16)
    }
}

impl std::fmt::Debug for SelectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionState")
            .field("current", &*self.current.read())
            .finish()
    }
}

impl SelectionState {
    /// `capacity` bounds how many unread notifications a slow subscriber may
    /// fall behind before it starts missing them.
    pub fn new(capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity.max(1));
        Self {
            current: RwLock::new(None),
            changes,
        }
    }

    /// Record `name` as the active model.
    ///
    /// The check and the write of the `(display name, model name)` pair happen
    /// under one write lock, so racing updates with the same name emit a
    /// single notification. Returns whether the display name changed.
    pub(crate) fn update(&self, name: &str) -> bool {
        let display_name = display_name_for(name);
        {
            let mut current = self.current.write();
            if current
                .as_ref()
                .is_some_and(|s| s.display_name == display_name)
            {
                return false;
            }
            *current = Some(Selected {
                display_name,
                model_name: name.to_string(),
            });
            // Sent while still holding the lock so subscribers observe
            // notifications in the same order as the stored values.
            // No receivers is not an error here.
            let _ = self.changes.send(name.to_string());
        }
        debug!(model = name, "Auto selection changed");
        true
    }

    /// Display name of the active selection, or `"Auto"` if none yet.
    pub fn current_display_name(&self) -> String {
        self.current
            .read()
            .as_ref()
            .map_or_else(|| AUTO_LABEL.to_string(), |s| s.display_name.clone())
    }

    /// Name of the last resolved model, or `"Auto"` if none yet.
    pub fn last_actual_model_name(&self) -> String {
        self.current
            .read()
            .as_ref()
            .map_or_else(|| AUTO_LABEL.to_string(), |s| s.model_name.clone())
    }

    /// Stream of model names, one per effective change.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}
