use std::collections::HashSet;
use std::hash::Hash;

use uuid::Uuid;

/// Tracks which popovers (dialogs, menus, pickers) are open.
///
/// Global keybindings are only live while nothing is open. Owned by the UI
/// shell and passed by reference, never ambient.
#[derive(Debug, Clone)]
pub struct PopoverMonitor<K = Uuid> {
    open: HashSet<K>,
}

impl<K: Eq + Hash> PopoverMonitor<K> {
    pub fn new() -> Self {
        Self {
            open: HashSet::new(),
        }
    }

    /// Record an open/close transition. Events without a popover are ignored.
    pub fn handle_open_change(&mut self, open: bool, popover: Option<K>) {
        let Some(popover) = popover else {
            return;
        };
        if open {
            self.open.insert(popover);
        } else {
            self.open.remove(&popover);
        }
    }

    pub fn global_keybindings_enabled(&self) -> bool {
        self.open.is_empty()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}

impl<K: Eq + Hash> Default for PopoverMonitor<K> {
    fn default() -> Self {
        Self::new()
    }
}
