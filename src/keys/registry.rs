use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;

use super::action::Action;
use super::chord::KeyChord;
use super::event::{Dispatch, KeyEvent};
use super::popover::PopoverMonitor;

pub type Callback = Arc<dyn Fn() + Send + Sync>;
pub type Predicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// The reaction bound to one chord.
#[derive(Clone)]
pub struct Handler {
    action: Callback,
    bubble: bool,
    enabled: Option<Predicate>,
}

impl Handler {
    pub fn new(action: impl Fn() + Send + Sync + 'static) -> Self {
        Self::from_callback(Arc::new(action))
    }

    pub fn from_callback(action: Callback) -> Self {
        Self {
            action,
            bubble: false,
            enabled: None,
        }
    }

    /// Let the event keep propagating to ancestor listeners after the
    /// action runs. Default action is still prevented.
    pub fn bubbling(self) -> Self {
        self.with_bubble(true)
    }

    pub fn with_bubble(mut self, bubble: bool) -> Self {
        self.bubble = bubble;
        self
    }

    /// Only match while `enabled` returns true.
    pub fn enabled_when(mut self, enabled: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.enabled = Some(Arc::new(enabled));
        self
    }

    pub(crate) fn with_predicate(mut self, enabled: Predicate) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn bubble(&self) -> bool {
        self.bubble
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.as_ref().map_or(true, |enabled| enabled())
    }

    fn fire(&self) -> Dispatch {
        (self.action)();
        Dispatch::matched(self.bubble)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("bubble", &self.bubble)
            .field("gated", &self.enabled.is_some())
            .finish_non_exhaustive()
    }
}

fn dispatch(chord: &KeyChord, handler: Option<&Handler>) -> Dispatch {
    match handler {
        Some(handler) if handler.is_enabled() => {
            tracing::trace!(%chord, bubble = handler.bubble, "Dispatching key handler");
            handler.fire()
        }
        Some(_) => {
            tracing::trace!(%chord, "Key handler disabled");
            Dispatch::UNMATCHED
        }
        None => Dispatch::UNMATCHED,
    }
}

/// Chord → handler table, fixed after construction.
///
/// Built from an ordered list; a later entry for the same chord replaces an
/// earlier one.
#[derive(Debug, Clone, Default)]
pub struct KeyHandlerRegistry {
    bindings: HashMap<KeyChord, Handler>,
}

impl KeyHandlerRegistry {
    pub fn new(entries: impl IntoIterator<Item = (KeyChord, Handler)>) -> Self {
        entries.into_iter().collect()
    }

    /// Bind every action that carries a shortcut. The action's own enabled
    /// predicate gates its handler.
    pub fn from_actions<'a>(actions: impl IntoIterator<Item = &'a Action>) -> Self {
        actions
            .into_iter()
            .filter_map(|action| Some((action.shortcut.clone()?, action.to_handler())))
            .collect()
    }

    /// Run the handler bound to the event's chord, if any.
    ///
    /// The action runs synchronously before this returns. A panic inside it
    /// is not caught.
    pub fn handle(&self, event: &KeyEvent) -> Dispatch {
        let chord = KeyChord::from_event(event);
        dispatch(&chord, self.bindings.get(&chord))
    }

    /// Like [`handle`](Self::handle), but does nothing while any popover is
    /// open: global bindings must not fire underneath a dialog or menu.
    pub fn handle_global<K: Eq + Hash>(
        &self,
        event: &KeyEvent,
        popovers: &PopoverMonitor<K>,
    ) -> Dispatch {
        if !popovers.global_keybindings_enabled() {
            return Dispatch::UNMATCHED;
        }
        self.handle(event)
    }

    pub fn get(&self, chord: &KeyChord) -> Option<&Handler> {
        self.bindings.get(chord)
    }

    pub fn chords(&self) -> impl Iterator<Item = &KeyChord> {
        self.bindings.keys()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<(KeyChord, Handler)> for KeyHandlerRegistry {
    fn from_iter<I: IntoIterator<Item = (KeyChord, Handler)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

/// Registry that can change after construction.
///
/// Register, unregister and lookup are serialized by a reader-writer lock,
/// so a lookup never sees a half-applied change. The lock is released
/// before the action runs, so actions may themselves (un)register bindings.
#[derive(Debug, Default)]
pub struct SharedKeyRegistry {
    bindings: RwLock<HashMap<KeyChord, Handler>>,
}

impl SharedKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handler previously bound to `chord`, if any.
    pub fn register(&self, chord: KeyChord, handler: Handler) -> Option<Handler> {
        self.bindings.write().insert(chord, handler)
    }

    pub fn unregister(&self, chord: &KeyChord) -> Option<Handler> {
        self.bindings.write().remove(chord)
    }

    pub fn handle(&self, event: &KeyEvent) -> Dispatch {
        let chord = KeyChord::from_event(event);
        let handler = self.bindings.read().get(&chord).cloned();
        dispatch(&chord, handler.as_ref())
    }

    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }

    /// Freeze the current bindings into an immutable registry.
    pub fn snapshot(&self) -> KeyHandlerRegistry {
        KeyHandlerRegistry {
            bindings: self.bindings.read().clone(),
        }
    }
}
