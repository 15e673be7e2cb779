use std::fmt;
use std::sync::Arc;

use super::chord::KeyChord;
use super::registry::{Callback, Handler, Predicate};

/// A user-invocable command, optionally reachable through a shortcut.
///
/// Actions feed both the command palette (title, description) and the key
/// registry (shortcut, callback, enabled).
#[derive(Clone)]
pub struct Action {
    pub id: String,
    pub title: String,
    description: Option<String>,
    pub shortcut: Option<KeyChord>,
    callback: Callback,
    enabled: Predicate,
}

impl Action {
    pub fn new(id: impl Into<String>, callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            id: id.into(),
            title: "Untitled".to_string(),
            description: None,
            shortcut: None,
            callback: Arc::new(callback),
            enabled: Arc::new(|| true),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_shortcut(mut self, shortcut: KeyChord) -> Self {
        self.shortcut = Some(shortcut);
        self
    }

    pub fn enabled_when(mut self, enabled: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.enabled = Arc::new(enabled);
        self
    }

    /// Falls back to the title.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.title)
    }

    pub fn is_enabled(&self) -> bool {
        (self.enabled)()
    }

    pub fn call(&self) {
        (self.callback)()
    }

    pub fn to_handler(&self) -> Handler {
        Handler::from_callback(self.callback.clone()).with_predicate(self.enabled.clone())
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("shortcut", &self.shortcut)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyEvent, KeyHandlerRegistry};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_defaults() {
        let action = Action::new("noop", || {});
        assert_eq!(action.title, "Untitled");
        assert_eq!(action.description(), "Untitled");
        assert!(action.is_enabled());

        let action = action.with_title("Undo");
        assert_eq!(action.description(), "Undo");
        let action = action.with_description("Undo the last change");
        assert_eq!(action.description(), "Undo the last change");
    }

    #[test]
    fn test_registry_from_actions() {
        let undone = Arc::new(AtomicUsize::new(0));
        let actions = vec![
            Action::new("undo", {
                let undone = undone.clone();
                move || {
                    undone.fetch_add(1, Ordering::SeqCst);
                }
            })
            .with_shortcut(KeyChord::new("z").meta()),
            Action::new("palette-only", || {}),
            Action::new("disabled", || panic!("must not run"))
                .with_shortcut(KeyChord::new("Delete"))
                .enabled_when(|| false),
        ];

        let registry = KeyHandlerRegistry::from_actions(&actions);
        assert_eq!(registry.len(), 2);

        assert!(registry.handle(&KeyEvent::new("z").with_meta(true)).handled());
        assert_eq!(undone.load(Ordering::SeqCst), 1);

        assert!(!registry.handle(&KeyEvent::new("Delete")).handled());
    }
}
