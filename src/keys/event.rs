/// A keyboard event as delivered by the UI layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_alt(mut self, alt: bool) -> Self {
        self.alt = alt;
        self
    }

    pub fn with_ctrl(mut self, ctrl: bool) -> Self {
        self.ctrl = ctrl;
        self
    }

    pub fn with_meta(mut self, meta: bool) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }

    /// Whether the event types a character rather than triggering a shortcut.
    /// Shift alone still types (it only changes case).
    pub fn is_char(&self) -> bool {
        self.key.chars().count() == 1 && !self.ctrl && !self.alt && !self.meta
    }
}

/// The real event object behind a [`KeyEvent`].
pub trait EventControl {
    fn prevent_default(&mut self);
    fn stop_propagation(&mut self);
}

/// What dispatching one event decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub matched: bool,
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl Dispatch {
    /// Nothing registered for the chord.
    pub const UNMATCHED: Dispatch = Dispatch {
        matched: false,
        prevent_default: false,
        stop_propagation: false,
    };

    pub fn matched(bubble: bool) -> Self {
        Self {
            matched: true,
            prevent_default: true,
            stop_propagation: !bubble,
        }
    }

    pub fn handled(&self) -> bool {
        self.matched
    }

    /// Replay the decision onto the real event.
    pub fn apply<E: EventControl + ?Sized>(&self, event: &mut E) -> bool {
        if self.prevent_default {
            event.prevent_default();
        }
        if self.stop_propagation {
            event.stop_propagation();
        }
        self.matched
    }
}
