use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

use super::event::KeyEvent;
use crate::error::ShortcutError;

/// Display glyphs for keys whose identifier is longer than one character.
static GLYPHS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ArrowDown", "↓"),
        ("ArrowLeft", "←"),
        ("ArrowRight", "→"),
        ("ArrowUp", "↑"),
        ("Alt", "⌥"),
        ("Backspace", "⌫"),
        ("CapsLock", "⇪"),
        ("Control", "⌃"),
        ("Dead", "☠️"),
        ("Delete", "⌦"),
        ("End", "⇲"),
        ("Enter", "⏎"),
        ("Escape", "⎋"),
        ("Home", "⌂"),
        ("Meta", "⌘"),
        ("PageDown", "⇟"),
        ("PageUp", "⇞"),
        ("Shift", "⇧"),
        ("Tab", "↹"),
        (" ", "␣"),
    ])
});

const CTRL_GLYPH: &str = "⌃";
const SHIFT_GLYPH: &str = "⇧";
const ALT_GLYPH: &str = "⌥";
const META_GLYPH: &str = "⌘";

/// A key plus the exact state of the four modifier keys.
///
/// Equality and hashing cover all five fields, so a chord with an extra or
/// missing modifier never matches another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord {
    /// Key identifier as reported by the UI layer, e.g. `"ArrowRight"` or `"z"`.
    pub key: String,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyChord {
    /// A chord with no modifiers held.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            alt: false,
            ctrl: false,
            meta: false,
            shift: false,
        }
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            key: event.key.clone(),
            alt: event.alt,
            ctrl: event.ctrl,
            meta: event.meta,
            shift: event.shift,
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.key == event.key
            && self.alt == event.alt
            && self.ctrl == event.ctrl
            && self.meta == event.meta
            && self.shift == event.shift
    }

    /// The single glyph shown for this chord's key.
    ///
    /// Printable characters are upper-cased. Multi-character identifiers
    /// must have an entry in the glyph table (function keys render as
    /// themselves); anything else is an error, never a fallback.
    pub fn glyph(&self) -> Result<Cow<'static, str>, ShortcutError> {
        let mut chars = self.key.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c != ' ' {
                return Ok(Cow::Owned(c.to_uppercase().collect()));
            }
        }
        if let Some(glyph) = GLYPHS.get(self.key.as_str()) {
            return Ok(Cow::Borrowed(*glyph));
        }
        if is_function_key(&self.key) {
            return Ok(Cow::Owned(self.key.clone()));
        }
        Err(ShortcutError::UnmappedKey(self.key.clone()))
    }

    /// Glyphs of the held modifiers, always ordered ctrl, shift, alt, meta.
    pub fn modifier_glyphs(&self) -> impl Iterator<Item = &'static str> {
        [
            (self.ctrl, CTRL_GLYPH),
            (self.shift, SHIFT_GLYPH),
            (self.alt, ALT_GLYPH),
            (self.meta, META_GLYPH),
        ]
        .into_iter()
        .filter_map(|(held, glyph)| held.then_some(glyph))
    }

    /// The full shortcut label, e.g. `⌃⇧⌘P`.
    pub fn render(&self) -> Result<String, ShortcutError> {
        let glyph = self.glyph()?;
        let mut out: String = self.modifier_glyphs().collect();
        out.push_str(&glyph);
        Ok(out)
    }
}

fn is_function_key(key: &str) -> bool {
    key.strip_prefix('F')
        .and_then(|n| n.parse::<u8>().ok())
        .is_some_and(|n| (1..=12).contains(&n))
}

/// Writes the parseable form, e.g. `Ctrl+Shift+ArrowUp`.
impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.shift {
            f.write_str("Shift+")?;
        }
        if self.alt {
            f.write_str("Alt+")?;
        }
        if self.meta {
            f.write_str("Meta+")?;
        }
        match self.key.as_str() {
            " " => f.write_str("Space"),
            "+" => f.write_str("Plus"),
            key => f.write_str(key),
        }
    }
}

impl FromStr for KeyChord {
    type Err = ShortcutError;

    /// Parse `[Modifier+]*Key`. Modifier names are case-insensitive and
    /// accept the usual aliases; the key keeps its case so `z` and `Z` stay
    /// distinct, except that `Space` and `Plus` name `" "` and `"+"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShortcutError::Empty);
        }

        let mut chord = KeyChord::new("");
        let mut key: Option<&str> = None;

        for part in s.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "alt" | "option" | "opt" => chord.alt = true,
                "shift" => chord.shift = true,
                "meta" | "cmd" | "command" | "super" => chord.meta = true,
                "" => return Err(ShortcutError::MissingKey(s.to_string())),
                _ if key.is_some() => return Err(ShortcutError::MultipleKeys(s.to_string())),
                _ => key = Some(part),
            }
        }

        let key = key.ok_or_else(|| ShortcutError::MissingKey(s.to_string()))?;
        chord.key = match key.to_ascii_lowercase().as_str() {
            "space" => " ".to_string(),
            "plus" => "+".to_string(),
            _ => key.to_string(),
        };
        Ok(chord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_structural_equality() {
        let a = KeyChord::new("ArrowRight").alt();
        let b = KeyChord::new("ArrowRight").alt();
        assert_eq!(a, b);

        let set: HashSet<KeyChord> = [a.clone(), b].into_iter().collect();
        assert_eq!(set.len(), 1);

        let variants = [
            KeyChord::new("ArrowLeft").alt(),
            KeyChord::new("ArrowRight"),
            KeyChord::new("ArrowRight").alt().ctrl(),
            KeyChord::new("ArrowRight").alt().meta(),
            KeyChord::new("ArrowRight").alt().shift(),
        ];
        for other in variants {
            assert_ne!(a, other);
        }
    }

    #[test]
    fn test_from_event_matches() {
        let event = KeyEvent::new("z").with_meta(true).with_shift(true);
        let chord = KeyChord::from_event(&event);
        assert_eq!(chord, KeyChord::new("z").meta().shift());
        assert!(chord.matches(&event));
        assert!(!KeyChord::new("z").meta().matches(&event));
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(KeyChord::new("z").glyph().unwrap(), "Z");
        assert_eq!(KeyChord::new("ArrowUp").glyph().unwrap(), "↑");
        assert_eq!(KeyChord::new(" ").glyph().unwrap(), "␣");
        assert_eq!(KeyChord::new("Enter").glyph().unwrap(), "⏎");
        assert_eq!(KeyChord::new("F12").glyph().unwrap(), "F12");
        assert_eq!(KeyChord::new("Dead").glyph().unwrap(), "☠️");
        assert_eq!(KeyChord::new("é").glyph().unwrap(), "É");
    }

    #[test]
    fn test_unmapped_key_is_an_error() {
        assert_eq!(
            KeyChord::new("Insert").glyph(),
            Err(ShortcutError::UnmappedKey("Insert".to_string()))
        );
        assert!(KeyChord::new("F13").render().is_err());
        assert!(KeyChord::new("").glyph().is_err());
    }

    #[test]
    fn test_modifier_order() {
        let chord = KeyChord::new("p").meta().shift().ctrl();
        assert_eq!(
            chord.modifier_glyphs().collect::<Vec<_>>(),
            vec!["⌃", "⇧", "⌘"]
        );
        assert_eq!(chord.render().unwrap(), "⌃⇧⌘P");

        let all = KeyChord::new("Enter").alt().shift().ctrl().meta();
        assert_eq!(all.render().unwrap(), "⌃⇧⌥⌘⏎");
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "Alt+Shift+ArrowUp".parse::<KeyChord>().unwrap(),
            KeyChord::new("ArrowUp").alt().shift()
        );
        assert_eq!(
            "cmd + shift + p".parse::<KeyChord>().unwrap(),
            KeyChord::new("p").meta().shift()
        );
        assert_eq!("Space".parse::<KeyChord>().unwrap(), KeyChord::new(" "));
        assert_eq!(
            "Ctrl+Plus".parse::<KeyChord>().unwrap(),
            KeyChord::new("+").ctrl()
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<KeyChord>(), Err(ShortcutError::Empty));
        assert_eq!(
            "Ctrl+Shift".parse::<KeyChord>(),
            Err(ShortcutError::MissingKey("Ctrl+Shift".to_string()))
        );
        assert_eq!(
            "Ctrl+".parse::<KeyChord>(),
            Err(ShortcutError::MissingKey("Ctrl+".to_string()))
        );
        assert_eq!(
            "a+b".parse::<KeyChord>(),
            Err(ShortcutError::MultipleKeys("a+b".to_string()))
        );
    }

    #[test]
    fn test_display_parses_back() {
        let chords = [
            KeyChord::new("ArrowDown").alt().shift(),
            KeyChord::new(" "),
            KeyChord::new("+").ctrl().meta(),
        ];
        for chord in chords {
            assert_eq!(chord.to_string().parse::<KeyChord>().unwrap(), chord);
        }
    }
}
