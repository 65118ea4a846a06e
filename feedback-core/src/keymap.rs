//! Keyboard shortcuts for the form.
//!
//! Ctrl+Enter (Cmd+Enter on macOS) submits through the same validated entry
//! point as the submit control. Escape closes the confirmation dialog.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyChord {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
            alt: false,
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    pub fn meta(key: Key) -> Self {
        Self {
            meta: true,
            ..Self::plain(key)
        }
    }

    pub fn action(&self) -> Option<KeyAction> {
        match self.key {
            Key::Enter if (self.ctrl || self.meta) && !self.alt => Some(KeyAction::Submit),
            Key::Escape if !(self.ctrl || self.meta || self.alt) => Some(KeyAction::Cancel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Submit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid key chord {input:?}: {message}")]
pub struct KeyParseError {
    pub input: String,
    pub message: &'static str,
}

impl FromStr for KeyChord {
    type Err = KeyParseError;

    /// Parses `ctrl+enter`, `cmd+enter`, `esc`, `shift+a` and similar.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |message| KeyParseError {
            input: s.to_string(),
            message,
        };

        let mut tokens: Vec<&str> = s.split('+').map(str::trim).collect();
        let key_token = tokens.pop().filter(|t| !t.is_empty()).ok_or_else(|| err("missing key"))?;

        let key = match key_token.to_ascii_lowercase().as_str() {
            "enter" | "return" => Key::Enter,
            "esc" | "escape" => Key::Escape,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return Err(err("unknown key")),
                }
            }
        };

        let mut chord = KeyChord::plain(key);
        for modifier in tokens {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "cmd" | "meta" | "super" => chord.meta = true,
                "shift" => chord.shift = true,
                "alt" | "option" => chord.alt = true,
                _ => return Err(err("unknown modifier")),
            }
        }
        Ok(chord)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.meta {
            f.write_str("cmd+")?;
        }
        if self.alt {
            f.write_str("alt+")?;
        }
        if self.shift {
            f.write_str("shift+")?;
        }
        match self.key {
            Key::Enter => f.write_str("enter"),
            Key::Escape => f.write_str("esc"),
            Key::Char(c) => write!(f, "{c}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_shortcuts() {
        assert_eq!(KeyChord::ctrl(Key::Enter).action(), Some(KeyAction::Submit));
        assert_eq!(KeyChord::meta(Key::Enter).action(), Some(KeyAction::Submit));
        assert_eq!(KeyChord::plain(Key::Enter).action(), None);
        assert_eq!(KeyChord::plain(Key::Escape).action(), Some(KeyAction::Cancel));
        assert_eq!(KeyChord::ctrl(Key::Char('s')).action(), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("ctrl+enter".parse(), Ok(KeyChord::ctrl(Key::Enter)));
        assert_eq!("Cmd + Return".parse(), Ok(KeyChord::meta(Key::Enter)));
        assert_eq!("esc".parse(), Ok(KeyChord::plain(Key::Escape)));
        assert!("hyper+enter".parse::<KeyChord>().is_err());
        assert!("ctrl+".parse::<KeyChord>().is_err());
        assert_eq!(KeyChord::ctrl(Key::Enter).to_string(), "ctrl+enter");
    }
}
