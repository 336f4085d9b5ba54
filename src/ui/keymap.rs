//! Key encoding for terminal input
//!
//! Converts UI key events to VT byte sequences for PTY input. Encoding is
//! a pure function; the caller is responsible for the event side effects:
//! a [`KeyDisposition::Forward`] result obliges the caller to suppress the
//! event's default handling and stop propagation, while
//! [`KeyDisposition::Reserved`] must leave the event untouched so the host
//! can act on its own shortcut.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const SUPER = 0b1000;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        if mods.contains(KeyModifiers::SUPER) {
            result |= Modifiers::SUPER;
        }
        result
    }
}

/// What the host must do with a key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Write these bytes to the PTY; suppress default handling and stop
    /// propagation
    Forward(Vec<u8>),
    /// A host shortcut; do not forward and do not suppress
    Reserved,
    /// Not handled; do not forward
    Ignored,
}

/// The session-toggle letter the host handles itself. Any chord holding
/// Ctrl or Super on this letter stays with the host, whatever extra
/// modifiers are held; matching is case-insensitive.
const RESERVED_KEY: char = 'j';

/// Key encoder for converting key events to PTY bytes
pub struct KeyEncoder;

impl KeyEncoder {
    /// Encode a key event. First match wins: reserved chord, control
    /// character, named key, then plain printable input.
    pub fn encode(event: &KeyEvent) -> KeyDisposition {
        let mods = Modifiers::from(event.modifiers);

        if Self::is_reserved(event.code, mods) {
            return KeyDisposition::Reserved;
        }

        // Ctrl + letter -> control character (Ctrl-A = 0x01 .. Ctrl-Z = 0x1A)
        if mods.contains(Modifiers::CTRL) && !mods.contains(Modifiers::ALT) {
            if let KeyCode::Char(ch) = event.code {
                if ch.is_ascii_alphabetic() {
                    let code = ch.to_ascii_uppercase() as u8 - b'A' + 1;
                    return KeyDisposition::Forward(vec![code]);
                }
            }
        }

        if let Some(bytes) = Self::named_key(event.code, mods) {
            return KeyDisposition::Forward(bytes);
        }

        // Plain printable input: no modifier other than Shift
        if mods.difference(Modifiers::SHIFT).is_empty() {
            if let KeyCode::Char(ch) = event.code {
                let mut buf = [0u8; 4];
                return KeyDisposition::Forward(ch.encode_utf8(&mut buf).as_bytes().to_vec());
            }
        }

        KeyDisposition::Ignored
    }

    fn is_reserved(code: KeyCode, mods: Modifiers) -> bool {
        match code {
            KeyCode::Char(ch) => {
                ch.to_ascii_lowercase() == RESERVED_KEY
                    && mods.intersects(Modifiers::CTRL | Modifiers::SUPER)
            }
            _ => false,
        }
    }

    /// Fixed byte sequences for named keys
    fn named_key(code: KeyCode, mods: Modifiers) -> Option<Vec<u8>> {
        match code {
            KeyCode::Enter => Some(vec![0x0D]),
            KeyCode::Backspace => Some(vec![0x7F]),
            KeyCode::Tab => {
                if mods.contains(Modifiers::SHIFT) {
                    Some(b"\x1b[Z".to_vec())
                } else {
                    Some(vec![0x09])
                }
            }
            KeyCode::BackTab => Some(b"\x1b[Z".to_vec()),
            KeyCode::Esc => Some(vec![0x1B]),
            KeyCode::Up => Some(b"\x1b[A".to_vec()),
            KeyCode::Down => Some(b"\x1b[B".to_vec()),
            KeyCode::Right => Some(b"\x1b[C".to_vec()),
            KeyCode::Left => Some(b"\x1b[D".to_vec()),
            KeyCode::Home => Some(b"\x1b[H".to_vec()),
            KeyCode::End => Some(b"\x1b[F".to_vec()),
            KeyCode::Insert => Some(b"\x1b[2~".to_vec()),
            KeyCode::Delete => Some(b"\x1b[3~".to_vec()),
            KeyCode::PageUp => Some(b"\x1b[5~".to_vec()),
            KeyCode::PageDown => Some(b"\x1b[6~".to_vec()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    fn forwarded(code: KeyCode, mods: KeyModifiers) -> Vec<u8> {
        match KeyEncoder::encode(&key_event(code, mods)) {
            KeyDisposition::Forward(bytes) => bytes,
            other => panic!("expected Forward, got {other:?}"),
        }
    }

    #[test]
    fn test_control_characters() {
        assert_eq!(
            forwarded(KeyCode::Char('a'), KeyModifiers::CONTROL),
            vec![0x01]
        );
        assert_eq!(
            forwarded(KeyCode::Char('z'), KeyModifiers::CONTROL),
            vec![0x1A]
        );
        // Uppercase letter maps to the same control code
        assert_eq!(
            forwarded(KeyCode::Char('C'), KeyModifiers::CONTROL | KeyModifiers::SHIFT),
            vec![0x03]
        );
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(forwarded(KeyCode::Enter, KeyModifiers::NONE), vec![0x0D]);
        assert_eq!(
            forwarded(KeyCode::Backspace, KeyModifiers::NONE),
            vec![0x7F]
        );
        assert_eq!(forwarded(KeyCode::Tab, KeyModifiers::NONE), vec![0x09]);
        assert_eq!(forwarded(KeyCode::Esc, KeyModifiers::NONE), vec![0x1B]);
    }

    #[test]
    fn test_arrow_keys() {
        assert_eq!(
            forwarded(KeyCode::Up, KeyModifiers::NONE),
            vec![0x1B, 0x5B, 0x41]
        );
        assert_eq!(
            forwarded(KeyCode::Down, KeyModifiers::NONE),
            b"\x1b[B".to_vec()
        );
        assert_eq!(
            forwarded(KeyCode::Right, KeyModifiers::NONE),
            b"\x1b[C".to_vec()
        );
        assert_eq!(
            forwarded(KeyCode::Left, KeyModifiers::NONE),
            b"\x1b[D".to_vec()
        );
    }

    #[test]
    fn test_printable_characters() {
        assert_eq!(forwarded(KeyCode::Char('a'), KeyModifiers::NONE), b"a");
        assert_eq!(forwarded(KeyCode::Char('A'), KeyModifiers::SHIFT), b"A");
        // Multi-byte characters pass through as UTF-8
        assert_eq!(
            forwarded(KeyCode::Char('é'), KeyModifiers::NONE),
            "é".as_bytes().to_vec()
        );
    }

    #[test]
    fn test_reserved_chord_not_forwarded() {
        let event = key_event(KeyCode::Char('j'), KeyModifiers::CONTROL);
        assert_eq!(KeyEncoder::encode(&event), KeyDisposition::Reserved);
        let event = key_event(KeyCode::Char('j'), KeyModifiers::SUPER);
        assert_eq!(KeyEncoder::encode(&event), KeyDisposition::Reserved);
    }

    #[test]
    fn test_reserved_chord_survives_extra_modifiers() {
        // Shift yields the uppercase letter; the chord is still reserved.
        let event = key_event(KeyCode::Char('J'), KeyModifiers::CONTROL | KeyModifiers::SHIFT);
        assert_eq!(KeyEncoder::encode(&event), KeyDisposition::Reserved);
        let event = key_event(KeyCode::Char('j'), KeyModifiers::CONTROL | KeyModifiers::SHIFT);
        assert_eq!(KeyEncoder::encode(&event), KeyDisposition::Reserved);
        let event = key_event(KeyCode::Char('j'), KeyModifiers::SUPER | KeyModifiers::ALT);
        assert_eq!(KeyEncoder::encode(&event), KeyDisposition::Reserved);
        // Neighbouring letters keep their control encoding
        let event = key_event(KeyCode::Char('k'), KeyModifiers::CONTROL);
        assert_eq!(
            KeyEncoder::encode(&event),
            KeyDisposition::Forward(vec![0x0B])
        );
    }

    #[test]
    fn test_unhandled_modifiers_ignored() {
        let event = key_event(KeyCode::Char('x'), KeyModifiers::ALT);
        assert_eq!(KeyEncoder::encode(&event), KeyDisposition::Ignored);
        let event = key_event(KeyCode::Char('x'), KeyModifiers::SUPER);
        assert_eq!(KeyEncoder::encode(&event), KeyDisposition::Ignored);
        let event = key_event(KeyCode::F(5), KeyModifiers::NONE);
        assert_eq!(KeyEncoder::encode(&event), KeyDisposition::Ignored);
    }

    #[test]
    fn test_navigation_keys() {
        assert_eq!(forwarded(KeyCode::Home, KeyModifiers::NONE), b"\x1b[H");
        assert_eq!(forwarded(KeyCode::End, KeyModifiers::NONE), b"\x1b[F");
        assert_eq!(forwarded(KeyCode::Delete, KeyModifiers::NONE), b"\x1b[3~");
        assert_eq!(forwarded(KeyCode::PageUp, KeyModifiers::NONE), b"\x1b[5~");
        assert_eq!(forwarded(KeyCode::PageDown, KeyModifiers::NONE), b"\x1b[6~");
        assert_eq!(
            forwarded(KeyCode::Tab, KeyModifiers::SHIFT),
            b"\x1b[Z".to_vec()
        );
    }
}
