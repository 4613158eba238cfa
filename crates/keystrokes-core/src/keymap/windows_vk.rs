//! Windows Virtual Key (VK) code tables.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//!
//! # What is a Windows Virtual Key (VK) code?
//!
//! Windows assigns each keyboard key a number called a "Virtual Key code".
//! These are defined in `<winuser.h>` and named `VK_*` (e.g., `VK_RETURN = 0x0D`,
//! `VK_SPACE = 0x20`).  Letter and digit keys reuse their ASCII upper-case
//! value: `VK_A = 0x41`, `VK_0 = 0x30`.  Punctuation lives in the `VK_OEM_*`
//! range and depends on the keyboard layout; the table below follows the
//! standard US layout.
//!
//! VK codes name *keys*, not characters.  Producing `"A"` or `"!"` needs Shift
//! held together with the `A` or `1` key, which is why [`char_to_key`] returns
//! a [`ResolvedKey`] carrying a `requires_shift` flag.
//!
//! Both tables are compile-time constants; there is no runtime write access.

use super::ResolvedKey;

/// VK_SHIFT, held down around keys that need the Shift modifier.
pub const VK_SHIFT: u16 = 0x10;

/// Looks up a named key.
///
/// Names match exactly as written in the table (upper-case), with or without
/// a leading `VK_`.  Lower-case words such as `"end"` are text, not keys.
/// Tokens shorter than two characters never match so that single characters
/// are always typed literally.
pub fn named_key(token: &str) -> Option<ResolvedKey> {
    if token.chars().nth(1).is_none() {
        return None;
    }
    let name = token.strip_prefix("VK_").unwrap_or(token);

    // Linear scan is fine: the table is small and only consulted per token.
    NAMED_KEYS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|&(_, key)| key)
}

/// Maps one character to the key that types it on a US layout.
///
/// Returns `None` for characters with no key (accented letters, emoji, ...).
pub fn char_to_key(ch: char) -> Option<ResolvedKey> {
    let plain = ResolvedKey::plain;
    let shifted = ResolvedKey::shifted;

    let key = match ch {
        'a'..='z' => plain(ch.to_ascii_uppercase() as u16),
        'A'..='Z' => shifted(ch as u16),
        '0'..='9' => plain(ch as u16),

        ' ' => plain(0x20),
        '\t' => plain(0x09),
        '\n' | '\r' => plain(0x0D),

        // ── Shifted digit row ────────────────────────────────────────────────
        ')' => shifted(0x30),
        '!' => shifted(0x31),
        '@' => shifted(0x32),
        '#' => shifted(0x33),
        '$' => shifted(0x34),
        '%' => shifted(0x35),
        '^' => shifted(0x36),
        '&' => shifted(0x37),
        '*' => shifted(0x38),
        '(' => shifted(0x39),

        // ── OEM punctuation ──────────────────────────────────────────────────
        ';' => plain(0xBA),
        ':' => shifted(0xBA),
        '=' => plain(0xBB),
        '+' => shifted(0xBB),
        ',' => plain(0xBC),
        '<' => shifted(0xBC),
        '-' => plain(0xBD),
        '_' => shifted(0xBD),
        '.' => plain(0xBE),
        '>' => shifted(0xBE),
        '/' => plain(0xBF),
        '?' => shifted(0xBF),
        '`' => plain(0xC0),
        '~' => shifted(0xC0),
        '[' => plain(0xDB),
        '{' => shifted(0xDB),
        '\\' => plain(0xDC),
        '|' => shifted(0xDC),
        ']' => plain(0xDD),
        '}' => shifted(0xDD),
        '\'' => plain(0xDE),
        '"' => shifted(0xDE),

        _ => return None,
    };
    Some(key)
}

const fn key(code: u16) -> ResolvedKey {
    ResolvedKey::plain(code)
}

/// Named keys, upper-case, without the `VK_` prefix.
///
/// Several names may map to the same code (`ENTER` / `RETURN`).  Entries built
/// with `ResolvedKey::shifted` are shifted variants of a physical key.
const NAMED_KEYS: &[(&str, ResolvedKey)] = &[
    // ── Control keys ─────────────────────────────────────────────────────────
    ("BACKSPACE", key(0x08)),
    ("BACK", key(0x08)),
    ("TAB", key(0x09)),
    ("ENTER", key(0x0D)),
    ("RETURN", key(0x0D)),
    ("PAUSE", key(0x13)),
    ("CAPSLOCK", key(0x14)),
    ("CAPITAL", key(0x14)),
    ("ESC", key(0x1B)),
    ("ESCAPE", key(0x1B)),
    ("SPACE", key(0x20)),
    ("PRINTSCREEN", key(0x2C)),
    ("SNAPSHOT", key(0x2C)),
    ("NUMLOCK", key(0x90)),
    ("SCROLLLOCK", key(0x91)),
    ("SCROLL", key(0x91)),
    // ── Navigation ───────────────────────────────────────────────────────────
    ("PAGEUP", key(0x21)),
    ("PRIOR", key(0x21)),
    ("PAGEDOWN", key(0x22)),
    ("NEXT", key(0x22)),
    ("END", key(0x23)),
    ("HOME", key(0x24)),
    ("LEFT", key(0x25)),
    ("UP", key(0x26)),
    ("RIGHT", key(0x27)),
    ("DOWN", key(0x28)),
    ("INSERT", key(0x2D)),
    ("DELETE", key(0x2E)),
    ("DEL", key(0x2E)),
    // ── Modifiers ────────────────────────────────────────────────────────────
    ("SHIFT", key(0x10)),
    ("CTRL", key(0x11)),
    ("CONTROL", key(0x11)),
    ("ALT", key(0x12)),
    ("MENU", key(0x12)),
    ("LSHIFT", key(0xA0)),
    ("RSHIFT", key(0xA1)),
    ("LCTRL", key(0xA2)),
    ("LCONTROL", key(0xA2)),
    ("RCTRL", key(0xA3)),
    ("RCONTROL", key(0xA3)),
    ("LALT", key(0xA4)),
    ("LMENU", key(0xA4)),
    ("RALT", key(0xA5)),
    ("RMENU", key(0xA5)),
    ("WIN", key(0x5B)),
    ("LWIN", key(0x5B)),
    ("RWIN", key(0x5C)),
    ("APPS", key(0x5D)),
    // ── Function keys ────────────────────────────────────────────────────────
    ("F1", key(0x70)),
    ("F2", key(0x71)),
    ("F3", key(0x72)),
    ("F4", key(0x73)),
    ("F5", key(0x74)),
    ("F6", key(0x75)),
    ("F7", key(0x76)),
    ("F8", key(0x77)),
    ("F9", key(0x78)),
    ("F10", key(0x79)),
    ("F11", key(0x7A)),
    ("F12", key(0x7B)),
    ("F13", key(0x7C)),
    ("F14", key(0x7D)),
    ("F15", key(0x7E)),
    ("F16", key(0x7F)),
    ("F17", key(0x80)),
    ("F18", key(0x81)),
    ("F19", key(0x82)),
    ("F20", key(0x83)),
    ("F21", key(0x84)),
    ("F22", key(0x85)),
    ("F23", key(0x86)),
    ("F24", key(0x87)),
    // ── Numpad ───────────────────────────────────────────────────────────────
    ("NUMPAD0", key(0x60)),
    ("NUMPAD1", key(0x61)),
    ("NUMPAD2", key(0x62)),
    ("NUMPAD3", key(0x63)),
    ("NUMPAD4", key(0x64)),
    ("NUMPAD5", key(0x65)),
    ("NUMPAD6", key(0x66)),
    ("NUMPAD7", key(0x67)),
    ("NUMPAD8", key(0x68)),
    ("NUMPAD9", key(0x69)),
    ("MULTIPLY", key(0x6A)),
    ("ADD", key(0x6B)),
    ("SUBTRACT", key(0x6D)),
    ("DECIMAL", key(0x6E)),
    ("DIVIDE", key(0x6F)),
    // ── Media ────────────────────────────────────────────────────────────────
    ("VOLUME_MUTE", key(0xAD)),
    ("VOLUME_DOWN", key(0xAE)),
    ("VOLUME_UP", key(0xAF)),
    ("MEDIA_NEXT_TRACK", key(0xB0)),
    ("MEDIA_PREV_TRACK", key(0xB1)),
    ("MEDIA_STOP", key(0xB2)),
    ("MEDIA_PLAY_PAUSE", key(0xB3)),
    // ── Punctuation (US layout) ──────────────────────────────────────────────
    ("OEM_1", key(0xBA)),
    ("SEMICOLON", key(0xBA)),
    ("COLON", ResolvedKey::shifted(0xBA)),
    ("OEM_PLUS", key(0xBB)),
    ("EQUALS", key(0xBB)),
    ("PLUS", ResolvedKey::shifted(0xBB)),
    ("OEM_COMMA", key(0xBC)),
    ("COMMA", key(0xBC)),
    ("OEM_MINUS", key(0xBD)),
    ("MINUS", key(0xBD)),
    ("UNDERSCORE", ResolvedKey::shifted(0xBD)),
    ("OEM_PERIOD", key(0xBE)),
    ("PERIOD", key(0xBE)),
    ("OEM_2", key(0xBF)),
    ("SLASH", key(0xBF)),
    ("QUESTION", ResolvedKey::shifted(0xBF)),
    ("OEM_3", key(0xC0)),
    ("BACKQUOTE", key(0xC0)),
    ("TILDE", ResolvedKey::shifted(0xC0)),
    ("OEM_4", key(0xDB)),
    ("LBRACKET", key(0xDB)),
    ("OEM_5", key(0xDC)),
    ("BACKSLASH", key(0xDC)),
    ("OEM_6", key(0xDD)),
    ("RBRACKET", key(0xDD)),
    ("OEM_7", key(0xDE)),
    ("QUOTE", key(0xDE)),
];
