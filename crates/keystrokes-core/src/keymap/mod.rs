//! Key token resolution.
//!
//! A key token in a command is either the name of a key (`"ENTER"`,
//! `"VK_SHIFT"`, `"F5"`) or literal text (`"a"`, `"Hello!"`).  [`resolve`]
//! turns it into the Windows virtual-key codes to press, each tagged with
//! whether Shift must be held to produce it.
//!
//! # Resolution rules
//!
//! 1. A token of two or more characters that matches the named-key table
//!    exactly (upper-case, optional `VK_` prefix) resolves to that one key.
//!    `"end"` is the text e-n-d; `"END"` is the End key.
//! 2. Anything else is typed character by character using a standard US
//!    layout.  `"A"` is Shift + VK_A, `"a"` is VK_A, `"!"` is Shift + VK_1.
//! 3. Characters with no key on that layout are skipped.  They do not abort
//!    the keystroke.

pub mod windows_vk;

use tracing::debug;

pub use windows_vk::VK_SHIFT;

/// A key to press, as understood by the input synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedKey {
    /// Windows virtual-key code of the physical key.
    pub code: u16,
    /// Whether Shift must be held while the key is pressed.
    pub requires_shift: bool,
}

impl ResolvedKey {
    pub const fn plain(code: u16) -> Self {
        Self {
            code,
            requires_shift: false,
        }
    }

    pub const fn shifted(code: u16) -> Self {
        Self {
            code,
            requires_shift: true,
        }
    }
}

/// Resolves a key token into the keys that produce it, in press order.
///
/// Returns an empty vector when nothing in the token can be typed.
///
/// # Examples
///
/// ```rust
/// use keystrokes_core::keymap::{resolve, ResolvedKey};
///
/// assert_eq!(resolve("ENTER"), vec![ResolvedKey::plain(0x0D)]);
/// assert_eq!(resolve("Hi"), vec![ResolvedKey::shifted(0x48), ResolvedKey::plain(0x49)]);
/// ```
pub fn resolve(token: &str) -> Vec<ResolvedKey> {
    if let Some(key) = windows_vk::named_key(token) {
        return vec![key];
    }

    token
        .chars()
        .filter_map(|ch| {
            let key = windows_vk::char_to_key(ch);
            if key.is_none() {
                debug!("keymap: no key for {ch:?} in token {token:?}, skipping");
            }
            key
        })
        .collect()
}
