//! Windows input emulation via the SendInput API.
//!
//! Key codes arrive as Windows virtual-key codes already, so they are passed
//! straight through.  Mouse positions arrive on the [0, 65535] absolute grid
//! and are sent with `MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_MOVE`, which moves
//! the cursor to the click position as part of the button event.

#![cfg(target_os = "windows")]

use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_LEFTDOWN,
    MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MOVE, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP,
    MOUSEINPUT, VIRTUAL_KEY,
};

use crate::application::synthesize::{
    AbsolutePoint, EmulationError, MouseButton, PlatformInputEmulator,
};

/// Virtual-key codes that need `KEYEVENTF_EXTENDEDKEY`.
const EXTENDED_VKS: &[u16] = &[
    0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, // nav
    0x2C, 0x2D, 0x2E, // PrintScreen, Insert, Delete
    0x5B, 0x5C, 0x5D, // Win keys, Apps
    0x6F, 0x90, // Numpad divide, NumLock
    0xA3, 0xA5, // Right Ctrl, Right Alt
];

/// Windows implementation of [`PlatformInputEmulator`] using SendInput.
#[derive(Debug, Default)]
pub struct WindowsInputEmulator;

impl WindowsInputEmulator {
    pub fn new() -> Self {
        Self
    }
}

impl PlatformInputEmulator for WindowsInputEmulator {
    fn emit_key_down(&self, code: u16) -> Result<(), EmulationError> {
        send_key(code, false)
    }

    fn emit_key_up(&self, code: u16) -> Result<(), EmulationError> {
        send_key(code, true)
    }

    fn emit_mouse_button(
        &self,
        button: MouseButton,
        pressed: bool,
        point: AbsolutePoint,
    ) -> Result<(), EmulationError> {
        let edge = match (button, pressed) {
            (MouseButton::Left, true) => MOUSEEVENTF_LEFTDOWN,
            (MouseButton::Left, false) => MOUSEEVENTF_LEFTUP,
            (MouseButton::Right, true) => MOUSEEVENTF_RIGHTDOWN,
            (MouseButton::Right, false) => MOUSEEVENTF_RIGHTUP,
        };

        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: point.x,
                    dy: point.y,
                    mouseData: 0,
                    dwFlags: edge | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_MOVE,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };
        send(input, "mouse button")
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn key_flags(code: u16, key_up: bool) -> KEYBD_EVENT_FLAGS {
    let mut flags = KEYBD_EVENT_FLAGS(0);
    if key_up {
        flags |= KEYEVENTF_KEYUP;
    }
    if EXTENDED_VKS.contains(&code) {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }
    flags
}

fn send_key(code: u16, key_up: bool) -> Result<(), EmulationError> {
    let input = INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(code),
                wScan: 0,
                dwFlags: key_flags(code, key_up),
                time: 0,
                dwExtraInfo: 0,
            },
        },
    };
    send(input, if key_up { "key up" } else { "key down" })
}

fn send(input: INPUT, what: &str) -> Result<(), EmulationError> {
    // SAFETY: input is a valid INPUT structure on the stack
    let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if sent == 0 {
        // SendInput returns 0 when the input was blocked, most often by UIPI
        // or because the desktop is not reachable from this session.
        return Err(EmulationError::InjectionFailed(format!(
            "SendInput rejected {what}: {}",
            windows::core::Error::from_win32()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_keys_get_extended_flag() {
        let flags = key_flags(0x25, false); // Left arrow
        assert_eq!(flags.0 & KEYEVENTF_EXTENDEDKEY.0, KEYEVENTF_EXTENDEDKEY.0);
    }

    #[test]
    fn test_letter_key_up_has_only_keyup_flag() {
        assert_eq!(key_flags(0x41, true), KEYEVENTF_KEYUP);
        assert_eq!(key_flags(0x41, false), KEYBD_EVENT_FLAGS(0));
    }
}
