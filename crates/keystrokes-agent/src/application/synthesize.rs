//! Input synthesis: the primitive actions the macro interpreter is built on.
//!
//! Two seams live here:
//!
//! - [`PlatformInputEmulator`] is the raw OS boundary (one key edge, one mouse
//!   button edge).  Each supported OS provides an implementation in the
//!   infrastructure layer.
//! - [`InputSynthesizer`] is what the interpreter drives: press, release,
//!   click, double-click, pause.  [`SettlingSynthesizer`] implements it on top
//!   of any emulator, holding Shift around shifted keys and waiting a short
//!   settle time after each edge so the receiving application sees them.
//!
//! # Coordinates (for beginners)
//!
//! Mouse positions arrive as fractions of the primary display (0.0 is the
//! left/top edge, 1.0 the right/bottom edge).  Windows expects absolute mouse
//! positions on a 0–65535 grid, so [`normalize_coordinates`] multiplies by
//! 65535 before anything reaches the OS.  Out-of-range fractions saturate.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use keystrokes_core::keymap::{ResolvedKey, VK_SHIFT};
use thiserror::Error;
use tracing::{debug, trace};

/// Side length of the absolute coordinate grid used by `SendInput`.
pub const ABSOLUTE_COORDINATE_MAX: f64 = 65535.0;

/// Error type for input emulation operations.
#[derive(Debug, Error)]
pub enum EmulationError {
    /// The OS rejected or dropped an injected event.
    #[error("input injection failed: {0}")]
    InjectionFailed(String),
    /// This build has no way to inject input on the current platform.
    #[error("input injection is not supported: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

/// A mouse position on the 0–65535 absolute grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbsolutePoint {
    pub x: i32,
    pub y: i32,
}

/// Converts a fractional screen position to the absolute grid.
///
/// # Examples
///
/// ```rust
/// use keystrokes_agent::application::synthesize::{normalize_coordinates, AbsolutePoint};
///
/// assert_eq!(normalize_coordinates(0.0, 1.0), AbsolutePoint { x: 0, y: 65535 });
/// assert_eq!(normalize_coordinates(0.5, 0.5), AbsolutePoint { x: 32767, y: 32767 });
/// ```
pub fn normalize_coordinates(x: f64, y: f64) -> AbsolutePoint {
    // `as` truncates toward zero and saturates at the i32 bounds (NaN -> 0).
    AbsolutePoint {
        x: (x * ABSOLUTE_COORDINATE_MAX) as i32,
        y: (y * ABSOLUTE_COORDINATE_MAX) as i32,
    }
}

/// Platform-agnostic raw input injection.
pub trait PlatformInputEmulator: Send + Sync {
    /// Injects a key-down edge for a Windows virtual-key code.
    fn emit_key_down(&self, code: u16) -> Result<(), EmulationError>;

    /// Injects a key-up edge for a Windows virtual-key code.
    fn emit_key_up(&self, code: u16) -> Result<(), EmulationError>;

    /// Injects a mouse button press or release at an absolute position.
    fn emit_mouse_button(
        &self,
        button: MouseButton,
        pressed: bool,
        point: AbsolutePoint,
    ) -> Result<(), EmulationError>;
}

/// The primitive actions the macro interpreter performs.
pub trait InputSynthesizer: Send + Sync {
    /// Presses a key, holding Shift first when the key requires it.
    fn press(&self, key: ResolvedKey) -> Result<(), EmulationError>;

    /// Releases a key.  Shift is always let go afterwards when the key
    /// required it, even if releasing the key itself failed.
    fn release(&self, key: ResolvedKey) -> Result<(), EmulationError>;

    fn left_click(&self, x: f64, y: f64) -> Result<(), EmulationError>;

    fn right_click(&self, x: f64, y: f64) -> Result<(), EmulationError>;

    fn double_click(&self, x: f64, y: f64) -> Result<(), EmulationError>;

    /// Blocks the executing thread.
    fn pause(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Waits applied after each injected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleTimings {
    /// After each key-down and key-up.
    pub key: Duration,
    /// Between a mouse button's press and release.
    pub click: Duration,
    /// Between the two clicks of a double-click.
    pub double_click_gap: Duration,
}

impl SettleTimings {
    /// No waiting at all.  Used by tests and dry runs.
    pub const fn none() -> Self {
        Self {
            key: Duration::ZERO,
            click: Duration::ZERO,
            double_click_gap: Duration::ZERO,
        }
    }
}

impl Default for SettleTimings {
    fn default() -> Self {
        Self {
            key: Duration::from_millis(100),
            click: Duration::from_millis(50),
            double_click_gap: Duration::from_millis(50),
        }
    }
}

/// [`InputSynthesizer`] backed by a [`PlatformInputEmulator`].
pub struct SettlingSynthesizer {
    emulator: Arc<dyn PlatformInputEmulator>,
    timings: SettleTimings,
}

impl SettlingSynthesizer {
    pub fn new(emulator: Arc<dyn PlatformInputEmulator>, timings: SettleTimings) -> Self {
        Self { emulator, timings }
    }

    pub fn timings(&self) -> SettleTimings {
        self.timings
    }

    fn click(&self, button: MouseButton, x: f64, y: f64) -> Result<(), EmulationError> {
        let point = normalize_coordinates(x, y);
        debug!("synthesizer: {button:?} click at ({x}, {y}) -> {point:?}");
        self.emulator.emit_mouse_button(button, true, point)?;
        settle(self.timings.click);
        self.emulator.emit_mouse_button(button, false, point)
    }
}

impl InputSynthesizer for SettlingSynthesizer {
    fn press(&self, key: ResolvedKey) -> Result<(), EmulationError> {
        trace!("synthesizer: press {:#04x} (shift: {})", key.code, key.requires_shift);
        if key.requires_shift {
            self.emulator.emit_key_down(VK_SHIFT)?;
            settle(self.timings.key);
        }
        self.emulator.emit_key_down(key.code)?;
        settle(self.timings.key);
        Ok(())
    }

    fn release(&self, key: ResolvedKey) -> Result<(), EmulationError> {
        trace!("synthesizer: release {:#04x} (shift: {})", key.code, key.requires_shift);
        let released = self.emulator.emit_key_up(key.code);
        if released.is_ok() {
            settle(self.timings.key);
        }
        if !key.requires_shift {
            return released;
        }
        let shift_released = self.emulator.emit_key_up(VK_SHIFT);
        released.and(shift_released)
    }

    fn left_click(&self, x: f64, y: f64) -> Result<(), EmulationError> {
        self.click(MouseButton::Left, x, y)
    }

    fn right_click(&self, x: f64, y: f64) -> Result<(), EmulationError> {
        self.click(MouseButton::Right, x, y)
    }

    fn double_click(&self, x: f64, y: f64) -> Result<(), EmulationError> {
        self.left_click(x, y)?;
        settle(self.timings.double_click_gap);
        self.left_click(x, y)
    }
}

fn settle(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
