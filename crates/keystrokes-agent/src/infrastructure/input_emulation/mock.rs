//! Recording input emulator for tests and `--dry-run`.
//!
//! # Why a recording emulator?
//!
//! The real emulator makes OS calls that need a desktop session, actually
//! press keys on the machine running them, and cannot be observed from Rust.
//!
//! `MockInputEmulator` replaces every OS call with an append to an in-memory
//! journal, so callers can inspect exactly what would have been injected and
//! in what order.
//!
//! # Usage in tests
//!
//! ```rust
//! use std::sync::Arc;
//! use keystrokes_agent::application::synthesize::{InputSynthesizer, SettleTimings, SettlingSynthesizer};
//! use keystrokes_agent::infrastructure::input_emulation::mock::{EmittedInput, MockInputEmulator};
//! use keystrokes_core::keymap::ResolvedKey;
//!
//! let emulator = Arc::new(MockInputEmulator::new());
//! let synth = SettlingSynthesizer::new(emulator.clone(), SettleTimings::none());
//! synth.press(ResolvedKey::plain(0x41)).unwrap();
//! assert_eq!(emulator.emitted(), vec![EmittedInput::KeyDown(0x41)]);
//! ```
//!
//! # Failure injection
//!
//! Set `should_fail` to make every call fail, or `failing_code` to make only
//! key edges for one virtual-key code fail.  Failed calls are not journaled.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::application::synthesize::{
    AbsolutePoint, EmulationError, MouseButton, PlatformInputEmulator,
};

/// One raw input edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmittedInput {
    KeyDown(u16),
    KeyUp(u16),
    MouseButton {
        button: MouseButton,
        pressed: bool,
        point: AbsolutePoint,
    },
}

impl fmt::Display for EmittedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyDown(code) => write!(f, "key down  {code:#04x}"),
            Self::KeyUp(code) => write!(f, "key up    {code:#04x}"),
            Self::MouseButton {
                button,
                pressed,
                point,
            } => {
                let edge = if *pressed { "down" } else { "up" };
                write!(f, "{button:?} {edge} at ({}, {})", point.x, point.y)
            }
        }
    }
}

/// An emulator that records calls instead of making OS API calls.
#[derive(Debug, Default)]
pub struct MockInputEmulator {
    /// Every successfully emitted edge, in order.
    pub journal: Mutex<Vec<EmittedInput>>,
    /// When `true`, every call returns `EmulationError::InjectionFailed`.
    pub should_fail: bool,
    /// When set, key edges for this code fail.
    pub failing_code: Option<u16>,
}

impl MockInputEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An emulator whose key edges for `code` fail.
    pub fn failing_on(code: u16) -> Self {
        Self {
            failing_code: Some(code),
            ..Self::default()
        }
    }

    /// Snapshot of the journal.
    pub fn emitted(&self) -> Vec<EmittedInput> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Key-down codes in order, ignoring everything else.
    pub fn key_downs(&self) -> Vec<u16> {
        self.emitted()
            .into_iter()
            .filter_map(|input| match input {
                EmittedInput::KeyDown(code) => Some(code),
                _ => None,
            })
            .collect()
    }

    fn record(&self, input: EmittedInput) -> Result<(), EmulationError> {
        if self.should_fail {
            return Err(EmulationError::InjectionFailed("mock failure".into()));
        }
        if let EmittedInput::KeyDown(code) | EmittedInput::KeyUp(code) = input {
            if self.failing_code == Some(code) {
                return Err(EmulationError::InjectionFailed(format!(
                    "mock failure for {code:#04x}"
                )));
            }
        }
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(input);
        Ok(())
    }
}

impl PlatformInputEmulator for MockInputEmulator {
    fn emit_key_down(&self, code: u16) -> Result<(), EmulationError> {
        self.record(EmittedInput::KeyDown(code))
    }

    fn emit_key_up(&self, code: u16) -> Result<(), EmulationError> {
        self.record(EmittedInput::KeyUp(code))
    }

    fn emit_mouse_button(
        &self,
        button: MouseButton,
        pressed: bool,
        point: AbsolutePoint,
    ) -> Result<(), EmulationError> {
        self.record(EmittedInput::MouseButton {
            button,
            pressed,
            point,
        })
    }
}
