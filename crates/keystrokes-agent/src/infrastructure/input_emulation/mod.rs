//! Platform-specific input emulation implementations.
//!
//! The correct implementation is selected at compile time via
//! `#[cfg(target_os = ...)]`.  Only Windows has a native backend: virtual-key
//! codes and the 0–65535 absolute grid are Windows conventions.  Elsewhere
//! [`create_platform_emulator`] returns [`UnsupportedInputEmulator`], which
//! fails every call.  That still lets a parent on those platforms relaunch or
//! do a dry run.

use std::sync::Arc;

use crate::application::synthesize::{
    AbsolutePoint, EmulationError, MouseButton, PlatformInputEmulator,
};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Returns the native emulator for this platform.
pub fn create_platform_emulator() -> Arc<dyn PlatformInputEmulator> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(windows::WindowsInputEmulator::new())
    }
    #[cfg(not(target_os = "windows"))]
    {
        Arc::new(UnsupportedInputEmulator)
    }
}

/// Emulator for platforms without a native backend.
#[derive(Debug, Default)]
pub struct UnsupportedInputEmulator;

impl UnsupportedInputEmulator {
    fn error() -> EmulationError {
        EmulationError::Unsupported(format!(
            "no input backend for {}; use --dry-run to preview",
            std::env::consts::OS
        ))
    }
}

impl PlatformInputEmulator for UnsupportedInputEmulator {
    fn emit_key_down(&self, _: u16) -> Result<(), EmulationError> {
        Err(Self::error())
    }

    fn emit_key_up(&self, _: u16) -> Result<(), EmulationError> {
        Err(Self::error())
    }

    fn emit_mouse_button(
        &self,
        _: MouseButton,
        _: bool,
        _: AbsolutePoint,
    ) -> Result<(), EmulationError> {
        Err(Self::error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_emulator_fails_every_call() {
        let emulator = UnsupportedInputEmulator;
        assert!(matches!(
            emulator.emit_key_down(0x41),
            Err(EmulationError::Unsupported(_))
        ));
        assert!(matches!(
            emulator.emit_mouse_button(MouseButton::Left, true, AbsolutePoint { x: 0, y: 0 }),
            Err(EmulationError::Unsupported(_))
        ));
    }
}
