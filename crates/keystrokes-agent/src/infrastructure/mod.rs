//! Infrastructure layer for the agent.
//!
//! Contains OS-facing adapters.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keystrokes_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`input_emulation`** – implementations of `PlatformInputEmulator`
//!   (SendInput on Windows) plus the recording `MockInputEmulator`.
//! - **`session`** – `SessionProbe` and `ProcessLauncher` implementations
//!   used by the session bridge.
//! - **`storage`** – TOML configuration loading.

pub mod input_emulation;
pub mod session;
pub mod storage;
