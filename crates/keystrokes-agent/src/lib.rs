//! keystrokes-agent library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the agent do? (for beginners)
//!
//! The agent types and clicks on behalf of an automation script.  A script is
//! a JSON list of events (keystrokes, mouse clicks, sleeps, macro calls).  The
//! agent:
//!
//! 1. Parses the script and the named macros it may call.
//! 2. Checks whether this process can reach the user's desktop.  A Windows
//!    service, for example, cannot.
//! 3. If it can, interprets the script and injects the input (`SendInput` on
//!    Windows).
//! 4. If it cannot, starts a copy of itself inside the user's session with the
//!    script passed as base64 arguments, and returns that child's pid.

/// Application layer: use cases for the agent.
pub mod application;

/// Infrastructure layer: OS adapters and configuration.
pub mod infrastructure;
