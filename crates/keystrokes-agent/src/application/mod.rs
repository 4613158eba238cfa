//! Application layer use cases for the agent.
//!
//! - **`synthesize`** – the `PlatformInputEmulator` OS seam and the
//!   `InputSynthesizer` primitives (press, release, clicks) built on it.
//! - **`run_macro`** – interprets a command's events, expanding macros.
//! - **`session_bridge`** – decides between running in-process and handing
//!   the command to a child in the interactive session.
//! - **`handle_command`** – the JSON request surface for embedding hosts.

pub mod handle_command;
pub mod run_macro;
pub mod session_bridge;
pub mod synthesize;
