//! # keystrokes-core
//!
//! Shared library for keystrokes containing the command model, the macro
//! registry, the key resolution tables, and the codec used to hand a command
//! off to a child process running in the interactive desktop session.
//!
//! This crate has zero dependencies on OS APIs.  Everything here is a pure
//! transform and can be tested on any platform.
//!
//! # Architecture overview
//!
//! keystrokes turns a declarative JSON command into synthetic keyboard and
//! mouse input.  A command is an ordered list of events:
//!
//! ```json
//! [
//!   {"type": "keystroke", "mode": "simultaneous", "keys": ["CTRL", "ESC"]},
//!   {"type": "sleep", "ms": 500},
//!   {"type": "macro", "name": "open-notepad"},
//!   {"type": "mouse_event", "event": "double_click", "x": 0.5, "y": 0.5}
//! ]
//! ```
//!
//! - **`domain`** – The [`Event`] sum type, its parser, and the
//!   [`MacroRegistry`] that named macro calls are resolved against.
//!
//! - **`keymap`** – Turns a textual key token (`"ENTER"`, `"Hello!"`) into
//!   Windows virtual-key codes plus a "needs Shift" flag.
//!
//! - **`protocol`** – The parent→child hand-off: how a command and its
//!   registry are carried across a process relaunch as base64 arguments.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::event::{
    parse_command, parse_command_value, CommandError, Event, Keystroke, KeystrokeMode, MacroCall,
    MouseAction, MouseEvent, SleepEvent,
};
pub use domain::registry::MacroRegistry;
pub use keymap::{resolve, ResolvedKey};
pub use protocol::handoff::{ChildInvocation, HandoffError, CHILD_MODE_MARKER};
