//! Interactive desktop detection.
//!
//! On Windows a service runs in session 0, which has no desktop the user can
//! see; input injected there goes nowhere.  On Linux a process started outside
//! a graphical login has neither `WAYLAND_DISPLAY` nor `DISPLAY` set.  Other
//! platforms are assumed interactive.

use std::env;

use crate::application::session_bridge::SessionProbe;

/// The active Linux display server protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayServer {
    /// `WAYLAND_DISPLAY` is set (with or without `DISPLAY`).
    Wayland,
    /// Only `DISPLAY` is set.
    X11,
}

/// Classifies the display server from boolean presence flags.
pub fn classify_display(has_wayland: bool, has_display: bool) -> Option<DisplayServer> {
    match (has_wayland, has_display) {
        (true, _) => Some(DisplayServer::Wayland),
        (false, true) => Some(DisplayServer::X11),
        (false, false) => None,
    }
}

/// Detects the display server from the environment.
///
/// Returns `None` outside any graphical session.
pub fn detect_display_server() -> Option<DisplayServer> {
    classify_display(env_is_set("WAYLAND_DISPLAY"), env_is_set("DISPLAY"))
}

fn env_is_set(name: &str) -> bool {
    env::var_os(name).is_some_and(|v| !v.is_empty())
}

/// Probe that reports interactive when a display server is reachable.
#[derive(Debug, Default)]
pub struct DisplayEnvProbe;

impl SessionProbe for DisplayEnvProbe {
    fn has_interactive_desktop(&self) -> bool {
        let server = detect_display_server();
        tracing::debug!("probe: display server {server:?}");
        server.is_some()
    }
}

/// Probe with a fixed answer.
///
/// `FixedProbe::non_interactive()` forces the relaunch path; the CLI uses it
/// for `--relaunch` so the hand-off can be exercised from a normal desktop.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe {
    interactive: bool,
}

impl FixedProbe {
    pub const fn interactive() -> Self {
        Self { interactive: true }
    }

    pub const fn non_interactive() -> Self {
        Self { interactive: false }
    }
}

impl SessionProbe for FixedProbe {
    fn has_interactive_desktop(&self) -> bool {
        self.interactive
    }
}
