//! Session probes and child launchers.
//!
//! The platform pair is selected at compile time:
//!
//! | Platform | Probe                      | Launcher                 |
//! |----------|----------------------------|--------------------------|
//! | Windows  | `WindowsSessionProbe`      | `WtsUserSessionLauncher` |
//! | Linux    | `DisplayEnvProbe`          | `DetachedLauncher`       |
//! | other    | `FixedProbe` (interactive) | `DetachedLauncher`       |

use std::sync::Arc;

use crate::application::session_bridge::{ProcessLauncher, SessionProbe};

pub mod detect;
pub mod launcher;

#[cfg(target_os = "windows")]
pub mod windows;

pub use detect::{DisplayEnvProbe, FixedProbe};
pub use launcher::{DetachedLauncher, RecordingLauncher};

/// Returns the probe for this platform.
pub fn create_session_probe() -> Arc<dyn SessionProbe> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(windows::WindowsSessionProbe)
    }
    #[cfg(target_os = "linux")]
    {
        Arc::new(DisplayEnvProbe)
    }
    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    {
        Arc::new(FixedProbe::interactive())
    }
}

/// Returns the launcher for this platform.
pub fn create_process_launcher() -> Arc<dyn ProcessLauncher> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(windows::WtsUserSessionLauncher)
    }
    #[cfg(not(target_os = "windows"))]
    {
        Arc::new(DetachedLauncher::current_exe())
    }
}
