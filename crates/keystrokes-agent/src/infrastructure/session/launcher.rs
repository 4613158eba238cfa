//! Portable child launcher.
//!
//! Spawns the executable with the hand-off arguments and returns immediately.
//! The child's stdio is detached and the `Child` handle is dropped without
//! waiting, so the parent never observes how the child ends.
//!
//! This launcher does not cross session boundaries.  It is the right tool
//! where the parent already shares the user's session (Linux, macOS, and
//! forced relaunches during testing); the Windows service case uses
//! `WtsUserSessionLauncher` instead.
//!
//! [`RecordingLauncher`] starts nothing; `--dry-run` uses it to show what
//! would have been launched.

use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::application::session_bridge::ProcessLauncher;

/// Launches a program (the current executable by default) with null stdio.
#[derive(Debug, Clone, Default)]
pub struct DetachedLauncher {
    program: Option<PathBuf>,
}

impl DetachedLauncher {
    /// Relaunches the running executable.
    pub fn current_exe() -> Self {
        Self::default()
    }

    /// Launches `program` instead of the running executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    fn program(&self) -> io::Result<PathBuf> {
        match &self.program {
            Some(program) => Ok(program.clone()),
            None => std::env::current_exe(),
        }
    }
}

impl ProcessLauncher for DetachedLauncher {
    fn launch_in_interactive_session(&self, args: &[String]) -> io::Result<u32> {
        let program = self.program()?;
        debug!("launcher: spawning {} with {} argument(s)", program.display(), args.len());
        let child = Command::new(&program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(child.id())
    }
}

/// Records launch requests without starting any process.
///
/// Every launch reports pid 0.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    launches: Mutex<Vec<Vec<String>>>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Argument lists of every launch so far, oldest first.
    pub fn launches(&self) -> Vec<Vec<String>> {
        self.launches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn launch_in_interactive_session(&self, args: &[String]) -> io::Result<u32> {
        debug!("launcher: recording launch with {} argument(s)", args.len());
        self.launches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(args.to_vec());
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_reports_spawn_error() {
        let launcher = DetachedLauncher::with_program("/nonexistent/keystrokes-test-binary");

        let result = launcher.launch_in_interactive_session(&["child".to_string()]);

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_returns_child_pid() {
        let launcher = DetachedLauncher::with_program("true");

        let pid = launcher
            .launch_in_interactive_session(&["child".to_string(), "W10=".to_string()])
            .unwrap();

        assert!(pid > 0);
    }

    #[test]
    fn test_default_program_is_current_exe() {
        let launcher = DetachedLauncher::current_exe();
        assert_eq!(launcher.program().unwrap(), std::env::current_exe().unwrap());
    }

    #[test]
    fn test_recording_launcher_keeps_arguments_and_starts_nothing() {
        let launcher = RecordingLauncher::new();
        let args = vec!["child".to_string(), "W10=".to_string()];

        let pid = launcher.launch_in_interactive_session(&args).unwrap();

        assert_eq!(pid, 0);
        assert_eq!(launcher.launches(), vec![args]);
    }
}
