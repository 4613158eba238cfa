//! Windows session probe and cross-session launcher.
//!
//! # Session 0 isolation (for beginners)
//!
//! Since Windows Vista, services run in session 0, which has its own window
//! station with no visible desktop.  `SendInput` from there succeeds or fails
//! silently but never reaches the logged-in user.  To type into the user's
//! desktop a service has to start a process *in the user's session*:
//!
//! 1. `WTSGetActiveConsoleSessionId` finds the session attached to the
//!    physical console.
//! 2. `WTSQueryUserToken` returns the logged-in user's token for it (needs
//!    `SeTcbPrivilege`, which LocalSystem has).
//! 3. `DuplicateTokenEx` turns it into a primary token usable for
//!    `CreateProcessAsUserW`.
//! 4. `CreateEnvironmentBlock` builds the user's environment.
//! 5. `CreateProcessAsUserW` starts `<self> child ...` on `winsta0\default`.

#![cfg(target_os = "windows")]

use std::ffi::{c_void, OsStr};
use std::io;
use std::iter::once;
use std::os::windows::ffi::OsStrExt;

use tracing::{debug, warn};
use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::Security::{
    DuplicateTokenEx, SecurityIdentification, TokenPrimary, TOKEN_ALL_ACCESS,
};
use windows::Win32::System::Environment::{CreateEnvironmentBlock, DestroyEnvironmentBlock};
use windows::Win32::System::RemoteDesktop::{
    ProcessIdToSessionId, WTSGetActiveConsoleSessionId, WTSQueryUserToken,
};
use windows::Win32::System::Threading::{
    CreateProcessAsUserW, GetCurrentProcessId, CREATE_NO_WINDOW, CREATE_UNICODE_ENVIRONMENT,
    PROCESS_INFORMATION, STARTUPINFOW,
};

use crate::application::session_bridge::{ProcessLauncher, SessionProbe};

/// Session id reserved for services.
const SERVICES_SESSION_ID: u32 = 0;

/// Returned by `WTSGetActiveConsoleSessionId` when no session is attached.
const NO_CONSOLE_SESSION: u32 = 0xFFFF_FFFF;

const INTERACTIVE_DESKTOP: &str = "winsta0\\default";

/// Reports non-interactive when this process runs in session 0.
#[derive(Debug, Default)]
pub struct WindowsSessionProbe;

impl SessionProbe for WindowsSessionProbe {
    fn has_interactive_desktop(&self) -> bool {
        let mut session_id = 0u32;
        // SAFETY: session_id is a valid out pointer for the duration of the call
        match unsafe { ProcessIdToSessionId(GetCurrentProcessId(), &mut session_id) } {
            Ok(()) => {
                debug!("probe: running in session {session_id}");
                session_id != SERVICES_SESSION_ID
            }
            Err(e) => {
                warn!("probe: ProcessIdToSessionId failed ({e}); assuming interactive");
                true
            }
        }
    }
}

/// Launches the current executable in the active console user's session.
#[derive(Debug, Default)]
pub struct WtsUserSessionLauncher;

impl ProcessLauncher for WtsUserSessionLauncher {
    fn launch_in_interactive_session(&self, args: &[String]) -> io::Result<u32> {
        let exe = std::env::current_exe()?;

        // SAFETY: no arguments; returns a plain session id
        let session_id = unsafe { WTSGetActiveConsoleSessionId() };
        if session_id == NO_CONSOLE_SESSION {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "no user session is attached to the console",
            ));
        }

        let mut user_token = OwnedHandle::default();
        // SAFETY: user_token.0 is a valid out pointer; ownership passes to the guard
        unsafe { WTSQueryUserToken(session_id, &mut user_token.0) }.map_err(win_err)?;

        let mut primary_token = OwnedHandle::default();
        // SAFETY: user_token is a live token handle; primary_token.0 is a valid out pointer
        unsafe {
            DuplicateTokenEx(
                user_token.0,
                TOKEN_ALL_ACCESS,
                None,
                SecurityIdentification,
                TokenPrimary,
                &mut primary_token.0,
            )
        }
        .map_err(win_err)?;

        let mut environment = EnvironmentBlock(std::ptr::null_mut());
        // SAFETY: environment.0 is a valid out pointer; freed by the guard
        unsafe { CreateEnvironmentBlock(&mut environment.0, primary_token.0, false) }
            .map_err(win_err)?;

        let mut command_line = wide(&command_line(&exe.to_string_lossy(), args));
        let mut desktop = wide(INTERACTIVE_DESKTOP);
        let startup = STARTUPINFOW {
            cb: std::mem::size_of::<STARTUPINFOW>() as u32,
            lpDesktop: PWSTR(desktop.as_mut_ptr()),
            ..Default::default()
        };
        let mut info = PROCESS_INFORMATION::default();

        // SAFETY: every pointer refers to a buffer that outlives the call;
        // command_line is mutable as CreateProcessAsUserW requires
        unsafe {
            CreateProcessAsUserW(
                primary_token.0,
                PCWSTR::null(),
                PWSTR(command_line.as_mut_ptr()),
                None,
                None,
                false,
                CREATE_UNICODE_ENVIRONMENT | CREATE_NO_WINDOW,
                Some(environment.0.cast_const()),
                PCWSTR::null(),
                &startup,
                &mut info,
            )
        }
        .map_err(win_err)?;

        drop(OwnedHandle(info.hThread));
        drop(OwnedHandle(info.hProcess));
        debug!("launcher: started pid {} in session {session_id}", info.dwProcessId);
        Ok(info.dwProcessId)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Closes the wrapped handle on drop.
#[derive(Default)]
struct OwnedHandle(HANDLE);

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            // SAFETY: the handle was returned by a Win32 call and is closed once
            let _ = unsafe { CloseHandle(self.0) };
        }
    }
}

/// Frees the wrapped environment block on drop.
struct EnvironmentBlock(*mut c_void);

impl Drop for EnvironmentBlock {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // SAFETY: the block was allocated by CreateEnvironmentBlock
            let _ = unsafe { DestroyEnvironmentBlock(self.0) };
        }
    }
}

/// Builds a command line that `CommandLineToArgvW` splits back into `args`.
fn command_line(exe: &str, args: &[String]) -> String {
    let mut line = format!("\"{exe}\"");
    for arg in args {
        line.push(' ');
        push_quoted(&mut line, arg);
    }
    line
}

/// Quotes `arg` when it is empty or holds whitespace or quotes.  Backslashes
/// are doubled only where they precede a quote.
fn push_quoted(line: &mut String, arg: &str) {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"']) {
        line.push_str(arg);
        return;
    }
    line.push('"');
    let mut backslashes = 0usize;
    for ch in arg.chars() {
        match ch {
            '\\' => backslashes += 1,
            '"' => {
                line.extend(std::iter::repeat('\\').take(backslashes + 1));
                backslashes = 0;
            }
            _ => backslashes = 0,
        }
        line.push(ch);
    }
    line.extend(std::iter::repeat('\\').take(backslashes));
    line.push('"');
}

fn wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(once(0)).collect()
}

fn win_err(e: windows::core::Error) -> io::Error {
    io::Error::from_raw_os_error(e.code().0 & 0xFFFF)
}
