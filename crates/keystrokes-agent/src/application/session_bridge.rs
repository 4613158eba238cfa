//! SessionBridge: runs a command where its input can actually land.
//!
//! A process running as a service (Windows session 0, or a Linux daemon
//! without a display) cannot inject input into the user's desktop.  The bridge
//! is a two-state machine:
//!
//! ```text
//!   ExecutionContext::child()                      ──► Direct
//!   ExecutionContext::parent() + interactive probe ──► Direct
//!   ExecutionContext::parent() + no desktop        ──► RelaunchAsChild
//! ```
//!
//! In `RelaunchAsChild` the command and registry are packed into a
//! [`ChildInvocation`] and handed to a [`ProcessLauncher`] that starts
//! `<self> child <cmd> <registry>` inside the interactive session.  The parent
//! does not wait for the child; it only reports the child's process id.
//!
//! When the parent was started with a configuration file, the child gets
//! `--config <path>` in front of the hand-off arguments so it runs with the
//! same depth limit, timings and start delay.
//!
//! A child always executes directly, which is what stops it relaunching
//! itself forever.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use keystrokes_core::{ChildInvocation, CommandError, Event, HandoffError, MacroRegistry};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use super::run_macro::{ExecutionError, MacroInterpreter};

/// Where the current process sits in the parent→child hand-off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    in_child: bool,
}

impl ExecutionContext {
    /// A process started by a user or service manager.
    pub const fn parent() -> Self {
        Self { in_child: false }
    }

    /// A process started by another instance's relaunch.
    pub const fn child() -> Self {
        Self { in_child: true }
    }

    pub const fn is_child(&self) -> bool {
        self.in_child
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Interpret the command in this process.
    Direct,
    /// Start a child in the interactive session and hand the command over.
    RelaunchAsChild,
}

/// Answers "can this process reach the interactive desktop?".
#[cfg_attr(test, mockall::automock)]
pub trait SessionProbe: Send + Sync {
    fn has_interactive_desktop(&self) -> bool;
}

/// Starts this executable inside the interactive user session.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessLauncher: Send + Sync {
    /// Launches the current executable with `args` and returns the child's
    /// process id without waiting for it to exit.
    fn launch_in_interactive_session(&self, args: &[String]) -> io::Result<u32>;
}

/// Error type for a bridged command.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("malformed command: {0}")]
    MalformedCommand(#[from] CommandError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("failed to launch child in the interactive session: {0}")]
    SpawnFailed(#[source] io::Error),

    #[error("failed to decode hand-off payload: {0}")]
    DecodeFailed(#[from] HandoffError),
}

/// How a bridged command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// Interpreted in this process.
    Executed,
    /// Handed to a child process; its outcome is not observed.
    Delegated { pid: u32 },
}

impl BridgeOutcome {
    /// JSON status object reported to hosts and printed by the CLI.
    pub fn to_json(self) -> Value {
        match self {
            Self::Executed => json!({ "status": "executed" }),
            Self::Delegated { pid } => json!({ "status": "delegated", "pid": pid }),
        }
    }
}

/// Option a child uses to locate the parent's configuration file.
pub const CONFIG_OPTION: &str = "--config";

/// Runs commands directly or through a child process.
pub struct SessionBridge {
    context: ExecutionContext,
    probe: Arc<dyn SessionProbe>,
    launcher: Arc<dyn ProcessLauncher>,
    interpreter: MacroInterpreter,
    start_delay: Duration,
    child_config: Option<PathBuf>,
}

impl SessionBridge {
    pub fn new(
        context: ExecutionContext,
        probe: Arc<dyn SessionProbe>,
        launcher: Arc<dyn ProcessLauncher>,
        interpreter: MacroInterpreter,
    ) -> Self {
        Self {
            context,
            probe,
            launcher,
            interpreter,
            start_delay: Duration::ZERO,
            child_config: None,
        }
    }

    /// Passes `--config <path>` to relaunched children.
    pub fn with_child_config(mut self, path: Option<PathBuf>) -> Self {
        self.child_config = path;
        self
    }

    /// Waits this long before a directly executed command starts.
    pub fn with_start_delay(mut self, start_delay: Duration) -> Self {
        self.start_delay = start_delay;
        self
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    /// Decides how the next command will run.
    pub fn mode(&self) -> ExecutionMode {
        if self.context.is_child() || self.probe.has_interactive_desktop() {
            ExecutionMode::Direct
        } else {
            ExecutionMode::RelaunchAsChild
        }
    }

    /// Runs `command` against `registry`.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Execution`] if direct execution fails.
    /// - [`BridgeError::SpawnFailed`] if the child cannot be launched.
    pub fn run(
        &self,
        command: &[Event],
        registry: &MacroRegistry,
    ) -> Result<BridgeOutcome, BridgeError> {
        match self.mode() {
            ExecutionMode::Direct => {
                self.run_direct(command, registry)?;
                Ok(BridgeOutcome::Executed)
            }
            ExecutionMode::RelaunchAsChild => self.relaunch(command, registry),
        }
    }

    /// Runs a decoded child invocation.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn run_invocation(
        &self,
        invocation: &ChildInvocation,
    ) -> Result<BridgeOutcome, BridgeError> {
        self.run(&invocation.command, &invocation.registry)
    }

    fn run_direct(&self, command: &[Event], registry: &MacroRegistry) -> Result<(), ExecutionError> {
        if !self.start_delay.is_zero() {
            debug!("bridge: waiting {:?} before executing", self.start_delay);
            thread::sleep(self.start_delay);
        }
        info!(
            "bridge: executing {} event(s) directly (child: {})",
            command.len(),
            self.context.is_child()
        );
        self.interpreter.execute(command, registry)
    }

    fn relaunch(
        &self,
        command: &[Event],
        registry: &MacroRegistry,
    ) -> Result<BridgeOutcome, BridgeError> {
        let handoff = ChildInvocation::new(command.to_vec(), registry.clone())
            .to_args()
            .map_err(|e| BridgeError::SpawnFailed(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        let mut args = Vec::with_capacity(handoff.len() + 2);
        if let Some(path) = &self.child_config {
            args.push(CONFIG_OPTION.to_string());
            args.push(path.to_string_lossy().into_owned());
        }
        args.extend(handoff);
        info!("bridge: no interactive desktop, relaunching into the user session");
        let pid = self
            .launcher
            .launch_in_interactive_session(&args)
            .map_err(BridgeError::SpawnFailed)?;
        info!("bridge: delegated {} event(s) to child pid {pid}", command.len());
        Ok(BridgeOutcome::Delegated { pid })
    }
}

/// Decodes the payload arguments of a `child` invocation.
///
/// # Errors
///
/// Returns [`BridgeError::DecodeFailed`] if either payload is not valid.
pub fn decode_child_payloads(
    command: &str,
    registry: Option<&str>,
) -> Result<ChildInvocation, BridgeError> {
    Ok(ChildInvocation::from_payloads(command, registry)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::synthesize::{EmulationError, InputSynthesizer};
    use keystrokes_core::keymap::ResolvedKey;
    use keystrokes_core::KeystrokeMode;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingSynthesizer {
        presses: Mutex<Vec<ResolvedKey>>,
    }

    impl InputSynthesizer for CountingSynthesizer {
        fn press(&self, key: ResolvedKey) -> Result<(), EmulationError> {
            self.presses.lock().unwrap().push(key);
            Ok(())
        }

        fn release(&self, _: ResolvedKey) -> Result<(), EmulationError> {
            Ok(())
        }

        fn left_click(&self, _: f64, _: f64) -> Result<(), EmulationError> {
            Ok(())
        }

        fn right_click(&self, _: f64, _: f64) -> Result<(), EmulationError> {
            Ok(())
        }

        fn double_click(&self, _: f64, _: f64) -> Result<(), EmulationError> {
            Ok(())
        }
    }

    fn probe(interactive: bool) -> MockSessionProbe {
        let mut probe = MockSessionProbe::new();
        probe.expect_has_interactive_desktop().return_const(interactive);
        probe
    }

    fn bridge(
        context: ExecutionContext,
        probe: MockSessionProbe,
        launcher: MockProcessLauncher,
    ) -> (Arc<CountingSynthesizer>, SessionBridge) {
        let synth = Arc::new(CountingSynthesizer::default());
        let bridge = SessionBridge::new(
            context,
            Arc::new(probe),
            Arc::new(launcher),
            MacroInterpreter::new(synth.clone()),
        );
        (synth, bridge)
    }

    fn command() -> Vec<Event> {
        vec![Event::keystroke(KeystrokeMode::Sequential, ["a"])]
    }

    #[test]
    fn test_interactive_parent_executes_directly() {
        // Arrange
        let mut launcher = MockProcessLauncher::new();
        launcher.expect_launch_in_interactive_session().times(0);
        let (synth, bridge) = bridge(ExecutionContext::parent(), probe(true), launcher);

        // Act
        let outcome = bridge.run(&command(), &MacroRegistry::new()).unwrap();

        // Assert
        assert_eq!(outcome, BridgeOutcome::Executed);
        assert_eq!(synth.presses.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_non_interactive_parent_relaunches_with_decodable_payloads() {
        // Arrange
        let mut registry = MacroRegistry::new();
        registry.insert("nap", vec![Event::sleep(10)]);
        let expected = ChildInvocation::new(command(), registry.clone());
        let mut launcher = MockProcessLauncher::new();
        launcher
            .expect_launch_in_interactive_session()
            .withf(move |args| ChildInvocation::from_args(args).ok().as_ref() == Some(&expected))
            .times(1)
            .returning(|_| Ok(4242));
        let (synth, bridge) = bridge(ExecutionContext::parent(), probe(false), launcher);

        // Act
        let outcome = bridge.run(&command(), &registry).unwrap();

        // Assert
        assert_eq!(outcome, BridgeOutcome::Delegated { pid: 4242 });
        assert!(synth.presses.lock().unwrap().is_empty());
    }

    #[test]
    fn test_relaunch_forwards_parent_config_path() {
        // Arrange
        let mut launcher = MockProcessLauncher::new();
        launcher
            .expect_launch_in_interactive_session()
            .withf(|args| {
                args[..2] == [CONFIG_OPTION.to_string(), "/etc/keystrokes.toml".to_string()]
                    && ChildInvocation::from_args(&args[2..]).is_ok()
            })
            .times(1)
            .returning(|_| Ok(7));
        let (_, bridge) = bridge(ExecutionContext::parent(), probe(false), launcher);
        let bridge = bridge.with_child_config(Some(PathBuf::from("/etc/keystrokes.toml")));

        // Act
        let outcome = bridge.run(&command(), &MacroRegistry::new()).unwrap();

        // Assert
        assert_eq!(outcome, BridgeOutcome::Delegated { pid: 7 });
    }

    #[test]
    fn test_child_never_relaunches() {
        // Arrange
        let mut probe = MockSessionProbe::new();
        probe.expect_has_interactive_desktop().return_const(false);
        let mut launcher = MockProcessLauncher::new();
        launcher.expect_launch_in_interactive_session().times(0);
        let (synth, bridge) = bridge(ExecutionContext::child(), probe, launcher);

        // Act
        let outcome = bridge.run(&command(), &MacroRegistry::new()).unwrap();

        // Assert
        assert_eq!(bridge.mode(), ExecutionMode::Direct);
        assert_eq!(outcome, BridgeOutcome::Executed);
        assert_eq!(synth.presses.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let mut launcher = MockProcessLauncher::new();
        launcher
            .expect_launch_in_interactive_session()
            .returning(|_| Err(io::Error::new(io::ErrorKind::PermissionDenied, "no token")));
        let (_, bridge) = bridge(ExecutionContext::parent(), probe(false), launcher);

        let result = bridge.run(&command(), &MacroRegistry::new());

        assert!(matches!(
            result,
            Err(BridgeError::SpawnFailed(e)) if e.kind() == io::ErrorKind::PermissionDenied
        ));
    }

    #[test]
    fn test_direct_execution_errors_pass_through() {
        let (_, bridge) = bridge(ExecutionContext::child(), probe(true), MockProcessLauncher::new());

        let result = bridge.run(&[Event::call("missing")], &MacroRegistry::new());

        assert!(matches!(
            result,
            Err(BridgeError::Execution(ExecutionError::UnknownMacro(_)))
        ));
    }

    #[test]
    fn test_decode_child_payloads_rejects_garbage() {
        let result = decode_child_payloads("%%%", None);
        assert!(matches!(result, Err(BridgeError::DecodeFailed(_))));
    }

    #[test]
    fn test_outcome_json() {
        assert_eq!(BridgeOutcome::Executed.to_json(), json!({"status": "executed"}));
        assert_eq!(
            BridgeOutcome::Delegated { pid: 7 }.to_json(),
            json!({"status": "delegated", "pid": 7})
        );
    }

    #[test]
    fn test_context_defaults_to_parent() {
        assert_eq!(ExecutionContext::default(), ExecutionContext::parent());
        assert!(!ExecutionContext::parent().is_child());
        assert!(ExecutionContext::child().is_child());
    }
}
