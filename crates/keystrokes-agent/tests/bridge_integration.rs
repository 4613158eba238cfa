//! Integration tests for the parent→child hand-off.
//!
//! A parent without a desktop relaunches; these tests capture the arguments
//! it would pass to the child, feed them to a child-context bridge, and check
//! that the child injects exactly what the parent would have.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use keystrokes_agent::application::handle_command::KeystrokeService;
use keystrokes_agent::application::run_macro::MacroInterpreter;
use keystrokes_agent::application::session_bridge::{
    decode_child_payloads, BridgeError, BridgeOutcome, ExecutionContext, ExecutionMode,
    ProcessLauncher, SessionBridge, CONFIG_OPTION,
};
use keystrokes_agent::application::synthesize::{SettleTimings, SettlingSynthesizer};
use keystrokes_agent::infrastructure::input_emulation::mock::{EmittedInput, MockInputEmulator};
use keystrokes_agent::infrastructure::session::FixedProbe;
use keystrokes_core::{parse_command, ChildInvocation, MacroRegistry, CHILD_MODE_MARKER};
use serde_json::json;

// ── Test doubles ──────────────────────────────────────────────────────────────

/// Records launch arguments and hands out increasing fake pids.
#[derive(Default)]
struct CapturingLauncher {
    launches: Mutex<Vec<Vec<String>>>,
}

impl CapturingLauncher {
    fn launches(&self) -> Vec<Vec<String>> {
        self.launches.lock().unwrap().clone()
    }
}

impl ProcessLauncher for CapturingLauncher {
    fn launch_in_interactive_session(&self, args: &[String]) -> io::Result<u32> {
        let mut launches = self.launches.lock().unwrap();
        launches.push(args.to_vec());
        Ok(1000 + launches.len() as u32)
    }
}

struct FailingLauncher;

impl ProcessLauncher for FailingLauncher {
    fn launch_in_interactive_session(&self, _: &[String]) -> io::Result<u32> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "no user token"))
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn bridge(
    context: ExecutionContext,
    interactive: bool,
    launcher: Arc<dyn ProcessLauncher>,
) -> (Arc<MockInputEmulator>, SessionBridge) {
    let emulator = Arc::new(MockInputEmulator::new());
    let synthesizer = SettlingSynthesizer::new(emulator.clone(), SettleTimings::none());
    let probe = if interactive {
        FixedProbe::interactive()
    } else {
        FixedProbe::non_interactive()
    };
    let bridge = SessionBridge::new(
        context,
        Arc::new(probe),
        launcher,
        MacroInterpreter::new(Arc::new(synthesizer)),
    );
    (emulator, bridge)
}

fn login_fixture() -> (Vec<keystrokes_core::Event>, MacroRegistry) {
    let command = parse_command(
        r#"[
            {"type": "mouse_event", "event": "double_click", "x": 0.5, "y": 0.4},
            {"type": "macro", "name": "login"},
            {"type": "keystroke", "mode": "sequential", "keys": ["ENTER"]}
        ]"#,
    )
    .unwrap();
    let registry = MacroRegistry::from_json(
        r#"{
            "login": [
                {"type": "keystroke", "mode": "sequential", "keys": ["Admin"]},
                {"type": "keystroke", "mode": "sequential", "keys": ["TAB"]},
                {"type": "macro", "name": "password"}
            ],
            "password": [{"type": "keystroke", "mode": "sequential", "keys": ["s3cr3t!"]}]
        }"#,
    )
    .unwrap();
    (command, registry)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn test_non_interactive_parent_spawns_child_with_original_payloads() {
    // Arrange
    let (command, registry) = login_fixture();
    let launcher = Arc::new(CapturingLauncher::default());
    let (emulator, parent) = bridge(ExecutionContext::parent(), false, launcher.clone());

    // Act
    let outcome = parent.run(&command, &registry).unwrap();

    // Assert
    assert_eq!(outcome, BridgeOutcome::Delegated { pid: 1001 });
    assert!(emulator.emitted().is_empty(), "parent must not inject input");

    let launches = launcher.launches();
    assert_eq!(launches.len(), 1);
    let args = &launches[0];
    assert_eq!(args[0], CHILD_MODE_MARKER);
    let decoded = decode_child_payloads(&args[1], Some(args[2].as_str())).unwrap();
    assert_eq!(decoded.command, command);
    assert_eq!(decoded.registry, registry);
}

#[test]
fn test_child_replays_exactly_what_a_direct_run_injects() {
    // Arrange
    let (command, registry) = login_fixture();
    let launcher = Arc::new(CapturingLauncher::default());
    let (_, parent) = bridge(ExecutionContext::parent(), false, launcher.clone());
    let (direct_emulator, direct) = bridge(ExecutionContext::parent(), true, launcher.clone());
    parent.run(&command, &registry).unwrap();
    let args = launcher.launches().remove(0);

    // Act
    let invocation = ChildInvocation::from_args(args.as_slice()).unwrap();
    let (child_emulator, child) = bridge(ExecutionContext::child(), false, launcher.clone());
    let child_outcome = child.run_invocation(&invocation).unwrap();
    let direct_outcome = direct.run(&command, &registry).unwrap();

    // Assert
    assert_eq!(child.mode(), ExecutionMode::Direct);
    assert_eq!(child_outcome, BridgeOutcome::Executed);
    assert_eq!(direct_outcome, BridgeOutcome::Executed);
    assert_eq!(child_emulator.emitted(), direct_emulator.emitted());
    assert_eq!(launcher.launches().len(), 1, "child must not relaunch again");
}

#[test]
fn test_child_payload_types_the_password() {
    let (command, registry) = login_fixture();
    let invocation = ChildInvocation::new(command, registry);
    let args = invocation.to_args().unwrap();
    let (emulator, child) = bridge(
        ExecutionContext::child(),
        false,
        Arc::new(CapturingLauncher::default()),
    );

    child
        .run_invocation(&ChildInvocation::from_args(args.as_slice()).unwrap())
        .unwrap();

    // "Admin" + TAB + "s3cr3t!" + ENTER = 14 key presses, plus Shift for A and !
    let downs = emulator.key_downs();
    assert_eq!(downs.len(), 14 + 2);
    assert_eq!(downs.last(), Some(&0x0D));
    assert!(matches!(
        emulator.emitted()[0],
        EmittedInput::MouseButton { pressed: true, .. }
    ));
}

#[test]
fn test_parent_config_path_reaches_the_child() {
    // Arrange
    let (command, registry) = login_fixture();
    let launcher = Arc::new(CapturingLauncher::default());
    let (_, parent) = bridge(ExecutionContext::parent(), false, launcher.clone());
    let parent = parent.with_child_config(Some(PathBuf::from("/srv/keystrokes/config.toml")));

    // Act
    parent.run(&command, &registry).unwrap();

    // Assert
    let args = launcher.launches().remove(0);
    assert_eq!(args[0], CONFIG_OPTION);
    assert_eq!(args[1], "/srv/keystrokes/config.toml");
    let decoded = ChildInvocation::from_args(&args[2..]).unwrap();
    assert_eq!(decoded.command, command);
}

#[test]
fn test_spawn_failure_surfaces_as_spawn_failed() {
    let (command, registry) = login_fixture();
    let (_, parent) = bridge(ExecutionContext::parent(), false, Arc::new(FailingLauncher));

    let result = parent.run(&command, &registry);

    assert!(matches!(result, Err(BridgeError::SpawnFailed(_))));
}

#[test]
fn test_corrupt_child_payload_is_decode_failed() {
    let result = decode_child_payloads("bm90IGpzb24=", None); // "not json"
    assert!(matches!(result, Err(BridgeError::DecodeFailed(_))));
}

#[test]
fn test_service_reports_delegation() {
    // Arrange
    let launcher = Arc::new(CapturingLauncher::default());
    let (_, bridge) = bridge(ExecutionContext::parent(), false, launcher.clone());
    let service = KeystrokeService::new(bridge, MacroRegistry::new());
    let request = json!({
        "commands": [{"type": "macro", "name": "hi"}],
        "macros": {"hi": [{"type": "keystroke", "mode": "sequential", "keys": ["hi"]}]}
    });

    // Act
    let reply = service.do_command(&request).unwrap();

    // Assert
    assert_eq!(reply, json!({"status": "delegated", "pid": 1001}));
    let args = launcher.launches().remove(0);
    let handed_off = decode_child_payloads(&args[1], Some(args[2].as_str())).unwrap();
    assert!(handed_off.registry.contains("hi"));
}
