//! keystrokes: entry point.
//!
//! Runs a JSON keyboard/mouse script, either in this process or, when this
//! process cannot reach the user's desktop, in a child relaunched into the
//! interactive session.
//!
//! # Usage
//!
//! ```text
//! keystrokes run --command script.json [--macros macros.json] [--relaunch] [--dry-run]
//! keystrokes run --inline '[{"type":"keystroke","mode":"sequential","keys":["hello"]}]'
//! keystrokes child <COMMAND_B64> [REGISTRY_B64]
//! ```
//!
//! `child` is what a parent passes to its relaunched copy, preceded by
//! `--config <path>` when the parent loaded a config file.  It is not meant
//! to be typed by hand, but doing so is a handy way to replay a hand-off.
//!
//! # Environment variable overrides
//!
//! | Variable            | Description                                  |
//! |---------------------|----------------------------------------------|
//! | `KEYSTROKES_CONFIG` | Config file path (same as `--config`)        |
//! | `RUST_LOG`          | Log filter; overrides `[agent] log_level`    |
//!
//! # Architecture overview
//!
//! ```text
//! main ── KeystrokeService ── SessionBridge ──┬── MacroInterpreter ── SettlingSynthesizer ── PlatformInputEmulator
//!                                             └── ProcessLauncher ──► `keystrokes child ...`
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use keystrokes_core::MacroRegistry;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keystrokes_agent::application::handle_command::KeystrokeService;
use keystrokes_agent::application::run_macro::MacroInterpreter;
use keystrokes_agent::application::session_bridge::{
    decode_child_payloads, ExecutionContext, ProcessLauncher, SessionBridge, SessionProbe,
};
use keystrokes_agent::application::synthesize::{
    PlatformInputEmulator, SettleTimings, SettlingSynthesizer,
};
use keystrokes_agent::infrastructure::input_emulation::{
    create_platform_emulator, mock::MockInputEmulator,
};
use keystrokes_agent::infrastructure::session::{
    create_process_launcher, create_session_probe, FixedProbe, RecordingLauncher,
};
use keystrokes_agent::infrastructure::storage::config::{
    effective_config_path, load_config, AgentConfig,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Keyboard and mouse macro runner.
#[derive(Debug, Parser)]
#[command(
    name = "keystrokes",
    about = "Runs JSON keyboard and mouse scripts in the interactive desktop session",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.
    ///
    /// Defaults to the platform config directory; a missing default file
    /// means built-in defaults.
    #[arg(long, global = true, env = "KEYSTROKES_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Run a script, relaunching into the user session if needed.
    Run(RunArgs),

    /// Execute a handed-off script.  Used by a parent's relaunch.
    Child {
        /// Base64 of the command JSON.
        command: String,
        /// Base64 of the macro registry JSON.  Omitted means no macros.
        registry: Option<String>,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// JSON file holding the script (an event array or `{"commands": [...]}`).
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with = "inline",
        required_unless_present = "inline"
    )]
    command: Option<PathBuf>,

    /// The script as a JSON string.
    #[arg(long, value_name = "JSON")]
    inline: Option<String>,

    /// JSON file of macros, layered over the config's `[macros]`.
    #[arg(long, value_name = "FILE")]
    macros: Option<PathBuf>,

    /// Always hand the script to a child, even with a desktop available.
    #[arg(long)]
    relaunch: bool,

    /// Record input and child launches instead of performing them, then print
    /// what would have happened.
    #[arg(long)]
    dry_run: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    init_tracing(&config.agent.log_level);
    let config_path = effective_config_path(cli.config.as_deref());

    match cli.command {
        CliCommand::Run(args) => run(args, &config, config_path),
        CliCommand::Child { command, registry } => {
            run_child(&command, registry.as_deref(), &config)
        }
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: RunArgs, config: &AgentConfig, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let request = read_request(&args)?;

    let mut registry = config.macros.clone();
    if let Some(path) = &args.macros {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read macros from {}", path.display()))?;
        let overlay = MacroRegistry::from_json(&text)
            .with_context(|| format!("invalid macros in {}", path.display()))?;
        registry.merge(overlay);
    }
    info!("loaded {} macro(s)", registry.len());

    let dry_run = args.dry_run.then(DryRun::default);
    let backends = Backends::select(&args, config, dry_run.as_ref());
    let bridge = build_bridge(ExecutionContext::parent(), backends, config)
        .with_child_config(config_path);
    let service = KeystrokeService::new(bridge, registry);
    let reply = service.do_command(&request)?;
    println!("{reply}");

    if let Some(dry_run) = dry_run {
        for input in dry_run.input.emitted() {
            println!("{input}");
        }
        for launch in dry_run.launches.launches() {
            println!("would launch: {}", launch.join(" "));
        }
    }
    Ok(())
}

fn run_child(command: &str, registry: Option<&str>, config: &AgentConfig) -> anyhow::Result<()> {
    let invocation = decode_child_payloads(command, registry)?;
    info!(
        "child: received {} event(s) and {} macro(s)",
        invocation.command.len(),
        invocation.registry.len()
    );

    let backends = Backends {
        probe: create_session_probe(),
        emulator: create_platform_emulator(),
        launcher: create_process_launcher(),
        timings: config.timing.settle_timings(),
    };
    build_bridge(ExecutionContext::child(), backends, config).run_invocation(&invocation)?;
    Ok(())
}

// ── Wiring ────────────────────────────────────────────────────────────────────

/// Recorders standing in for real injection and real child launches.
#[derive(Default)]
struct DryRun {
    input: Arc<MockInputEmulator>,
    launches: Arc<RecordingLauncher>,
}

/// The platform-facing half of a bridge.
struct Backends {
    probe: Arc<dyn SessionProbe>,
    emulator: Arc<dyn PlatformInputEmulator>,
    launcher: Arc<dyn ProcessLauncher>,
    timings: SettleTimings,
}

impl Backends {
    /// Picks the backends for `run`.  A dry run never touches the OS: it
    /// records input, records launches, and assumes a desktop unless
    /// `--relaunch` asks for the child path.
    fn select(args: &RunArgs, config: &AgentConfig, dry_run: Option<&DryRun>) -> Self {
        let probe: Arc<dyn SessionProbe> = if args.relaunch {
            Arc::new(FixedProbe::non_interactive())
        } else if dry_run.is_some() {
            Arc::new(FixedProbe::interactive())
        } else {
            create_session_probe()
        };
        match dry_run {
            Some(dry_run) => Self {
                probe,
                emulator: dry_run.input.clone(),
                launcher: dry_run.launches.clone(),
                timings: SettleTimings::none(),
            },
            None => Self {
                probe,
                emulator: create_platform_emulator(),
                launcher: create_process_launcher(),
                timings: config.timing.settle_timings(),
            },
        }
    }
}

fn build_bridge(
    context: ExecutionContext,
    backends: Backends,
    config: &AgentConfig,
) -> SessionBridge {
    let synthesizer = SettlingSynthesizer::new(backends.emulator, backends.timings);
    let interpreter =
        MacroInterpreter::new(Arc::new(synthesizer)).with_max_depth(config.agent.max_macro_depth);
    SessionBridge::new(context, backends.probe, backends.launcher, interpreter)
        .with_start_delay(config.agent.start_delay())
}

fn read_request(args: &RunArgs) -> anyhow::Result<Value> {
    let (text, source) = match (&args.command, &args.inline) {
        (Some(path), _) => (
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read command from {}", path.display()))?,
            path.display().to_string(),
        ),
        (None, Some(inline)) => (inline.clone(), "--inline".to_string()),
        (None, None) => anyhow::bail!("either --command or --inline is required"),
    };
    serde_json::from_str(&text).with_context(|| format!("{source} is not valid JSON"))
}
