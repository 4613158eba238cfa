//! KeystrokeService: the JSON-in, JSON-out surface a host embeds.
//!
//! A request is either a bare array of events or an object:
//!
//! ```json
//! {
//!   "commands": [{"type": "macro", "name": "login"}],
//!   "macros":   {"login": [{"type": "keystroke", "mode": "sequential", "keys": ["admin"]}]}
//! }
//! ```
//!
//! Per-request `macros` are layered over the service's configured registry
//! for that request only.  The reply is the bridge outcome as JSON.

use std::borrow::Cow;

use keystrokes_core::{parse_command_value, CommandError, Event, MacroRegistry};
use serde_json::Value;
use tracing::debug;

use super::session_bridge::{BridgeError, SessionBridge};

const MACROS_FIELD: &str = "macros";

/// Runs JSON command requests through a [`SessionBridge`].
pub struct KeystrokeService {
    bridge: SessionBridge,
    registry: MacroRegistry,
}

impl KeystrokeService {
    /// Creates a service whose requests see `registry` unless they override
    /// individual macros.
    pub fn new(bridge: SessionBridge, registry: MacroRegistry) -> Self {
        Self { bridge, registry }
    }

    pub fn registry(&self) -> &MacroRegistry {
        &self.registry
    }

    /// Parses and runs one request.
    ///
    /// Returns `{"status": "executed"}` or `{"status": "delegated", "pid": N}`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MalformedCommand`] if the request does not parse
    /// (nothing is executed in that case), or the bridge's error otherwise.
    pub fn do_command(&self, request: &Value) -> Result<Value, BridgeError> {
        let (command, overlay) = parse_request(request.clone())?;
        let registry = if overlay.is_empty() {
            Cow::Borrowed(&self.registry)
        } else {
            debug!("service: request overrides {} macro(s)", overlay.len());
            let mut merged = self.registry.clone();
            merged.merge(overlay);
            Cow::Owned(merged)
        };
        let outcome = self.bridge.run(&command, &registry)?;
        Ok(outcome.to_json())
    }
}

fn parse_request(request: Value) -> Result<(Vec<Event>, MacroRegistry), CommandError> {
    match request {
        Value::Object(mut fields) => {
            let overlay = match fields.remove(MACROS_FIELD) {
                Some(macros) => MacroRegistry::from_value(macros)?,
                None => MacroRegistry::new(),
            };
            let command = parse_command_value(Value::Object(fields))?;
            Ok((command, overlay))
        }
        other => Ok((parse_command_value(other)?, MacroRegistry::new())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
