//! Parent→child hand-off codec.
//!
//! When the controlling process cannot reach the interactive desktop it
//! relaunches itself inside the user's session and passes the work along on
//! the command line:
//!
//! ```text
//! <self> child <base64(command JSON)> <base64(registry JSON)>
//! ```
//!
//! Both payloads use the standard base64 alphabet with padding, which never
//! contains whitespace or quotes, so they survive any command-line quoting.
//! The command and the registry are encoded independently so either can be
//! inspected on its own.
//!
//! The registry argument may be omitted (an empty registry is assumed).  A
//! payload that is present but cannot be decoded is a fatal startup error for
//! the child.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::event::{parse_command_value, CommandError, Event};
use crate::domain::registry::MacroRegistry;

/// First argument of a child invocation.
pub const CHILD_MODE_MARKER: &str = "child";

const COMMAND_PAYLOAD: &str = "command";
const REGISTRY_PAYLOAD: &str = "registry";

/// Errors that can occur while encoding or decoding a child invocation.
#[derive(Debug, Error)]
pub enum HandoffError {
    /// The first argument is not [`CHILD_MODE_MARKER`].
    #[error("not a child invocation (expected `{}` as first argument)", CHILD_MODE_MARKER)]
    MissingMarker,

    /// A required payload argument is absent.
    #[error("child invocation is missing the {0} payload")]
    MissingPayload(&'static str),

    /// More arguments than marker + command + registry.
    #[error("child invocation has {0} unexpected extra argument(s)")]
    ExtraArguments(usize),

    /// A payload is not valid base64.
    #[error("{payload} payload is not valid base64: {source}")]
    Base64 {
        payload: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    /// A payload decoded but does not describe a valid command or registry.
    #[error("{payload} payload is invalid: {source}")]
    Payload {
        payload: &'static str,
        #[source]
        source: CommandError,
    },

    /// A payload could not be serialized.
    #[error("failed to encode {payload} payload: {source}")]
    Encode {
        payload: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// The work handed from a parent process to its child.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChildInvocation {
    pub command: Vec<Event>,
    pub registry: MacroRegistry,
}

impl ChildInvocation {
    pub fn new(command: Vec<Event>, registry: MacroRegistry) -> Self {
        Self { command, registry }
    }

    /// Encodes the command as base64 of its canonical JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Encode`] if serialization fails.
    pub fn encode_command(&self) -> Result<String, HandoffError> {
        encode_payload(COMMAND_PAYLOAD, &self.command)
    }

    /// Encodes the registry as base64 of its canonical JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Encode`] if serialization fails.
    pub fn encode_registry(&self) -> Result<String, HandoffError> {
        encode_payload(REGISTRY_PAYLOAD, &self.registry)
    }

    /// Builds the argument list for the child process (without the program).
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Encode`] if either payload cannot be serialized.
    pub fn to_args(&self) -> Result<Vec<String>, HandoffError> {
        Ok(vec![
            CHILD_MODE_MARKER.to_string(),
            self.encode_command()?,
            self.encode_registry()?,
        ])
    }

    /// Decodes a child invocation from its argument list (without the program).
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError`] if the marker is missing, the command payload
    /// is absent, there are extra arguments, or a payload fails to decode.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keystrokes_core::{ChildInvocation, Event, MacroRegistry};
    ///
    /// let original = ChildInvocation::new(vec![Event::sleep(10)], MacroRegistry::new());
    /// let args = original.to_args().unwrap();
    /// assert_eq!(ChildInvocation::from_args(args.as_slice()).unwrap(), original);
    /// ```
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, HandoffError> {
        let mut args = args.iter().map(AsRef::as_ref);
        if args.next() != Some(CHILD_MODE_MARKER) {
            return Err(HandoffError::MissingMarker);
        }
        let command = args
            .next()
            .ok_or(HandoffError::MissingPayload(COMMAND_PAYLOAD))?;
        let registry = args.next();
        let extra = args.count();
        if extra > 0 {
            return Err(HandoffError::ExtraArguments(extra));
        }
        Self::from_payloads(command, registry)
    }

    /// Decodes the two base64 payloads of a child invocation.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Base64`] or [`HandoffError::Payload`] naming the
    /// payload that failed.
    pub fn from_payloads(command: &str, registry: Option<&str>) -> Result<Self, HandoffError> {
        let command = decode_value(COMMAND_PAYLOAD, command)
            .and_then(|value| with_payload(COMMAND_PAYLOAD, parse_command_value(value)))?;
        let registry = match registry {
            Some(encoded) => decode_value(REGISTRY_PAYLOAD, encoded)
                .and_then(|value| with_payload(REGISTRY_PAYLOAD, MacroRegistry::from_value(value)))?,
            None => MacroRegistry::new(),
        };
        Ok(Self { command, registry })
    }
}

fn encode_payload<T: Serialize>(payload: &'static str, value: &T) -> Result<String, HandoffError> {
    let json =
        serde_json::to_vec(value).map_err(|source| HandoffError::Encode { payload, source })?;
    Ok(STANDARD.encode(json))
}

fn decode_value(payload: &'static str, encoded: &str) -> Result<Value, HandoffError> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|source| HandoffError::Base64 { payload, source })?;
    let value = serde_json::from_slice(&bytes).map_err(|e| HandoffError::Payload {
        payload,
        source: CommandError::Json(e),
    })?;
    Ok(value)
}

fn with_payload<T>(payload: &'static str, result: Result<T, CommandError>) -> Result<T, HandoffError> {
    result.map_err(|source| HandoffError::Payload { payload, source })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
