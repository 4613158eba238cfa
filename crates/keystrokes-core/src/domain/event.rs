//! The command language: four event kinds and their JSON contract.
//!
//! A command is an ordered list of [`Event`]s.  Each event is a JSON object
//! whose discriminator field selects the variant:
//!
//! | Discriminator   | Variant fields           | Rust variant      |
//! |-----------------|--------------------------|-------------------|
//! | `keystroke`     | `mode`, `keys`           | [`Event::Keystroke`] |
//! | `mouse_event`   | `event`, `x`, `y`        | [`Event::Mouse`]     |
//! | `sleep`         | `ms`                     | [`Event::Sleep`]     |
//! | `macro`         | `name`                   | [`Event::Macro`]     |
//!
//! The discriminator key is `type`.  `kind` and `command` are accepted as
//! aliases (checked in that order) because older payloads used them.
//!
//! # Parsing is all-or-nothing
//!
//! [`parse_command`] either returns every event of the list or a single
//! [`CommandError`] naming the index of the first bad element.  A command is
//! never partially executed because half of it failed to parse.

use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Keys that may carry the event discriminator, in lookup order.
pub const DISCRIMINATOR_KEYS: [&str; 3] = ["type", "kind", "command"];

/// Error type for command and registry parsing.
///
/// Every variant is a flavour of "malformed command": the payload does not
/// describe a valid list of events.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The payload text is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A list of events was expected.
    #[error("expected a list of events, got {0}")]
    NotAList(&'static str),

    /// A list element is not a JSON object.
    #[error("expected an event object, got {0}")]
    NotAnObject(&'static str),

    /// None of the [`DISCRIMINATOR_KEYS`] is present.
    #[error("event has no `type` field")]
    MissingDiscriminator,

    /// The discriminator is present but is not a string.
    #[error("event `type` must be a string, got {0}")]
    InvalidDiscriminator(&'static str),

    /// The discriminator names an event kind that does not exist.
    #[error("unknown event type `{0}`")]
    UnknownKind(String),

    /// The variant's fields are missing or have the wrong type.
    #[error("invalid `{kind}` event: {source}")]
    InvalidFields {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The macro registry payload is not a JSON object.
    #[error("expected a macro registry object, got {0}")]
    NotARegistry(&'static str),

    /// Wraps an error with the index of the offending list element.
    #[error("event {index}: {source}")]
    AtIndex {
        index: usize,
        #[source]
        source: Box<CommandError>,
    },

    /// Wraps an error with the macro whose body failed to parse.
    #[error("macro `{name}`: {source}")]
    InMacro {
        name: String,
        #[source]
        source: Box<CommandError>,
    },
}

impl CommandError {
    fn at(self, index: usize) -> Self {
        Self::AtIndex {
            index,
            source: Box::new(self),
        }
    }

    pub(crate) fn in_macro(self, name: &str) -> Self {
        Self::InMacro {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}

// ── Event variants ────────────────────────────────────────────────────────────

/// How the keys of a [`Keystroke`] are pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeystrokeMode {
    /// One key fully down and up before the next begins.
    Sequential,
    /// All keys held down in order, then released in reverse order.
    Simultaneous,
}

/// A group of key tokens pressed either one after another or together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keystroke {
    pub mode: KeystrokeMode,
    /// Key tokens in press order.  Duplicates are allowed.
    pub keys: Vec<String>,
}

/// Mouse button gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseAction {
    LeftClick,
    RightClick,
    DoubleClick,
}

/// A click at a fractional screen position.
///
/// `(0, 0)` is the top-left corner of the primary display and `(1, 1)` the
/// bottom-right.  Values outside `[0, 1]` are accepted; where they land on
/// screen is up to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseEvent {
    #[serde(rename = "event", alias = "action")]
    pub action: MouseAction,
    pub x: f64,
    pub y: f64,
}

/// Explicit pause between steps, e.g. to wait for a window to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepEvent {
    #[serde(rename = "ms", alias = "duration_ms")]
    pub duration_ms: u64,
}

impl SleepEvent {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Reference to a named macro, resolved against the registry at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroCall {
    pub name: String,
}

/// One step of a command.
///
/// Serializes to the canonical form with a `type` discriminator, which is
/// also what the child hand-off carries.  Deserialization goes through
/// [`Event::from_value`] so the discriminator aliases are honoured for any
/// serde format (JSON payloads, TOML configuration).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Keystroke(Keystroke),
    #[serde(rename = "mouse_event")]
    Mouse(MouseEvent),
    Sleep(SleepEvent),
    #[serde(rename = "macro")]
    Macro(MacroCall),
}

impl Event {
    /// Builds a keystroke event from anything that yields key tokens.
    pub fn keystroke<I, S>(mode: KeystrokeMode, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keystroke(Keystroke {
            mode,
            keys: keys.into_iter().map(Into::into).collect(),
        })
    }

    pub fn mouse(action: MouseAction, x: f64, y: f64) -> Self {
        Self::Mouse(MouseEvent { action, x, y })
    }

    pub fn sleep(duration_ms: u64) -> Self {
        Self::Sleep(SleepEvent { duration_ms })
    }

    pub fn call(name: impl Into<String>) -> Self {
        Self::Macro(MacroCall { name: name.into() })
    }

    /// The canonical discriminator value of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Keystroke(_) => "keystroke",
            Self::Mouse(_) => "mouse_event",
            Self::Sleep(_) => "sleep",
            Self::Macro(_) => "macro",
        }
    }

    /// Parses a single event object.
    ///
    /// Only the fields of the variant selected by the discriminator are read;
    /// anything else in the object is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if `value` is not an object, the discriminator
    /// is missing or unknown, or the variant's fields are invalid.
    pub fn from_value(value: Value) -> Result<Self, CommandError> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => return Err(CommandError::NotAnObject(json_type_name(&other))),
        };

        let tag = DISCRIMINATOR_KEYS
            .iter()
            .find_map(|key| fields.remove(*key))
            .ok_or(CommandError::MissingDiscriminator)?;
        let tag = match tag {
            Value::String(tag) => tag,
            other => return Err(CommandError::InvalidDiscriminator(json_type_name(&other))),
        };

        let body = Value::Object(fields);
        match tag.as_str() {
            "keystroke" => parse_fields("keystroke", body).map(Self::Keystroke),
            "mouse_event" | "mouse" => parse_fields("mouse_event", body).map(Self::Mouse),
            "sleep" => parse_fields("sleep", body).map(Self::Sleep),
            "macro" | "macro_call" => parse_fields("macro", body).map(Self::Macro),
            other => Err(CommandError::UnknownKind(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

// ── Command parsing ───────────────────────────────────────────────────────────

/// Parses a command from JSON text.
///
/// # Errors
///
/// Returns [`CommandError`] if the text is not JSON or any event is invalid.
///
/// # Examples
///
/// ```rust
/// use keystrokes_core::{parse_command, Event, KeystrokeMode};
///
/// let events = parse_command(r#"[{"type":"keystroke","mode":"sequential","keys":["A"]}]"#).unwrap();
/// assert_eq!(events, vec![Event::keystroke(KeystrokeMode::Sequential, ["A"])]);
/// ```
pub fn parse_command(json: &str) -> Result<Vec<Event>, CommandError> {
    let value: Value = serde_json::from_str(json)?;
    parse_command_value(value)
}

/// Parses a command from an already-decoded JSON value.
///
/// Accepts either a bare array of events or an object carrying the array
/// under `commands`.
///
/// # Errors
///
/// Returns [`CommandError`] on the first invalid element; no events are
/// returned in that case.
pub fn parse_command_value(value: Value) -> Result<Vec<Event>, CommandError> {
    match value {
        Value::Array(items) => parse_events(items),
        Value::Object(mut map) => match map.remove("commands") {
            Some(Value::Array(items)) => parse_events(items),
            Some(other) => Err(CommandError::NotAList(json_type_name(&other))),
            None => Err(CommandError::NotAList("object without `commands`")),
        },
        other => Err(CommandError::NotAList(json_type_name(&other))),
    }
}

/// Parses every element of `items`, stopping at the first failure.
pub(crate) fn parse_events(items: Vec<Value>) -> Result<Vec<Event>, CommandError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| Event::from_value(item).map_err(|e| e.at(index)))
        .collect()
}

fn parse_fields<T: DeserializeOwned>(kind: &'static str, body: Value) -> Result<T, CommandError> {
    serde_json::from_value(body).map_err(|source| CommandError::InvalidFields { kind, source })
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_keystroke_event() {
        // Arrange
        let value = json!({"type": "keystroke", "mode": "simultaneous", "keys": ["CTRL", "c"]});

        // Act
        let event = Event::from_value(value).unwrap();

        // Assert
        assert_eq!(
            event,
            Event::keystroke(KeystrokeMode::Simultaneous, ["CTRL", "c"])
        );
    }

    #[test]
    fn test_parse_mouse_event_accepts_integer_coordinates() {
        let value = json!({"type": "mouse_event", "event": "right_click", "x": 1, "y": 0});

        let event = Event::from_value(value).unwrap();

        assert_eq!(event, Event::mouse(MouseAction::RightClick, 1.0, 0.0));
    }

    #[test]
    fn test_parse_sleep_event() {
        let event = Event::from_value(json!({"type": "sleep", "ms": 250})).unwrap();
        assert_eq!(event, Event::sleep(250));
        let Event::Sleep(sleep) = event else {
            panic!("expected a sleep event");
        };
        assert_eq!(sleep.duration(), Duration::from_millis(250));
    }

    #[test]
    fn test_parse_macro_event() {
        let event = Event::from_value(json!({"type": "macro", "name": "greet"})).unwrap();
        assert_eq!(event, Event::call("greet"));
    }

    #[test]
    fn test_kind_and_command_keys_are_discriminator_aliases() {
        let by_kind = Event::from_value(json!({"kind": "sleep", "ms": 1})).unwrap();
        let by_command = Event::from_value(json!({"command": "sleep", "ms": 1})).unwrap();
        assert_eq!(by_kind, Event::sleep(1));
        assert_eq!(by_command, Event::sleep(1));
    }

    #[test]
    fn test_duration_ms_is_accepted_for_sleep() {
        let event = Event::from_value(json!({"type": "sleep", "duration_ms": 40})).unwrap();
        assert_eq!(event, Event::sleep(40));
    }

    #[test]
    fn test_fields_of_other_variants_are_ignored() {
        // Only the tagged variant's fields are meaningful.
        let value = json!({"type": "macro", "name": "m", "keys": ["A"], "ms": 5});
        assert_eq!(Event::from_value(value).unwrap(), Event::call("m"));
    }

    #[test]
    fn test_missing_discriminator_is_rejected() {
        let result = Event::from_value(json!({"mode": "sequential", "keys": ["A"]}));
        assert!(matches!(result, Err(CommandError::MissingDiscriminator)));
    }

    #[test]
    fn test_non_string_discriminator_is_rejected() {
        let result = Event::from_value(json!({"type": 7}));
        assert!(matches!(result, Err(CommandError::InvalidDiscriminator("number"))));
    }

    #[test]
    fn test_unknown_discriminator_is_rejected() {
        let result = Event::from_value(json!({"type": "scroll", "delta": 3}));
        assert!(matches!(result, Err(CommandError::UnknownKind(kind)) if kind == "scroll"));
    }

    #[test]
    fn test_missing_variant_field_is_rejected() {
        let result = Event::from_value(json!({"type": "mouse_event", "event": "left_click", "x": 0.5}));
        assert!(matches!(
            result,
            Err(CommandError::InvalidFields { kind: "mouse_event", .. })
        ));
    }

    #[test]
    fn test_wrongly_typed_field_is_rejected() {
        let result = Event::from_value(json!({"type": "keystroke", "mode": "sequential", "keys": "A"}));
        assert!(matches!(result, Err(CommandError::InvalidFields { kind: "keystroke", .. })));
    }

    #[test]
    fn test_negative_sleep_is_rejected() {
        let result = Event::from_value(json!({"type": "sleep", "ms": -10}));
        assert!(matches!(result, Err(CommandError::InvalidFields { kind: "sleep", .. })));
    }

    #[test]
    fn test_unknown_keystroke_mode_is_rejected() {
        let result = Event::from_value(json!({"type": "keystroke", "mode": "chord", "keys": []}));
        assert!(result.is_err());
    }

    #[test]
    fn test_non_object_event_is_rejected() {
        let result = Event::from_value(json!("keystroke"));
        assert!(matches!(result, Err(CommandError::NotAnObject("string"))));
    }

    #[test]
    fn test_parse_command_is_all_or_nothing_and_reports_index() {
        // Arrange – second element is bad
        let json = r#"[
            {"type": "sleep", "ms": 10},
            {"type": "teleport"},
            {"type": "sleep", "ms": 20}
        ]"#;

        // Act
        let result = parse_command(json);

        // Assert
        match result {
            Err(CommandError::AtIndex { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(*source, CommandError::UnknownKind(_)));
            }
            other => panic!("expected AtIndex error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_command_accepts_commands_wrapper() {
        let value = json!({"commands": [{"type": "macro", "name": "x"}]});
        assert_eq!(parse_command_value(value).unwrap(), vec![Event::call("x")]);
    }

    #[test]
    fn test_parse_command_rejects_scalar_payload() {
        assert!(matches!(
            parse_command_value(json!(42)),
            Err(CommandError::NotAList("number"))
        ));
        assert!(matches!(
            parse_command_value(json!({"events": []})),
            Err(CommandError::NotAList(_))
        ));
    }

    #[test]
    fn test_parse_command_rejects_invalid_json() {
        assert!(matches!(parse_command("[{"), Err(CommandError::Json(_))));
    }

    #[test]
    fn test_empty_command_is_valid() {
        assert!(parse_command("[]").unwrap().is_empty());
    }

    #[test]
    fn test_events_serialize_with_type_discriminator() {
        // Arrange
        let events = vec![
            Event::keystroke(KeystrokeMode::Sequential, ["A"]),
            Event::mouse(MouseAction::DoubleClick, 0.25, 0.75),
            Event::sleep(5),
            Event::call("greet"),
        ];

        // Act
        let value = serde_json::to_value(&events).unwrap();

        // Assert
        assert_eq!(
            value,
            json!([
                {"type": "keystroke", "mode": "sequential", "keys": ["A"]},
                {"type": "mouse_event", "event": "double_click", "x": 0.25, "y": 0.75},
                {"type": "sleep", "ms": 5},
                {"type": "macro", "name": "greet"}
            ])
        );
    }

    #[test]
    fn test_event_deserialize_uses_aliases() {
        let event: Event = serde_json::from_str(r#"{"kind":"mouse","action":"left_click","x":0,"y":0}"#).unwrap();
        assert_eq!(event, Event::mouse(MouseAction::LeftClick, 0.0, 0.0));
    }

    #[test]
    fn test_error_messages_name_the_problem() {
        let err = parse_command(r#"[{"type":"sleep","ms":1},{"type":"nope"}]"#).unwrap_err();
        assert_eq!(err.to_string(), "event 1: unknown event type `nope`");
    }
}
