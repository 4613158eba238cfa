//! Named macros.
//!
//! A [`MacroRegistry`] maps a macro name to the ordered events it expands to.
//! It is supplied next to a command (from configuration, from a file, or from
//! the parent process during a hand-off), never inside it.
//!
//! Names are resolved when a [`MacroCall`](super::event::MacroCall) executes,
//! not when the registry is built, so a macro may call one that is defined
//! later in the same payload, or even itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::event::{json_type_name, parse_events, CommandError, Event};

/// Mapping from macro name to its body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacroRegistry {
    macros: BTreeMap<String, Vec<Event>>,
}

impl MacroRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a registry from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the text is not a JSON object of event lists.
    pub fn from_json(json: &str) -> Result<Self, CommandError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parses a registry from a JSON object mapping names to event lists.
    ///
    /// Parsing is all-or-nothing: one bad macro body rejects the registry.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotARegistry`] for a non-object payload and
    /// [`CommandError::InMacro`] naming the macro whose body is invalid.
    pub fn from_value(value: Value) -> Result<Self, CommandError> {
        let entries = match value {
            Value::Object(entries) => entries,
            Value::Null => return Ok(Self::new()),
            other => return Err(CommandError::NotARegistry(json_type_name(&other))),
        };

        let mut macros = BTreeMap::new();
        for (name, body) in entries {
            let events = match body {
                Value::Array(items) => parse_events(items),
                other => Err(CommandError::NotAList(json_type_name(&other))),
            }
            .map_err(|e| e.in_macro(&name))?;
            macros.insert(name, events);
        }
        Ok(Self { macros })
    }

    /// Adds or replaces a macro.  Returns the previous body, if any.
    pub fn insert(&mut self, name: impl Into<String>, events: Vec<Event>) -> Option<Vec<Event>> {
        self.macros.insert(name.into(), events)
    }

    /// Looks up a macro body by name.
    pub fn get(&self, name: &str) -> Option<&[Event]> {
        self.macros.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Macro names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.macros.keys().map(String::as_str)
    }

    /// Overlays `other` onto `self`; macros in `other` win on name clashes.
    pub fn merge(&mut self, other: Self) {
        self.macros.extend(other.macros);
    }
}

impl FromIterator<(String, Vec<Event>)> for MacroRegistry {
    fn from_iter<T: IntoIterator<Item = (String, Vec<Event>)>>(iter: T) -> Self {
        Self {
            macros: iter.into_iter().collect(),
        }
    }
}
