//! RunMacroUseCase: walks a command's events and drives the input synthesizer.
//!
//! Events are executed strictly in order on the calling thread.  The first
//! failing event stops the command and its error is returned unchanged; input
//! already sent to the OS is not undone.
//!
//! Macro calls are looked up when they execute, so a macro may reference one
//! defined after it or itself.  Expansion is bounded by a nesting depth so a
//! self-referencing macro fails cleanly instead of exhausting the stack.

use std::sync::Arc;

use keystrokes_core::keymap::{resolve, ResolvedKey};
use keystrokes_core::{Event, Keystroke, KeystrokeMode, MacroRegistry, MouseAction, MouseEvent};
use thiserror::Error;
use tracing::debug;

use super::synthesize::{EmulationError, InputSynthesizer};

/// Maximum nesting of macro calls when nothing else is configured.
pub const DEFAULT_MAX_MACRO_DEPTH: usize = 64;

/// Error type for command execution.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A macro call named a macro the registry does not contain.
    #[error("unknown macro `{0}`")]
    UnknownMacro(String),

    /// Expanding this macro would nest deeper than the configured limit.
    #[error("macro `{name}` exceeds the maximum nesting depth of {max_depth}")]
    MacroDepthExceeded { name: String, max_depth: usize },

    #[error(transparent)]
    Injection(#[from] EmulationError),
}

/// Executes event sequences against a macro registry.
pub struct MacroInterpreter {
    synthesizer: Arc<dyn InputSynthesizer>,
    max_depth: usize,
}

impl MacroInterpreter {
    pub fn new(synthesizer: Arc<dyn InputSynthesizer>) -> Self {
        Self {
            synthesizer,
            max_depth: DEFAULT_MAX_MACRO_DEPTH,
        }
    }

    /// Sets how many macro calls may be nested inside one another.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Executes `events` in order, expanding macro calls from `registry`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExecutionError`] encountered.  Remaining events are
    /// not executed.
    pub fn execute(
        &self,
        events: &[Event],
        registry: &MacroRegistry,
    ) -> Result<(), ExecutionError> {
        self.execute_at_depth(events, registry, 0)
    }

    fn execute_at_depth(
        &self,
        events: &[Event],
        registry: &MacroRegistry,
        depth: usize,
    ) -> Result<(), ExecutionError> {
        for event in events {
            self.execute_event(event, registry, depth)?;
        }
        Ok(())
    }

    fn execute_event(
        &self,
        event: &Event,
        registry: &MacroRegistry,
        depth: usize,
    ) -> Result<(), ExecutionError> {
        match event {
            Event::Keystroke(keystroke) => self.run_keystroke(keystroke)?,
            Event::Mouse(mouse) => self.run_mouse(mouse)?,
            Event::Sleep(sleep) => {
                debug!("interpreter: sleeping {} ms", sleep.duration_ms);
                self.synthesizer.pause(sleep.duration());
            }
            Event::Macro(call) => {
                let body = registry
                    .get(&call.name)
                    .ok_or_else(|| ExecutionError::UnknownMacro(call.name.clone()))?;
                if depth >= self.max_depth {
                    return Err(ExecutionError::MacroDepthExceeded {
                        name: call.name.clone(),
                        max_depth: self.max_depth,
                    });
                }
                debug!("interpreter: expanding macro `{}` at depth {}", call.name, depth + 1);
                self.execute_at_depth(body, registry, depth + 1)?;
            }
        }
        Ok(())
    }

    fn run_keystroke(&self, keystroke: &Keystroke) -> Result<(), EmulationError> {
        let keys: Vec<ResolvedKey> = keystroke
            .keys
            .iter()
            .flat_map(|token| resolve(token))
            .collect();
        debug!(
            "interpreter: {:?} keystroke {:?} -> {} key(s)",
            keystroke.mode,
            keystroke.keys,
            keys.len()
        );

        match keystroke.mode {
            KeystrokeMode::Simultaneous => {
                for key in &keys {
                    self.synthesizer.press(*key)?;
                }
                for key in keys.iter().rev() {
                    self.synthesizer.release(*key)?;
                }
            }
            KeystrokeMode::Sequential => {
                for key in keys {
                    self.synthesizer.press(key)?;
                    self.synthesizer.release(key)?;
                }
            }
        }
        Ok(())
    }

    fn run_mouse(&self, mouse: &MouseEvent) -> Result<(), EmulationError> {
        debug!("interpreter: {:?} at ({}, {})", mouse.action, mouse.x, mouse.y);
        match mouse.action {
            MouseAction::LeftClick => self.synthesizer.left_click(mouse.x, mouse.y),
            MouseAction::RightClick => self.synthesizer.right_click(mouse.x, mouse.y),
            MouseAction::DoubleClick => self.synthesizer.double_click(mouse.x, mouse.y),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
