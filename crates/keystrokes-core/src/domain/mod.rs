//! Domain entities for keystrokes.
//!
//! This module contains the command language itself, with no infrastructure
//! dependencies:
//!
//! - [`event`] – the four event kinds and the all-or-nothing parser that
//!   builds them from JSON-like payloads.
//! - [`registry`] – the name → events mapping that macro calls are looked up
//!   in at execution time.
//!
//! Entities are created per invocation and discarded afterwards; nothing here
//! holds process-wide state.

pub mod event;
pub mod registry;
