//! Protocol module containing the parent→child hand-off codec.

pub mod handoff;

pub use handoff::{ChildInvocation, HandoffError, CHILD_MODE_MARKER};
