//! Persistent settings.
//!
//! - **`config`** – TOML agent configuration (`config.toml`).

pub mod config;
