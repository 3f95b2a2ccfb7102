//! Subtick Bridge library target.
//!
//! The binary entry point is in `main.rs`; this file exists so `tests/*.rs`
//! can import the bridge's logic.

pub mod config;
pub mod keyboard;
pub mod terminal;
pub mod util;
