//! Command implementations for the Tessera CLI
//!
//! Each command module handles the CLI interface and delegates to
//! tessera-render for the actual work.

pub mod components;
pub mod render;
