//! CLI module for SiteBuddy
//!
//! Handles command-line argument parsing and the interactive chat loop.

pub mod args;
pub mod chat;

pub use args::{Args, Commands, Verbosity};
