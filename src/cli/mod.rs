//! CLI module for argument parsing and output formatting.
//!
//! Arguments are parsed with clap; output is either a terminal report or
//! the JSON session snapshot.

pub mod args;
pub mod output;
