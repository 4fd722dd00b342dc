//! wavshape CLI library.
//!
//! Argument definitions, model/EQ configuration and the `process` and
//! `inspect` commands behind the `wavshape` binary.

pub mod cli_args;
pub mod commands;
pub mod config;
