//! wavshape End-to-End Test Infrastructure
//!
//! This crate provides integration tests for the streaming paths:
//!
//! - Round trips: samples -> WAV file -> samples, against `hound` as a
//!   reference implementation
//! - Layout: byte-level checks of the RIFF chunk structure we write and
//!   tolerate on input
//! - Pipeline: input file -> overlap-add processing -> output file
//! - CLI: the `process` and `inspect` commands against real files
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p wavshape-tests
//! ```

pub mod fixtures;
pub mod layout;
