//! Deterministic JSON serialization for files written by the client.
//!
//! Output uses 2-space indentation and a trailing newline, UTF-8 without
//! BOM, so repeated writes of the same state are byte-identical.

mod json;

pub use json::*;
