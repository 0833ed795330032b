//! Terminal front end for Mindikot.
//!
//! Command parsing and text rendering used by the `mk_client` binary and by
//! the host's own seat in `mk_server`.

pub mod commands;
pub mod display;
