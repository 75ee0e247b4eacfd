//! docdbctl library surface
//!
//! The binary is a thin wrapper; everything it does lives here so the
//! integration tests can drive registration, binding, and dispatch directly.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod params;
