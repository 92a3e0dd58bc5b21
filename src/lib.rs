//! Avikit - AVI container inspection and re-muxing
//!
//! This library crate exposes the command implementations for integration testing.

pub mod commands;
pub mod config;
