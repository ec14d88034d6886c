//! Shared utilities for opsdeck.
//!
//! This crate provides common utilities used across the opsdeck workspace:
//! - ULID-based identifier generation
//! - Logging setup with tracing
//! - Lexical path helpers

pub mod id;
pub mod log;
pub mod path;

pub use id::Identifier;
