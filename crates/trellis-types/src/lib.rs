//! Foundation types for trellis.
//!
//! This crate contains the types shared by every trellis crate: the error
//! type used by configuration loading and history storage, and the
//! `ShellConfig` that tunes sessions.

pub mod config;
pub mod error;
