//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! platform CLI adapter and its text decoder, wall-clock sleeping, and
//! config/manifest loading.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod clock;
pub mod command_runner;
pub mod config;
pub mod decode;
pub mod manifest;
pub mod platform;
