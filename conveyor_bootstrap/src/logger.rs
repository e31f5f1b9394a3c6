// /////////////////////////////////////////////////////////////////////////////
// Conveyor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Logger
//!
//! tracing-subscriber initialization for binaries and test harnesses that
//! embed the engine.
//!
//! ## Design Rationale
//!
//! The engine itself only emits through the `tracing` macros and never
//! installs a subscriber; which subscriber runs, and at which level, is a
//! decision for the embedding process. This module provides that decision
//! in one place:
//!
//! - **Environment-driven** - `RUST_LOG` wins when set
//! - **Fallback directive** - callers pass the default filter for when the
//!   environment is silent
//! - **Idempotent variant** - [`try_init_logging`] for test harnesses where
//!   several tests race to install the global subscriber

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Error raised when logging initialization fails.
#[derive(Debug, Error)]
pub enum LoggingInitError {
    #[error("global tracing subscriber already installed")]
    AlreadyInitialized,
}

/// Builds the environment filter: `RUST_LOG` if present, otherwise the
/// caller's default directive.
fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install the global tracing subscriber, panicking if one is already set.
///
/// Intended for binary entry points, where a double install is a bug.
pub fn init_logging(default_directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .with_target(true)
        .init();
}

/// Install the global tracing subscriber if none is set yet.
///
/// # Errors
///
/// Returns [`LoggingInitError::AlreadyInitialized`] when a subscriber was
/// installed earlier; callers in test harnesses usually ignore this.
pub fn try_init_logging(default_directive: &str) -> Result<(), LoggingInitError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .with_target(true)
        .try_init()
        .map_err(|_| LoggingInitError::AlreadyInitialized)
}
