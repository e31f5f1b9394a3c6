// /////////////////////////////////////////////////////////////////////////////
// Conveyor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the engine layers (domain and
//! infrastructure) and provides the runtime plumbing every consumer of the
//! engine needs:
//!
//! - **Cancellation context** - The [`CancellationToken`] passed through
//!   every filter and worker; all blocking engine operations observe it
//! - **Shutdown coordination** - Grace-period enforcement for turning an
//!   OS signal into a drained, closed pipeline
//! - **Logging initialization** - tracing-subscriber setup with an
//!   environment-driven filter
//!
//! ## Architecture Position
//!
//! Bootstrap can be depended on by the engine crate; the domain layer
//! cannot access bootstrap. This keeps the domain free of async-runtime
//! concerns while letting the engine share one cancellation primitive with
//! the binaries that embed it.
//!
//! ## Module Structure
//!
//! - `logger` - tracing-subscriber initialization
//! - `shutdown` - Cancellation token and shutdown coordination

pub mod logger;
pub mod shutdown;

pub use logger::{init_logging, try_init_logging};
pub use shutdown::{CancellationToken, ShutdownCoordinator};
