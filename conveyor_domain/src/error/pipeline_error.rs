// /////////////////////////////////////////////////////////////////////////////
// Conveyor RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! This module provides the error taxonomy carried through the conveyor
//! engine. The taxonomy is deliberately narrow: the engine never terminates
//! because a worker failed, so almost every variant describes a per-item,
//! non-fatal condition that is routed to the shared error sink while the
//! stage keeps draining its input.
//!
//! ## Error Categories
//!
//! ### Per-Item Errors (routed to the error sink)
//! - **InputShape**: a worker received an item whose variant or inner types
//!   did not match its expectation
//! - **WorkerFailure**: an error returned by user worker code
//! - **Cancelled**: the context was cancelled before or during processing;
//!   the stage continues draining, and every subsequent item also fails
//!   with `Cancelled`
//!
//! ### Out-of-Band Errors (never reach the error sink)
//! - **StatsWrite**: the statistics extractor failed to serialize or append
//!   a record; logged, and the timer continues
//! - **InvalidConfiguration**: construction-time validation failures such as
//!   an empty pipeline name or a zero concurrency bound
//! - **Internal**: unexpected engine failures
//!
//! ## Propagation Policy
//!
//! Filters and the pipeline do not catch, retry, or transform errors;
//! retries are a worker-level concern. An item whose worker chain failed is
//! dropped from the output stream, so downstream stages see a strictly
//! smaller stream.

use thiserror::Error;

/// Domain-specific errors for the conveyor pipeline engine.
///
/// Each variant carries a descriptive message. Errors are `Clone` so they
/// can be logged and counted without taking them out of the sink.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Input shape mismatch: {0}")]
    InputShape(String),

    #[error("Worker failure: {0}")]
    WorkerFailure(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Statistics write failed: {0}")]
    StatsWrite(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Creates a new input-shape error
    pub fn input_shape(msg: impl Into<String>) -> Self {
        Self::InputShape(msg.into())
    }

    /// Creates a new worker-failure error
    pub fn worker_failure(msg: impl Into<String>) -> Self {
        Self::WorkerFailure(msg.into())
    }

    /// Creates a new cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Creates a new statistics-write error
    pub fn stats_write(msg: impl Into<String>) -> Self {
        Self::StatsWrite(msg.into())
    }

    /// Creates a new configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Checks whether the error is a cancellation
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PipelineError::Cancelled(_))
    }

    /// Checks whether the error is per-item (routed to the error sink)
    /// rather than a construction-time or bookkeeping failure.
    pub fn is_per_item(&self) -> bool {
        matches!(
            self,
            PipelineError::InputShape(_) | PipelineError::WorkerFailure(_) | PipelineError::Cancelled(_)
        )
    }
}
