// /////////////////////////////////////////////////////////////////////////////
// Conveyor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Conveyor
//!
//! A streaming pipeline engine: a linear chain of asynchronous filter
//! stages transforming a lazy stream of opaque items into an output stream,
//! while per-item errors flow to a shared side channel, per-stage runtime
//! statistics accumulate, and cancellation propagates cooperatively through
//! every suspension point.
//!
//! ## Core Concepts
//!
//! ### Items and Workers
//! An [`Item`] is a tagged variant over opaque payloads; a [`Worker`] is a
//! user-supplied transformation from item to item (or error). Adjacent
//! workers agree on the payload shapes they exchange.
//!
//! ### Filters
//! A [`Filter`] wraps a worker chain with a scheduling discipline:
//!
//! - [`SerialFilter`] - one item at a time, arrival order preserved
//! - [`ParallelFilter`] - a task per item, unbounded, completion order
//! - [`BoundedParallelFilter`] - at most N chains in flight, gated by a
//!   FIFO counting [`Semaphore`]; the engine's backpressure mechanism
//!
//! ### Pipelines
//! A [`Pipeline`] composes filters end to end over one shared error sink
//! and exposes per-run counters, aggregate snapshots, and a periodic
//! statistics extractor appending line-oriented JSON records to a sink
//! file.
//!
//! ## Stream Ownership
//!
//! The producer closes the input stream; each filter closes its output
//! exactly when its input has drained and its in-flight work finished; the
//! caller closes the error sink only after fully draining the final
//! output.
//!
//! ## Quick Start
//!
//! See [`pipeline`] for a complete worked example.

pub mod filter;
pub mod pipeline;
pub mod semaphore;
pub mod stats;
pub mod worker;

// The cancellation context is defined by the bootstrap layer so binaries
// and the engine share one primitive; re-exported for worker implementors.
pub use conveyor_bootstrap::shutdown::CancellationToken;

pub use conveyor_domain::{
    ConcurrencyBound, FilterKind, FilterStat, FilterStatSnapshot, Item, Payload, PipelineError, PipelineName,
    PipelineStat,
};

pub use filter::{
    error_channel, item_channel, BoundedParallelFilter, ErrorReceiver, ErrorSender, Filter, ItemReceiver, ItemSender,
    ParallelFilter, SerialFilter, DEFAULT_CHANNEL_CAPACITY,
};
pub use pipeline::Pipeline;
pub use semaphore::{Semaphore, SemaphorePermit};
pub use worker::{FnWorker, Worker};
