// /////////////////////////////////////////////////////////////////////////////
// Conveyor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Filter Stages
//!
//! A filter is one stage of a pipeline: it reads a lazy stream of items,
//! runs each item through its worker chain, and writes survivors to a lazy
//! output stream while routing per-item errors to a shared sink. The three
//! implementations differ only in how they schedule chain runs:
//!
//! - [`serial::SerialFilter`] - one item at a time, arrival order preserved
//! - [`parallel::ParallelFilter`] - one task per item, unbounded
//! - [`bounded::BoundedParallelFilter`] - up to N tasks, gated by a
//!   counting semaphore
//!
//! ## Stream Contract
//!
//! Streams are bounded `tokio::sync::mpsc` channels. The producer closes
//! the input by dropping its sender; the filter closes the output exactly
//! when the input has drained and every in-flight chain has completed. The
//! error sink is shared by all stages of a pipeline and is closed by its
//! external owner after the output has been fully drained; filters only
//! ever hold clones.
//!
//! ## Accounting
//!
//! Every received item is counted, its chain time is added to the work
//! counter, and the time spent handing the result downstream (or to the
//! error sink) is added to the waiting counter. Under backpressure the
//! waiting counter is where the time accumulates.

pub mod bounded;
pub mod parallel;
pub mod serial;

use std::sync::Arc;
use std::time::Instant;

use conveyor_bootstrap::shutdown::CancellationToken;
use conveyor_domain::{FilterKind, FilterStat, FilterStatSnapshot, Item, PipelineError};
use tokio::sync::mpsc;

use crate::worker::{run_chain, Worker};

pub use bounded::BoundedParallelFilter;
pub use parallel::ParallelFilter;
pub use serial::SerialFilter;

/// Default capacity of the item channels between stages.
///
/// Kept small so a slow consumer exerts backpressure on the producer
/// almost immediately; raising it trades memory for burst absorption.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Sending half of an item stream.
pub type ItemSender = mpsc::Sender<Item>;
/// Receiving half of an item stream.
pub type ItemReceiver = mpsc::Receiver<Item>;
/// Sending half of the shared error sink.
pub type ErrorSender = mpsc::Sender<PipelineError>;
/// Receiving half of the shared error sink.
pub type ErrorReceiver = mpsc::Receiver<PipelineError>;

/// Creates a bounded item stream.
pub fn item_channel(capacity: usize) -> (ItemSender, ItemReceiver) {
    mpsc::channel(capacity.max(1))
}

/// Creates a bounded error sink.
pub fn error_channel(capacity: usize) -> (ErrorSender, ErrorReceiver) {
    mpsc::channel(capacity.max(1))
}

/// One stage of a pipeline.
///
/// Implementations are cheap to share (`Arc<dyn Filter>`); a single filter
/// value runs one filter loop per pipeline run, accumulating into the same
/// statistics across runs.
pub trait Filter: Send + Sync {
    /// Starts the filter loop over `input`, returning the output stream.
    ///
    /// The call returns immediately; the loop is driven lazily by
    /// consumption of the returned receiver. Per-item errors go to
    /// `errors`, which the filter never closes.
    fn filter(&self, ctx: CancellationToken, input: ItemReceiver, errors: ErrorSender) -> ItemReceiver;

    /// The filter name, derived from its worker chain.
    fn name(&self) -> &str;

    /// The scheduling discipline tag.
    fn kind(&self) -> FilterKind;

    /// A point-in-time snapshot of the filter's counters.
    fn snapshot(&self) -> FilterStatSnapshot;
}

/// Runs one item through the chain with full statistics bookkeeping, then
/// routes the outcome.
///
/// Shared by all three scheduling disciplines; in the parallel variants it
/// is the body of each spawned task.
pub(crate) async fn process_item(
    ctx: &CancellationToken,
    workers: &[Arc<dyn Worker>],
    stat: &FilterStat,
    item: Item,
    output: &ItemSender,
    errors: &ErrorSender,
) {
    stat.record_item();

    let started = Instant::now();
    let result = run_chain(ctx, workers, item).await;
    stat.add_work(started.elapsed());

    let started = Instant::now();
    match result {
        Ok(item) => send_output(ctx, output, errors, item).await,
        Err(error) => send_error(errors, error).await,
    }
    stat.add_waiting(started.elapsed());
}

/// Pushes a transformed item downstream, turning an abandoned send into a
/// cancellation error on the sink.
async fn send_output(ctx: &CancellationToken, output: &ItemSender, errors: &ErrorSender, item: Item) {
    tokio::select! {
        biased;
        result = output.send(item) => {
            if result.is_err() {
                // The downstream receiver is gone; nothing left to hand the
                // item to. Continue draining so the stage can close.
                tracing::debug!("output stream dropped before item could be delivered");
            }
        }
        _ = ctx.cancelled() => {
            send_error(errors, PipelineError::cancelled("item abandoned while waiting on downstream")).await;
        }
    }
}

/// Delivers a per-item error to the shared sink.
///
/// Never raced against cancellation: the sink must keep receiving the
/// cancellation errors produced during a drain. The sink owner closes it
/// only after the output stream is exhausted.
pub(crate) async fn send_error(errors: &ErrorSender, error: PipelineError) {
    if errors.send(error).await.is_err() {
        tracing::debug!("error sink closed before error could be delivered");
    }
}
