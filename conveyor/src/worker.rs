// /////////////////////////////////////////////////////////////////////////////
// Conveyor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Contract
//!
//! A [`Worker`] is one user-supplied transformation step: it receives an
//! [`Item`] by move, produces a new item (or an error), and may block on
//! external I/O. The engine treats worker bodies as opaque; side effects
//! are permitted and invisible to it.
//!
//! ## Cancellation Obligations
//!
//! Workers receive the run's [`CancellationToken`] and must observe it
//! promptly, returning [`PipelineError::Cancelled`] instead of starting or
//! continuing long blocking operations. The engine additionally checks the
//! token between chain links, so a worker that merely computes can ignore
//! the token and still cancel at the next link boundary.
//!
//! ## Chains
//!
//! A filter owns workers chained left to right: the output of `workers[0]`
//! feeds `workers[1]`, and so on, short-circuiting on the first error. The
//! scheduling discipline of a filter applies to the chain as a whole, never
//! to individual links.

use async_trait::async_trait;
use conveyor_bootstrap::shutdown::CancellationToken;
use conveyor_domain::{Item, PipelineError};
use std::sync::Arc;

/// A single transformation step in a filter's worker chain.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Transforms one item into one item or an error.
    ///
    /// The worker owns `item` and may mutate or replace it. Errors are
    /// per-item: they are routed to the shared error sink and the item is
    /// dropped from the output stream.
    async fn work(&self, ctx: &CancellationToken, item: Item) -> Result<Item, PipelineError>;

    /// Short name used in filter statistics.
    ///
    /// Defaults to the unqualified type name of the implementation.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// Adapts a synchronous closure as a [`Worker`].
///
/// Useful for tests, demos, and cheap pure transformations. The closure
/// runs on the filter's task; long blocking work belongs in a real
/// [`Worker`] implementation that can observe cancellation mid-flight.
pub struct FnWorker<F> {
    label: String,
    transform: F,
}

impl<F> FnWorker<F>
where
    F: Fn(Item) -> Result<Item, PipelineError> + Send + Sync,
{
    /// Wraps `transform` under the given statistics label.
    pub fn new(label: impl Into<String>, transform: F) -> Self {
        Self {
            label: label.into(),
            transform,
        }
    }
}

#[async_trait]
impl<F> Worker for FnWorker<F>
where
    F: Fn(Item) -> Result<Item, PipelineError> + Send + Sync,
{
    async fn work(&self, ctx: &CancellationToken, item: Item) -> Result<Item, PipelineError> {
        if ctx.is_cancelled() {
            return Err(PipelineError::cancelled(format!("worker {} skipped", self.label)));
        }
        (self.transform)(item)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Joins the chain's worker names with `,` to form the filter name used in
/// statistics records.
pub(crate) fn chain_name(workers: &[Arc<dyn Worker>]) -> String {
    workers
        .iter()
        .map(|worker| worker.name())
        .collect::<Vec<_>>()
        .join(",")
}

/// Runs the worker chain left to right, short-circuiting on the first
/// error and checking cancellation before each link.
pub(crate) async fn run_chain(
    ctx: &CancellationToken,
    workers: &[Arc<dyn Worker>],
    mut item: Item,
) -> Result<Item, PipelineError> {
    for worker in workers {
        if ctx.is_cancelled() {
            return Err(PipelineError::cancelled(format!(
                "cancelled before worker {}",
                worker.name()
            )));
        }
        item = worker.work(ctx, item).await?;
    }
    Ok(item)
}
