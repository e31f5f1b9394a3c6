// /////////////////////////////////////////////////////////////////////////////
// Conveyor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bounded Parallel Filter
//!
//! Schedules like [`ParallelFilter`](crate::filter::parallel::ParallelFilter)
//! except that a counting semaphore of capacity N gates task spawning: the
//! driver acquires a permit before spawning each chain and the spawned task
//! releases it on completion. At most N chains are ever in flight.
//!
//! This is the engine's primary backpressure mechanism. During a burst the
//! driver blocks on acquisition, which in turn blocks the producer on the
//! input channel; once downstream consumption resumes, permits free up and
//! the burst drains. Acquisition order equals input order; completion order
//! remains unordered.

use std::sync::Arc;
use std::time::Instant;

use conveyor_bootstrap::shutdown::CancellationToken;
use conveyor_domain::{ConcurrencyBound, FilterKind, FilterStat, FilterStatSnapshot};
use tokio::task::JoinSet;

use crate::filter::{item_channel, process_item, send_error, ErrorSender, Filter, ItemReceiver, DEFAULT_CHANNEL_CAPACITY};
use crate::semaphore::Semaphore;
use crate::worker::{chain_name, Worker};

/// Task-per-item filter stage capped at N in-flight worker chains.
pub struct BoundedParallelFilter {
    semaphore: Semaphore,
    workers: Arc<[Arc<dyn Worker>]>,
    stat: Arc<FilterStat>,
}

impl BoundedParallelFilter {
    /// Creates a bounded filter over the given worker chain.
    pub fn new(bound: ConcurrencyBound, workers: Vec<Arc<dyn Worker>>) -> Self {
        let stat = Arc::new(FilterStat::new(chain_name(&workers), FilterKind::BoundedParallel));
        Self {
            semaphore: Semaphore::new(bound),
            workers: workers.into(),
            stat,
        }
    }

    /// Convenience constructor for a single-worker chain.
    pub fn with_worker(bound: ConcurrencyBound, worker: Arc<dyn Worker>) -> Self {
        Self::new(bound, vec![worker])
    }

    /// The in-flight cap fixed at construction.
    pub fn bound(&self) -> usize {
        self.semaphore.capacity()
    }
}

impl Filter for BoundedParallelFilter {
    fn filter(&self, ctx: CancellationToken, mut input: ItemReceiver, errors: ErrorSender) -> ItemReceiver {
        let (output, receiver) = item_channel(DEFAULT_CHANNEL_CAPACITY);
        let semaphore = self.semaphore.clone();
        let workers = Arc::clone(&self.workers);
        let stat = Arc::clone(&self.stat);

        tokio::spawn(async move {
            let run_started = Instant::now();
            let mut tasks = JoinSet::new();

            while let Some(item) = input.recv().await {
                // Acquired in the driver so acquisition order equals input
                // order; the permit travels into the task.
                let permit = match semaphore.acquire(&ctx).await {
                    Ok(permit) => permit,
                    Err(error) => {
                        // Cancelled while saturated: the item still counts,
                        // and surfaces on the sink like any failed item.
                        stat.record_item();
                        send_error(&errors, error).await;
                        continue;
                    }
                };

                let ctx = ctx.clone();
                let workers = Arc::clone(&workers);
                let stat = Arc::clone(&stat);
                let output = output.clone();
                let errors = errors.clone();
                tasks.spawn(async move {
                    process_item(&ctx, &workers, &stat, item, &output, &errors).await;
                    permit.release();
                });
            }

            while let Some(joined) = tasks.join_next().await {
                if let Err(join_error) = joined {
                    if join_error.is_panic() {
                        tracing::error!(%join_error, "worker chain task panicked");
                    }
                }
            }
            stat.add_duration(run_started.elapsed());
        });

        receiver
    }

    fn name(&self) -> &str {
        self.stat.name()
    }

    fn kind(&self) -> FilterKind {
        FilterKind::BoundedParallel
    }

    fn snapshot(&self) -> FilterStatSnapshot {
        self.stat.snapshot()
    }
}
