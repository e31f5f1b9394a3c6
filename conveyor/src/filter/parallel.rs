// /////////////////////////////////////////////////////////////////////////////
// Conveyor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Parallel Filter
//!
//! Spawns an independent task per arriving item; worker chains run
//! concurrently and completion order is observable downstream. There is no
//! cap on in-flight tasks, so this variant is only appropriate when the
//! upstream is known to be bounded; use
//! [`BoundedParallelFilter`](crate::filter::bounded::BoundedParallelFilter)
//! everywhere else.
//!
//! The driver tracks outstanding tasks in a `JoinSet`: after the input
//! drains it awaits every task, then lets the output close, which is what
//! guarantees that the output stream closes exactly when all in-flight
//! work has completed.

use std::sync::Arc;
use std::time::Instant;

use conveyor_bootstrap::shutdown::CancellationToken;
use conveyor_domain::{FilterKind, FilterStat, FilterStatSnapshot};
use tokio::task::JoinSet;

use crate::filter::{item_channel, process_item, ErrorSender, Filter, ItemReceiver, DEFAULT_CHANNEL_CAPACITY};
use crate::worker::{chain_name, Worker};

/// Unbounded task-per-item filter stage.
pub struct ParallelFilter {
    workers: Arc<[Arc<dyn Worker>]>,
    stat: Arc<FilterStat>,
}

impl ParallelFilter {
    /// Creates a parallel filter over the given worker chain.
    pub fn new(workers: Vec<Arc<dyn Worker>>) -> Self {
        let stat = Arc::new(FilterStat::new(chain_name(&workers), FilterKind::Parallel));
        Self {
            workers: workers.into(),
            stat,
        }
    }

    /// Convenience constructor for a single-worker chain.
    pub fn with_worker(worker: Arc<dyn Worker>) -> Self {
        Self::new(vec![worker])
    }
}

impl Filter for ParallelFilter {
    fn filter(&self, ctx: CancellationToken, mut input: ItemReceiver, errors: ErrorSender) -> ItemReceiver {
        let (output, receiver) = item_channel(DEFAULT_CHANNEL_CAPACITY);
        let workers = Arc::clone(&self.workers);
        let stat = Arc::clone(&self.stat);

        tokio::spawn(async move {
            let run_started = Instant::now();
            let mut tasks = JoinSet::new();

            while let Some(item) = input.recv().await {
                let ctx = ctx.clone();
                let workers = Arc::clone(&workers);
                let stat = Arc::clone(&stat);
                let output = output.clone();
                let errors = errors.clone();
                tasks.spawn(async move {
                    process_item(&ctx, &workers, &stat, item, &output, &errors).await;
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
            // Driver's `output` drops here, after the last task clone; the
            // stream closes with no in-flight work remaining.
        });

        receiver
    }

    fn name(&self) -> &str {
        self.stat.name()
    }

    fn kind(&self) -> FilterKind {
        FilterKind::Parallel
    }

    fn snapshot(&self) -> FilterStatSnapshot {
        self.stat.snapshot()
    }
}
