// /////////////////////////////////////////////////////////////////////////////
// Conveyor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Common Test Helpers
//!
//! Shared workers and stream helpers for the integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use conveyor::{
    item_channel, CancellationToken, ErrorReceiver, Item, ItemReceiver, PipelineError, Worker,
};

/// Squares a `u64` payload after a small delay.
pub struct SqWorker;

#[async_trait]
impl Worker for SqWorker {
    async fn work(&self, _ctx: &CancellationToken, item: Item) -> Result<Item, PipelineError> {
        tokio::time::sleep(Duration::from_millis(2)).await;
        let n: u64 = item.take_single()?;
        Ok(Item::single(n * n))
    }

    fn name(&self) -> &str {
        "SqWorker"
    }
}

/// Sleeps for a fixed delay, observing cancellation mid-sleep.
pub struct SleepWorker {
    pub delay: Duration,
}

#[async_trait]
impl Worker for SleepWorker {
    async fn work(&self, ctx: &CancellationToken, item: Item) -> Result<Item, PipelineError> {
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => Ok(item),
            _ = ctx.cancelled() => Err(PipelineError::cancelled("sleep interrupted")),
        }
    }

    fn name(&self) -> &str {
        "SleepWorker"
    }
}

/// Sleeps then squares, tracking the concurrent-chain high-water mark.
pub struct SleepSqWorker {
    pub delay: Duration,
    pub current: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
}

impl SleepSqWorker {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            current: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Worker for SleepSqWorker {
    async fn work(&self, _ctx: &CancellationToken, item: Item) -> Result<Item, PipelineError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        let n: u64 = item.take_single()?;
        Ok(Item::single(n * n))
    }

    fn name(&self) -> &str {
        "SleepSqWorker"
    }
}

/// Builds a pre-filled, closed input stream of `u64` payloads.
pub fn feed(values: impl IntoIterator<Item = u64>) -> ItemReceiver {
    let values: Vec<u64> = values.into_iter().collect();
    let (sender, receiver) = item_channel(values.len().max(1));
    for value in values {
        sender
            .try_send(Item::single(value))
            .expect("prefilled channel overflow");
    }
    receiver
}

/// Builds a pre-filled, closed input stream from arbitrary items.
pub fn feed_items(items: Vec<Item>) -> ItemReceiver {
    let (sender, receiver) = item_channel(items.len().max(1));
    for item in items {
        sender.try_send(item).expect("prefilled channel overflow");
    }
    receiver
}

/// Drains an output stream of `u64` payloads into a vector.
pub async fn collect_u64(mut receiver: ItemReceiver) -> Vec<u64> {
    let mut out = Vec::new();
    while let Some(item) = receiver.recv().await {
        out.push(item.take_single::<u64>().expect("non-u64 payload in output"));
    }
    out
}

/// Drains the error sink after the owning sender has been dropped.
pub async fn collect_errors(mut receiver: ErrorReceiver) -> Vec<PipelineError> {
    let mut out = Vec::new();
    while let Some(error) = receiver.recv().await {
        out.push(error);
    }
    out
}
