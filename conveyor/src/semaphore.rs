// /////////////////////////////////////////////////////////////////////////////
// Conveyor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Counting Semaphore
//!
//! The cancellation-aware counting semaphore gating task spawns inside
//! [`BoundedParallelFilter`](crate::filter::bounded::BoundedParallelFilter).
//!
//! ## Semantics
//!
//! - Capacity is fixed at construction and is at least 1.
//! - [`Semaphore::acquire`] suspends until a permit frees up, checking the
//!   context before queuing and racing against cancellation while queued.
//! - Waiters are served in FIFO order, so acquisition order equals request
//!   order even under contention.
//! - A [`SemaphorePermit`] releases its slot when dropped; an explicit
//!   [`SemaphorePermit::release`] exists for call sites where the handoff
//!   deserves a name.

use conveyor_bootstrap::shutdown::CancellationToken;
use conveyor_domain::{ConcurrencyBound, PipelineError};
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;

/// Counting semaphore with cancellation-aware acquisition.
#[derive(Debug, Clone)]
pub struct Semaphore {
    inner: Arc<tokio::sync::Semaphore>,
    capacity: usize,
}

/// A held slot; dropping it releases the slot back to the semaphore.
#[derive(Debug)]
pub struct SemaphorePermit {
    _permit: OwnedSemaphorePermit,
}

impl SemaphorePermit {
    /// Releases the slot. Equivalent to dropping the permit.
    pub fn release(self) {}
}

impl Semaphore {
    /// Creates a semaphore with `capacity` available slots.
    pub fn new(capacity: ConcurrencyBound) -> Self {
        Self {
            inner: Arc::new(tokio::sync::Semaphore::new(capacity.get())),
            capacity: capacity.get(),
        }
    }

    /// The fixed slot count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently available.
    pub fn available(&self) -> usize {
        self.inner.available_permits()
    }

    /// Acquires a slot, suspending while the semaphore is saturated.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Cancelled`] when the context is cancelled
    /// before or during acquisition.
    pub async fn acquire(&self, ctx: &CancellationToken) -> Result<SemaphorePermit, PipelineError> {
        if ctx.is_cancelled() {
            return Err(PipelineError::cancelled("semaphore acquisition abandoned"));
        }
        tokio::select! {
            result = Arc::clone(&self.inner).acquire_owned() => {
                let permit = result.map_err(|_| PipelineError::internal("semaphore closed"))?;
                Ok(SemaphorePermit { _permit: permit })
            }
            _ = ctx.cancelled() => Err(PipelineError::cancelled("semaphore acquisition interrupted")),
        }
    }
}
