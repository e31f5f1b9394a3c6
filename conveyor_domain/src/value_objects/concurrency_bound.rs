// /////////////////////////////////////////////////////////////////////////////
// Conveyor RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Concurrency Bound Value Object
//!
//! The cap on in-flight worker chains within one bounded filter. The bound
//! is fixed at construction and must be at least 1; a bound of 1 serializes
//! the in-flight count without promising arrival order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Validated concurrency cap for a bounded parallel filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct ConcurrencyBound(usize);

impl ConcurrencyBound {
    /// Validates and creates a bound.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfiguration`] when `bound` is zero.
    pub fn new(bound: usize) -> Result<Self, PipelineError> {
        if bound == 0 {
            return Err(PipelineError::invalid_config("concurrency bound must be at least 1"));
        }
        Ok(Self(bound))
    }

    /// The cap as a plain count.
    pub fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ConcurrencyBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for ConcurrencyBound {
    type Error = PipelineError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConcurrencyBound> for usize {
    fn from(bound: ConcurrencyBound) -> Self {
        bound.0
    }
}
