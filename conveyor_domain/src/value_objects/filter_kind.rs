// /////////////////////////////////////////////////////////////////////////////
// Conveyor RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Filter Kind Tag
//!
//! The scheduling discipline tag attached to every statistics record. The
//! serialized names match the filter type names so records stay readable
//! when tailed by an external shipper.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scheduling discipline of a filter, as recorded in statistics.
///
/// `Pipeline` tags the synthetic aggregate view a pipeline exposes when it
/// presents itself as if it were a single filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    #[serde(rename = "SerialFilter")]
    Serial,
    #[serde(rename = "ParallelFilter")]
    Parallel,
    #[serde(rename = "BoundedParallelFilter")]
    BoundedParallel,
    #[serde(rename = "Pipeline")]
    Pipeline,
}

impl FilterKind {
    /// The serialized tag name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Serial => "SerialFilter",
            FilterKind::Parallel => "ParallelFilter",
            FilterKind::BoundedParallel => "BoundedParallelFilter",
            FilterKind::Pipeline => "Pipeline",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
