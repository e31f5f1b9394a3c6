// /////////////////////////////////////////////////////////////////////////////
// Conveyor RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Conveyor Domain
//!
//! The conveyor domain holds the core business types of the streaming
//! pipeline engine. It is completely independent of external concerns like
//! async runtimes, file systems, or logging backends, so every type here can
//! be constructed and exercised in plain synchronous tests.
//!
//! ## Module Structure
//!
//! - [`entities`] - Objects with behavior and mutable state: the [`Item`]
//!   flowing through a pipeline and the [`FilterStat`] accumulator mutated
//!   concurrently by worker tasks.
//! - [`error`] - The [`PipelineError`] taxonomy carried through the engine.
//! - [`value_objects`] - Immutable, self-validating values: pipeline names,
//!   concurrency bounds, and filter kind tags.
//!
//! ## Core Concepts
//!
//! ### Items
//! An [`Item`] is the unit flowing through a pipeline: either a single
//! opaque payload or an ordered aggregate of payloads. Adjacent workers
//! agree on the concrete shape; violations surface as
//! [`PipelineError::InputShape`].
//!
//! ### Statistics
//! Each filter owns a [`FilterStat`] whose counters are mutated with atomic
//! additions so parallel worker tasks never tear a read. Snapshots are
//! point-in-time reads: fields are individually consistent but not jointly
//! atomic.
//!
//! ### Errors
//! Errors in the engine are per-item and non-fatal to a stage. The taxonomy
//! is deliberately narrow; see [`error::PipelineError`].

pub mod entities;
pub mod error;
pub mod value_objects;

pub use entities::filter_stat::{FilterStat, FilterStatSnapshot, PipelineStat};
pub use entities::item::{Item, Payload};
pub use error::PipelineError;
pub use value_objects::concurrency_bound::ConcurrencyBound;
pub use value_objects::filter_kind::FilterKind;
pub use value_objects::pipeline_name::PipelineName;
