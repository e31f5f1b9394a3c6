// /////////////////////////////////////////////////////////////////////////////
// Conveyor RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Error types for the conveyor domain.

pub mod pipeline_error;

pub use pipeline_error::PipelineError;
