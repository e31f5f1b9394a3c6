// /////////////////////////////////////////////////////////////////////////////
// Conveyor RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Name Value Object
//!
//! A validated, human-readable pipeline identifier. The name doubles as the
//! prefix of the statistics sink file created in the temp directory, so the
//! accepted alphabet is restricted to characters that are safe in a file
//! name on every supported platform.
//!
//! ## Validation Rules
//!
//! - Not empty after trimming surrounding whitespace
//! - At most 128 characters
//! - ASCII alphanumeric plus `-` and `_` only

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Validated pipeline identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PipelineName(String);

impl PipelineName {
    /// Maximum accepted length in characters.
    pub const MAX_LENGTH: usize = 128;

    /// Validates and creates a pipeline name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfiguration`] when the name is
    /// empty, too long, or contains characters outside the file-safe
    /// alphabet.
    pub fn new(name: impl Into<String>) -> Result<Self, PipelineError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::invalid_config("pipeline name must not be empty"));
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(PipelineError::invalid_config(format!(
                "pipeline name exceeds {} characters",
                Self::MAX_LENGTH
            )));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(PipelineError::invalid_config(format!(
                "pipeline name '{trimmed}' may only contain ASCII alphanumerics, '-' and '_'"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The validated name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PipelineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PipelineName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for PipelineName {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PipelineName {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PipelineName> for String {
    fn from(name: PipelineName) -> Self {
        name.0
    }
}
