// /////////////////////////////////////////////////////////////////////////////
// Conveyor RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Items
//!
//! This module defines [`Item`], the unit flowing through a pipeline. An
//! item is a tagged variant over opaque payloads:
//!
//! - [`Item::Single`] carries one payload
//! - [`Item::Parts`] carries an ordered, index-addressed list of payloads,
//!   for workers that produce or consume multiple typed values
//!
//! The concrete payload types are an agreement between adjacent workers;
//! the engine never inspects them. Every shape violation (wrong variant,
//! wrong inner type, index out of range) surfaces as
//! [`PipelineError::InputShape`] with a message naming the expectation.
//!
//! ## Ownership
//!
//! Items are passed by move across stage boundaries. No two stages ever
//! hold the same item simultaneously, so a worker may freely mutate the
//! item it received.
//!
//! ## Usage
//!
//! ```rust
//! use conveyor_domain::Item;
//!
//! let item = Item::single(21u64);
//! let n: u64 = item.take_single().unwrap();
//! assert_eq!(n * 2, 42);
//!
//! let mut item = Item::single("thumbnail".to_string());
//! item.push_part(Item::payload(1024u32));
//! assert_eq!(item.part_count(), 2);
//! assert_eq!(item.part_ref::<u32>(1).unwrap(), &1024);
//! ```

use std::any::{type_name, Any};
use std::fmt;

use crate::error::PipelineError;

/// An opaque payload carried by an [`Item`].
///
/// Payloads must be `Send` because items cross task boundaries inside
/// parallel filters.
pub type Payload = Box<dyn Any + Send>;

/// The unit flowing through a pipeline.
pub enum Item {
    /// A plain payload.
    Single(Payload),
    /// An aggregate with an ordered, index-addressed list of parts.
    Parts(Vec<Payload>),
}

impl Item {
    /// Wraps a value as a single-payload item.
    pub fn single<T: Any + Send>(value: T) -> Self {
        Item::Single(Box::new(value))
    }

    /// Builds an aggregate item from pre-boxed parts, preserving order.
    pub fn from_parts(parts: Vec<Payload>) -> Self {
        Item::Parts(parts)
    }

    /// Boxes a value as a [`Payload`], for use with [`Item::from_parts`]
    /// and [`Item::push_part`].
    pub fn payload<T: Any + Send>(value: T) -> Payload {
        Box::new(value)
    }

    /// Returns `true` for the single-payload variant.
    pub fn is_single(&self) -> bool {
        matches!(self, Item::Single(_))
    }

    /// Returns `true` for the aggregate variant.
    pub fn is_parts(&self) -> bool {
        matches!(self, Item::Parts(_))
    }

    /// Number of addressable parts. A single payload counts as one.
    pub fn part_count(&self) -> usize {
        match self {
            Item::Single(_) => 1,
            Item::Parts(parts) => parts.len(),
        }
    }

    /// Consumes the item, downcasting its single payload to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InputShape`] if the item is an aggregate or
    /// if the payload is not a `T`.
    pub fn take_single<T: Any>(self) -> Result<T, PipelineError> {
        match self {
            Item::Single(payload) => downcast_payload(payload),
            Item::Parts(parts) => Err(PipelineError::input_shape(format!(
                "expected a single {} payload, found an aggregate of {} parts",
                type_name::<T>(),
                parts.len()
            ))),
        }
    }

    /// Consumes the item, returning its ordered parts.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InputShape`] if the item is a single
    /// payload.
    pub fn take_parts(self) -> Result<Vec<Payload>, PipelineError> {
        match self {
            Item::Parts(parts) => Ok(parts),
            Item::Single(_) => Err(PipelineError::input_shape(
                "expected an aggregate item, found a single payload",
            )),
        }
    }

    /// Borrows the part at `index`, downcast to `T`. Index 0 of a single
    /// payload addresses the payload itself.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InputShape`] if the index is out of range
    /// or the part is not a `T`.
    pub fn part_ref<T: Any>(&self, index: usize) -> Result<&T, PipelineError> {
        let payload = match self {
            Item::Single(payload) if index == 0 => payload,
            Item::Single(_) => {
                return Err(PipelineError::input_shape(format!(
                    "part index {index} out of range for a single payload"
                )));
            }
            Item::Parts(parts) => parts.get(index).ok_or_else(|| {
                PipelineError::input_shape(format!(
                    "part index {index} out of range, item has {} parts",
                    parts.len()
                ))
            })?,
        };
        payload.downcast_ref::<T>().ok_or_else(|| {
            PipelineError::input_shape(format!("part {index} is not a {}", type_name::<T>()))
        })
    }

    /// Appends a part, promoting a single payload to an aggregate whose
    /// first part is the previous payload.
    pub fn push_part(&mut self, payload: Payload) {
        match std::mem::replace(self, Item::Parts(Vec::new())) {
            Item::Single(first) => *self = Item::Parts(vec![first, payload]),
            Item::Parts(mut parts) => {
                parts.push(payload);
                *self = Item::Parts(parts);
            }
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Single(_) => write!(f, "Item::Single(<payload>)"),
            Item::Parts(parts) => write!(f, "Item::Parts({} parts)", parts.len()),
        }
    }
}

/// Unboxes a [`Payload`] into a concrete `T`.
///
/// # Errors
///
/// Returns [`PipelineError::InputShape`] naming `T` when the payload holds
/// a different type.
pub fn downcast_payload<T: Any>(payload: Payload) -> Result<T, PipelineError> {
    payload
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| PipelineError::input_shape(format!("payload is not a {}", type_name::<T>())))
}
