// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core error types, domain types, and validation rules for relayq.
//!
//! This crate has no I/O. It defines the message record model shared by the
//! store and the HTTP boundary, the [`RelayqError`] taxonomy, phone number
//! normalization, and the field-level request validation rules that are
//! enforced both at the HTTP boundary and again inside the store.

pub mod error;
pub mod phone;
pub mod types;
pub mod validate;

pub use error::{FieldError, RelayqError};
pub use phone::normalize_phone;
pub use types::{MessageRecord, MessageStatus};
