// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Firebase Realtime Database REST gateway for relayq.
//!
//! The database owns all durable state; this crate is the only code that
//! talks to it. [`FirebaseClient`] wraps the REST surface (push, read,
//! range queries, delete, SSE streaming), and [`FirebaseGateway`] layers the
//! session lifecycle on top: bounded-retry initialization, an idempotent
//! ready flag, and a connectivity probe that never errors.

pub mod client;
pub mod gateway;
pub mod retry;
pub mod stream;

pub use client::{FirebaseClient, Query};
pub use gateway::{CollectionRef, FirebaseGateway, is_valid_key};
pub use stream::{DbEvent, EventPayload};
