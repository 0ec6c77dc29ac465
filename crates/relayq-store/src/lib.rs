// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message record store, status waiter, and statistics aggregation.
//!
//! Everything in this crate is a thin layer of reads and writes against the
//! messages collection handle from `relayq-firebase`; the external database
//! is the sole durable owner of state.

pub mod records;
pub mod stats;
pub mod waiter;

pub use records::{BulkQueued, MessageStore, NewMessage};
pub use stats::{MessageStats, RecentStats, compute_recent_stats, compute_stats};
pub use waiter::{STATUS_WAIT_TIMEOUT, WaitOutcome, spawn_status_logger, wait_for_status};
