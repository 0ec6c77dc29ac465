// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store and the HTTP boundary.
//!
//! Wire field names are camelCase to stay compatible with records that
//! other producers already write into the same collection.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a queued message.
///
/// Records are always written as `pending`. Every later transition is made
/// by the external sender process; relayq only observes those transitions.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageStatus {
    /// Queued, not yet picked up by a sender.
    #[default]
    Pending,
    /// Picked up by a sender, delivery in progress.
    Processing,
    /// Delivered by the sender.
    Sent,
    /// The sender gave up on this record.
    Error,
}

impl MessageStatus {
    /// Terminal statuses are the only ones eligible for the cleanup sweep.
    pub fn is_terminal(self) -> bool {
        matches!(self, MessageStatus::Sent | MessageStatus::Error)
    }
}

/// One queued outbound message as stored in the external database.
///
/// The record id is the store-generated key and lives outside the record
/// body, exactly as the database lays it out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// Normalized recipient number: `+` followed by digits only.
    pub phone_number: String,
    /// Message body, 1-4096 characters.
    pub message: String,
    /// Lifecycle status; absent in foreign records means `pending`.
    #[serde(default)]
    pub status: MessageStatus,
    /// Creation time, epoch milliseconds. Set once, immutable.
    pub created_at: i64,
    /// Producer tag (`api`, `api-bulk`, or foreign values). Missing sources
    /// bucket as "unknown" in statistics.
    #[serde(default)]
    pub source: Option<String>,
}

/// Source tag written by the single-send path.
pub const SOURCE_API: &str = "api";

/// Source tag written by the bulk-send path.
pub const SOURCE_API_BULK: &str = "api-bulk";
