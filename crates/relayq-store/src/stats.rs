// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Statistics aggregation over the messages collection.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, TimeZone, Timelike};
use serde::Serialize;

use relayq_core::types::MessageRecord;
use relayq_core::{MessageStatus, RelayqError};
use relayq_firebase::{CollectionRef, Query};

/// Aggregate statistics over the whole collection.
///
/// All four status counters are always present (0 when no records match).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStats {
    pub total: u64,
    pub pending: u64,
    pub processing: u64,
    pub sent: u64,
    pub error: u64,
    /// UTC calendar date (`YYYY-MM-DD`) to count.
    pub by_date: BTreeMap<String, u64>,
    /// Source tag to count; records without a source bucket as "unknown".
    pub by_source: BTreeMap<String, u64>,
}

/// Statistics over a trailing time window.
///
/// Carries per-status counts and an hourly breakdown instead of the
/// date/source maps of the full scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentStats {
    pub total: u64,
    pub pending: u64,
    pub processing: u64,
    pub sent: u64,
    pub error: u64,
    /// Hour of day (0-23, server's local timezone) to count.
    pub hourly: BTreeMap<String, u64>,
}

/// Scans the whole collection and aggregates statistics.
pub async fn compute_stats(collection: &CollectionRef) -> Result<MessageStats, RelayqError> {
    let records = collection
        .query::<MessageRecord>(&Query::default())
        .await?;

    let mut stats = MessageStats::default();
    for record in records.into_values() {
        stats.total += 1;
        count_status(
            record.status,
            &mut stats.pending,
            &mut stats.processing,
            &mut stats.sent,
            &mut stats.error,
        );

        if let Some(date) = utc_date(record.created_at) {
            *stats.by_date.entry(date).or_insert(0) += 1;
        }

        let source = match record.source.as_deref() {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => "unknown".to_string(),
        };
        *stats.by_source.entry(source).or_insert(0) += 1;
    }

    Ok(stats)
}

/// Aggregates statistics for records with `createdAt >= since`.
///
/// The range filter runs server-side (`orderBy=createdAt&startAt=since`).
pub async fn compute_recent_stats(
    collection: &CollectionRef,
    since: i64,
) -> Result<RecentStats, RelayqError> {
    let query = Query::by_created_at().start_at(since);
    let records = collection.query::<MessageRecord>(&query).await?;

    let mut stats = RecentStats::default();
    for record in records.into_values() {
        stats.total += 1;
        count_status(
            record.status,
            &mut stats.pending,
            &mut stats.processing,
            &mut stats.sent,
            &mut stats.error,
        );

        if let Some(hour) = local_hour(record.created_at) {
            *stats.hourly.entry(hour.to_string()).or_insert(0) += 1;
        }
    }

    Ok(stats)
}

fn count_status(
    status: MessageStatus,
    pending: &mut u64,
    processing: &mut u64,
    sent: &mut u64,
    error: &mut u64,
) {
    match status {
        MessageStatus::Pending => *pending += 1,
        MessageStatus::Processing => *processing += 1,
        MessageStatus::Sent => *sent += 1,
        MessageStatus::Error => *error += 1,
    }
}

/// UTC calendar date of an epoch-millis timestamp.
fn utc_date(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Hour of day in the server's local timezone.
fn local_hour(millis: i64) -> Option<u32> {
    Local.timestamp_millis_opt(millis).single().map(|dt| dt.hour())
}
