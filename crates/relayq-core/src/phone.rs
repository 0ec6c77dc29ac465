// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number normalization.

/// Normalize a phone number to `+` followed by its digit-only subsequence.
///
/// All non-digit characters (including any existing `+`) are stripped, then a
/// single `+` is prepended. Normalizing an already-normalized number is a
/// no-op, so at most one leading `+` is ever present.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("+{digits}")
}
