// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field-level request validation rules.
//!
//! These rules are enforced at the HTTP boundary and enforced again by the
//! store before any write, so the store never depends on its callers having
//! validated input.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{FieldError, RelayqError};

/// Maximum message body length in characters.
pub const MESSAGE_MAX_CHARS: usize = 4096;

/// Inclusive bounds on a bulk-send batch.
pub const BULK_MIN_ITEMS: usize = 1;
pub const BULK_MAX_ITEMS: usize = 100;

/// Inclusive bounds on the cleanup age threshold, in days.
pub const CLEANUP_MIN_DAYS: i64 = 1;
pub const CLEANUP_MAX_DAYS: i64 = 365;

/// Accepted pre-normalization phone format: optional `+`, 10-15 digits.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+]?[0-9]{10,15}$").expect("static pattern"));

/// Append a field error for `value` to `errors` if it is not a valid phone
/// number. `field` names the offending request field in the error.
pub fn check_phone_number(field: &str, value: &str, errors: &mut Vec<FieldError>) {
    if value.is_empty() {
        errors.push(FieldError::new(field, "Phone number is required"));
    } else if !PHONE_PATTERN.is_match(value) {
        errors.push(FieldError::new(
            field,
            "Invalid phone number format. Include country code.",
        ));
    }
}

/// Append a field error for `value` to `errors` if it is not a valid message
/// body (1-4096 characters).
pub fn check_message_body(field: &str, value: &str, errors: &mut Vec<FieldError>) {
    if value.is_empty() {
        errors.push(FieldError::new(field, "Message is required"));
    } else if value.chars().count() > MESSAGE_MAX_CHARS {
        errors.push(FieldError::new(
            field,
            "Message must be between 1 and 4096 characters",
        ));
    }
}

/// Validate a single send request. Collects all field errors rather than
/// failing on the first.
pub fn validate_send(phone_number: &str, message: &str) -> Result<(), RelayqError> {
    let mut errors = Vec::new();
    check_phone_number("phoneNumber", phone_number, &mut errors);
    check_message_body("message", message, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(RelayqError::Validation(errors))
    }
}

/// Validate the cleanup age threshold.
pub fn validate_days_old(days: i64) -> Result<(), RelayqError> {
    if (CLEANUP_MIN_DAYS..=CLEANUP_MAX_DAYS).contains(&days) {
        Ok(())
    } else {
        Err(RelayqError::Validation(vec![FieldError::new(
            "daysOld",
            "daysOld must be between 1 and 365",
        )]))
    }
}
