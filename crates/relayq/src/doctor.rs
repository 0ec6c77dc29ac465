// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `relayq doctor` command implementation.
//!
//! Runs diagnostic checks against the configured database to identify
//! configuration issues and connectivity problems before serving.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use serde_json::json;

use relayq_config::RelayqConfig;
use relayq_firebase::{FirebaseClient, FirebaseGateway};

/// Node the write probe uses; records are deleted right after creation.
const PROBE_NODE: &str = "diagnostics";

/// Bound on each network check.
const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Status of a diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: &'static str,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

impl CheckResult {
    fn pass(name: &'static str, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name,
            status: CheckStatus::Pass,
            message: message.into(),
            duration: start.elapsed(),
        }
    }

    fn fail(name: &'static str, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name,
            status: CheckStatus::Fail,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `relayq doctor` command.
///
/// Returns true when every check passed. With `--plain`, disables colored
/// output.
pub async fn run_doctor(config: &RelayqConfig, plain: bool) -> bool {
    let use_color = !plain && std::io::stdout().is_terminal();

    let mut results = vec![check_config(config)];

    // Network checks only make sense once the config itself is usable.
    if let Ok(gateway) = FirebaseGateway::new(&config.firebase) {
        results.push(check_connectivity(&gateway).await);
        results.push(check_read(gateway.client()).await);
        results.push(check_write(gateway.client()).await);
    }

    println!();
    println!("  relayq doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    for result in &results {
        let duration_ms = result.duration.as_millis();
        let line = match result.status {
            CheckStatus::Pass => {
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<16} {} ({duration_ms}ms)",
                        "✓".green(),
                        result.name,
                        result.message
                    )
                } else {
                    format!(
                        "    [OK]   {:<16} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
            CheckStatus::Fail => {
                fail_count += 1;
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<16} {} ({duration_ms}ms)",
                        "✗".red(),
                        result.name,
                        result.message.red()
                    )
                } else {
                    format!(
                        "    [FAIL] {:<16} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
        };
        println!("{line}");
    }

    println!();
    if fail_count > 0 {
        let issue_word = if fail_count == 1 { "issue" } else { "issues" };
        println!("  {fail_count} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    fail_count == 0
}

/// Check the configuration validates cleanly.
fn check_config(config: &RelayqConfig) -> CheckResult {
    let start = Instant::now();
    match relayq_config::validate_config(config) {
        Ok(()) => CheckResult::pass("Configuration", "valid", start),
        Err(errors) => CheckResult::fail("Configuration", format!("{} error(s)", errors.len()), start),
    }
}

/// Check the database answers a connectivity probe.
async fn check_connectivity(gateway: &FirebaseGateway) -> CheckResult {
    let start = Instant::now();
    if gateway.test_connectivity().await {
        CheckResult::pass("Connectivity", "database reachable", start)
    } else {
        CheckResult::fail("Connectivity", "database unreachable", start)
    }
}

/// Check a shallow read succeeds (catches auth and rules problems that a
/// bare connect does not).
async fn check_read(client: &FirebaseClient) -> CheckResult {
    let start = Instant::now();
    match client.shallow_root(CHECK_TIMEOUT).await {
        Ok(()) => CheckResult::pass("Read probe", "shallow read ok", start),
        Err(e) => CheckResult::fail("Read probe", format!("read failed: {e}"), start),
    }
}

/// Check a write and its cleanup delete succeed on the diagnostics node.
async fn check_write(client: &FirebaseClient) -> CheckResult {
    let start = Instant::now();
    let probe = json!({
        "probe": true,
        "at": chrono::Utc::now().timestamp_millis(),
    });
    match client.push(PROBE_NODE, &probe).await {
        Ok(id) => match client.delete(&format!("{PROBE_NODE}/{id}")).await {
            Ok(()) => CheckResult::pass("Write probe", "write and delete ok", start),
            Err(e) => CheckResult::fail("Write probe", format!("cleanup failed: {e}"), start),
        },
        Err(e) => CheckResult::fail("Write probe", format!("write failed: {e}"), start),
    }
}
