//! Short detail summary attached to terminal notifications
//!
//! Built from the persisted Error and Warning rows of an execution:
//! `Issues in: Copy, Delete. Last: <most recent message>`.

use std::collections::BTreeSet;

use arkive_domain::constants::{DETAIL_SUMMARY_MAX_LEN, DETAIL_SUMMARY_TRUNCATE_SUFFIX};
use arkive_domain::{ExecutionLog, LogLevel, OperationType};

/// `None` when there are no Error or Warning rows.
pub fn build_detail_summary(logs: &[ExecutionLog]) -> Option<String> {
    let issues: Vec<&ExecutionLog> = logs
        .iter()
        .filter(|log| match log.level {
            LogLevel::Error | LogLevel::Warning => true,
            LogLevel::Info => false,
        })
        .collect();

    // max_by_key keeps the last of equal timestamps
    let latest = issues.iter().max_by_key(|log| log.timestamp)?;

    let operations: BTreeSet<OperationType> =
        issues.iter().filter_map(|log| log.operation).collect();

    let mut summary = String::new();
    if !operations.is_empty() {
        let labels: Vec<&str> = operations.iter().map(|op| op.label()).collect();
        summary.push_str("Issues in: ");
        summary.push_str(&labels.join(", "));
        summary.push_str(". ");
    }
    summary.push_str("Last: ");
    summary.push_str(latest.message.trim());

    Some(truncate(summary))
}

fn truncate(summary: String) -> String {
    if summary.chars().count() <= DETAIL_SUMMARY_MAX_LEN {
        return summary;
    }
    let keep = DETAIL_SUMMARY_MAX_LEN - DETAIL_SUMMARY_TRUNCATE_SUFFIX.chars().count();
    let mut truncated: String = summary.chars().take(keep).collect();
    truncated.push_str(DETAIL_SUMMARY_TRUNCATE_SUFFIX);
    truncated
}
