//! Best-effort name extraction from EventBridge rule and target ARNs.
//!
//! Malformed input yields an empty string.

use std::sync::LazyLock;

use regex::Regex;

/// Last `/` segment after `:rule/`, e.g. `...:rule/<bus>/<name>` or `...:rule/<name>`.
static RULE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":rule/(?:.*/)?([^/]+)$").expect("valid rule regex"));

/// `...:<resource-type>/<name>[/...]`.
static TARGET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":[A-Za-z0-9-]+/([^/]+)").expect("valid target regex"));

/// Rule name from a rule ARN.
pub fn rule_name(rule_arn: &str) -> String {
    capture(&RULE_NAME, rule_arn)
}

/// Target name from a target ARN.
pub fn target_name(target_arn: &str) -> String {
    capture(&TARGET_NAME, target_arn)
}

/// Application short code: text before the first `.` of a rule name.
pub fn subscriber_app(rule_name: &str) -> String {
    match rule_name.split_once('.') {
        Some((app, _)) => app.to_string(),
        None => String::new(),
    }
}

fn capture(pattern: &Regex, input: &str) -> String {
    pattern
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
