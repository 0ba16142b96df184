//! Test fixtures and backup listing generators.

use chrono::{DateTime, Duration, Utc};

/// Backup name stamped with the given instant.
pub fn backup_name_at(ts: DateTime<Utc>, suffix: &str) -> String {
    format!("backup-{}{}", ts.format("%Y%m%d-%H%M%S"), suffix)
}

/// Backup name stamped `days` before `now`.
pub fn backup_name_days_ago(now: DateTime<Utc>, days: i64, suffix: &str) -> String {
    backup_name_at(now - Duration::days(days), suffix)
}

/// One backup per day for the last `n` days, newest first.
pub fn daily_backups(now: DateTime<Utc>, n: i64) -> Vec<String> {
    (0..n)
        .map(|day| backup_name_days_ago(now, day, ".tar.zst"))
        .collect()
}

/// Generate a JSON array payload.
pub fn json_payload(names: &[String]) -> String {
    serde_json::to_string(names).unwrap()
}

/// Generate a literal-notation list payload with single quotes.
pub fn literal_payload(names: &[String]) -> String {
    let quoted: Vec<String> = names
        .iter()
        .map(|name| format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// JSON payload mixing names with values that are not strings.
pub fn mixed_json_payload(names: &[String]) -> String {
    let mut values: Vec<serde_json::Value> = names
        .iter()
        .map(|name| serde_json::Value::String(name.clone()))
        .collect();
    values.insert(0, serde_json::json!(42));
    values.push(serde_json::json!(null));
    values.push(serde_json::json!({"name": "backup-20000101-000000"}));
    values.push(serde_json::json!(["backup-20000101-000000"]));
    serde_json::Value::Array(values).to_string()
}

/// Names that never yield a candidate.
pub fn invalid_names() -> Vec<String> {
    [
        "not-a-backup",
        "backup-2020-01-01",
        "backup-20201301-000000",
        "backup-20200230-000000",
        "backup-20200101-250000",
        "backup-20200101-235960",
        "Backup-20200101-000000",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
