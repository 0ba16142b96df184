//! End-to-end tests for the retention pipeline.
//!
//! These tests drive raw payload text through parsing, cutoff computation and
//! filtering, with a fixed clock.

use integration_tests::{fixtures, setup::TestContext};
use retention_core::Error;

/// Test the documented example: a 2020 backup with a one-day window
#[test]
fn test_old_backup_is_selected() {
    let ctx = TestContext::new().with_dest("/dest");
    let lines = ctx.output_lines("1", r#"["backup-20200101-000000-x"]"#);
    assert_eq!(lines, vec!["/dest/backup-20200101-000000-x"]);
}

/// Test names without the pattern produce nothing
#[test]
fn test_non_backup_is_ignored() {
    let ctx = TestContext::new();
    assert!(ctx.output_lines("1", r#"["not-a-backup"]"#).is_empty());
}

/// Test malformed payload degrades to no output
#[test]
fn test_malformed_payload_selects_nothing() {
    let ctx = TestContext::new();
    let outcome = ctx.run("5", "{{{").unwrap();
    assert!(outcome.candidates.is_empty());
    assert_eq!(outcome.stats.scanned, 0);
}

/// Test the cutoff is strict: a backup exactly at the cutoff is kept
#[test]
fn test_daily_backups_cutoff_boundary() {
    let ctx = TestContext::new();
    let names = fixtures::daily_backups(ctx.now, 10);
    let lines = ctx.output_lines("7", &fixtures::json_payload(&names));

    assert_eq!(
        lines,
        vec![
            format!("/srv/backups/{}", names[8]),
            format!("/srv/backups/{}", names[9]),
        ]
    );
}

/// Test output keeps input order rather than timestamp order
#[test]
fn test_output_preserves_input_order() {
    let ctx = TestContext::new().with_dest("d");
    let names = vec![
        "backup-20230101-000000".to_string(),
        "backup-20210101-000000".to_string(),
        "backup-20220101-000000".to_string(),
    ];
    let lines = ctx.output_lines("30", &fixtures::json_payload(&names));
    assert_eq!(
        lines,
        vec![
            "d/backup-20230101-000000",
            "d/backup-20210101-000000",
            "d/backup-20220101-000000",
        ]
    );
}

/// Test every invalid name is skipped silently but counted
#[test]
fn test_invalid_names_are_skipped() {
    let ctx = TestContext::new();
    let mut names = fixtures::invalid_names();
    names.push("backup-20200101-000000".to_string());

    let outcome = ctx.run("1", &fixtures::json_payload(&names)).unwrap();
    assert_eq!(outcome.candidates.len(), 1);
    assert_eq!(outcome.stats.unmatched, 3);
    assert_eq!(outcome.stats.invalid_date, 4);
}

/// Test non-string elements never produce output, even nested names
#[test]
fn test_non_string_items_are_skipped() {
    let ctx = TestContext::new();
    let names = vec!["backup-20200101-000000".to_string()];
    let outcome = ctx.run("1", &fixtures::mixed_json_payload(&names)).unwrap();

    assert_eq!(outcome.candidates.len(), 1);
    assert_eq!(outcome.stats.non_text, 4);
}

/// Test repeated runs give identical output
#[test]
fn test_runs_are_idempotent() {
    let ctx = TestContext::new();
    let payload = fixtures::json_payload(&fixtures::daily_backups(ctx.now, 30));
    assert_eq!(ctx.output_lines("14", &payload), ctx.output_lines("14", &payload));
}

/// Test a negative window moves the cutoff into the future
#[test]
fn test_negative_window_selects_recent_backups() {
    let ctx = TestContext::new();
    let names = fixtures::daily_backups(ctx.now, 3);
    let lines = ctx.output_lines("-1", &fixtures::json_payload(&names));
    assert_eq!(lines.len(), 3);
}

/// Test unusable retention values are fatal
#[test]
fn test_invalid_retention_is_an_error() {
    let ctx = TestContext::new();
    assert!(matches!(
        ctx.run("seven", "[]"),
        Err(Error::InvalidRetention { .. })
    ));
    assert!(matches!(
        ctx.run("-9223372036854775808", "[]"),
        Err(Error::CutoffOutOfRange { .. })
    ));
}

/// Test a cutoff outside years 1 to 9999 is fatal in either direction
#[test]
fn test_cutoff_outside_four_digit_years_is_fatal() {
    let ctx = TestContext::new();
    let payload = r#"["backup-20200101-000000", "backup-99991231-235959"]"#;
    assert!(matches!(
        ctx.run("-3000000", payload),
        Err(Error::CutoffOutOfRange { days: -3_000_000 })
    ));
    assert!(matches!(
        ctx.run("800000", payload),
        Err(Error::CutoffOutOfRange { days: 800_000 })
    ));
}

/// Test trailing slashes on the destination collapse to one separator
#[test]
fn test_destination_prefix_normalized() {
    let ctx = TestContext::new().with_dest("s3://bucket/path///");
    let lines = ctx.output_lines("1", r#"["backup-20200101-000000"]"#);
    assert_eq!(lines, vec!["s3://bucket/path/backup-20200101-000000"]);
}
