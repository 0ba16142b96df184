//! Tests for the two accepted listing notations.

use integration_tests::{fixtures, setup::TestContext};
use retention_core::{parse_payload, Notation, ParseResult};

/// Test JSON and literal listings select the same candidates
#[test]
fn test_notations_are_interchangeable() {
    let ctx = TestContext::new();
    let names = fixtures::daily_backups(ctx.now, 20);

    let from_json = ctx.output_lines("10", &fixtures::json_payload(&names));
    let from_literal = ctx.output_lines("10", &fixtures::literal_payload(&names));

    assert_eq!(from_json.len(), 9);
    assert_eq!(from_json, from_literal);
}

/// Test the literal fallback with a mixed list
#[test]
fn test_literal_list_with_constants() {
    let ctx = TestContext::new().with_dest("/d");
    let payload = "['backup-20200101-000000', 3, None]";

    assert_eq!(parse_payload(payload).notation(), Some(Notation::Literal));
    assert_eq!(ctx.output_lines("1", payload), vec!["/d/backup-20200101-000000"]);
}

/// Test tuples, sets and dict keys are iterated like lists
#[test]
fn test_literal_containers() {
    let ctx = TestContext::new().with_dest("/d");

    let tuple = "('backup-20200101-000000', 'backup-20200102-000000',)";
    assert_eq!(ctx.output_lines("1", tuple).len(), 2);

    let set = "{'backup-20200101-000000', 'backup-20200101-000000'}";
    assert_eq!(ctx.output_lines("1", set), vec!["/d/backup-20200101-000000"]);

    let dict = "{'backup-20200101-000000': 1, 'keep': 2}";
    assert_eq!(ctx.output_lines("1", dict), vec!["/d/backup-20200101-000000"]);
}

/// Test JSON objects contribute their keys in document order
#[test]
fn test_json_object_keys() {
    let ctx = TestContext::new().with_dest("/d");
    let payload = r#"{"backup-20200102-000000": {}, "backup-20200101-000000": {}}"#;
    assert_eq!(
        ctx.output_lines("1", payload),
        vec!["/d/backup-20200102-000000", "/d/backup-20200101-000000"]
    );
}

/// Test multi-line literal listings with comments
#[test]
fn test_literal_multiline_listing() {
    let ctx = TestContext::new().with_dest("/d");
    let payload = "[\n    'backup-20200101-000000',  # oldest\n    \"backup-20240614-000000\",\n]\n";
    assert_eq!(ctx.output_lines("30", payload), vec!["/d/backup-20200101-000000"]);
}

/// Test payloads in neither notation are empty, not errors
#[test]
fn test_unrecognized_payloads_are_empty() {
    for payload in [
        "",
        "   ",
        "{{{",
        "backup-20200101-000000",
        "backup-20200101-000000\nbackup-20200102-000000",
        "[backup-20200101-000000]",
        "<list><item>backup-20200101-000000</item></list>",
    ] {
        assert_eq!(parse_payload(payload), ParseResult::Empty, "{:?}", payload);
    }
}

/// Test a top-level string is not treated as a one-item listing
#[test]
fn test_top_level_string_is_empty() {
    let ctx = TestContext::new();
    assert!(ctx.output_lines("1", r#""backup-20200101-000000""#).is_empty());
    assert!(ctx.output_lines("1", "'backup-20200101-000000'").is_empty());
}

/// Test JSON listings with non-finite numbers still select their backups
#[test]
fn test_json_non_finite_numbers() {
    let ctx = TestContext::new().with_dest("/d");
    let payload = r#"["backup-20200101-000000", NaN, -Infinity]"#;

    assert_eq!(parse_payload(payload).notation(), Some(Notation::Json));
    assert_eq!(ctx.output_lines("1", payload), vec!["/d/backup-20200101-000000"]);
}
