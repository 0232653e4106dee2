//! Integration tests for rule derivation and record validation.
//!
//! These exercise the rules a form definition implies (required flags,
//! kind formats, numeric bounds) plus explicit overrides and
//! record-level rules.

use chrono::NaiveDate;

use formwork_model::{FieldKind, FieldSpec, FieldValue, FormDefinition, Record};
use formwork_validate::{FieldRule, Issue, RECORD_KEY, RuleSet};

fn make_definition() -> FormDefinition {
    FormDefinition::from_fields(vec![
        FieldSpec::new("name", FieldKind::Text)
            .with_label("Full name")
            .required(),
        FieldSpec::new("email", FieldKind::Email).with_label("Email"),
        FieldSpec::new("age", FieldKind::Number)
            .with_label("Age")
            .with_min(0.0)
            .with_max(130.0),
        FieldSpec::new("country", FieldKind::Select)
            .with_label("Country")
            .required(),
        FieldSpec::new("stay", FieldKind::DateRange).with_label("Stay"),
    ])
}

fn make_record(entries: &[(&str, FieldValue)]) -> Record {
    let mut record = Record::new();
    for (field, value) in entries {
        record.set(*field, value.clone());
    }
    record
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn required_text_uses_label_in_message() {
    let rules = RuleSet::derive(&make_definition());
    let record = make_record(&[("country", FieldValue::choice("NL", "Netherlands"))]);

    let report = rules.validate(&record);

    let issue = report.error_for("name").expect("error for name");
    assert_eq!(issue.message(), "Full name is required");
    assert!(matches!(issue, Issue::RequiredEmpty { .. }));
}

#[test]
fn required_select_reports_unselected() {
    let rules = RuleSet::derive(&make_definition());
    let record = make_record(&[("name", FieldValue::text("Ada"))]);

    let report = rules.validate(&record);

    let issue = report.error_for("country").expect("error for country");
    assert!(matches!(issue, Issue::RequiredUnselected { .. }));
    assert_eq!(issue.message(), "Country is required");
}

#[test]
fn complete_record_passes() {
    let rules = RuleSet::derive(&make_definition());
    let record = make_record(&[
        ("name", FieldValue::text("Ada")),
        ("email", FieldValue::text("ada@example.org")),
        ("age", FieldValue::number(36.0)),
        ("country", FieldValue::choice("NL", "Netherlands")),
    ]);

    let report = rules.validate(&record);

    assert!(report.is_valid(), "unexpected issues: {:?}", report.issues);
}

#[test]
fn optional_empty_fields_pass() {
    let rules = RuleSet::derive(&make_definition());
    let record = make_record(&[
        ("name", FieldValue::text("Ada")),
        ("country", FieldValue::choice("NL", "Netherlands")),
        ("email", FieldValue::Empty),
    ]);

    assert!(rules.validate(&record).is_valid());
}

#[test]
fn email_kind_checks_format_when_non_empty() {
    let rules = RuleSet::derive(&make_definition());
    let record = make_record(&[
        ("name", FieldValue::text("Ada")),
        ("country", FieldValue::choice("NL", "Netherlands")),
        ("email", FieldValue::text("not-an-address")),
    ]);

    let report = rules.validate(&record);

    let issue = report.error_for("email").expect("error for email");
    assert!(matches!(issue, Issue::InvalidEmail { .. }));
}

#[test]
fn number_bounds_come_from_the_spec() {
    let rules = RuleSet::derive(&make_definition());
    let record = make_record(&[
        ("name", FieldValue::text("Ada")),
        ("country", FieldValue::choice("NL", "Netherlands")),
        ("age", FieldValue::number(200.0)),
    ]);

    let report = rules.validate(&record);

    let issue = report.error_for("age").expect("error for age");
    assert!(matches!(issue, Issue::AboveMaximum { .. }));
    assert_eq!(issue.message(), "Age must be at most 130 (found 200)");
}

#[test]
fn shape_mismatch_is_reported_before_other_checks() {
    let rules = RuleSet::derive(&make_definition());
    let record = make_record(&[
        ("name", FieldValue::number(7.0)),
        ("country", FieldValue::choice("NL", "Netherlands")),
    ]);

    let report = rules.validate(&record);

    let issue = report.error_for("name").expect("error for name");
    assert!(matches!(issue, Issue::ShapeMismatch { .. }));
}

#[test]
fn date_range_must_be_ordered() {
    let rules = RuleSet::derive(&make_definition());
    let record = make_record(&[
        ("name", FieldValue::text("Ada")),
        ("country", FieldValue::choice("NL", "Netherlands")),
        (
            "stay",
            FieldValue::DateRange {
                start: date(2026, 3, 10),
                end: date(2026, 3, 1),
            },
        ),
    ]);

    let report = rules.validate(&record);

    assert!(matches!(
        report.error_for("stay"),
        Some(Issue::InvalidDateRange { .. })
    ));
}

#[test]
fn override_can_relax_a_derived_required_flag() {
    let rules = RuleSet::derive(&make_definition())
        .with_rule("country", FieldRule::new().required(false));
    let record = make_record(&[("name", FieldValue::text("Ada"))]);

    assert!(rules.validate(&record).is_valid());
}

#[test]
fn custom_pattern_rule_applies_to_text() {
    let rule = FieldRule::new()
        .with_pattern(r"^[A-Z]{2}-\d{4}$", "must look like XX-0000")
        .expect("pattern compiles");
    let rules = RuleSet::derive(&make_definition()).with_rule("name", rule);

    let record = make_record(&[
        ("name", FieldValue::text("bad")),
        ("country", FieldValue::choice("NL", "Netherlands")),
    ]);
    let report = rules.validate(&record);

    let issue = report.error_for("name").expect("error for name");
    assert_eq!(issue.message(), "Full name must look like XX-0000");
}

#[test]
fn record_rules_report_under_the_synthetic_key() {
    let rules = RuleSet::derive(&make_definition()).with_record_rule(
        "adult-has-email",
        |record: &Record| {
            let adult = record
                .get("age")
                .and_then(FieldValue::as_number)
                .is_some_and(|age| age >= 18.0);
            let has_email = record
                .get("email")
                .is_some_and(|value| !value.is_empty());
            (adult && !has_email).then(|| "Adults must provide an email address".to_string())
        },
    );

    let record = make_record(&[
        ("name", FieldValue::text("Ada")),
        ("country", FieldValue::choice("NL", "Netherlands")),
        ("age", FieldValue::number(36.0)),
    ]);
    let report = rules.validate(&record);

    let issue = report.error_for(RECORD_KEY).expect("record-level error");
    assert_eq!(issue.message(), "Adults must provide an email address");
    assert!(report.error_for("email").is_none());
}

#[test]
fn invalid_custom_pattern_is_a_typed_error() {
    let result = FieldRule::new().with_pattern("(unclosed", "never");
    assert!(result.is_err());
}

#[test]
fn reports_serialize_for_host_consumption() {
    let rules = RuleSet::derive(&make_definition());
    let report = rules.validate(&make_record(&[]));

    let json = serde_json::to_value(&report).expect("report serializes");
    let issues = json["issues"].as_array().expect("issues array");
    assert_eq!(issues.len(), report.issues.len());
    assert!(!issues.is_empty());
}
