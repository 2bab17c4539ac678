/*!
 * Tests for the suitability predicate
 */

use std::collections::HashSet;

use storycast::content::ContentUnit;
use storycast::selection::{evaluate, RejectReason, SelectionRules, Verdict};

use crate::common;

fn rules(min: usize, max: usize, terms: &[&str]) -> SelectionRules {
    let owned: Vec<String> = terms.iter().map(|t| t.to_string()).collect();
    SelectionRules::new(min, max, &owned).expect("rules should build")
}

fn no_consumed() -> HashSet<String> {
    HashSet::new()
}

/// Test a well-formed unit is accepted
#[test]
fn test_evaluate_withSuitableUnit_shouldAccept() {
    let unit = common::comment("c1", &common::long_body());
    let verdict = evaluate(&unit, &no_consumed(), &common::open_rules());
    assert_eq!(verdict, Verdict::Accepted);
}

/// Test stickied wins over every later check
#[test]
fn test_evaluate_withStickiedUnit_shouldRejectFirst() {
    let mut unit = common::comment("c1", "darn, this is stickied");
    unit.stickied = true;
    let verdict = evaluate(&unit, &no_consumed(), &rules(1, 1000, &["darn"]));
    assert_eq!(verdict, Verdict::Rejected(RejectReason::Stickied));
}

/// Test removal placeholders are rejected
#[test]
fn test_evaluate_withRemovedBody_shouldReject() {
    let unit = common::comment("c1", "[removed]");
    let verdict = evaluate(&unit, &no_consumed(), &common::open_rules());
    assert_eq!(verdict, Verdict::Rejected(RejectReason::DeletedOrRemoved));

    let unit = common::comment("c2", "[deleted]");
    let verdict = evaluate(&unit, &no_consumed(), &common::open_rules());
    assert_eq!(verdict, Verdict::Rejected(RejectReason::DeletedOrRemoved));
}

/// Test a body that sanitizes to nothing is rejected before term checks
#[test]
fn test_evaluate_withUrlOnlyBody_shouldRejectAsEmpty() {
    let unit = common::comment("c1", "https://example.com/only/a/link");
    let verdict = evaluate(&unit, &no_consumed(), &common::open_rules());
    assert_eq!(verdict, Verdict::Rejected(RejectReason::EmptyAfterSanitize));
}

/// Test blocked terms match whole words case-insensitively and report the term
#[test]
fn test_evaluate_withBlockedTerm_shouldReportMatchedTerm() {
    let term_rules = rules(1, 1000, &["darn"]);

    let hit = common::comment("c1", "Well Darn, that went poorly");
    assert_eq!(
        evaluate(&hit, &no_consumed(), &term_rules),
        Verdict::Rejected(RejectReason::BlockedTerm("darn".to_string()))
    );

    // Substring inside a longer word does not match
    let near_miss = common::comment("c2", "the darndest thing happened");
    assert_eq!(evaluate(&near_miss, &no_consumed(), &term_rules), Verdict::Accepted);
}

/// Test length bounds are inclusive on both ends
#[test]
fn test_evaluate_withLengthBounds_shouldBeInclusive() {
    let bounded = rules(5, 10, &[]);

    let too_short = common::comment("c1", "hi");
    assert_eq!(
        evaluate(&too_short, &no_consumed(), &bounded),
        Verdict::Rejected(RejectReason::LengthOutOfRange(2))
    );

    let exactly_min = common::comment("c2", "12345");
    assert_eq!(evaluate(&exactly_min, &no_consumed(), &bounded), Verdict::Accepted);

    let exactly_max = common::comment("c3", "1234567890");
    assert_eq!(evaluate(&exactly_max, &no_consumed(), &bounded), Verdict::Accepted);

    let too_long = common::comment("c4", "12345678901");
    assert_eq!(
        evaluate(&too_long, &no_consumed(), &bounded),
        Verdict::Rejected(RejectReason::LengthOutOfRange(11))
    );
}

/// Test units without an author are rejected
#[test]
fn test_evaluate_withMissingAuthor_shouldReject() {
    let unit = ContentUnit::new("c1", common::long_body(), None);
    let verdict = evaluate(&unit, &no_consumed(), &common::open_rules());
    assert_eq!(verdict, Verdict::Rejected(RejectReason::NoAuthor));
}

/// Test consumed ids are rejected
#[test]
fn test_evaluate_withConsumedId_shouldReject() {
    let unit = common::comment("c1", &common::long_body());
    let consumed: HashSet<String> = ["c1".to_string()].into_iter().collect();
    let verdict = evaluate(&unit, &consumed, &common::open_rules());
    assert_eq!(verdict, Verdict::Rejected(RejectReason::AlreadyUsed));
}

/// Test the predicate is deterministic
#[test]
fn test_evaluate_withSameInputs_shouldBeDeterministic() {
    let unit = common::comment("c1", &common::long_body());
    let consumed = no_consumed();
    let open = common::open_rules();
    let first = evaluate(&unit, &consumed, &open);
    let second = evaluate(&unit, &consumed, &open);
    assert_eq!(first, second);
}

/// Test a missing term file disables the filter instead of failing
#[test]
fn test_rules_from_terms_file_withMissingFile_shouldDisableFilter() {
    let loaded = SelectionRules::from_terms_file(1, 100, "does-not-exist.json")
        .expect("missing file should not fail");
    assert_eq!(loaded.blocked_term_count(), 0);
}

/// Test a malformed term file disables the filter instead of failing
#[test]
fn test_rules_from_terms_file_withMalformedFile_shouldDisableFilter() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("terms.json");
    std::fs::write(&path, "definitely not json").expect("write");

    let loaded = SelectionRules::from_terms_file(1, 100, &path).expect("should not fail");
    assert_eq!(loaded.blocked_term_count(), 0);
}

/// Test a valid term file loads its entries
#[test]
fn test_rules_from_terms_file_withValidFile_shouldLoadTerms() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("terms.json");
    std::fs::write(&path, r#"["alpha", "bravo"]"#).expect("write");

    let loaded = SelectionRules::from_terms_file(1, 100, &path).expect("should load");
    assert_eq!(loaded.blocked_term_count(), 2);
    assert_eq!(loaded.blocked_term_in("some ALPHA text"), Some("alpha"));
    assert_eq!(loaded.blocked_term_in("nothing here"), None);
}
