/*!
 * Tests for the persisted dedup and produced ledgers
 */

use storycast::selection::{DedupLedger, ProducedLedger, ProducedRecord};

use crate::common;

/// Test recorded ids survive a reopen
#[test]
fn test_dedup_record_withReopen_shouldPersistIds() {
    common::init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("used_units.json");

    {
        let ledger = DedupLedger::open(&path);
        ledger.record("thread1", &["c1", "c2"]);
        ledger.record("thread2", &["c9"]);
    }

    let reopened = DedupLedger::open(&path);
    let thread1 = reopened.consumed_for("thread1");
    assert!(thread1.contains("c1"));
    assert!(thread1.contains("c2"));
    assert_eq!(thread1.len(), 2);
    assert!(reopened.consumed_for("thread2").contains("c9"));
    assert!(reopened.consumed_for("unknown").is_empty());
}

/// Test recording the same ids twice leaves the persisted set unchanged
#[test]
fn test_dedup_record_withSameIdsTwice_shouldBeIdempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("used_units.json");

    let ledger = DedupLedger::open(&path);
    ledger.record("thread1", &["c1", "c2"]);
    let after_first = std::fs::read_to_string(&path).expect("store exists");

    ledger.record("thread1", &["c1", "c2"]);
    let after_second = std::fs::read_to_string(&path).expect("store exists");

    assert_eq!(after_first, after_second);
    assert_eq!(ledger.consumed_for("thread1").len(), 2);
}

/// Test recording merges with previously recorded ids
#[test]
fn test_dedup_record_withNewIds_shouldUnion() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("used_units.json");

    let ledger = DedupLedger::open(&path);
    ledger.record("thread1", &["c1"]);
    ledger.record("thread1", &["c2", "c1"]);

    let reopened = DedupLedger::open(&path);
    assert_eq!(reopened.consumed_for("thread1").len(), 2);
}

/// Test a corrupted store resets to empty instead of failing
#[test]
fn test_dedup_open_withCorruptedStore_shouldResetToEmpty() {
    common::init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("used_units.json");
    std::fs::write(&path, "{ this is not json").expect("write");

    let ledger = DedupLedger::open(&path);
    assert!(ledger.consumed_for("thread1").is_empty());
    assert!(!ledger.is_source_unsuitable("thread1"));

    // The next successful write overwrites the corrupt file
    ledger.record("thread1", &["c1"]);
    let reopened = DedupLedger::open(&path);
    assert!(reopened.consumed_for("thread1").contains("c1"));
}

/// Test unsuitable-source marks persist
#[test]
fn test_dedup_mark_unsuitable_withReopen_shouldPersist() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("used_units.json");

    {
        let ledger = DedupLedger::open(&path);
        assert!(!ledger.is_source_unsuitable("thread1"));
        ledger.mark_source_unsuitable("thread1");
        assert!(ledger.is_source_unsuitable("thread1"));
    }

    let reopened = DedupLedger::open(&path);
    assert!(reopened.is_source_unsuitable("thread1"));
    assert!(!reopened.is_source_unsuitable("thread2"));
}

/// Test an empty source id is refused
#[test]
fn test_dedup_mark_unsuitable_withEmptyId_shouldBeIgnored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("used_units.json");

    let ledger = DedupLedger::open(&path);
    ledger.mark_source_unsuitable("");
    assert!(!ledger.is_source_unsuitable(""));
    assert!(!path.exists());
}

/// Test produced records persist and answer contains()
#[test]
fn test_produced_append_withReopen_shouldPersistRecords() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("produced.json");

    {
        let ledger = ProducedLedger::open(&path);
        assert!(ledger.is_empty());
        ledger.append(ProducedRecord::now("thread1", "A title", "a-title-thread1.mp4"));
        assert!(ledger.contains("thread1"));
        assert_eq!(ledger.len(), 1);
    }

    let reopened = ProducedLedger::open(&path);
    assert!(reopened.contains("thread1"));
    assert!(!reopened.contains("thread2"));
}

/// Test a corrupted produced store resets to empty
#[test]
fn test_produced_open_withCorruptedStore_shouldResetToEmpty() {
    common::init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("produced.json");
    std::fs::write(&path, "[{\"broken\": ").expect("write");

    let ledger = ProducedLedger::open(&path);
    assert!(ledger.is_empty());
    assert!(!ledger.contains("thread1"));
}

/// Test produced records capture a timestamp
#[test]
fn test_produced_record_now_shouldStampTime() {
    let record = ProducedRecord::now("thread1", "Title", "file.mp4");
    assert!(!record.timestamp.is_empty());
    assert_eq!(record.source_id, "thread1");
}
