//! Store-to-graph tests: ingest documents, read them back, accumulate,
//! and resume from checkpoints.

use std::thread;

use interaction_graph::{
    Accumulator, AccumulatorConfig, Checkpoint, Error, JsonLinesStore, MemoryStore,
    RecordSink, RecoveryMode, ingest_lines,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const STREAM: &str = r#"{"user": {"screen_name": "a"}, "in_reply_to_screen_name": "b"}
{"user": {"screen_name": "a"}, "in_reply_to_screen_name": "b"}
this line was cut off by a reconnect
{"user": {"screen_name": "c"}, "in_reply_to_screen_name": null, "quoted_status": {"user": {"screen_name": "a"}}}
{"limit": {"track": 12}}
{"user": {"screen_name": "d"}, "retweeted_status": {"user": {"screen_name": "c"}}}
"#;

#[test]
fn test_ingest_then_build_from_jsonl() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonLinesStore::open(dir.path().join("posts.jsonl")).unwrap();

    let ingested = ingest_lines(STREAM.as_bytes(), &store).unwrap();
    assert_eq!(ingested.stored, 5);
    assert_eq!(ingested.rejected, 1);

    let mut acc = Accumulator::new();
    let report = acc.accumulate_from(store.source().unwrap()).unwrap();

    assert_eq!(report.records_seen, 5);
    assert_eq!(report.records_skipped, 1, "the rate-limit notice has no author");
    assert_eq!(acc.graph().weight("a", "b"), Some(2));
    assert_eq!(acc.graph().weight("c", "a"), Some(1));
    assert_eq!(acc.graph().weight("d", "c"), Some(1));
}

#[test]
fn test_memory_store_and_jsonl_agree() {
    let dir = tempfile::tempdir().unwrap();
    let file_store = JsonLinesStore::open(dir.path().join("posts.jsonl")).unwrap();
    let mem_store = MemoryStore::new();
    ingest_lines(STREAM.as_bytes(), &file_store).unwrap();
    ingest_lines(STREAM.as_bytes(), &mem_store).unwrap();

    let mut from_file = Accumulator::new();
    from_file.accumulate_from(file_store.source().unwrap()).unwrap();
    let mut from_mem = Accumulator::new();
    from_mem.accumulate_from(mem_store.snapshot()).unwrap();

    assert_eq!(from_file.graph(), from_mem.graph());
}

#[test]
fn test_snapshot_is_stable_under_concurrent_appends() {
    let store = MemoryStore::new();
    for _ in 0..1_000 {
        store.append(json!({"author_id": "a", "reply_target_id": "b"})).unwrap();
    }
    let snapshot = store.snapshot();

    let producer = {
        let store = store.clone();
        thread::spawn(move || {
            for _ in 0..1_000 {
                store.append(json!({"author_id": "x", "reply_target_id": "y"})).unwrap();
            }
        })
    };

    let mut acc = Accumulator::new();
    acc.accumulate_from(snapshot).unwrap();
    producer.join().unwrap();

    assert_eq!(acc.graph().weight("a", "b"), Some(1_000));
    assert!(!acc.graph().contains_node("x"), "snapshot must not see later appends");
    assert_eq!(store.len(), 2_000);
}

#[test]
fn test_resume_from_checkpoint_matches_full_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonLinesStore::open(dir.path().join("posts.jsonl")).unwrap();
    ingest_lines(STREAM.as_bytes(), &store).unwrap();

    let mut full = Accumulator::new();
    full.accumulate_from(store.source().unwrap()).unwrap();

    // Interrupted after three records.
    let cp_path = dir.path().join("run.checkpoint.json");
    let mut first = Accumulator::new();
    first.accumulate_from(store.source().unwrap().take(3)).unwrap();
    first.checkpoint().save(&cp_path).unwrap();
    drop(first);

    let checkpoint = Checkpoint::load(&cp_path).unwrap();
    assert_eq!(checkpoint.records_consumed, 3);
    let source = checkpoint.skip_consumed(store.source().unwrap()).unwrap();
    let mut resumed = Accumulator::resume(checkpoint, Default::default());
    resumed.accumulate_from(source).unwrap();

    assert_eq!(resumed.graph(), full.graph());
    assert_eq!(resumed.report(), full.report());
}

#[test]
fn test_checkpoint_makes_later_builds_incremental() {
    let store = MemoryStore::new();
    store.append(json!({"author_id": "a", "reply_target_id": "b"})).unwrap();

    let mut acc = Accumulator::new();
    acc.accumulate_from(store.snapshot()).unwrap();
    let checkpoint = acc.checkpoint();

    store.append(json!({"author_id": "a", "reply_target_id": "b"})).unwrap();
    let source = checkpoint.skip_consumed(store.snapshot()).unwrap();
    let mut next = Accumulator::resume(checkpoint, Default::default());
    next.accumulate_from(source).unwrap();

    assert_eq!(next.graph().weight("a", "b"), Some(2));
    assert_eq!(next.report().records_seen, 2);
}

#[test]
fn test_torn_line_in_store_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("posts.jsonl");
    let mut bytes = b"{\"author_id\":\"a\",\"reply_target_id\":\"b\"}\n".to_vec();
    bytes.extend_from_slice(b"{\"author_id\":\"caf\xC3\n");
    bytes.extend_from_slice(b"{\"author_id\":\"c\",\"reply_target_id\":\"d\"}\n");
    std::fs::write(&path, bytes).unwrap();

    let store = JsonLinesStore::open(&path).unwrap();
    let mut acc = Accumulator::new();
    let report = acc.accumulate_from(store.source().unwrap()).unwrap();

    assert_eq!(report.records_skipped, 1);
    assert_eq!(acc.graph().weight("a", "b"), Some(1));
    assert_eq!(acc.graph().weight("c", "d"), Some(1));
}

// ============================================================================
// Checkpointed runs
// ============================================================================

/// Six records; the fourth has no author.
fn six_record_store() -> MemoryStore {
    let store = MemoryStore::new();
    for (author, target) in [("a", "b"), ("b", "c"), ("a", "b"), ("", "x"), ("c", "a"), ("a", "c")] {
        store.append(json!({"author_id": author, "reply_target_id": target})).unwrap();
    }
    store
}

fn plain_run(store: &MemoryStore) -> Accumulator {
    let mut acc = Accumulator::new();
    acc.accumulate_from(store.snapshot()).unwrap();
    acc
}

#[test]
fn test_checkpointed_run_matches_plain_run_at_any_chunk_size() {
    let store = six_record_store();
    let expected = plain_run(&store);

    for every in [1, 2, 3, 5, 6, 7] {
        let dir = tempfile::tempdir().unwrap();
        let cp_path = dir.path().join("run.checkpoint.json");

        let mut acc = Accumulator::new();
        let report = acc.accumulate_checkpointed(store.snapshot(), &cp_path, every).unwrap();
        assert_eq!(acc.graph(), expected.graph(), "every = {every}");
        assert_eq!(report, expected.report(), "every = {every}");

        let saved = Checkpoint::load(&cp_path).unwrap();
        assert_eq!(saved.records_consumed, 6, "every = {every}");
        assert_eq!(&saved.graph, expected.graph(), "every = {every}");
    }
}

#[test]
fn test_rerun_after_finished_checkpointed_build() {
    let dir = tempfile::tempdir().unwrap();
    let cp_path = dir.path().join("run.checkpoint.json");
    let store = six_record_store();

    let mut first = Accumulator::new();
    first.accumulate_checkpointed(store.snapshot(), &cp_path, 3).unwrap();

    // Nothing new: same graph, checkpoint untouched.
    let checkpoint = Checkpoint::load(&cp_path).unwrap();
    let source = checkpoint.skip_consumed(store.snapshot()).unwrap();
    let mut again = Accumulator::resume(checkpoint.clone(), Default::default());
    again.accumulate_checkpointed(source, &cp_path, 3).unwrap();
    assert_eq!(again.graph(), first.graph());
    assert_eq!(Checkpoint::load(&cp_path).unwrap(), checkpoint);

    // Two appended records are folded in incrementally.
    store.append(json!({"author_id": "a", "reply_target_id": "b"})).unwrap();
    store.append(json!({"author_id": "d", "reply_target_id": "a"})).unwrap();
    let checkpoint = Checkpoint::load(&cp_path).unwrap();
    let source = checkpoint.skip_consumed(store.snapshot()).unwrap();
    let mut next = Accumulator::resume(checkpoint, Default::default());
    next.accumulate_checkpointed(source, &cp_path, 3).unwrap();

    assert_eq!(next.graph(), plain_run(&store).graph());
    assert_eq!(next.graph().weight("a", "b"), Some(3));
    assert_eq!(Checkpoint::load(&cp_path).unwrap().records_consumed, 8);
}

#[test]
fn test_aborted_checkpointed_run_keeps_last_full_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let cp_path = dir.path().join("run.checkpoint.json");
    let store = six_record_store();

    let cfg = AccumulatorConfig::default().with_recovery(RecoveryMode::Abort);
    let mut acc = Accumulator::with_config(cfg);
    let err = acc.accumulate_checkpointed(store.snapshot(), &cp_path, 2).unwrap_err();
    assert!(matches!(err, Error::MalformedRecord(_)));

    let saved = Checkpoint::load(&cp_path).unwrap();
    assert_eq!(saved.records_consumed, 2, "the chunk holding the bad record is not saved");
    assert_eq!(saved.graph.weight("a", "b"), Some(1));
    assert_eq!(saved.graph.weight("b", "c"), Some(1));
}

#[test]
fn test_checkpointed_run_over_empty_source() {
    let dir = tempfile::tempdir().unwrap();
    let cp_path = dir.path().join("run.checkpoint.json");

    let mut acc = Accumulator::new();
    let report = acc.accumulate_checkpointed(MemoryStore::new().snapshot(), &cp_path, 0).unwrap();

    assert_eq!(report.records_seen, 0);
    assert!(!cp_path.exists(), "nothing consumed, nothing to save");
}
