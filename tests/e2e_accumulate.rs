//! End-to-end accumulation tests.
//!
//! Each test feeds records (built in code or decoded from stored JSON
//! documents) through the `Accumulator` and checks the resulting graph.

use interaction_graph::{
    Accumulator, AccumulatorConfig, Edge, Error, MultiSlotPolicy, PostRecord,
    RecoveryMode, TargetAnomalyPolicy,
};
use pretty_assertions::assert_eq;
use serde_json::json;

// ============================================================================
// Helper: decode stored documents the way a store would hand them over.
// ============================================================================

fn decode(docs: Vec<serde_json::Value>) -> Vec<interaction_graph::Result<PostRecord>> {
    docs.iter().map(PostRecord::from_document).collect()
}

fn sorted_nodes(acc: &Accumulator) -> Vec<String> {
    acc.graph().sorted_nodes().into_iter().map(|n| n.to_string()).collect()
}

// ============================================================================
// 1. The worked scenario: two replies a→b, one quote c→a
// ============================================================================

#[test]
fn test_reply_and_quote_scenario() {
    let records = decode(vec![
        json!({"author": "a", "reply_target_id": "b"}),
        json!({"author": "a", "reply_target_id": "b"}),
        json!({"author": "c", "quoted_status": {"author": "a"}}),
    ]);

    let mut acc = Accumulator::new();
    let report = acc.accumulate_from(records.into_iter()).unwrap();

    assert_eq!(report.records_applied, 3);
    assert_eq!(sorted_nodes(&acc), ["a", "b", "c"]);
    assert_eq!(acc.graph().sorted_edges(), vec![
        Edge::new("a", "b", 2),
        Edge::new("c", "a", 1),
    ]);
}

// ============================================================================
// 2. Idempotent node insertion
// ============================================================================

#[test]
fn test_repeated_author_single_node() {
    let mut acc = Accumulator::new();
    acc.accumulate(vec![
        PostRecord::new("a").replying_to("b"),
        PostRecord::new("a"),
        PostRecord::new("a"),
    ])
    .unwrap();

    assert_eq!(acc.graph().node_count(), 2);
    assert_eq!(acc.graph().weight("a", "b"), Some(1), "author-only posts must not reset weights");
}

// ============================================================================
// 3. Weight monotonicity with unrelated interleaving
// ============================================================================

#[test]
fn test_weight_counts_interleaved_interactions() {
    let mut records = Vec::new();
    for i in 0..25 {
        records.push(PostRecord::new("a").replying_to("b"));
        records.push(PostRecord::new(format!("noise{i}")).reposting("z"));
    }

    let mut acc = Accumulator::new();
    acc.accumulate(records).unwrap();

    assert_eq!(acc.graph().weight("a", "b"), Some(25));
    assert_eq!(acc.graph().weight("b", "a"), None);
    assert_eq!(acc.graph().edge_count(), 26);
}

// ============================================================================
// 4. Multi-target fan-out
// ============================================================================

#[test]
fn test_reply_and_quote_in_one_post() {
    let mut acc = Accumulator::new();
    acc.accumulate(vec![PostRecord::new("a").replying_to("b").quoting("c")]).unwrap();

    assert_eq!(acc.graph().sorted_edges(), vec![
        Edge::new("a", "b", 1),
        Edge::new("a", "c", 1),
    ]);
}

#[test]
fn test_stored_tweet_with_all_three_slots() {
    let records = decode(vec![json!({
        "id_str": "1",
        "user": {"screen_name": "alice"},
        "in_reply_to_screen_name": "bob",
        "quoted_status": {"user": {"screen_name": "carol"}},
        "retweeted_status": {"user": {"screen_name": "dave"}},
    })]);

    let mut acc = Accumulator::new();
    acc.accumulate_from(records.into_iter()).unwrap();

    for target in ["bob", "carol", "dave"] {
        assert_eq!(acc.graph().weight("alice", target), Some(1), "alice -> {target}");
    }
}

// ============================================================================
// 5. Empty input
// ============================================================================

#[test]
fn test_empty_input() {
    let mut acc = Accumulator::new();
    let report = acc.accumulate(Vec::<PostRecord>::new()).unwrap();

    assert_eq!(report.records_seen, 0);
    assert!(acc.graph().is_empty());
    assert_eq!(acc.graph().edge_count(), 0);
}

// ============================================================================
// 6. Malformed records
// ============================================================================

#[test]
fn test_malformed_skipped_by_default() {
    let records = decode(vec![
        json!({"author_id": "a", "reply_target_id": "b"}),
        json!({"reply_target_id": "ghost"}),
        json!({"author_id": "", "reply_target_id": "ghost"}),
        json!({"delete": {"status": {"id": 1}}}),
        json!({"author_id": "c", "reply_target_id": "a"}),
    ]);

    let mut acc = Accumulator::new();
    let report = acc.accumulate_from(records.into_iter()).unwrap();

    assert_eq!(report.records_seen, 5);
    assert_eq!(report.records_skipped, 3);
    assert_eq!(report.records_applied, 2);
    assert!(!acc.graph().contains_node("ghost"), "skipped records contribute nothing");
    assert_eq!(sorted_nodes(&acc), ["a", "b", "c"]);
}

#[test]
fn test_malformed_aborts_when_configured() {
    let cfg = AccumulatorConfig::default().with_recovery(RecoveryMode::Abort);
    let mut acc = Accumulator::with_config(cfg);

    let err = acc
        .accumulate(vec![
            PostRecord::new("a").replying_to("b"),
            PostRecord::default().replying_to("x"),
            PostRecord::new("c").replying_to("d"),
        ])
        .unwrap_err();

    assert!(matches!(err, Error::MalformedRecord(_)));
    assert_eq!(acc.report().records_seen, 2);
    assert_eq!(acc.graph().weight("a", "b"), Some(1), "partial graph stays readable");
}

#[test]
fn test_target_without_author_yields_no_edge() {
    let records = decode(vec![json!({
        "author_id": "a",
        "quote_target": {"text": "deleted"},
        "repost_target": {"author_id": "b"},
    })]);

    let mut acc = Accumulator::new();
    acc.accumulate_from(records.into_iter()).unwrap();

    assert_eq!(acc.graph().sorted_edges(), vec![Edge::new("a", "b", 1)]);
}

#[test]
fn test_target_without_author_rejected_when_strict() {
    let records = decode(vec![
        json!({"author_id": "a", "quote_target": {"text": "deleted"}, "reply_target_id": "b"}),
        json!({"author_id": "c", "reply_target_id": "a"}),
    ]);

    let cfg = AccumulatorConfig::default().with_target_anomaly(TargetAnomalyPolicy::Reject);
    let mut acc = Accumulator::with_config(cfg);
    let report = acc.accumulate_from(records.into_iter()).unwrap();

    assert_eq!(report.records_skipped, 1);
    assert_eq!(acc.graph().weight("a", "b"), None);
    assert_eq!(acc.graph().weight("c", "a"), Some(1));
}

// ============================================================================
// 7. Policies
// ============================================================================

#[test]
fn test_quote_and_repost_of_same_author() {
    let record = PostRecord::new("a").quoting("b").reposting("b");

    let mut each = Accumulator::new();
    each.accumulate(vec![record.clone()]).unwrap();
    assert_eq!(each.graph().weight("a", "b"), Some(2));

    let cfg = AccumulatorConfig::default().with_multi_slot(MultiSlotPolicy::OncePerTarget);
    let mut once = Accumulator::with_config(cfg);
    once.accumulate(vec![record]).unwrap();
    assert_eq!(once.graph().weight("a", "b"), Some(1));
}

#[test]
fn test_self_reply_threads() {
    let thread = vec![
        PostRecord::new("a").replying_to("a"),
        PostRecord::new("a").replying_to("a"),
    ];

    let mut kept = Accumulator::new();
    kept.accumulate(thread.clone()).unwrap();
    assert_eq!(kept.graph().weight("a", "a"), Some(2));

    let mut dropped = Accumulator::with_config(AccumulatorConfig::default().with_self_loops(false));
    dropped.accumulate(thread).unwrap();
    assert_eq!(dropped.graph().edge_count(), 0);
    assert!(dropped.graph().contains_node("a"));
}

// ============================================================================
// 8. Lazy, single-pass input
// ============================================================================

#[test]
fn test_lazy_generated_source() {
    let source = (0..10_000u32).map(|i| {
        Ok::<_, Error>(PostRecord::new(format!("u{}", i % 100)).replying_to(format!("u{}", (i + 1) % 100)))
    });

    let mut acc = Accumulator::new();
    let report = acc.accumulate_from(source).unwrap();

    assert_eq!(report.records_seen, 10_000);
    assert_eq!(acc.graph().node_count(), 100);
    assert_eq!(acc.graph().edge_count(), 100);
    assert_eq!(acc.graph().weight("u0", "u1"), Some(100));
    assert_eq!(acc.graph().total_weight(), 10_000);
}
