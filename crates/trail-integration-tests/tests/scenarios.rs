//! End-to-end scenarios across chain operations and snapshot transport.

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;
use trail_chain::{
    canonical_order, chain_digest, extend, find_by_proof, find_head, find_root, list_history,
    merge, merge_all, merge_with, ChainConfig, CorruptionNotifier, Cursor, History, ListOptions,
    MergeFailure, MergeOptions,
};
use trail_integration_tests::{body, extend_times, fixed_key, genesis, init_tracing};
use trail_snapshot::{
    close_history, load_snapshot, open_history, save_snapshot, Snapshot, SnapshotFormat,
};

fn transport(format: SnapshotFormat, history: &History) -> History {
    open_history(&close_history(format, history).unwrap()).unwrap()
}

#[test]
fn test_alice_three_entries() {
    init_tracing();
    let (sk, vk) = fixed_key(1);
    let history = genesis("alice", &sk, &vk);
    let history = extend(&history, json!({ "v": 1 }), &sk, None).unwrap();
    let history = extend(&history, json!({ "v": 2 }), &sk, None).unwrap();

    assert_eq!(history.len(), 3);
    let (_, head) = find_head(&history).unwrap();
    assert_eq!(head.body, json!({ "v": 2 }));
    let (_, root) = find_root(&history).unwrap();
    assert!(root.headers.prev.is_none());
    assert_eq!(root.body, json!({}));
}

#[test]
fn test_merge_with_empty_alleged_keeps_trusted() {
    init_tracing();
    let (sk, vk) = fixed_key(2);
    let history = extend_times(&genesis("alice", &sk, &vk), &sk, "t", 4);
    let merged = merge(&history, &History::new()).unwrap();
    assert_eq!(merged, history);
}

#[test]
fn test_replicas_converge_through_mixed_formats() {
    init_tracing();
    let (sk, vk) = fixed_key(3);
    let seed = genesis("alice", &sk, &vk);

    let mut writer = transport(SnapshotFormat::Json, &seed);
    let mut b = transport(SnapshotFormat::Binary, &seed);
    let mut c = transport(SnapshotFormat::Base64Url, &seed);

    writer = extend(&writer, json!({ "v": 1 }), &sk, None).unwrap();
    writer = extend(&writer, json!({ "v": 2 }), &sk, None).unwrap();

    b = merge(&b, &transport(SnapshotFormat::Binary, &writer)).unwrap();
    c = merge(&c, &transport(SnapshotFormat::Base64Url, &b)).unwrap();
    writer = merge(&writer, &c).unwrap();

    let expected = canonical_order(&writer).unwrap();
    assert_eq!(expected.len(), 3);
    assert_eq!(canonical_order(&b).unwrap(), expected);
    assert_eq!(canonical_order(&c).unwrap(), expected);
    assert_eq!(chain_digest(&b).unwrap(), chain_digest(&c).unwrap());
}

#[test]
fn test_repeated_merge_is_idempotent() {
    let (sk, vk) = fixed_key(4);
    let writer = extend_times(&genesis("alice", &sk, &vk), &sk, "w", 1);
    let replica = genesis("alice", &sk, &vk);

    let once = merge(&replica, &writer).unwrap();
    let twice = merge(&once, &writer).unwrap();
    assert_eq!(canonical_order(&once).unwrap(), canonical_order(&twice).unwrap());
    assert_eq!(once, twice);
}

#[test]
fn test_local_branch_wins_concurrent_conflict() {
    let (sk, vk) = fixed_key(5);
    let root = genesis("alice", &sk, &vk);
    let local = transport(SnapshotFormat::Binary, &root);
    let remote = transport(SnapshotFormat::Base64Url, &root);

    let a = extend(&local, json!({ "branch": "A" }), &sk, None).unwrap();
    let b = extend(&remote, json!({ "branch": "B" }), &sk, None).unwrap();
    let (b_head, _) = find_head(&b).unwrap();

    let trusted_a = merge(&a, &b).unwrap();
    let trusted_b = merge(&b, &a).unwrap();
    assert_eq!(find_head(&trusted_a).unwrap().1.body, json!({ "branch": "A" }));
    assert_eq!(find_head(&trusted_b).unwrap().1.body, json!({ "branch": "B" }));
    assert!(find_by_proof(&trusted_a, b_head.as_str()).is_none());
}

#[test]
fn test_foreign_root_is_rejected_and_trusted_untouched() {
    let (a_sk, a_vk) = fixed_key(6);
    let (b_sk, b_vk) = fixed_key(7);
    let trusted = extend(&genesis("shared", &a_sk, &a_vk), json!({ "local": true }), &a_sk, None)
        .unwrap();
    let foreign = extend(&genesis("shared", &b_sk, &b_vk), json!({ "foreign": true }), &b_sk, None)
        .unwrap();
    let before = trusted.clone();

    let result = merge(&trusted, &foreign);
    assert!(matches!(result, Err(MergeFailure::Malformed(_))));
    assert_eq!(trusted, before);
}

#[test]
fn test_rotation_survives_transport_between_parties() {
    init_tracing();
    let (k1_sk, k1_vk) = fixed_key(8);
    let (k2_sk, k2_vk) = fixed_key(9);

    let mut writer = genesis("alice", &k1_sk, &k1_vk);
    let replica = transport(SnapshotFormat::Base64Url, &writer);

    writer = extend(&writer, json!({ "phase": "rotate" }), &k1_sk, Some(k2_vk)).unwrap();

    // A second party that only holds the new key continues the chain.
    let mut second = transport(SnapshotFormat::Binary, &writer);
    second = extend(&second, json!({ "phase": "after-rotate" }), &k2_sk, None).unwrap();

    let merged = merge(&replica, &transport(SnapshotFormat::Json, &second)).unwrap();
    let order = canonical_order(&merged).unwrap();
    assert_eq!(order.len(), 3);
    assert_eq!(
        merged.get(order[2].as_str()).unwrap().body,
        json!({ "phase": "after-rotate" })
    );

    // The retired key can no longer extend.
    assert!(extend(&merged, json!({ "phase": "late" }), &k1_sk, None).is_err());
}

#[test]
fn test_corruption_listener_sees_tampered_snapshot() {
    init_tracing();
    let (sk, vk) = fixed_key(10);
    let trusted = genesis("alice", &sk, &vk);
    let extended = extend_times(&trusted, &sk, "x", 2);

    let Snapshot::Json(mut raw) = close_history(SnapshotFormat::Json, &extended).unwrap() else {
        panic!("expected json snapshot");
    };
    let (head, _) = find_head(&extended).unwrap();
    raw[head.as_str()]["body"] = json!({ "tag": "x", "v": 100 });
    let tampered = open_history(&Snapshot::Json(raw)).unwrap();

    let notifier = CorruptionNotifier::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    notifier.subscribe(move |report| {
        assert!(matches!(report.failure, MergeFailure::SignatureInvalid { .. }));
        counter.fetch_add(1, Ordering::SeqCst);
    });
    notifier.subscribe(|_| panic!("misbehaving listener"));

    let before = trusted.clone();
    let options = MergeOptions::default().with_notifier(&notifier);
    assert!(merge_with(&trusted, &tampered, &options).is_err());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(trusted, before);
}

#[test]
fn test_concurrent_merges_share_trusted() {
    let (sk, vk) = fixed_key(11);
    let trusted = Arc::new(genesis("alice", &sk, &vk));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let trusted = Arc::clone(&trusted);
            let alleged = extend(&trusted, body("thread", i), &sk, None).unwrap();
            thread::spawn(move || merge(&trusted, &alleged).unwrap())
        })
        .collect();

    let results: Vec<History> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.len(), 2);
        assert_eq!(find_head(result).unwrap().1.body, body("thread", i));
    }
    assert_eq!(trusted.len(), 1);
}

#[test]
fn test_snapshot_files_exchange() {
    let dir = TempDir::new().unwrap();
    let (sk, vk) = fixed_key(12);
    let writer = extend_times(&genesis("alice", &sk, &vk), &sk, "f", 3);

    let path = dir.path().join("alice.b64");
    save_snapshot(&path, SnapshotFormat::Base64Url, &writer).unwrap();

    let reader = genesis("alice", &sk, &vk);
    let loaded = load_snapshot(&path, SnapshotFormat::Base64Url).unwrap();
    let merged = merge(&reader, &loaded).unwrap();
    assert_eq!(chain_digest(&merged).unwrap(), chain_digest(&writer).unwrap());
}

#[test]
fn test_config_drives_merge_and_listing() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("trail.toml");
    std::fs::write(
        &path,
        "[merge]\nenforce_body_schema = true\n\n[list]\nlimit = 2\ninclude_headers = true\n",
    )?;
    let config = ChainConfig::load(&path)?;

    let (sk, vk) = fixed_key(13);
    let uniform = extend_times(&genesis("alice", &sk, &vk), &sk, "c", 1);
    let snapshots = [uniform.clone(), uniform.clone()];

    // Root body `{}` and `{"tag","v"}` differ in shape.
    let options = MergeOptions::from_config(&config);
    assert!(matches!(
        merge_all(&snapshots, &options),
        Err(MergeFailure::SchemaDivergence { .. })
    ));
    assert_eq!(merge_all(&snapshots, &MergeOptions::default())?, uniform);

    let listed = list_history(&uniform, &ListOptions::from_config(&config))?;
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|e| e.headers.is_some()));
    Ok(())
}

#[test]
fn test_cursor_over_merged_history() {
    let (sk, vk) = fixed_key(14);
    let history = extend_times(&genesis("alice", &sk, &vk), &sk, "k", 2);
    let mut cursor = Cursor::at_root(&history).unwrap();
    let mut seen = vec![cursor.current().body.clone()];
    while cursor.switch_next() {
        seen.push(cursor.current().body.clone());
    }
    assert_eq!(seen, [json!({}), body("k", 0), body("k", 1)]);
}
