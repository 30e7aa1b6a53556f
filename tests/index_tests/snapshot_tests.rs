//! Tests for index snapshots
//!
//! These tests verify:
//! - Write/load preserves the key → value mapping
//! - Rebuilt trees satisfy every structural invariant
//! - Header and checksum validation
//! - Duplicate keys are refused on rebuild

use std::fs;

use strata::index::{BPlusTree, IndexKey, IndexSnapshot};
use strata::storage::Address;
use strata::StrataError;
use tempfile::TempDir;

fn sample_tree(n: i64) -> BPlusTree<IndexKey, Address> {
    let mut tree = BPlusTree::new(4);
    for i in (1..=n).rev() {
        tree.insert(IndexKey::Int(i), Address::new("Person_1.seg", 1 + (i as u64) * 41));
    }
    tree
}

#[test]
fn test_snapshot_roundtrip_preserves_mapping() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("Person.idx");
    let tree = sample_tree(120);

    let written = IndexSnapshot::write(&path, &tree).unwrap();
    assert_eq!(written, 120);

    let loaded: BPlusTree<IndexKey, Address> = IndexSnapshot::load(&path, 4).unwrap();
    loaded.validate().unwrap();

    let original: Vec<_> = tree.iter().collect();
    let rebuilt: Vec<_> = loaded.iter().collect();
    assert_eq!(original, rebuilt);
}

#[test]
fn test_snapshot_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("a.idx");
    let second = temp.path().join("b.idx");

    let tree = sample_tree(57);
    IndexSnapshot::write(&first, &tree).unwrap();
    let once: BPlusTree<IndexKey, Address> = IndexSnapshot::load(&first, 4).unwrap();
    IndexSnapshot::write(&second, &once).unwrap();
    let twice: BPlusTree<IndexKey, Address> = IndexSnapshot::load(&second, 4).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    assert_eq!(twice.keys(), tree.keys());
}

#[test]
fn test_snapshot_load_with_other_fanout() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("Person.idx");
    IndexSnapshot::write(&path, &sample_tree(40)).unwrap();

    let loaded: BPlusTree<IndexKey, Address> = IndexSnapshot::load(&path, 3).unwrap();

    assert_eq!(loaded.maximum(), 3);
    assert_eq!(loaded.len(), 40);
    loaded.validate().unwrap();
}

#[test]
fn test_snapshot_of_empty_tree() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("Empty.idx");
    let tree: BPlusTree<IndexKey, Address> = BPlusTree::new(4);

    assert_eq!(IndexSnapshot::write(&path, &tree).unwrap(), 0);
    let loaded: BPlusTree<IndexKey, Address> = IndexSnapshot::load(&path, 4).unwrap();
    assert!(loaded.is_empty());
}

#[test]
fn test_snapshot_text_keys() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("Planet.idx");
    let mut tree = BPlusTree::new(4);
    for name in ["venus", "earth", "mars", "mercury", "jupiter", "saturn"] {
        tree.insert(IndexKey::Text(name.to_string()), Address::new("Planet_1.seg", 1));
    }

    IndexSnapshot::write(&path, &tree).unwrap();
    let loaded: BPlusTree<IndexKey, Address> = IndexSnapshot::load(&path, 4).unwrap();

    assert_eq!(loaded.keys(), tree.keys());
    assert_eq!(loaded.keys()[0], IndexKey::Text("earth".to_string()));
}

#[test]
fn test_snapshot_detects_corruption() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("Person.idx");
    IndexSnapshot::write(&path, &sample_tree(10)).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let result = IndexSnapshot::load::<IndexKey, Address>(&path, 4);
    assert!(matches!(result, Err(StrataError::Snapshot(_))));
}

#[test]
fn test_snapshot_rejects_bad_magic() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("Person.idx");
    IndexSnapshot::write(&path, &sample_tree(3)).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    bytes[0..4].copy_from_slice(b"NOPE");
    fs::write(&path, &bytes).unwrap();

    let result = IndexSnapshot::read::<IndexKey, Address>(&path);
    assert!(matches!(result, Err(StrataError::Snapshot(_))));
}

#[test]
fn test_snapshot_rejects_truncated_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("Person.idx");
    fs::write(&path, b"STIX").unwrap();

    let result = IndexSnapshot::read::<IndexKey, Address>(&path);
    assert!(matches!(result, Err(StrataError::Snapshot(_))));
}

#[test]
fn test_rebuild_refuses_duplicates() {
    let entries = vec![(1, "a"), (2, "b"), (1, "c")];

    let result = IndexSnapshot::rebuild(entries, 4);
    assert!(matches!(result, Err(StrataError::Snapshot(_))));
}

#[test]
fn test_snapshot_bulk_load_validates_once() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("Bulk.idx");
    let mut tree = BPlusTree::new(4);
    for i in 0..50_000i64 {
        tree.insert(IndexKey::Int(i), Address::new("Bulk_1.seg", 1 + (i as u64 % 48) * 41));
    }
    assert_eq!(IndexSnapshot::write(&path, &tree).unwrap(), 50_000);

    let loaded: BPlusTree<IndexKey, Address> = IndexSnapshot::load(&path, 4).unwrap();
    assert_eq!(loaded.len(), 50_000);
    loaded.validate().unwrap();
}
