//! Tests for the B+ tree engine
//!
//! These tests verify:
//! - Ordered insert with leaf and internal splits
//! - Lookups, in-place value changes, duplicate rejection
//! - Deletion with borrow, fusion and root collapse
//! - Leaf chain ordering under random insert/delete orders
//! - Structural statistics and shape rendering

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use strata::index::{BPlusTree, TreeStats};

// =============================================================================
// Helper Functions
// =============================================================================

fn tree_with(maximum: usize, keys: &[i64]) -> BPlusTree<i64, String> {
    let mut tree = BPlusTree::new(maximum);
    for &key in keys {
        let (inserted, _) = tree.insert(key, format!("v{}", key));
        assert!(inserted, "key {} inserted twice", key);
    }
    tree
}

fn shuffled(n: i64, seed: u64) -> Vec<i64> {
    let mut keys: Vec<i64> = (1..=n).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(seed));
    keys
}

// =============================================================================
// Insert Tests
// =============================================================================

#[test]
fn test_scenario_fanout_four() {
    let mut tree = BPlusTree::new(4);

    for key in [1, 5, 2, 3, 4, 6, 7, 8] {
        tree.insert(key, key * 100);
        tree.validate().unwrap();
    }

    assert_eq!(tree.keys(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(tree.len(), 8);
}

#[test]
fn test_insert_grows_root() {
    let tree = tree_with(4, &[1, 2, 3, 4, 5]);

    assert_eq!(tree.depth(), 1);
    assert_eq!(
        tree.stats(),
        TreeStats {
            splits: 1,
            parent_splits: 0,
            fusions: 0,
            parent_fusions: 0,
        }
    );
    assert_eq!(tree.render(), "`- [3]\n   |- [1, 2]\n   `- [3, 4, 5]\n");
}

#[test]
fn test_insert_duplicate_is_rejected() {
    let mut tree = tree_with(4, &[1, 2, 3]);

    let (inserted, _) = tree.insert(2, "other".to_string());

    assert!(!inserted);
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.query(&2), Some(&"v2".to_string()));
}

#[test]
fn test_insert_returns_holding_leaf() {
    let mut tree = BPlusTree::new(3);

    for key in shuffled(200, 7) {
        let (inserted, leaf) = tree.insert(key, ());
        assert!(inserted);
        assert!(tree.leaf(leaf).keys.contains(&key));
    }
}

#[test]
fn test_internal_splits_counted() {
    let tree = tree_with(4, &(1..=100).collect::<Vec<_>>());

    let stats = tree.stats();
    assert!(stats.parent_splits > 0);
    assert!(stats.splits > stats.parent_splits);
    assert!(tree.depth() >= 2);
    tree.validate().unwrap();
}

#[test]
fn test_fanout_clamps_to_two() {
    let tree: BPlusTree<i64, ()> = BPlusTree::new(1);

    assert_eq!(tree.maximum(), 2);
    assert_eq!(tree.minimum(), 1);
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[test]
fn test_query_and_find() {
    let tree = tree_with(4, &shuffled(64, 3));

    for key in 1..=64 {
        assert_eq!(tree.query(&key), Some(&format!("v{}", key)));
        assert!(tree.leaf(tree.find(&key)).keys.contains(&key));
    }
    assert_eq!(tree.query(&0), None);
    assert_eq!(tree.query(&65), None);
    assert!(!tree.contains_key(&100));
}

#[test]
fn test_query_empty_tree() {
    let tree: BPlusTree<i64, String> = BPlusTree::new(4);

    assert_eq!(tree.query(&1), None);
    assert!(tree.is_empty());
    assert_eq!(tree.iter().count(), 0);
    assert!(tree.leaf(tree.leftmost_leaf()).keys.is_empty());
}

#[test]
fn test_change_replaces_value_only() {
    let mut tree = tree_with(4, &[1, 2, 3, 4, 5, 6]);
    let stats = tree.stats();

    let (changed, leaf) = tree.change(&4, "four".to_string());
    assert!(changed);
    assert!(tree.leaf(leaf).keys.contains(&4));
    assert_eq!(tree.query(&4), Some(&"four".to_string()));

    let (changed, _) = tree.change(&40, "missing".to_string());
    assert!(!changed);
    assert_eq!(tree.stats(), stats);
    assert_eq!(tree.len(), 6);
}

#[test]
fn test_leftmost_leaf_holds_smallest_key() {
    let tree = tree_with(3, &shuffled(50, 11));

    let leftmost = tree.leaf(tree.leftmost_leaf());
    assert_eq!(leftmost.keys[0], 1);
    assert_eq!(leftmost.prev, None);
}

#[test]
fn test_text_keys_order_lexicographically() {
    let mut tree = BPlusTree::new(3);
    for word in ["pear", "apple", "fig", "banana", "cherry", "date", "10", "9"] {
        tree.insert(word.to_string(), word.len());
    }

    assert_eq!(
        tree.keys(),
        vec!["10", "9", "apple", "banana", "cherry", "date", "fig", "pear"]
    );
    tree.validate().unwrap();
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_borrows_before_fusing() {
    let mut tree = tree_with(4, &[1, 2, 3, 4, 5]);

    assert_eq!(tree.delete(&1), Some("v1".to_string()));
    assert_eq!(tree.stats().fusions, 0);
    assert_eq!(tree.depth(), 1);
    assert_eq!(tree.render(), "`- [4]\n   |- [2, 3]\n   `- [4, 5]\n");

    assert_eq!(tree.delete(&2), Some("v2".to_string()));
    assert_eq!(tree.stats().fusions, 1);
    assert_eq!(tree.stats().parent_fusions, 0);
    assert_eq!(tree.depth(), 0);
    assert_eq!(tree.keys(), vec![3, 4, 5]);
}

#[test]
fn test_delete_missing_key() {
    let mut tree = tree_with(4, &[1, 2, 3]);

    assert_eq!(tree.delete(&9), None);
    assert_eq!(tree.len(), 3);
}

#[test]
fn test_delete_everything_collapses_to_empty_leaf() {
    let keys = shuffled(300, 42);
    let mut tree = tree_with(4, &keys);

    for key in shuffled(300, 43) {
        assert!(tree.delete(&key).is_some());
        tree.validate().unwrap();
    }

    assert!(tree.is_empty());
    assert_eq!(tree.depth(), 0);
    assert!(tree.stats().parent_fusions > 0);
    assert_eq!(tree.arena().live_count(), 1);
}

#[test]
fn test_reinsert_after_delete() {
    let mut tree = tree_with(3, &(1..=40).collect::<Vec<_>>());
    for key in (1..=40).filter(|k| k % 2 == 0) {
        tree.delete(&key);
    }
    for key in (1..=40).filter(|k| k % 2 == 0) {
        let (inserted, _) = tree.insert(key, format!("again{}", key));
        assert!(inserted);
    }

    assert_eq!(tree.keys(), (1..=40).collect::<Vec<_>>());
    assert_eq!(tree.query(&10), Some(&"again10".to_string()));
    tree.validate().unwrap();
}

// =============================================================================
// Order Invariant Tests
// =============================================================================

#[test]
fn test_order_invariant_random_orders() {
    for maximum in [2, 3, 4, 5, 7, 16] {
        for seed in 0..4 {
            let keys = shuffled(250, seed);
            let mut tree = BPlusTree::new(maximum);

            for &key in &keys {
                tree.insert(key, key);
            }
            tree.validate().unwrap();
            assert_eq!(tree.keys(), (1..=250).collect::<Vec<_>>());

            let mut doomed = keys.clone();
            doomed.shuffle(&mut StdRng::seed_from_u64(seed + 100));
            doomed.truncate(125);
            for key in &doomed {
                assert_eq!(tree.delete(key), Some(*key));
            }
            tree.validate().unwrap();

            let mut expected: Vec<i64> = (1..=250).filter(|k| !doomed.contains(k)).collect();
            expected.sort();
            assert_eq!(tree.keys(), expected);
            assert_eq!(tree.len(), 125);
        }
    }
}

#[test]
fn test_iter_pairs_keys_with_values() {
    let tree = tree_with(4, &shuffled(30, 5));

    for (key, value) in tree.iter() {
        assert_eq!(value, &format!("v{}", key));
    }
}

// =============================================================================
// Rendering Tests
// =============================================================================

#[test]
fn test_render_single_leaf() {
    let tree = tree_with(4, &[2, 1]);
    assert_eq!(tree.render(), "`- [1, 2]\n");
}

#[test]
fn test_render_lists_every_node() {
    let tree = tree_with(2, &(1..=10).collect::<Vec<_>>());
    let rendered = tree.render();

    assert!(rendered.starts_with("`- ["));
    assert_eq!(rendered.lines().count(), tree.arena().live_count());
}
