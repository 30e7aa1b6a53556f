//! B+ Tree Engine
//!
//! Orchestrates the node model into whole-tree find/insert/delete and ordered
//! scans over the leaf chain.

use std::fmt::{self, Write as _};

use tracing::debug;

use crate::error::{Result, StrataError};

use super::node::{locate, InternalNode, LeafNode, Node, NodeArena, NodeId};

/// Structural counters for one tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Every split (leaf or internal)
    pub splits: u64,
    /// Splits of internal nodes only
    pub parent_splits: u64,
    /// Every fusion (leaf or internal)
    pub fusions: u64,
    /// Fusions of internal nodes only
    pub parent_fusions: u64,
}

/// B+ tree mapping unique keys to values
///
/// ## Occupancy
/// - every non-root node holds between `minimum` and `maximum` keys
/// - the root may hold fewer (an internal root holds at least one)
///
/// ## Growth / shrink
/// - a root split allocates a new root (`depth += 1`)
/// - an internal root left with zero keys is replaced by its only child
///   (`depth -= 1`)
#[derive(Debug, Clone)]
pub struct BPlusTree<K, V> {
    arena: NodeArena<K, V>,
    root: NodeId,
    maximum: usize,
    minimum: usize,
    depth: usize,
    len: usize,
    stats: TreeStats,
}

impl<K: Ord + Clone, V> BPlusTree<K, V> {
    /// Create an empty tree with fanout `maximum` (values below 2 clamp to 2)
    pub fn new(maximum: usize) -> Self {
        let maximum = maximum.max(2);
        let mut arena = NodeArena::new();
        let root = arena.alloc(Node::Leaf(LeafNode::new()));

        Self {
            arena,
            root,
            maximum,
            minimum: maximum / 2,
            depth: 0,
            len: 0,
            stats: TreeStats::default(),
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Descend to the leaf that holds (or would hold) `key`
    pub fn find(&self, key: &K) -> NodeId {
        let mut node = self.root;
        loop {
            match self.arena.get(node) {
                Node::Leaf(_) => return node,
                Node::Internal(internal) => {
                    node = internal.children[locate(&internal.keys, key)];
                }
            }
        }
    }

    /// Value stored under `key`, if any
    pub fn query(&self, key: &K) -> Option<&V> {
        let leaf = self.arena.leaf(self.find(key));
        leaf.keys
            .binary_search(key)
            .ok()
            .map(|i| &leaf.values[i])
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.query(key).is_some()
    }

    /// Leftmost leaf: the head of the leaf chain
    pub fn leftmost_leaf(&self) -> NodeId {
        let mut node = self.root;
        while let Node::Internal(internal) = self.arena.get(node) {
            node = internal.children[0];
        }
        node
    }

    /// Ordered iterator over `(key, value)` following the leaf chain
    pub fn iter(&self) -> LeafChainIter<'_, K, V> {
        LeafChainIter {
            arena: &self.arena,
            leaf: Some(self.leftmost_leaf()),
            pos: 0,
        }
    }

    /// All keys in ascending order
    pub fn keys(&self) -> Vec<K> {
        self.iter().map(|(k, _)| k.clone()).collect()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert a new key
    ///
    /// Returns `(false, leaf)` without touching the tree if the key exists,
    /// otherwise `(true, leaf)` where `leaf` now holds the key.
    pub fn insert(&mut self, key: K, value: V) -> (bool, NodeId) {
        let leaf_id = self.find(&key);
        let leaf = self.arena.leaf_mut(leaf_id);

        let pos = match leaf.keys.binary_search(&key) {
            Ok(_) => return (false, leaf_id),
            Err(pos) => pos,
        };
        leaf.keys.insert(pos, key);
        leaf.values.insert(pos, value);
        let count = leaf.keys.len();
        self.len += 1;

        let home = if count > self.maximum {
            let (pivot, [left, right]) = self.split_node(leaf_id);
            self.insert_index(pivot, left, right);
            if pos < count / 2 {
                left
            } else {
                right
            }
        } else {
            leaf_id
        };

        self.debug_validate();
        (true, home)
    }

    /// Replace the value of an existing key; no structural change
    pub fn change(&mut self, key: &K, value: V) -> (bool, NodeId) {
        let leaf_id = self.find(key);
        let leaf = self.arena.leaf_mut(leaf_id);
        match leaf.keys.binary_search(key) {
            Ok(i) => {
                leaf.values[i] = value;
                (true, leaf_id)
            }
            Err(_) => (false, leaf_id),
        }
    }

    /// Remove a key, returning its value
    ///
    /// An under-full node first borrows from a sibling, otherwise it is fused
    /// and the deficiency check moves to its parent.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        let leaf_id = self.find(key);
        let leaf = self.arena.leaf_mut(leaf_id);
        let pos = leaf.keys.binary_search(key).ok()?;

        leaf.keys.remove(pos);
        let value = leaf.values.remove(pos);
        self.len -= 1;

        self.rebalance(leaf_id);
        self.debug_validate();
        Some(value)
    }

    /// Push a split upward until a parent absorbs it or a new root grows
    fn insert_index(&mut self, pivot: K, left: NodeId, right: NodeId) {
        let mut pending = Some((pivot, left, right));

        while let Some((pivot, left, right)) = pending.take() {
            match self.arena.get(right).parent() {
                None => {
                    let root = self.arena.alloc(Node::Internal(InternalNode {
                        keys: vec![pivot],
                        children: vec![left, right],
                        parent: None,
                    }));
                    self.arena.get_mut(left).set_parent(Some(root));
                    self.arena.get_mut(right).set_parent(Some(root));
                    self.root = root;
                    self.depth += 1;
                    debug!(depth = self.depth, "B+ tree grew a new root");
                }
                Some(parent) => {
                    let idx = self.arena.child_index(parent, right);
                    let node = self.arena.internal_mut(parent);
                    node.keys.insert(idx, pivot);
                    node.children.insert(idx, left);

                    if node.keys.len() > self.maximum {
                        let (pivot, [left, right]) = self.split_node(parent);
                        pending = Some((pivot, left, right));
                    }
                }
            }
        }
    }

    /// Restore occupancy from `node` upward after a removal
    fn rebalance(&mut self, mut node: NodeId) {
        loop {
            if node == self.root {
                self.shrink_root();
                return;
            }
            if self.arena.get(node).key_count() >= self.minimum {
                return;
            }
            if self.arena.borrow_key(node, self.minimum) {
                return;
            }

            let Some(parent) = self.arena.get(node).parent() else {
                panic!("non-root {} has no parent", node);
            };
            self.stats.fusions += 1;
            if !self.arena.get(node).is_leaf() {
                self.stats.parent_fusions += 1;
            }
            self.arena.fusion(node);
            node = parent;
        }
    }

    fn shrink_root(&mut self) {
        let child = match self.arena.get(self.root) {
            Node::Internal(root) if root.keys.is_empty() => root.children[0],
            _ => return,
        };

        self.arena.release(self.root);
        self.arena.get_mut(child).set_parent(None);
        self.root = child;
        self.depth -= 1;
        debug!(depth = self.depth, "B+ tree root collapsed");
    }

    fn split_node(&mut self, id: NodeId) -> (K, [NodeId; 2]) {
        self.stats.splits += 1;
        if !self.arena.get(id).is_leaf() {
            self.stats.parent_splits += 1;
        }
        self.arena.split(id)
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check every structural invariant of the tree
    ///
    /// - parent/child links agree, `children == keys + 1`
    /// - keys strictly ascending and inside the separator bounds
    /// - occupancy within `[minimum, maximum]` below the root
    /// - all leaves at `depth`, leaf chain ascending and complete
    pub fn validate(&self) -> Result<()> {
        let mut leaves = Vec::new();
        self.validate_node(self.root, None, None, None, 0, &mut leaves)?;

        // Leaf chain must visit the leaves in left-to-right order
        let mut chain = Vec::new();
        let mut prev: Option<NodeId> = None;
        let mut cursor = Some(self.leftmost_leaf());
        let mut last_key: Option<&K> = None;
        let mut count = 0;

        while let Some(id) = cursor {
            if chain.len() > leaves.len() {
                return Err(violation("leaf chain contains a cycle"));
            }
            let leaf = self.arena.leaf(id);
            if leaf.prev != prev {
                return Err(violation(format!("{} has a stale prev link", id)));
            }
            for key in &leaf.keys {
                if last_key.is_some_and(|last| last >= key) {
                    return Err(violation("leaf chain is not strictly ascending"));
                }
                last_key = Some(key);
                count += 1;
            }
            chain.push(id);
            prev = Some(id);
            cursor = leaf.next;
        }

        if chain != leaves {
            return Err(violation("leaf chain does not match tree order"));
        }
        if count != self.len {
            return Err(violation(format!(
                "leaf chain holds {} keys, tree counts {}",
                count, self.len
            )));
        }
        Ok(())
    }

    fn validate_node(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        lower: Option<&K>,
        upper: Option<&K>,
        level: usize,
        leaves: &mut Vec<NodeId>,
    ) -> Result<()> {
        if !self.arena.contains(id) {
            return Err(violation(format!("dangling child {}", id)));
        }
        let node = self.arena.get(id);
        if node.parent() != parent {
            return Err(violation(format!("{} has a wrong parent link", id)));
        }

        let keys = node.keys();
        if keys.windows(2).any(|w| w[0] >= w[1]) {
            return Err(violation(format!("{} keys are not strictly ascending", id)));
        }
        if let (Some(lo), Some(first)) = (lower, keys.first()) {
            if first < lo {
                return Err(violation(format!("{} holds a key below its bound", id)));
            }
        }
        if let (Some(hi), Some(last)) = (upper, keys.last()) {
            if last >= hi {
                return Err(violation(format!("{} holds a key above its bound", id)));
            }
        }
        if keys.len() > self.maximum {
            return Err(violation(format!("{} overflows with {} keys", id, keys.len())));
        }
        if id != self.root && keys.len() < self.minimum {
            return Err(violation(format!("{} underflows with {} keys", id, keys.len())));
        }

        match node {
            Node::Leaf(_) => {
                if level != self.depth {
                    return Err(violation(format!(
                        "{} sits at level {} but depth is {}",
                        id, level, self.depth
                    )));
                }
                leaves.push(id);
            }
            Node::Internal(internal) => {
                if internal.children.len() != internal.keys.len() + 1 {
                    return Err(violation(format!(
                        "{} has {} keys but {} children",
                        id,
                        internal.keys.len(),
                        internal.children.len()
                    )));
                }
                if internal.keys.is_empty() {
                    return Err(violation(format!("internal {} holds no keys", id)));
                }
                for (i, &child) in internal.children.iter().enumerate() {
                    let lo = if i == 0 { lower } else { Some(&internal.keys[i - 1]) };
                    let hi = internal.keys.get(i).or(upper);
                    self.validate_node(child, Some(id), lo, hi, level + 1, leaves)?;
                }
            }
        }
        Ok(())
    }

    /// Full check after each mutation when built with `validate-tree`
    #[inline]
    fn debug_validate(&self) {
        #[cfg(feature = "validate-tree")]
        if let Err(e) = self.validate() {
            panic!("{}", e);
        }
    }
}

impl<K, V> BPlusTree<K, V> {
    /// Number of keys stored
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of edges from root to leaves
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Maximum keys per node (M)
    pub fn maximum(&self) -> usize {
        self.maximum
    }

    /// Minimum keys per non-root node (`M / 2`)
    pub fn minimum(&self) -> usize {
        self.minimum
    }

    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Read access to the node arena
    pub fn arena(&self) -> &NodeArena<K, V> {
        &self.arena
    }

    /// Leaf by identifier (as returned by `find`, `insert`, `change`)
    pub fn leaf(&self, id: NodeId) -> &LeafNode<K, V> {
        self.arena.leaf(id)
    }
}

impl<K: fmt::Display, V> BPlusTree<K, V> {
    /// Indented listing of every node's keys, root first
    ///
    /// ```text
    /// `- [3, 5]
    ///    |- [1, 2]
    ///    |- [3, 4]
    ///    `- [5, 6, 7]
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_node(self.root, "", true, &mut out);
        out
    }

    fn render_node(&self, id: NodeId, prefix: &str, last: bool, out: &mut String) {
        let node = self.arena.get(id);
        let keys: Vec<String> = node.keys().iter().map(|k| k.to_string()).collect();
        let _ = writeln!(
            out,
            "{}{}[{}]",
            prefix,
            if last { "`- " } else { "|- " },
            keys.join(", ")
        );

        if let Node::Internal(internal) = node {
            let child_prefix = format!("{}{}", prefix, if last { "   " } else { "|  " });
            let count = internal.children.len();
            for (i, &child) in internal.children.iter().enumerate() {
                self.render_node(child, &child_prefix, i + 1 == count, out);
            }
        }
    }
}

/// Iterator over the leaf chain
pub struct LeafChainIter<'a, K, V> {
    arena: &'a NodeArena<K, V>,
    leaf: Option<NodeId>,
    pos: usize,
}

impl<'a, K, V> Iterator for LeafChainIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        loop {
            let leaf = arena.leaf(self.leaf?);
            if self.pos < leaf.keys.len() {
                let item = (&leaf.keys[self.pos], &leaf.values[self.pos]);
                self.pos += 1;
                return Some(item);
            }
            self.leaf = leaf.next;
            self.pos = 0;
        }
    }
}

fn violation(msg: impl Into<String>) -> StrataError {
    StrataError::InvariantViolation(msg.into())
}
