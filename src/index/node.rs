//! Index Node Model
//!
//! Internal nodes, leaves, and the arena that owns them. Parent, child and
//! sibling links are arena identifiers, so the node graph has no ownership
//! cycles.
//!
//! ## Routing
//! ```text
//!            [ 10 | 20 ]
//!           /     |     \
//!     k < 10  10<=k<20  k >= 20
//! ```
//! Internal nodes route an equal key to the right. Leaves treat an equal key
//! as "replace", never as a duplicate.
//!
//! All operations here are pure in-memory; none of them touch a file.

/// Stable identifier of a node inside a [`NodeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// Routing node: `children.len() == keys.len() + 1`
#[derive(Debug, Clone)]
pub struct InternalNode<K> {
    pub keys: Vec<K>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

/// Leaf node holding values, linked to its neighbours across the whole tree
#[derive(Debug, Clone)]
pub struct LeafNode<K, V> {
    pub keys: Vec<K>,
    pub values: Vec<V>,
    pub parent: Option<NodeId>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
}

/// Either kind of node
#[derive(Debug, Clone)]
pub enum Node<K, V> {
    Internal(InternalNode<K>),
    Leaf(LeafNode<K, V>),
}

/// Index of the first key strictly greater than `key` (or `keys.len()`)
pub fn locate<K: Ord>(keys: &[K], key: &K) -> usize {
    keys.partition_point(|k| k <= key)
}

impl<K, V> LeafNode<K, V> {
    /// An empty, unlinked leaf
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            parent: None,
            prev: None,
            next: None,
        }
    }
}

impl<K, V> Default for LeafNode<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> Node<K, V> {
    /// Position of the first key strictly greater than `key`
    pub fn locate(&self, key: &K) -> usize {
        locate(self.keys(), key)
    }
}

impl<K, V> Node<K, V> {
    pub fn keys(&self) -> &[K] {
        match self {
            Node::Internal(n) => &n.keys,
            Node::Leaf(l) => &l.keys,
        }
    }

    pub fn key_count(&self) -> usize {
        self.keys().len()
    }

    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Internal(n) => n.parent,
            Node::Leaf(l) => l.parent,
        }
    }

    pub fn set_parent(&mut self, parent: Option<NodeId>) {
        match self {
            Node::Internal(n) => n.parent = parent,
            Node::Leaf(l) => l.parent = parent,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }
}

/// Dense container owning every node of one tree
///
/// Released slots are recycled, so identifiers stay small and stable for the
/// lifetime of the node they name.
#[derive(Debug, Clone)]
pub struct NodeArena<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<NodeId>,
}

impl<K, V> Default for NodeArena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> NodeArena<K, V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Store a node and return its identifier
    pub fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.0] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Remove a node from the arena, returning it
    pub fn release(&mut self, id: NodeId) -> Node<K, V> {
        match self.slots.get_mut(id.0).and_then(Option::take) {
            Some(node) => {
                self.free.push(id);
                node
            }
            None => panic!("release of dead {}", id),
        }
    }

    /// Number of live nodes
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    pub fn get(&self, id: NodeId) -> &Node<K, V> {
        match self.slots.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("dangling {}", id),
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        match self.slots.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("dangling {}", id),
        }
    }

    pub fn leaf(&self, id: NodeId) -> &LeafNode<K, V> {
        match self.get(id) {
            Node::Leaf(l) => l,
            Node::Internal(_) => panic!("{} is not a leaf", id),
        }
    }

    pub fn leaf_mut(&mut self, id: NodeId) -> &mut LeafNode<K, V> {
        match self.get_mut(id) {
            Node::Leaf(l) => l,
            Node::Internal(_) => panic!("{} is not a leaf", id),
        }
    }

    pub fn internal(&self, id: NodeId) -> &InternalNode<K> {
        match self.get(id) {
            Node::Internal(n) => n,
            Node::Leaf(_) => panic!("{} is not an internal node", id),
        }
    }

    pub fn internal_mut(&mut self, id: NodeId) -> &mut InternalNode<K> {
        match self.get_mut(id) {
            Node::Internal(n) => n,
            Node::Leaf(_) => panic!("{} is not an internal node", id),
        }
    }

    /// Position of `child` among its parent's children
    pub fn child_index(&self, parent: NodeId, child: NodeId) -> usize {
        match self.internal(parent).children.iter().position(|&c| c == child) {
            Some(idx) => idx,
            None => panic!("{} is not a child of its parent {}", child, parent),
        }
    }

    fn adopt(&mut self, parent: NodeId, children: &[NodeId]) {
        for &child in children {
            self.get_mut(child).set_parent(Some(parent));
        }
    }
}

impl<K: Ord + Clone, V> NodeArena<K, V> {
    // =========================================================================
    // Split
    // =========================================================================

    /// Split an overfull node at `mid = len / 2`
    ///
    /// The original node keeps its identifier and becomes the right half; a
    /// new left node is allocated. Returns `(pivot, [left, right])`.
    ///
    /// - Internal: `keys[mid]` moves up and appears in neither half.
    /// - Leaf: the pivot is the first key of the right half and stays there.
    pub fn split(&mut self, id: NodeId) -> (K, [NodeId; 2]) {
        match self.get(id) {
            Node::Internal(_) => self.split_internal(id),
            Node::Leaf(_) => self.split_leaf(id),
        }
    }

    fn split_internal(&mut self, id: NodeId) -> (K, [NodeId; 2]) {
        let node = self.internal_mut(id);
        let mid = node.keys.len() / 2;

        let mut upper_keys = node.keys.split_off(mid);
        let pivot = upper_keys.remove(0);
        let upper_children = node.children.split_off(mid + 1);

        let lower_keys = std::mem::replace(&mut node.keys, upper_keys);
        let lower_children = std::mem::replace(&mut node.children, upper_children);
        let parent = node.parent;

        let left = self.alloc(Node::Internal(InternalNode {
            keys: lower_keys,
            children: lower_children.clone(),
            parent,
        }));
        self.adopt(left, &lower_children);

        (pivot, [left, id])
    }

    fn split_leaf(&mut self, id: NodeId) -> (K, [NodeId; 2]) {
        let leaf = self.leaf_mut(id);
        let mid = leaf.keys.len() / 2;

        let upper_keys = leaf.keys.split_off(mid);
        let upper_values = leaf.values.split_off(mid);
        let lower_keys = std::mem::replace(&mut leaf.keys, upper_keys);
        let lower_values = std::mem::replace(&mut leaf.values, upper_values);
        let pivot = leaf.keys[0].clone();
        let parent = leaf.parent;
        let prev = leaf.prev;

        let left = self.alloc(Node::Leaf(LeafNode {
            keys: lower_keys,
            values: lower_values,
            parent,
            prev,
            next: Some(id),
        }));

        self.leaf_mut(id).prev = Some(left);
        if let Some(prev) = prev {
            self.leaf_mut(prev).next = Some(left);
        }

        (pivot, [left, id])
    }

    // =========================================================================
    // Borrow
    // =========================================================================

    /// Pull one entry from a sibling holding more than `minimum` keys
    ///
    /// Tries the right sibling first, then the left one. The shared parent's
    /// separator is adjusted. Returns false (and changes nothing) when neither
    /// sibling can spare a key.
    pub fn borrow_key(&mut self, id: NodeId, minimum: usize) -> bool {
        let Some(parent) = self.get(id).parent() else {
            return false;
        };
        let idx = self.child_index(parent, id);
        let siblings = self.internal(parent).children.len();

        if idx + 1 < siblings {
            let right = self.internal(parent).children[idx + 1];
            if self.get(right).key_count() > minimum {
                self.borrow_from_right(parent, idx, id, right);
                return true;
            }
        }

        if idx > 0 {
            let left = self.internal(parent).children[idx - 1];
            if self.get(left).key_count() > minimum {
                self.borrow_from_left(parent, idx, id, left);
                return true;
            }
        }

        false
    }

    fn borrow_from_right(&mut self, parent: NodeId, idx: usize, id: NodeId, right: NodeId) {
        if self.get(id).is_leaf() {
            let (key, value) = {
                let donor = self.leaf_mut(right);
                (donor.keys.remove(0), donor.values.remove(0))
            };
            let separator = self.leaf(right).keys[0].clone();

            let leaf = self.leaf_mut(id);
            leaf.keys.push(key);
            leaf.values.push(value);
            self.internal_mut(parent).keys[idx] = separator;
        } else {
            let separator = self.internal(parent).keys[idx].clone();
            let (key, child) = {
                let donor = self.internal_mut(right);
                (donor.keys.remove(0), donor.children.remove(0))
            };

            let node = self.internal_mut(id);
            node.keys.push(separator);
            node.children.push(child);
            self.get_mut(child).set_parent(Some(id));
            self.internal_mut(parent).keys[idx] = key;
        }
    }

    fn borrow_from_left(&mut self, parent: NodeId, idx: usize, id: NodeId, left: NodeId) {
        if self.get(id).is_leaf() {
            let (key, value) = {
                let donor = self.leaf_mut(left);
                let last = donor.keys.len() - 1;
                (donor.keys.remove(last), donor.values.remove(last))
            };

            let leaf = self.leaf_mut(id);
            leaf.keys.insert(0, key.clone());
            leaf.values.insert(0, value);
            self.internal_mut(parent).keys[idx - 1] = key;
        } else {
            let separator = self.internal(parent).keys[idx - 1].clone();
            let (key, child) = {
                let donor = self.internal_mut(left);
                let last = donor.keys.len() - 1;
                (donor.keys.remove(last), donor.children.remove(last + 1))
            };

            let node = self.internal_mut(id);
            node.keys.insert(0, separator);
            node.children.insert(0, child);
            self.get_mut(child).set_parent(Some(id));
            self.internal_mut(parent).keys[idx - 1] = key;
        }
    }

    // =========================================================================
    // Fusion
    // =========================================================================

    /// Merge a deficient node into an adjacent sibling and release it
    ///
    /// Prefers the right sibling under the same parent, else the left one.
    /// The separator between the two is removed from the parent (and, for
    /// internal nodes, pulled down into the merged node). Leaves are unlinked
    /// from the leaf chain. Returns the surviving sibling.
    pub fn fusion(&mut self, id: NodeId) -> NodeId {
        let Some(parent) = self.get(id).parent() else {
            panic!("fusion of parentless {}", id);
        };
        let idx = self.child_index(parent, id);
        let siblings = self.internal(parent).children.len();
        if siblings < 2 {
            panic!("{} has no sibling to merge with", id);
        }

        let into_right = idx + 1 < siblings;
        let (target, separator_idx) = if into_right {
            (self.internal(parent).children[idx + 1], idx)
        } else {
            (self.internal(parent).children[idx - 1], idx - 1)
        };

        let separator = {
            let p = self.internal_mut(parent);
            p.children.remove(idx);
            p.keys.remove(separator_idx)
        };

        match self.release(id) {
            Node::Leaf(leaf) => {
                if let Some(prev) = leaf.prev {
                    self.leaf_mut(prev).next = leaf.next;
                }
                if let Some(next) = leaf.next {
                    self.leaf_mut(next).prev = leaf.prev;
                }

                let survivor = self.leaf_mut(target);
                if into_right {
                    let (mut keys, mut values) = (leaf.keys, leaf.values);
                    keys.append(&mut survivor.keys);
                    values.append(&mut survivor.values);
                    survivor.keys = keys;
                    survivor.values = values;
                } else {
                    survivor.keys.extend(leaf.keys);
                    survivor.values.extend(leaf.values);
                }
            }
            Node::Internal(node) => {
                self.adopt(target, &node.children);

                let survivor = self.internal_mut(target);
                if into_right {
                    let (mut keys, mut children) = (node.keys, node.children);
                    keys.push(separator);
                    keys.append(&mut survivor.keys);
                    children.append(&mut survivor.children);
                    survivor.keys = keys;
                    survivor.children = children;
                } else {
                    survivor.keys.push(separator);
                    survivor.keys.extend(node.keys);
                    survivor.children.extend(node.children);
                }
            }
        }

        target
    }
}
