//! LRU Recency Structure
//!
//! Unsynchronized map-plus-doubly-linked-list core of the order cache.
//! Nodes live in a slab indexed by `usize`, so promotion, insertion and
//! eviction are all O(1) pointer splices with no per-operation allocation
//! beyond the entry itself. Synchronization is the engine's job, not ours.

use std::collections::HashMap;

use crate::models::Order;

/// Node in the recency list. `prev` points toward the MRU end,
/// `next` toward the LRU end.
struct Node {
    uid: String,
    order: Order,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Fixed-capacity mapping from order uid to record with LRU eviction order.
///
/// Head = most recently used, tail = least recently used. A uid appears at
/// most once; the entry count never exceeds `capacity`.
pub(crate) struct LruMap {
    map: HashMap<String, usize>,
    nodes: Vec<Option<Node>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    capacity: usize,
}

impl LruMap {
    /// Creates an empty map. The engine validates capacity before calling.
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            map: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_list: Vec::new(),
            capacity,
        }
    }

    /// Looks up an order and promotes it to most-recently-used on a hit.
    pub(crate) fn get(&mut self, uid: &str) -> Option<&Order> {
        let idx = *self.map.get(uid)?;
        self.move_to_front(idx);
        self.nodes[idx].as_ref().map(|node| &node.order)
    }

    /// Reads the cached version for a uid without touching recency order.
    pub(crate) fn peek_version(&self, uid: &str) -> Option<u64> {
        let idx = *self.map.get(uid)?;
        self.nodes[idx].as_ref().map(|node| node.order.version)
    }

    /// Inserts or replaces the entry for `uid` and marks it most-recently-used.
    ///
    /// Returns the order evicted to make room, if any. An overwrite never
    /// counts twice against capacity and never evicts.
    pub(crate) fn insert(&mut self, uid: String, order: Order) -> Option<Order> {
        if let Some(&idx) = self.map.get(&uid) {
            if let Some(node) = &mut self.nodes[idx] {
                node.order = order;
            }
            self.move_to_front(idx);
            return None;
        }

        let evicted = if self.map.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        let idx = self.alloc_node();
        self.nodes[idx] = Some(Node {
            uid: uid.clone(),
            order,
            prev: None,
            next: self.head,
        });

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }

        self.map.insert(uid, idx);
        evicted
    }

    /// Removes the entry for `uid` if present.
    pub(crate) fn remove(&mut self, uid: &str) -> Option<Order> {
        let idx = self.map.remove(uid)?;
        self.unlink(idx);
        self.free_list.push(idx);
        self.nodes[idx].take().map(|node| node.order)
    }

    /// Current entry count.
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    /// Splices a node out of its position and relinks it at the MRU end.
    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }

        self.unlink(idx);

        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = self.head;
        }

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    /// Detaches a node from the list, fixing head/tail as needed.
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match &self.nodes[idx] {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }
    }

    /// Drops the node at the LRU end and deletes its map entry.
    fn evict_lru(&mut self) -> Option<Order> {
        let tail_idx = self.tail?;
        self.unlink(tail_idx);
        let node = self.nodes[tail_idx].take()?;
        self.map.remove(&node.uid);
        self.free_list.push(tail_idx);
        Some(node.order)
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }

    /// Walks the recency list in both directions and asserts it agrees with
    /// the map on membership and cardinality. Used by the stress harness.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        use std::collections::HashSet;

        assert!(self.map.len() <= self.capacity, "capacity exceeded");

        // Forward walk from MRU to LRU
        let mut seen = HashSet::new();
        let mut cursor = self.head;
        let mut prev = None;
        while let Some(idx) = cursor {
            let node = self.nodes[idx].as_ref().expect("list points at empty slot");
            assert_eq!(node.prev, prev, "broken back-pointer at {}", node.uid);
            assert_eq!(
                self.map.get(&node.uid),
                Some(&idx),
                "map disagrees with list for {}",
                node.uid
            );
            assert!(seen.insert(node.uid.clone()), "duplicate key {}", node.uid);
            prev = cursor;
            cursor = node.next;
        }

        assert_eq!(self.tail, prev, "tail does not match end of forward walk");
        assert_eq!(seen.len(), self.map.len(), "list and map cardinality differ");
    }
}
