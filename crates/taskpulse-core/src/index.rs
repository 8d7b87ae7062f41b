//! Bounded task index with least-recently-used eviction.
//!
//! A `HashMap` maps task id → arena slot, and an index-linked list over the
//! arena keeps recency order (head = most recent, tail = least recent).
//! `get`, `put` and `remove` are O(1). Removed slots go on a free list, so the
//! arena never grows beyond the capacity.
//!
//! Eviction is silent. Under sustained overload in-flight tasks may be
//! dropped; [`BoundedTaskIndex::evictions`] makes that observable.

use std::collections::HashMap;

use crate::domain::TaskRecord;

/// リンクなし
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node {
    id: String,
    record: Option<TaskRecord>,
    prev: usize,
    next: usize,
}

/// BoundedTaskIndex は容量固定の `task id → TaskRecord` キャッシュ（LRU）
#[derive(Debug)]
pub struct BoundedTaskIndex {
    capacity: usize,
    slots: HashMap<String, usize>,
    arena: Vec<Node>,
    head: usize,
    tail: usize,
    free: usize,
    evictions: u64,
}

impl BoundedTaskIndex {
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "BoundedTaskIndex capacity must be > 0");
        Self {
            capacity,
            slots: HashMap::with_capacity(capacity),
            arena: Vec::new(),
            head: NIL,
            tail: NIL,
            free: NIL,
            evictions: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 容量確保のために追い出したレコード数（生成時からの累計）
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// レコードを取得し、最近使用（MRU）に移動
    pub fn get(&mut self, id: &str) -> Option<&TaskRecord> {
        let idx = *self.slots.get(id)?;
        self.move_to_head(idx);
        self.arena[idx].record.as_ref()
    }

    /// [`get`](Self::get) の可変版（その場で更新する用）
    pub fn get_mut(&mut self, id: &str) -> Option<&mut TaskRecord> {
        let idx = *self.slots.get(id)?;
        self.move_to_head(idx);
        self.arena[idx].record.as_mut()
    }

    /// 使用順を変えずにレコードを参照
    pub fn peek(&self, id: &str) -> Option<&TaskRecord> {
        self.slots
            .get(id)
            .and_then(|&idx| self.arena[idx].record.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// 挿入または置き換え（MRU に移動）
    ///
    /// 容量いっぱいで新しい id を入れると、最も古い（LRU）レコードを
    /// 追い出して返す。
    pub fn put(&mut self, id: String, record: TaskRecord) -> Option<TaskRecord> {
        if let Some(&idx) = self.slots.get(&id) {
            self.arena[idx].record = Some(record);
            self.move_to_head(idx);
            return None;
        }

        let evicted = if self.slots.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        let idx = self.alloc(id.clone(), record);
        self.push_head(idx);
        self.slots.insert(id, idx);
        evicted
    }

    /// レコードを明示的に削除（終端状態の後片付け）
    pub fn remove(&mut self, id: &str) -> Option<TaskRecord> {
        let idx = self.slots.remove(id)?;
        self.unlink(idx);
        self.release(idx)
    }

    /// MRU → LRU の順に id を列挙
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            if cursor == NIL {
                return None;
            }
            let node = &self.arena[cursor];
            cursor = node.next;
            Some(node.id.as_str())
        })
    }

    fn evict_lru(&mut self) -> Option<TaskRecord> {
        if self.tail == NIL {
            return None;
        }
        let idx = self.tail;
        let id = std::mem::take(&mut self.arena[idx].id);
        self.slots.remove(&id);
        self.unlink(idx);
        self.evictions += 1;
        self.release(idx)
    }

    fn alloc(&mut self, id: String, record: TaskRecord) -> usize {
        let node = Node {
            id,
            record: Some(record),
            prev: NIL,
            next: NIL,
        };
        if self.free == NIL {
            self.arena.push(node);
            self.arena.len() - 1
        } else {
            let idx = self.free;
            self.free = self.arena[idx].next;
            self.arena[idx] = node;
            idx
        }
    }

    fn release(&mut self, idx: usize) -> Option<TaskRecord> {
        let node = &mut self.arena[idx];
        let record = node.record.take();
        node.id.clear();
        node.prev = NIL;
        node.next = self.free;
        self.free = idx;
        record
    }

    fn push_head(&mut self, idx: usize) {
        self.arena[idx].prev = NIL;
        self.arena[idx].next = self.head;
        if self.head != NIL {
            self.arena[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.arena[idx].prev, self.arena[idx].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.arena[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.arena[next].prev = prev;
        }
        self.arena[idx].prev = NIL;
        self.arena[idx].next = NIL;
    }

    fn move_to_head(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.unlink(idx);
        self.push_head(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskState;

    fn record(id: &str) -> TaskRecord {
        TaskRecord::new(id, TaskState::Received)
    }

    fn filled(capacity: usize, ids: &[&str]) -> BoundedTaskIndex {
        let mut index = BoundedTaskIndex::new(capacity);
        for id in ids {
            index.put(id.to_string(), record(id));
        }
        index
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut index = filled(3, &["a", "b", "c"]);

        let evicted = index.put("d".to_string(), record("d"));
        assert_eq!(evicted.map(|r| r.id), Some("a".to_string()));
        assert_eq!(index.len(), 3);
        assert!(!index.contains("a"));
        assert_eq!(index.evictions(), 1);
    }

    #[test]
    fn get_refreshes_recency() {
        let mut index = filled(3, &["a", "b", "c"]);
        assert!(index.get("a").is_some());

        index.put("d".to_string(), record("d"));
        assert!(index.contains("a"));
        assert!(!index.contains("b"));
        assert_eq!(index.ids().collect::<Vec<_>>(), vec!["d", "a", "c"]);
    }

    #[test]
    fn peek_does_not_refresh_recency() {
        let mut index = filled(2, &["a", "b"]);
        assert!(index.peek("a").is_some());

        index.put("c".to_string(), record("c"));
        assert!(!index.contains("a"));
    }

    #[test]
    fn replacing_existing_id_never_evicts() {
        let mut index = filled(2, &["a", "b"]);
        let mut updated = record("a");
        updated.state = TaskState::Started;

        assert!(index.put("a".to_string(), updated).is_none());
        assert_eq!(index.len(), 2);
        assert_eq!(index.peek("a").map(|r| r.state), Some(TaskState::Started));
        assert_eq!(index.evictions(), 0);
    }

    #[test]
    fn remove_frees_a_slot_for_reuse() {
        let mut index = filled(2, &["a", "b"]);
        assert_eq!(index.remove("a").map(|r| r.id), Some("a".to_string()));
        assert!(index.remove("a").is_none());

        assert!(index.put("c".to_string(), record("c")).is_none());
        assert_eq!(index.len(), 2);
        assert_eq!(index.arena.len(), 2);
        assert_eq!(index.ids().collect::<Vec<_>>(), vec!["c", "b"]);
    }

    #[test]
    fn capacity_of_one() {
        let mut index = filled(1, &["a"]);
        index.put("b".to_string(), record("b"));
        assert_eq!(index.ids().collect::<Vec<_>>(), vec!["b"]);
        assert!(index.remove("b").is_some());
        assert!(index.is_empty());
        assert_eq!(index.ids().count(), 0);
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn zero_capacity_panics() {
        BoundedTaskIndex::new(0);
    }
}
