//! Property tests for BoundedTaskIndex.
//!
//! - len() never exceeds capacity()
//! - eviction always drops the least recently used id
//! - get()/get_mut() promote, peek() does not
//! - ids() matches a VecDeque reference model (front = MRU)

use std::collections::{HashMap, VecDeque};

use proptest::prelude::*;

use taskpulse_core::{BoundedTaskIndex, TaskRecord, TaskState};

#[derive(Debug, Clone)]
enum Op {
    Put(u8, u64),
    Get(u8),
    Peek(u8),
    Remove(u8),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..24, any::<u64>()).prop_map(|(k, v)| Op::Put(k, v)),
        2 => (0u8..24).prop_map(Op::Get),
        1 => (0u8..24).prop_map(Op::Peek),
        1 => (0u8..24).prop_map(Op::Remove),
    ]
}

fn key(k: u8) -> String {
    format!("task-{k}")
}

fn record(k: u8, clock: u64) -> TaskRecord {
    let mut record = TaskRecord::new(key(k), TaskState::Sent);
    record.clock = clock;
    record
}

struct Model {
    capacity: usize,
    order: VecDeque<String>,
    values: HashMap<String, u64>,
}

impl Model {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            values: HashMap::new(),
        }
    }

    fn promote(&mut self, id: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == id) {
            let id = self.order.remove(pos).unwrap();
            self.order.push_front(id);
        }
    }

    fn put(&mut self, id: String, value: u64) -> Option<String> {
        if self.values.insert(id.clone(), value).is_some() {
            self.promote(&id);
            return None;
        }
        let evicted = if self.order.len() >= self.capacity {
            let lru = self.order.pop_back().unwrap();
            self.values.remove(&lru);
            Some(lru)
        } else {
            None
        };
        self.order.push_front(id);
        evicted
    }

    fn get(&mut self, id: &str) -> Option<u64> {
        let value = self.values.get(id).copied();
        if value.is_some() {
            self.promote(id);
        }
        value
    }

    fn remove(&mut self, id: &str) -> Option<u64> {
        let value = self.values.remove(id)?;
        self.order.retain(|k| k != id);
        Some(value)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn matches_reference_model(capacity in 1usize..=12, ops in prop::collection::vec(arb_op(), 1..200)) {
        let mut index = BoundedTaskIndex::new(capacity);
        let mut model = Model::new(capacity);
        let mut evictions = 0u64;

        for op in ops {
            match op {
                Op::Put(k, v) => {
                    let evicted = index.put(key(k), record(k, v)).map(|r| r.id);
                    let expected = model.put(key(k), v);
                    if expected.is_some() {
                        evictions += 1;
                    }
                    prop_assert_eq!(evicted, expected);
                }
                Op::Get(k) => {
                    let got = index.get(&key(k)).map(|r| r.clock);
                    prop_assert_eq!(got, model.get(&key(k)));
                }
                Op::Peek(k) => {
                    let got = index.peek(&key(k)).map(|r| r.clock);
                    prop_assert_eq!(got, model.values.get(&key(k)).copied());
                }
                Op::Remove(k) => {
                    let got = index.remove(&key(k)).map(|r| r.clock);
                    prop_assert_eq!(got, model.remove(&key(k)));
                }
            }

            prop_assert!(index.len() <= index.capacity());
            prop_assert_eq!(index.len(), model.order.len());
        }

        let ids: Vec<&str> = index.ids().collect();
        let expected: Vec<&str> = model.order.iter().map(String::as_str).collect();
        prop_assert_eq!(ids, expected);
        prop_assert_eq!(index.evictions(), evictions);
    }

    #[test]
    fn distinct_inserts_keep_the_most_recent(capacity in 1usize..=16, extra in 1usize..=32) {
        let mut index = BoundedTaskIndex::new(capacity);
        let total = capacity + extra;
        for i in 0..total {
            index.put(format!("t{i}"), TaskRecord::new(format!("t{i}"), TaskState::Received));
        }

        prop_assert_eq!(index.len(), capacity);
        prop_assert_eq!(index.evictions(), extra as u64);
        for i in 0..extra {
            let id = format!("t{i}");
            prop_assert!(!index.contains(&id));
        }
        for i in extra..total {
            let id = format!("t{i}");
            prop_assert!(index.contains(&id));
        }
    }

    #[test]
    fn peek_never_changes_order(capacity in 2usize..=10, probes in prop::collection::vec(0usize..10, 1..20)) {
        let mut index = BoundedTaskIndex::new(capacity);
        for i in 0..capacity {
            index.put(format!("t{i}"), TaskRecord::new(format!("t{i}"), TaskState::Sent));
        }
        let before: Vec<String> = index.ids().map(str::to_string).collect();
        for p in probes {
            let _ = index.peek(&format!("t{}", p % capacity));
        }
        let after: Vec<String> = index.ids().map(str::to_string).collect();
        prop_assert_eq!(before, after);
    }
}
