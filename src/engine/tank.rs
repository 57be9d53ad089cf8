// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Priority storage behind the recursion trampoline.
//!
//! A tank queue stage and the feeder that precedes it on a loop's back edge
//! share one [`TankHandle`]. The feeder pushes straight into the storage
//! instead of calling the tank's `accept`, and the tank's drain loop (still
//! active further up the call stack) picks the unit up. The handle is only
//! ever borrowed for the duration of a single push or pop, never across a
//! forward, so neither side can observe the other mid-operation.
//!
//! # Priority Ordering
//!
//! Entries are ordered by:
//! 1. **Priority** (lower first), read from the configured priority field
//! 2. **Insertion sequence** (earlier first) for equal priorities
//!
//! Units without a priority get the next value of a strictly increasing
//! counter that starts at 1. Placeholders sit at [`PLACEHOLDER_PRIORITY`] so
//! they always drain first; they are dropped rather than forwarded.
//!
//! # Examples
//!
//! ```rust
//! use the_filterworks::engine::tank::TankHandle;
//! use the_filterworks::packet::Unit;
//!
//! let tank = TankHandle::new(2, "seq_num");
//! for (text, seq) in [("six", 6), ("five", 5), ("minus", -1)] {
//!     let unit = Unit::from_text(text);
//!     unit.set_seq_num(seq);
//!     tank.push(unit);
//! }
//!
//! // Over capacity: the lowest priority entry leaves first.
//! let released = tank.pop_excess().flatten().unwrap();
//! assert_eq!(released.text(), "minus");
//! assert!(tank.pop_excess().is_none());
//! ```

use crate::config::consts::{DEFAULT_PRIORITY_FIELD, PLACEHOLDER_PRIORITY};
use crate::packet::Unit;
use std::cell::RefCell;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::rc::Rc;

/// One buffered entry. `unit == None` marks a placeholder.
#[derive(Debug)]
pub struct Slot {
    pub priority: f64,
    pub order: u64,
    pub unit: Option<Unit>,
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Slot {}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then(self.order.cmp(&other.order))
    }
}

/// Min-heap of units keyed by (priority, insertion sequence).
#[derive(Debug, Default)]
pub struct PriorityBuffer {
    heap: BinaryHeap<Reverse<Slot>>,
    sequence: u64,
}

impl PriorityBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Pushes a unit. `priority == None` uses the internal counter.
    pub fn push(&mut self, unit: Unit, priority: Option<f64>) {
        let order = self.next_sequence();
        let priority = priority.unwrap_or(order as f64);
        self.heap.push(Reverse(Slot {
            priority,
            order,
            unit: Some(unit),
        }));
    }

    pub fn push_placeholder(&mut self) {
        let order = self.next_sequence();
        self.heap.push(Reverse(Slot {
            priority: PLACEHOLDER_PRIORITY,
            order,
            unit: None,
        }));
    }

    /// Removes the lowest-priority entry.
    pub fn pop(&mut self) -> Option<Slot> {
        self.heap.pop().map(|Reverse(slot)| slot)
    }

    /// Entries, placeholders included.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Entries that are real units.
    pub fn held(&self) -> usize {
        self.heap.iter().filter(|Reverse(s)| s.unit.is_some()).count()
    }

    /// Payloads of the held units in priority order.
    pub fn sorted_data(&self) -> Vec<Vec<u8>> {
        let mut slots: Vec<&Slot> = self.heap.iter().map(|Reverse(s)| s).collect();
        slots.sort();
        slots
            .into_iter()
            .filter_map(|s| s.unit.as_ref().map(Unit::data))
            .collect()
    }
}

#[derive(Debug)]
pub struct TankStore {
    buffer: PriorityBuffer,
    capacity: i64,
    priority_field: String,
}

impl TankStore {
    fn priority_of(&self, unit: &Unit) -> Option<f64> {
        if self.priority_field == DEFAULT_PRIORITY_FIELD {
            if let Some(seq) = unit.seq_num() {
                return Some(seq as f64);
            }
        }
        unit.attr(&self.priority_field).and_then(|v| v.as_f64())
    }
}

/// Shared handle onto tank storage. Cloning shares the storage.
#[derive(Debug, Clone)]
pub struct TankHandle {
    store: Rc<RefCell<TankStore>>,
}

impl Default for TankHandle {
    fn default() -> Self {
        Self::new(0, DEFAULT_PRIORITY_FIELD)
    }
}

impl TankHandle {
    /// A negative capacity retains everything.
    pub fn new(capacity: i64, priority_field: &str) -> Self {
        Self {
            store: Rc::new(RefCell::new(TankStore {
                buffer: PriorityBuffer::new(),
                capacity,
                priority_field: priority_field.to_string(),
            })),
        }
    }

    pub fn push(&self, unit: Unit) {
        let mut store = self.store.borrow_mut();
        let priority = store.priority_of(&unit);
        store.buffer.push(unit, priority);
    }

    /// Pops one entry if the buffer is over capacity.
    ///
    /// Returns `None` when nothing needs to leave, `Some(None)` for a
    /// placeholder and `Some(Some(unit))` for a unit to forward.
    pub fn pop_excess(&self) -> Option<Option<Unit>> {
        let mut store = self.store.borrow_mut();
        let capacity = store.capacity;
        if capacity < 0 || store.buffer.len() as i64 <= capacity {
            return None;
        }
        store.buffer.pop().map(|slot| slot.unit)
    }

    /// Pads with placeholders up to capacity. No-op for negative capacity.
    pub fn pad(&self) -> usize {
        let mut store = self.store.borrow_mut();
        let mut added = 0;
        while store.capacity >= 0 && (store.buffer.len() as i64) < store.capacity {
            store.buffer.push_placeholder();
            added += 1;
        }
        added
    }

    pub fn set_capacity(&self, capacity: i64) {
        self.store.borrow_mut().capacity = capacity;
    }

    pub fn capacity(&self) -> i64 {
        self.store.borrow().capacity
    }

    pub fn set_priority_field(&self, field: &str) {
        self.store.borrow_mut().priority_field = field.to_string();
    }

    pub fn len(&self) -> usize {
        self.store.borrow().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.borrow().buffer.is_empty()
    }

    pub fn held(&self) -> usize {
        self.store.borrow().buffer.held()
    }

    pub fn sorted_data(&self) -> Vec<Vec<u8>> {
        self.store.borrow().buffer.sorted_data()
    }

    pub fn same_store(&self, other: &TankHandle) -> bool {
        Rc::ptr_eq(&self.store, &other.store)
    }
}
