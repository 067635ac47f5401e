// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Slab storage and free list for registration slots.

use crate::slot::{Slot, SlotKey, RETIRED_VERSION};
use precedence_core::{ArbiterId, Priority};
use std::cell::RefCell;
use std::rc::Rc;

/// A slot pool that several arbiters of the same value type can share.
pub type SharedSlotPool<V> = Rc<RefCell<SlotPool<V>>>;

/// What happened to a slot when it was handed back to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The slot went back onto the free list and will be reused.
    Pooled,
    /// The slot's version space is exhausted. It stays allocated but is
    /// never reused, so no stale handle can alias a future registrant.
    Retired,
}

/// A snapshot of a pool's occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Slots ever created by the pool.
    pub allocated: usize,
    /// Slots currently backing a registration.
    pub live: usize,
    /// Slots waiting on the free list.
    pub free: usize,
    /// Slots permanently removed from reuse.
    pub retired: usize,
}

/// Arena of registration slots with an intrusive free list.
///
/// Slots are addressed by index and carry a 16-bit version that is bumped on
/// every release. A handle captures `(index, version)` at issue time and is
/// valid only while the live version still matches. When a version would
/// reach `u16::MAX` the slot is retired instead of reused.
#[derive(Debug)]
pub struct SlotPool<V> {
    slots: Vec<Slot<V>>,
    free_head: Option<u32>,
    free_len: usize,
    retired: usize,
}

impl<V> Default for SlotPool<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> SlotPool<V> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty pool with room for `capacity` slots before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            free_len: 0,
            retired: 0,
        }
    }

    /// Creates an empty pool wrapped for sharing between arbiters.
    pub fn shared() -> SharedSlotPool<V> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Returns the current occupancy of the pool.
    pub fn stats(&self) -> PoolStats {
        let allocated = self.slots.len();
        PoolStats {
            allocated,
            live: allocated - self.free_len - self.retired,
            free: self.free_len,
            retired: self.retired,
        }
    }

    /// Takes a slot off the free list, or creates one, and initialises it.
    pub(crate) fn acquire(&mut self, owner: ArbiterId, priority: Priority, value: V) -> SlotKey {
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            self.free_head = slot.next_free.take();
            self.free_len -= 1;
            slot.value = Some(value);
            slot.priority = priority;
            slot.owner = Some(owner);
            SlotKey {
                index,
                version: slot.version,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot::new(owner, priority, value));
            SlotKey { index, version: 0 }
        }
    }

    /// Hands a live slot back, bumping its version first.
    ///
    /// Returns the slot's former payload so the caller can drop it outside
    /// any borrow of the pool.
    pub(crate) fn release(&mut self, index: u32) -> (Release, Option<V>) {
        let slot = &mut self.slots[index as usize];
        debug_assert!(slot.is_live(), "released a slot that is not live");

        let value = slot.value.take();
        slot.owner = None;
        slot.version += 1;

        if slot.is_retired() {
            self.retired += 1;
            log::debug!("Slot {index} reached version {RETIRED_VERSION} and was retired.");
            return (Release::Retired, value);
        }

        slot.next_free = self.free_head;
        self.free_head = Some(index);
        self.free_len += 1;
        (Release::Pooled, value)
    }

    /// Returns the slot designated by `key` if that occupancy is still live.
    pub(crate) fn get(&self, key: SlotKey) -> Option<&Slot<V>> {
        self.slots
            .get(key.index as usize)
            .filter(|slot| slot.version == key.version && slot.is_live())
    }

    /// Mutable counterpart of [`get`](SlotPool::get).
    pub(crate) fn get_mut(&mut self, key: SlotKey) -> Option<&mut Slot<V>> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.version == key.version && slot.is_live())
    }

    /// Direct access by index, for slots an arbiter knows to be live.
    pub(crate) fn slot(&self, index: u32) -> &Slot<V> {
        &self.slots[index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_creates_then_reuses_slots() {
        let owner = ArbiterId::next();
        let mut pool = SlotPool::new();

        let first = pool.acquire(owner, Priority(0), "a");
        assert_eq!(first, SlotKey { index: 0, version: 0 });
        assert_eq!(pool.release(first.index), (Release::Pooled, Some("a")));

        let second = pool.acquire(owner, Priority(1), "b");
        assert_eq!(second.index, 0, "The freed slot should be reused");
        assert_eq!(second.version, 1, "Reuse must observe the bumped version");
        assert_eq!(pool.stats().allocated, 1);
    }

    #[test]
    fn free_list_is_last_in_first_out() {
        let owner = ArbiterId::next();
        let mut pool = SlotPool::new();
        let a = pool.acquire(owner, Priority(0), 1);
        let b = pool.acquire(owner, Priority(0), 2);

        pool.release(a.index);
        pool.release(b.index);

        assert_eq!(pool.acquire(owner, Priority(0), 3).index, b.index);
        assert_eq!(pool.acquire(owner, Priority(0), 4).index, a.index);
        assert_eq!(pool.acquire(owner, Priority(0), 5).index, 2);
    }

    #[test]
    fn stale_keys_do_not_resolve() {
        let owner = ArbiterId::next();
        let mut pool = SlotPool::new();
        let old = pool.acquire(owner, Priority(0), 10);
        pool.release(old.index);
        assert!(pool.get(old).is_none(), "Released occupancy must not resolve");

        let new = pool.acquire(owner, Priority(0), 20);
        assert_eq!(new.index, old.index);
        assert!(pool.get(old).is_none(), "Old key must not alias the new occupancy");
        assert_eq!(pool.get(new).and_then(|s| s.value), Some(20));
        assert!(pool.get_mut(old).is_none());
    }

    #[test]
    fn out_of_range_key_does_not_resolve() {
        let pool = SlotPool::<u8>::new();
        assert!(pool.get(SlotKey { index: 9, version: 0 }).is_none());
    }

    #[test]
    fn slot_is_retired_when_version_space_runs_out() {
        let owner = ArbiterId::next();
        let mut pool = SlotPool::new();

        let mut last = pool.acquire(owner, Priority(0), 0u32);
        for n in 1..u32::from(RETIRED_VERSION) {
            assert_eq!(pool.release(last.index).0, Release::Pooled);
            last = pool.acquire(owner, Priority(0), n);
            assert_eq!(last.index, 0);
        }

        assert_eq!(last.version, RETIRED_VERSION - 1);
        assert_eq!(pool.release(last.index).0, Release::Retired);
        assert_eq!(
            pool.stats(),
            PoolStats {
                allocated: 1,
                live: 0,
                free: 0,
                retired: 1,
            }
        );

        let fresh = pool.acquire(owner, Priority(0), 99);
        assert_eq!(fresh.index, 1, "A retired slot must never be handed out again");
        assert!(pool.get(last).is_none());
    }

    #[test]
    fn stats_track_live_and_free_slots() {
        let owner = ArbiterId::next();
        let mut pool = SlotPool::with_capacity(4);
        let a = pool.acquire(owner, Priority(0), ());
        let _b = pool.acquire(owner, Priority(0), ());
        pool.release(a.index);

        let stats = pool.stats();
        assert_eq!(stats.allocated, 2);
        assert_eq!(stats.live, 1);
        assert_eq!(stats.free, 1);
        assert_eq!(stats.retired, 0);
    }
}
