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

//! Resolves many competing contributions down to one effective value.

use crate::handle::{PriorityHandle, Registration};
use crate::observer::{Dispatcher, ObserverId};
use crate::pool::{SharedSlotPool, SlotPool};
use crate::registry;
use precedence_core::{ArbiterError, ArbiterId, Priority, Result};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Arbitrates one contended value between prioritised contributions.
///
/// Callers [`register`](Arbiter::register) a value at a [`Priority`] and get a
/// [`PriorityHandle`] back. The arbiter's [`value`](Arbiter::value) is the
/// value of the top-ranked live registration, or the default value when
/// there is none.
///
/// # Ranking
///
/// The **numerically smallest** priority wins (see [`Priority`]). Among equal
/// priorities the earliest registration wins; a registration moved to a new
/// priority queues up behind the registrations already at that priority.
///
/// # Notifications
///
/// Observers added with [`subscribe`](Arbiter::subscribe) are called once per
/// actual change of [`value`](Arbiter::value), after the arbiter's state is
/// updated. Observers may call back into the arbiter; transitions they cause
/// are delivered after the current one has reached every observer.
///
/// # Sharing
///
/// `Arbiter` is a cheap reference-counted handle: clones refer to the same
/// arbiter. Dropping the last clone releases every remaining registration,
/// which invalidates their handles. Not thread-safe.
///
/// # Example
///
/// ```rust
/// use precedence_arbiter::Arbiter;
///
/// let zoom = Arbiter::new(1.0_f32);
/// let cutscene = zoom.register(0.5, 10);
/// assert_eq!(zoom.value(), 0.5);
///
/// let menu = zoom.register(2.0, 1);
/// assert_eq!(zoom.value(), 2.0);
///
/// zoom.release(menu);
/// assert_eq!(zoom.value(), 0.5);
/// zoom.release(cutscene);
/// assert_eq!(zoom.value(), 1.0);
/// ```
pub struct Arbiter<V> {
    inner: Rc<ArbiterInner<V>>,
}

struct ArbiterInner<V> {
    id: ArbiterId,
    pool: SharedSlotPool<V>,
    state: RefCell<ArbiterState<V>>,
    dispatcher: Dispatcher<V>,
}

struct ArbiterState<V> {
    default_value: V,
    current_value: V,
    /// Live slot indices, ascending by priority, FIFO among equal priorities.
    /// `order[0]` feeds `current_value`.
    order: Vec<u32>,
}

impl<V: Clone + PartialEq + 'static> Arbiter<V> {
    /// Creates an arbiter drawing slots from the shared pool for `V`.
    pub fn new(default_value: V) -> Self {
        Self::with_pool(default_value, registry::shared_pool::<V>())
    }

    /// Creates an arbiter drawing slots from an explicitly provided pool.
    pub fn with_pool(default_value: V, pool: SharedSlotPool<V>) -> Self {
        let id = ArbiterId::next();
        log::trace!("Created {id}.");
        Self {
            inner: Rc::new(ArbiterInner {
                id,
                pool,
                state: RefCell::new(ArbiterState {
                    current_value: default_value.clone(),
                    default_value,
                    order: Vec::new(),
                }),
                dispatcher: Dispatcher::new(),
            }),
        }
    }

    /// Returns this arbiter's identity.
    pub fn id(&self) -> ArbiterId {
        self.inner.id
    }

    /// Returns the pool this arbiter draws slots from.
    pub fn pool(&self) -> SharedSlotPool<V> {
        self.inner.pool.clone()
    }

    /// The effective value: the top-ranked contribution, or the default.
    pub fn value(&self) -> V {
        self.inner.state.borrow().current_value.clone()
    }

    /// The value reported while nothing is registered.
    pub fn default_value(&self) -> V {
        self.inner.state.borrow().default_value.clone()
    }

    /// Replaces the default value.
    ///
    /// Takes effect immediately only if nothing is registered; otherwise it is
    /// used once every registration has been released.
    pub fn set_default_value(&self, value: V) {
        let displaced = {
            let pool = self.inner.pool.borrow();
            let mut state = self.inner.state.borrow_mut();
            let previous_default = std::mem::replace(&mut state.default_value, value);
            let previous_value = if state.order.is_empty() {
                self.inner.refresh(&mut state, &pool)
            } else {
                None
            };
            (previous_default, previous_value)
        };
        drop(displaced);
        self.inner.dispatcher.flush();
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.inner.state.borrow().order.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.state.borrow().order.is_empty()
    }

    /// The priority of the registration currently feeding the value.
    pub fn top_priority(&self) -> Option<Priority> {
        let pool = self.inner.pool.borrow();
        let state = self.inner.state.borrow();
        state.order.first().map(|&index| pool.slot(index).priority)
    }

    /// Adds a contribution and returns the handle controlling it.
    ///
    /// The new registration is placed after every existing registration with
    /// the same priority. If it becomes the top-ranked one, the arbiter's value
    /// changes to `value`.
    #[must_use = "dropping the handle leaks the registration; release it or use `register_scoped`"]
    pub fn register(&self, value: V, priority: impl Into<Priority>) -> PriorityHandle<V> {
        let priority = priority.into();
        let inner = &*self.inner;

        let key = inner.pool.borrow_mut().acquire(inner.id, priority, value);
        let displaced = {
            let pool = inner.pool.borrow();
            let mut state = inner.state.borrow_mut();
            let position = insertion_point(&state.order, &*pool, priority);
            state.order.insert(position, key.index);
            let displaced = if position == 0 {
                inner.refresh(&mut state, &pool)
            } else {
                None
            };
            log::trace!(
                "{}: registered slot {} (v{}) at priority {priority}, rank {position}.",
                inner.id,
                key.index,
                key.version
            );
            displaced
        };
        drop(displaced);
        inner.dispatcher.flush();

        PriorityHandle::new(inner.id, key)
    }

    /// Like [`register`](Arbiter::register), but the returned guard releases
    /// the registration when dropped.
    pub fn register_scoped(&self, value: V, priority: impl Into<Priority>) -> Registration<V> {
        let handle = self.register(value, priority);
        Registration::new(self.clone(), handle)
    }

    /// Starts observing changes of [`value`](Arbiter::value).
    pub fn subscribe<F: FnMut(&V) + 'static>(&self, callback: F) -> ObserverId {
        self.inner
            .dispatcher
            .observers()
            .borrow_mut()
            .subscribe(callback)
    }

    /// Stops an observer. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.inner.dispatcher.observers().borrow_mut().unsubscribe(id)
    }

    /// Number of subscribed observers.
    pub fn observer_count(&self) -> usize {
        self.inner.dispatcher.observers().borrow().len()
    }

    /// Returns `true` if `handle` designates a live registration of this arbiter.
    pub fn is_live(&self, handle: PriorityHandle<V>) -> bool {
        let pool = self.inner.pool.borrow();
        self.inner.check(handle, &pool).is_ok()
    }

    /// The value contributed through `handle`.
    pub fn value_of(&self, handle: PriorityHandle<V>) -> Result<V> {
        let pool = self.inner.pool.borrow();
        self.inner.check(handle, &pool)?;
        pool.get(handle.key())
            .and_then(|slot| slot.value.clone())
            .ok_or_else(|| stale(handle))
    }

    /// The priority of the contribution made through `handle`.
    pub fn priority_of(&self, handle: PriorityHandle<V>) -> Result<Priority> {
        let pool = self.inner.pool.borrow();
        self.inner.check(handle, &pool)?;
        Ok(pool.slot(handle.index()).priority)
    }

    /// Whether the contribution made through `handle` currently feeds the value.
    pub fn is_top_priority(&self, handle: PriorityHandle<V>) -> Result<bool> {
        let pool = self.inner.pool.borrow();
        self.inner.check(handle, &pool)?;
        Ok(self.inner.state.borrow().order.first() == Some(&handle.index()))
    }

    /// Replaces the value contributed through `handle`.
    ///
    /// Only changes the arbiter's value if this contribution is top-ranked.
    pub fn set_value(&self, handle: PriorityHandle<V>, value: V) -> Result<()> {
        let previous = {
            let mut pool = self.inner.pool.borrow_mut();
            self.inner.check(handle, &pool)?;
            let previous = pool
                .get_mut(handle.key())
                .and_then(|slot| slot.value.replace(value));

            let mut state = self.inner.state.borrow_mut();
            let displaced = if state.order.first() == Some(&handle.index()) {
                self.inner.refresh(&mut state, &pool)
            } else {
                None
            };
            (previous, displaced)
        };
        drop(previous);
        self.inner.dispatcher.flush();
        Ok(())
    }

    /// Moves the contribution made through `handle` to a new priority.
    ///
    /// Setting the priority it already has is a no-op and keeps its place
    /// among equal priorities. Otherwise it is queued behind the registrations
    /// already at the new priority.
    pub fn set_priority(
        &self,
        handle: PriorityHandle<V>,
        priority: impl Into<Priority>,
    ) -> Result<()> {
        let priority = priority.into();
        let displaced = {
            let mut pool = self.inner.pool.borrow_mut();
            self.inner.check(handle, &pool)?;
            let Some(slot) = pool.get_mut(handle.key()) else {
                return Err(stale(handle));
            };
            if slot.priority == priority {
                return Ok(());
            }
            slot.priority = priority;

            let index = handle.index();
            let mut state = self.inner.state.borrow_mut();
            let was_top = state.order.first() == Some(&index);
            if let Some(position) = state.order.iter().position(|&i| i == index) {
                state.order.remove(position);
            }
            let position = insertion_point(&state.order, &*pool, priority);
            state.order.insert(position, index);

            let displaced = if was_top || position == 0 {
                self.inner.refresh(&mut state, &pool)
            } else {
                None
            };
            log::trace!(
                "{}: slot {index} moved to priority {priority}, rank {position}.",
                self.inner.id
            );
            displaced
        };
        drop(displaced);
        self.inner.dispatcher.flush();
        Ok(())
    }

    /// Releases the registration made through `handle`.
    ///
    /// Returns `true` if this call released it. Releasing a stale handle,
    /// including one already released, does nothing and returns `false`.
    pub fn release(&self, handle: PriorityHandle<V>) -> bool {
        if handle.owner() != self.inner.id {
            log::warn!(
                "{}: ignoring release of a handle issued by {}.",
                self.inner.id,
                handle.owner()
            );
            return false;
        }

        let payload = {
            let mut pool = self.inner.pool.borrow_mut();
            if pool.get(handle.key()).is_none() {
                return false;
            }

            let index = handle.index();
            let mut state = self.inner.state.borrow_mut();
            let was_top = state.order.first() == Some(&index);
            if let Some(position) = state.order.iter().position(|&i| i == index) {
                state.order.remove(position);
            }

            let (outcome, payload) = pool.release(index);
            log::trace!(
                "{}: released slot {index} (v{}) -> {outcome:?}.",
                self.inner.id,
                handle.version()
            );

            let displaced = if was_top {
                self.inner.refresh(&mut state, &pool)
            } else {
                None
            };
            (payload, displaced)
        };
        drop(payload);
        self.inner.dispatcher.flush();
        true
    }
}

impl<V> ArbiterInner<V>
where
    V: Clone + PartialEq,
{
    /// Validates that `handle` designates a live registration of this arbiter.
    fn check(&self, handle: PriorityHandle<V>, pool: &SlotPool<V>) -> Result<()> {
        if handle.owner() != self.id {
            return Err(ArbiterError::ForeignHandle {
                handle_owner: handle.owner(),
                arbiter: self.id,
            });
        }
        match pool.get(handle.key()) {
            Some(slot) if slot.owner == Some(self.id) => Ok(()),
            _ => Err(stale(handle)),
        }
    }

    /// Re-derives the current value from `order[0]`, queueing a notification
    /// if it changed.
    ///
    /// Returns the displaced value so the caller drops it after releasing
    /// its borrows.
    #[must_use]
    fn refresh(&self, state: &mut ArbiterState<V>, pool: &SlotPool<V>) -> Option<V> {
        let top = state
            .order
            .first()
            .and_then(|&index| pool.slot(index).value.as_ref())
            .unwrap_or(&state.default_value);

        if *top == state.current_value {
            return None;
        }
        let top = top.clone();
        let displaced = std::mem::replace(&mut state.current_value, top.clone());
        self.dispatcher.enqueue(top);
        Some(displaced)
    }
}

impl<V> Drop for ArbiterInner<V> {
    fn drop(&mut self) {
        let order = std::mem::take(&mut self.state.get_mut().order);
        if order.is_empty() {
            return;
        }

        let Ok(mut pool) = self.pool.try_borrow_mut() else {
            log::warn!(
                "{}: pool busy during drop; {} slot(s) not returned.",
                self.id,
                order.len()
            );
            return;
        };
        log::debug!(
            "{}: dropped with {} live registration(s); returning slots to the pool.",
            self.id,
            order.len()
        );
        let payloads: Vec<Option<V>> = order
            .into_iter()
            .map(|index| pool.release(index).1)
            .collect();
        drop(pool);
        drop(payloads);
    }
}

/// Index before the first slot that `priority` outranks.
fn insertion_point<V>(order: &[u32], pool: &SlotPool<V>, priority: Priority) -> usize {
    order
        .iter()
        .position(|&index| priority.outranks(pool.slot(index).priority))
        .unwrap_or(order.len())
}

fn stale<V>(handle: PriorityHandle<V>) -> ArbiterError {
    ArbiterError::StaleHandle {
        index: handle.index(),
        version: handle.version(),
    }
}

impl<V> Clone for Arbiter<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V: Clone + PartialEq + Default + 'static> Default for Arbiter<V> {
    fn default() -> Self {
        Self::new(V::default())
    }
}

impl<V: fmt::Debug> fmt::Debug for Arbiter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Arbiter");
        debug.field("id", &self.inner.id);
        match self.inner.state.try_borrow() {
            Ok(state) => debug
                .field("value", &state.current_value)
                .field("default_value", &state.default_value)
                .field("registrations", &state.order.len()),
            Err(_) => debug.field("state", &"<borrowed>"),
        };
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder<V: Clone + PartialEq + 'static>(arbiter: &Arbiter<V>) -> Rc<RefCell<Vec<V>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        arbiter.subscribe(move |v: &V| sink.borrow_mut().push(v.clone()));
        seen
    }

    #[test]
    fn starts_at_default_value() {
        let arbiter = Arbiter::new(7);
        assert_eq!(arbiter.value(), 7);
        assert_eq!(arbiter.default_value(), 7);
        assert!(arbiter.is_empty());
        assert_eq!(arbiter.top_priority(), None);
    }

    #[test]
    fn smaller_priority_number_wins() {
        let arbiter = Arbiter::new(0);
        let low = arbiter.register(5, 10);
        let high = arbiter.register(9, 1);

        assert_eq!(arbiter.value(), 9);
        assert_eq!(arbiter.top_priority(), Some(Priority(1)));
        assert_eq!(arbiter.is_top_priority(high), Ok(true));
        assert_eq!(arbiter.is_top_priority(low), Ok(false));
    }

    #[test]
    fn registering_below_top_does_not_notify() {
        let arbiter = Arbiter::new(0);
        let seen = recorder(&arbiter);

        let _top = arbiter.register(3, 0);
        let _same_value = arbiter.register(3, 5);
        let _other_value = arbiter.register(8, 5);

        assert_eq!(*seen.borrow(), vec![3]);
    }

    #[test]
    fn registering_top_with_current_value_does_not_notify() {
        let arbiter = Arbiter::new(4);
        let seen = recorder(&arbiter);

        let _h = arbiter.register(4, 0);
        assert_eq!(arbiter.value(), 4);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn set_value_only_matters_on_top_slot() {
        let arbiter = Arbiter::new(0);
        let seen = recorder(&arbiter);
        let top = arbiter.register(1, 0);
        let below = arbiter.register(2, 1);

        arbiter.set_value(below, 20).unwrap();
        assert_eq!(arbiter.value(), 1);
        assert_eq!(arbiter.value_of(below), Ok(20));

        arbiter.set_value(top, 10).unwrap();
        assert_eq!(arbiter.value(), 10);

        arbiter.set_value(top, 10).unwrap();
        assert_eq!(*seen.borrow(), vec![1, 10]);
    }

    #[test]
    fn raising_priority_takes_over() {
        let arbiter = Arbiter::new(0);
        let _a = arbiter.register(1, 5);
        let b = arbiter.register(2, 10);

        arbiter.set_priority(b, 0).unwrap();
        assert_eq!(arbiter.value(), 2);
        assert_eq!(arbiter.priority_of(b), Ok(Priority(0)));
    }

    #[test]
    fn demoting_the_top_slot_hands_over_the_value() {
        let arbiter = Arbiter::new(0);
        let seen = recorder(&arbiter);
        let a = arbiter.register(1, 0);
        let _b = arbiter.register(2, 5);

        arbiter.set_priority(a, 10).unwrap();
        assert_eq!(arbiter.value(), 2);
        assert_eq!(arbiter.is_top_priority(a), Ok(false));
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn moved_slot_queues_behind_equal_priorities() {
        let arbiter = Arbiter::new(0);
        let _first = arbiter.register(1, 5);
        let mover = arbiter.register(2, 0);
        assert_eq!(arbiter.value(), 2);

        arbiter.set_priority(mover, 5).unwrap();
        assert_eq!(arbiter.value(), 1, "The slot already at priority 5 keeps precedence");
    }

    #[test]
    fn same_priority_is_a_no_op() {
        let arbiter = Arbiter::new(0);
        let first = arbiter.register(1, 5);
        let _second = arbiter.register(2, 5);

        arbiter.set_priority(first, 5).unwrap();
        assert_eq!(arbiter.value(), 1, "Re-setting the same priority must keep the slot in front");
    }

    #[test]
    fn default_value_is_latent_while_registered() {
        let arbiter = Arbiter::new(0);
        let seen = recorder(&arbiter);
        let h = arbiter.register(5, 0);

        arbiter.set_default_value(100);
        assert_eq!(arbiter.value(), 5);
        assert_eq!(arbiter.default_value(), 100);

        arbiter.release(h);
        assert_eq!(arbiter.value(), 100);

        arbiter.set_default_value(200);
        assert_eq!(arbiter.value(), 200);
        assert_eq!(*seen.borrow(), vec![5, 100, 200]);
    }

    #[test]
    fn stale_handle_operations_fail() {
        let arbiter = Arbiter::new(0);
        let h = arbiter.register(1, 0);
        assert!(arbiter.release(h));

        let expected = Err(ArbiterError::StaleHandle {
            index: h.index(),
            version: h.version(),
        });
        assert_eq!(arbiter.value_of(h), expected);
        assert_eq!(arbiter.set_value(h, 3), Err(stale(h)));
        assert_eq!(arbiter.set_priority(h, 3), Err(stale(h)));
        assert_eq!(arbiter.priority_of(h), Err(stale(h)));
        assert_eq!(arbiter.is_top_priority(h), Err(stale(h)));
        assert!(!arbiter.is_live(h));
    }

    #[test]
    fn release_is_idempotent() {
        let arbiter = Arbiter::new(0);
        let seen = recorder(&arbiter);
        let h = arbiter.register(1, 0);

        assert!(arbiter.release(h));
        assert!(!arbiter.release(h));
        assert!(!arbiter.release(h));
        assert_eq!(*seen.borrow(), vec![1, 0]);
    }

    #[test]
    fn stale_handle_cannot_touch_reused_slot() {
        let pool = SlotPool::shared();
        let arbiter = Arbiter::with_pool(0, pool);
        let old = arbiter.register(1, 0);
        arbiter.release(old);

        let new = arbiter.register(2, 0);
        assert_eq!(new.index(), old.index(), "The slot should have been reused");

        assert!(arbiter.set_value(old, 99).is_err());
        assert!(!arbiter.release(old));
        assert_eq!(arbiter.value(), 2);
        assert_eq!(arbiter.value_of(new), Ok(2));
    }

    #[test]
    fn handles_are_rejected_by_other_arbiters() {
        let pool = SlotPool::shared();
        let a = Arbiter::with_pool(0, pool.clone());
        let b = Arbiter::with_pool(0, pool);
        let h = a.register(1, 0);

        assert_eq!(
            b.value_of(h),
            Err(ArbiterError::ForeignHandle {
                handle_owner: a.id(),
                arbiter: b.id(),
            })
        );
        assert!(!b.release(h), "A foreign release must be ignored");
        assert!(a.is_live(h));
        assert_eq!(a.value(), 1);
    }

    #[test]
    fn dropping_the_arbiter_returns_slots_to_pool() {
        let pool = SlotPool::shared();
        {
            let arbiter = Arbiter::with_pool(String::new(), pool.clone());
            let _a = arbiter.register("a".to_string(), 0);
            let _b = arbiter.register("b".to_string(), 1);
            assert_eq!(pool.borrow().stats().live, 2);
        }
        let stats = pool.borrow().stats();
        assert_eq!(stats.live, 0);
        assert_eq!(stats.free, 2);
    }

    #[test]
    fn clones_share_state() {
        let arbiter = Arbiter::new(0);
        let alias = arbiter.clone();
        let h = alias.register(3, 0);
        assert_eq!(arbiter.value(), 3);
        assert!(arbiter.release(h));
        assert_eq!(alias.value(), 0);
    }

    #[test]
    fn unsubscribed_observer_is_not_called() {
        let arbiter = Arbiter::new(0);
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let id = arbiter.subscribe(move |_| *counter.borrow_mut() += 1);
        assert_eq!(arbiter.observer_count(), 1);

        let h = arbiter.register(1, 0);
        assert!(arbiter.unsubscribe(id));
        arbiter.release(h);

        assert_eq!(*calls.borrow(), 1);
        assert_eq!(arbiter.observer_count(), 0);
    }

    #[test]
    fn observer_sees_updated_state() {
        let arbiter = Arbiter::new(0);
        let observed = Rc::new(RefCell::new(Vec::new()));
        let sink = observed.clone();
        let reader = arbiter.clone();
        arbiter.subscribe(move |v| sink.borrow_mut().push((*v, reader.value())));

        let _h = arbiter.register(5, 0);
        assert_eq!(*observed.borrow(), vec![(5, 5)]);
    }

    type ArbiterCell = Rc<RefCell<Option<Arbiter<Tracked>>>>;

    /// Reads the arbiter back when the last copy of a value goes away.
    struct DropReader {
        arbiter: ArbiterCell,
        reads: Rc<RefCell<Vec<(u32, usize)>>>,
        id: u32,
    }

    impl Drop for DropReader {
        fn drop(&mut self) {
            if let Some(arbiter) = self.arbiter.borrow().as_ref() {
                let len = arbiter.len();
                let _ = arbiter.value();
                self.reads.borrow_mut().push((self.id, len));
            }
        }
    }

    #[derive(Clone)]
    struct Tracked(u32, Rc<DropReader>);

    impl PartialEq for Tracked {
        fn eq(&self, other: &Self) -> bool {
            self.0 == other.0
        }
    }

    #[test]
    fn displaced_values_are_dropped_outside_internal_borrows() {
        // --- 1. SETUP ---
        let cell: ArbiterCell = Rc::new(RefCell::new(None));
        let reads = Rc::new(RefCell::new(Vec::new()));
        let tracked = |id: u32| {
            Tracked(
                id,
                Rc::new(DropReader {
                    arbiter: cell.clone(),
                    reads: reads.clone(),
                    id,
                }),
            )
        };
        let arbiter = Arbiter::new(tracked(0));
        *cell.borrow_mut() = Some(arbiter.clone());

        // --- 2. ACTION & ASSERTIONS ---
        // The old default is also the current value; both copies go at once.
        arbiter.set_default_value(tracked(1));
        assert_eq!(*reads.borrow(), vec![(0, 0)]);

        // Replacing the top value displaces it from the slot and the output.
        let h = arbiter.register(tracked(2), 0);
        arbiter.set_value(h, tracked(3)).unwrap();
        assert_eq!(*reads.borrow(), vec![(0, 0), (2, 1)]);

        // Demoting the top slot behind another one hands the output over.
        let other = arbiter.register(tracked(4), 5);
        arbiter.set_priority(h, 10).unwrap();
        assert_eq!(arbiter.value().0, 4);
        arbiter.set_value(h, tracked(5)).unwrap();
        assert_eq!(*reads.borrow(), vec![(0, 0), (2, 1), (3, 2)]);

        // Releasing the top slot drops its payload and the displaced output.
        assert!(arbiter.release(other));
        assert_eq!(*reads.borrow(), vec![(0, 0), (2, 1), (3, 2), (4, 1)]);
        assert_eq!(arbiter.value().0, 5);

        // --- 3. CLEANUP ---
        cell.borrow_mut().take();
    }
}
