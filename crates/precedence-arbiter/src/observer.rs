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

//! Change observers and the ordered dispatch of value transitions.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Token returned by [`Arbiter::subscribe`](crate::Arbiter::subscribe), used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback<V> = Rc<RefCell<dyn FnMut(&V)>>;

/// Observers in subscription order.
pub(crate) struct ObserverList<V> {
    next_id: u64,
    entries: Vec<(ObserverId, Callback<V>)>,
}

impl<V> ObserverList<V> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn subscribe<F: FnMut(&V) + 'static>(&mut self, callback: F) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        let callback: Callback<V> = Rc::new(RefCell::new(callback));
        self.entries.push((id, callback));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn contains(&self, id: ObserverId) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn snapshot(&self) -> Vec<(ObserverId, Callback<V>)> {
        self.entries.clone()
    }
}

/// Queues value transitions and delivers them to observers one at a time.
///
/// Transitions raised while a delivery is already running (an observer
/// mutating the arbiter it observes) are appended to the queue and delivered
/// by the outer delivery loop once the current transition has reached every
/// observer. Observers therefore always see transitions in the order they
/// happened and are never re-entered.
pub(crate) struct Dispatcher<V> {
    observers: RefCell<ObserverList<V>>,
    pending: RefCell<VecDeque<V>>,
    dispatching: Cell<bool>,
}

impl<V> Dispatcher<V> {
    pub(crate) fn new() -> Self {
        Self {
            observers: RefCell::new(ObserverList::new()),
            pending: RefCell::new(VecDeque::new()),
            dispatching: Cell::new(false),
        }
    }

    pub(crate) fn observers(&self) -> &RefCell<ObserverList<V>> {
        &self.observers
    }

    /// Records a transition to be delivered by the next [`flush`](Dispatcher::flush).
    pub(crate) fn enqueue(&self, value: V) {
        self.pending.borrow_mut().push_back(value);
    }

    /// Delivers every queued transition, unless a delivery is already running
    /// further up the stack.
    ///
    /// Must be called with no borrow of arbiter state outstanding.
    pub(crate) fn flush(&self) {
        if self.dispatching.replace(true) {
            return;
        }
        let _guard = DispatchGuard(self);

        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(value) = next else { break };

            let snapshot = self.observers.borrow().snapshot();
            for (id, callback) in snapshot {
                // Unsubscribed by an earlier observer of this same transition.
                if !self.observers.borrow().contains(id) {
                    continue;
                }
                (&mut *callback.borrow_mut())(&value);
            }
        }
    }
}

/// Re-arms the dispatcher even if an observer panics.
struct DispatchGuard<'a, V>(&'a Dispatcher<V>);

impl<V> Drop for DispatchGuard<'_, V> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.pending.borrow_mut().clear();
        }
        self.0.dispatching.set(false);
    }
}
