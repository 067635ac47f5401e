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

//! Caller-held capabilities for a registration.

use crate::arbiter::Arbiter;
use crate::slot::SlotKey;
use precedence_core::{ArbiterId, Disposable, Priority, Result};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A copyable token designating one registration with an [`Arbiter`].
///
/// The handle captures the slot's index and version at issue time, together
/// with the issuing arbiter's identity. Every operation performed with it
/// goes through the arbiter and re-validates all three, so once the
/// registration is released the handle is permanently inert: releasing again
/// is a no-op and any other operation returns
/// [`ArbiterError::StaleHandle`](precedence_core::ArbiterError::StaleHandle),
/// even after the underlying slot has been reused by another registrant.
pub struct PriorityHandle<V> {
    owner: ArbiterId,
    index: u32,
    version: u16,
    _marker: PhantomData<fn() -> V>,
}

impl<V> PriorityHandle<V> {
    pub(crate) fn new(owner: ArbiterId, key: SlotKey) -> Self {
        Self {
            owner,
            index: key.index,
            version: key.version,
            _marker: PhantomData,
        }
    }

    pub(crate) fn key(self) -> SlotKey {
        SlotKey {
            index: self.index,
            version: self.version,
        }
    }

    /// The arbiter that issued this handle.
    pub fn owner(self) -> ArbiterId {
        self.owner
    }

    /// Index of the slot backing the registration.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Slot version captured when the handle was issued.
    pub fn version(self) -> u16 {
        self.version
    }
}

impl<V> Clone for PriorityHandle<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for PriorityHandle<V> {}

impl<V> PartialEq for PriorityHandle<V> {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.index == other.index && self.version == other.version
    }
}

impl<V> Eq for PriorityHandle<V> {}

impl<V> Hash for PriorityHandle<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.index.hash(state);
        self.version.hash(state);
    }
}

impl<V> fmt::Debug for PriorityHandle<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityHandle")
            .field("owner", &self.owner)
            .field("index", &self.index)
            .field("version", &self.version)
            .finish()
    }
}

/// A registration that releases itself when dropped.
///
/// Pairs an [`Arbiter`] with the [`PriorityHandle`] it issued, so the
/// contribution can be read and updated without passing the arbiter around.
/// Keeps the arbiter alive for as long as the registration exists.
pub struct Registration<V: Clone + PartialEq + 'static> {
    arbiter: Arbiter<V>,
    handle: PriorityHandle<V>,
    armed: bool,
}

impl<V: Clone + PartialEq + 'static> Registration<V> {
    pub(crate) fn new(arbiter: Arbiter<V>, handle: PriorityHandle<V>) -> Self {
        Self {
            arbiter,
            handle,
            armed: true,
        }
    }

    /// The underlying handle.
    pub fn handle(&self) -> PriorityHandle<V> {
        self.handle
    }

    /// The arbiter this registration contributes to.
    pub fn arbiter(&self) -> &Arbiter<V> {
        &self.arbiter
    }

    /// The contributed value.
    pub fn value(&self) -> Result<V> {
        self.arbiter.value_of(self.handle)
    }

    /// Replaces the contributed value.
    pub fn set_value(&self, value: V) -> Result<()> {
        self.arbiter.set_value(self.handle, value)
    }

    /// The contribution's priority.
    pub fn priority(&self) -> Result<Priority> {
        self.arbiter.priority_of(self.handle)
    }

    /// Moves the contribution to a new priority.
    pub fn set_priority(&self, priority: impl Into<Priority>) -> Result<()> {
        self.arbiter.set_priority(self.handle, priority)
    }

    /// Whether this contribution currently feeds the arbiter's value.
    pub fn is_top_priority(&self) -> Result<bool> {
        self.arbiter.is_top_priority(self.handle)
    }

    /// Whether the registration has not been released yet.
    pub fn is_live(&self) -> bool {
        self.arbiter.is_live(self.handle)
    }

    /// Detaches the guard, leaving release to the caller.
    pub fn into_parts(mut self) -> (Arbiter<V>, PriorityHandle<V>) {
        self.armed = false;
        (self.arbiter.clone(), self.handle)
    }
}

impl<V: Clone + PartialEq + 'static> Disposable for Registration<V> {
    fn dispose(&mut self) {
        self.arbiter.release(self.handle);
    }
}

impl<V: Clone + PartialEq + 'static> Drop for Registration<V> {
    fn drop(&mut self) {
        if self.armed {
            self.dispose();
        }
    }
}

impl<V: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for Registration<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("handle", &self.handle)
            .field("value", &self.value().ok())
            .field("armed", &self.armed)
            .finish()
    }
}
