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

//! The pooled record behind every registration.

use precedence_core::{ArbiterId, Priority};

/// A slot's version once it can no longer be reused.
pub(crate) const RETIRED_VERSION: u16 = u16::MAX;

/// Identifies one occupancy of a slot: its index in the pool plus the
/// version it had when the occupancy began.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotKey {
    pub(crate) index: u32,
    pub(crate) version: u16,
}

/// One registrant's contribution, reused across registrations.
#[derive(Debug)]
pub(crate) struct Slot<V> {
    /// `Some` only while the slot is live.
    pub(crate) value: Option<V>,
    pub(crate) priority: Priority,
    /// Bumped on every release. Never decremented.
    pub(crate) version: u16,
    /// The arbiter currently holding this slot, `None` while pooled or retired.
    pub(crate) owner: Option<ArbiterId>,
    /// Intrusive free-list link, only meaningful while pooled.
    pub(crate) next_free: Option<u32>,
}

impl<V> Slot<V> {
    pub(crate) fn new(owner: ArbiterId, priority: Priority, value: V) -> Self {
        Self {
            value: Some(value),
            priority,
            version: 0,
            owner: Some(owner),
            next_free: None,
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        self.owner.is_some()
    }

    pub(crate) fn is_retired(&self) -> bool {
        self.version == RETIRED_VERSION
    }
}
