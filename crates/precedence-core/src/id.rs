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

//! Identity of an arbiter.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Source of fresh arbiter identities. Never reset.
static NEXT_ARBITER_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique identifier for an arbiter.
///
/// Slots remember the identity of the arbiter that owns them, and handles
/// capture it at issue time, so a handle can never be resolved against a
/// different arbiter's slots even when both share a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArbiterId(u64);

impl ArbiterId {
    /// Allocates an identity that has never been handed out before.
    pub fn next() -> Self {
        Self(NEXT_ARBITER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ArbiterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "arbiter#{}", self.0)
    }
}
