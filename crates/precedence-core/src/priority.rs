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

//! Defines the priority ranking used to resolve competing contributions.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The rank of a contribution to an arbitrated value.
///
/// # Ordering contract
///
/// **A numerically smaller priority wins.** `Priority(1)` outranks
/// `Priority(10)`, and [`Priority::HIGHEST`] is `i32::MIN`. This runs against
/// the "bigger number wins" intuition, so prefer [`Priority::outranks`] over
/// comparing raw numbers when the intent is "does this one take precedence".
///
/// The derived [`Ord`] is plain numeric order, which means the top-ranked
/// priority in a sorted collection is the *first* element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Priority(pub i32);

impl Priority {
    /// The priority used when a caller does not care about ranking.
    pub const DEFAULT: Self = Self(0);
    /// The strongest possible priority.
    pub const HIGHEST: Self = Self(i32::MIN);
    /// The weakest possible priority.
    pub const LOWEST: Self = Self(i32::MAX);

    /// Creates a priority from its raw rank.
    pub const fn new(rank: i32) -> Self {
        Self(rank)
    }

    /// Returns the raw rank.
    pub const fn rank(self) -> i32 {
        self.0
    }

    /// Returns `true` if `self` takes strict precedence over `other`.
    ///
    /// Equal priorities never outrank each other; ties are resolved by
    /// registration order instead.
    pub const fn outranks(self, other: Self) -> bool {
        self.0 < other.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i32> for Priority {
    fn from(rank: i32) -> Self {
        Self(rank)
    }
}

impl From<Priority> for i32 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
