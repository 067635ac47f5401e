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

//! Defines the error taxonomy for handle operations.
//!
//! Only misuse of a handle can fail. Registration always succeeds, releasing
//! a handle twice is a no-op, and version-space exhaustion in the slot pool
//! degrades silently by retiring the slot.

use crate::id::ArbiterId;
use thiserror::Error;

/// An error raised by an operation performed through a handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ArbiterError {
    /// The handle's registration was already released, or its slot has since
    /// been reused or retired.
    #[error("invalid handle: registration at slot {index} (version {version}) was already released or reused")]
    StaleHandle {
        /// Slot index captured by the handle.
        index: u32,
        /// Slot version captured by the handle.
        version: u16,
    },
    /// The handle was issued by a different arbiter.
    #[error("invalid handle: issued by {handle_owner}, used with {arbiter}")]
    ForeignHandle {
        /// The arbiter that issued the handle.
        handle_owner: ArbiterId,
        /// The arbiter the handle was presented to.
        arbiter: ArbiterId,
    },
}

impl ArbiterError {
    /// Returns `true` for every variant that means "this handle no longer
    /// designates a live registration of this arbiter".
    pub fn is_invalid_handle(&self) -> bool {
        matches!(
            self,
            ArbiterError::StaleHandle { .. } | ArbiterError::ForeignHandle { .. }
        )
    }
}

/// A specialized `Result` for handle operations.
pub type Result<T> = std::result::Result<T, ArbiterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_handle_message_names_slot() {
        let err = ArbiterError::StaleHandle {
            index: 3,
            version: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("slot 3"), "unexpected message: {msg}");
        assert!(msg.contains("version 7"), "unexpected message: {msg}");
        assert!(err.is_invalid_handle());
    }

    #[test]
    fn foreign_handle_message_names_both_arbiters() {
        let owner = ArbiterId::next();
        let other = ArbiterId::next();
        let err = ArbiterError::ForeignHandle {
            handle_owner: owner,
            arbiter: other,
        };
        let msg = err.to_string();
        assert!(msg.contains(&owner.to_string()));
        assert!(msg.contains(&other.to_string()));
    }
}
