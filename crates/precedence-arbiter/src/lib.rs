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

//! # Precedence Arbiter
//!
//! Priority-based arbitration of a single contended value.
//!
//! Many independent concerns (a cutscene, a pause menu, a debug overlay) may
//! each want to drive the same value, such as the active camera or the input
//! focus. Each one registers its wish with an [`Arbiter`] at some
//! [`Priority`]; the arbiter exposes the wish of the top-ranked registration
//! and falls back to a default once every registration has been released.
//!
//! Registrations live in pooled, versioned slots. The [`PriorityHandle`] a
//! caller receives captures the slot's version, so a handle kept after its
//! registration was released can never act on whichever registration reuses
//! that slot later.
//!
//! The whole subsystem is single-threaded and synchronous.

#![warn(missing_docs)]

mod arbiter;
mod handle;
mod observer;
mod pool;
pub mod registry;
mod slot;

pub use arbiter::Arbiter;
pub use handle::{PriorityHandle, Registration};
pub use observer::ObserverId;
pub use pool::{PoolStats, Release, SharedSlotPool, SlotPool};

pub use precedence_core::{AddTo, ArbiterError, ArbiterId, Disposable, DisposeBag, Priority, Result};
