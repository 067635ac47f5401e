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

//! A lazily populated, per-value-type registry of shared slot pools.
//!
//! Every [`Arbiter`](crate::Arbiter) created with [`Arbiter::new`](crate::Arbiter::new)
//! draws its slots from the pool registered here for its value type, so slots
//! released by one arbiter are reused by the next.
//!
//! # Lifetime
//!
//! Pools are created on first use and never torn down: slots (including
//! retired ones) live until the owning thread exits. The registry is
//! thread-local because pools are `Rc`-shared and the arbitration subsystem
//! runs on a single thread.

use crate::pool::{SharedSlotPool, SlotPool};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static POOLS: RefCell<HashMap<TypeId, Box<dyn Any>>> = RefCell::new(HashMap::new());
}

/// Returns the shared pool for value type `V`, creating it on first request.
pub fn shared_pool<V: 'static>() -> SharedSlotPool<V> {
    POOLS.with(|pools| {
        let mut pools = pools.borrow_mut();
        let key = TypeId::of::<V>();

        if let Some(pool) = pools
            .get(&key)
            .and_then(|boxed| boxed.downcast_ref::<SharedSlotPool<V>>())
        {
            return pool.clone();
        }

        log::debug!(
            "Creating shared slot pool for `{}`.",
            std::any::type_name::<V>()
        );
        let pool = SlotPool::<V>::shared();
        pools.insert(key, Box::new(pool.clone()));
        pool
    })
}

/// Returns the number of value types that currently have a shared pool on
/// this thread.
pub fn pool_count() -> usize {
    POOLS.with(|pools| pools.borrow().len())
}
