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

//! The disposal contract and a container that tears down many disposables at once.

use std::fmt;

/// A resource with an explicit, idempotent release step.
///
/// Calling [`dispose`](Disposable::dispose) more than once must be harmless:
/// every call after the first is a no-op.
pub trait Disposable {
    /// Releases the resource.
    fn dispose(&mut self);
}

impl<F: FnMut()> Disposable for Option<F> {
    fn dispose(&mut self) {
        if let Some(mut f) = self.take() {
            f();
        }
    }
}

/// Groups disposables so they can be released together.
///
/// Items are disposed in insertion order, after which every callback
/// registered with [`on_dispose`](DisposeBag::on_dispose) fires in
/// registration order. Dropping the bag disposes it.
///
/// # Example
///
/// ```rust
/// use precedence_core::{AddTo, Disposable, DisposeBag};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let released = Rc::new(Cell::new(false));
/// let mut bag = DisposeBag::new();
///
/// let flag = released.clone();
/// Some(move || flag.set(true)).add_to(&mut bag);
///
/// bag.dispose();
/// assert!(released.get());
/// ```
#[derive(Default)]
pub struct DisposeBag {
    items: Vec<Box<dyn Disposable>>,
    on_dispose: Vec<Box<dyn FnOnce()>>,
    disposed: bool,
}

impl DisposeBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a disposable to the bag.
    ///
    /// If the bag has already been disposed, the item is disposed right away
    /// instead of being kept.
    pub fn add<D: Disposable + 'static>(&mut self, mut item: D) {
        if self.disposed {
            log::trace!("DisposeBag already disposed; releasing added item immediately.");
            item.dispose();
            return;
        }
        self.items.push(Box::new(item));
    }

    /// Registers a callback fired once the bag's contents have been disposed.
    ///
    /// Fires immediately if the bag has already been disposed.
    pub fn on_dispose<F: FnOnce() + 'static>(&mut self, callback: F) {
        if self.disposed {
            callback();
            return;
        }
        self.on_dispose.push(Box::new(callback));
    }

    /// Returns `true` once [`dispose`](DisposeBag::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Returns the number of items still held by the bag.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the bag holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Disposable for DisposeBag {
    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        let items = std::mem::take(&mut self.items);
        log::trace!("Disposing {} item(s) from DisposeBag.", items.len());
        for mut item in items {
            item.dispose();
        }

        for callback in std::mem::take(&mut self.on_dispose) {
            callback();
        }
    }
}

impl Drop for DisposeBag {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for DisposeBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposeBag")
            .field("items", &self.items.len())
            .field("callbacks", &self.on_dispose.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

/// Extension for handing a disposable over to a [`DisposeBag`].
pub trait AddTo {
    /// Moves `self` into `bag`.
    fn add_to(self, bag: &mut DisposeBag);
}

impl<D: Disposable + 'static> AddTo for D {
    fn add_to(self, bag: &mut DisposeBag) {
        bag.add(self);
    }
}
