// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Host-side stand-in for a memory mapped register block.
//!
//! The words are `Cell<u32>`, which has the layout of `u32` and allows the
//! register structs (themselves built on `UnsafeCell`) to alias them. The
//! drivers run unmodified against it; the tests then inspect the raw words by
//! byte offset, exactly like reading the block with a debugger.

use core::cell::Cell;
use core::mem::size_of;

use kernel::utilities::StaticRef;

pub(crate) struct FakeMmio<const N: usize> {
    words: [Cell<u32>; N],
}

impl<const N: usize> FakeMmio<N> {
    pub(crate) fn new() -> Self {
        Self {
            words: core::array::from_fn(|_| Cell::new(0)),
        }
    }

    /// View the block as a register struct.
    ///
    /// ## Safety
    ///
    /// The returned reference must not be used after `self` is dropped.
    pub(crate) unsafe fn registers<T>(&self) -> StaticRef<T> {
        assert!(size_of::<T>() <= N * size_of::<u32>());
        StaticRef::new(self.words.as_ptr().cast::<T>())
    }

    pub(crate) fn word(&self, offset: usize) -> u32 {
        self.words[offset / 4].get()
    }

    pub(crate) fn set_word(&self, offset: usize, value: u32) {
        self.words[offset / 4].set(value)
    }

    pub(crate) fn snapshot(&self) -> [u32; N] {
        core::array::from_fn(|i| self.words[i].get())
    }
}
