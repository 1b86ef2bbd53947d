// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Shared contracts for the pin-configuration chip crates.
//!
//! The kernel crate holds the platform-neutral pieces that chip crates build
//! on: the standard error type, the typed MMIO pointer, the clock gate
//! interface and the GPIO Hardware Interface Layer (HIL) definitions.
//!
//! Most `unsafe` code is in this kernel crate.

#![no_std]

pub mod hil;
pub mod platform;
pub mod utilities;

mod errorcode;

pub use crate::errorcode::ErrorCode;
