// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Peripheral implementations for the STM32F4xx MCU: GPIO pin configuration,
//! EXTI line routing and the clock gates both depend on.
//!
//! STM32F4 family: <https://www.st.com/en/microcontrollers/stm32f4.html>

#![no_std]

mod config;
#[cfg(test)]
mod fake_mmio;

pub mod gpio;
pub mod rcc;
pub mod syscfg;
