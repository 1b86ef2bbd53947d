// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Compile-time configuration of the chip crate.
//!
//! Configuration is a typed `const` object rather than scattered `#[cfg]`
//! attributes, so every code path is type-checked whatever the feature set,
//! and the compiler folds the disabled branches away. This is the only module
//! that reads Cargo features.

use crate::gpio::PortId;

/// Data structure holding compile-time configuration options.
pub(crate) struct Config {
    /// Whether each `Port::configure` call is reported on the `log` facade,
    /// with the pin, the configuration and the derived field values.
    pub(crate) trace_pin_config: bool,

    /// Whether each EXTI routing change is reported on the `log` facade.
    pub(crate) trace_exti_routing: bool,

    /// GPIO ports bonded out on the selected chip variant.
    pub(crate) ports: &'static [PortId],
}

const STM32F401_PORTS: &[PortId] = &[
    PortId::GPIOA,
    PortId::GPIOB,
    PortId::GPIOC,
    PortId::GPIOD,
    PortId::GPIOE,
    PortId::GPIOH,
];

const STM32F429_PORTS: &[PortId] = &[
    PortId::GPIOA,
    PortId::GPIOB,
    PortId::GPIOC,
    PortId::GPIOD,
    PortId::GPIOE,
    PortId::GPIOF,
    PortId::GPIOG,
    PortId::GPIOH,
    PortId::GPIOI,
    PortId::GPIOJ,
    PortId::GPIOK,
];

// STM32F446
const DEFAULT_PORTS: &[PortId] = &[
    PortId::GPIOA,
    PortId::GPIOB,
    PortId::GPIOC,
    PortId::GPIOD,
    PortId::GPIOE,
    PortId::GPIOF,
    PortId::GPIOG,
    PortId::GPIOH,
];

/// The unique instance of `Config`.
pub(crate) const CONFIG: Config = Config {
    trace_pin_config: cfg!(feature = "trace_pin_config"),
    trace_exti_routing: cfg!(feature = "trace_exti_routing"),
    ports: if cfg!(feature = "stm32f401") {
        STM32F401_PORTS
    } else if cfg!(feature = "stm32f429") {
        STM32F429_PORTS
    } else {
        DEFAULT_PORTS
    },
};
