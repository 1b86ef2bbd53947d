// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Reset and clock control: the peripheral clock gates used by GPIO and SYSCFG.

use kernel::platform::chip::ClockInterface;
use kernel::utilities::registers::interfaces::{ReadWriteable, Readable};
use kernel::utilities::registers::{register_bitfields, Field, ReadWrite};
use kernel::utilities::StaticRef;

use crate::gpio::PortId;

/// Reset and clock control, up to the APB2 enable register
#[repr(C)]
struct RccRegisters {
    /// CR, PLLCFGR, CFGR, CIR, AHBxRSTR and APBxRSTR
    _reserved0: [u32; 12],
    /// AHB1 peripheral clock register
    ahb1enr: ReadWrite<u32, AHB1ENR::Register>,
    /// AHB2ENR, AHB3ENR, reserved word, APB1ENR
    _reserved1: [u32; 4],
    /// APB2 peripheral clock enable register
    apb2enr: ReadWrite<u32, APB2ENR::Register>,
}

register_bitfields![u32,
    AHB1ENR [
        /// IO port A clock enable
        GPIOAEN OFFSET(0) NUMBITS(1) [],
        /// IO port B clock enable
        GPIOBEN OFFSET(1) NUMBITS(1) [],
        /// IO port C clock enable
        GPIOCEN OFFSET(2) NUMBITS(1) [],
        /// IO port D clock enable
        GPIODEN OFFSET(3) NUMBITS(1) [],
        /// IO port E clock enable
        GPIOEEN OFFSET(4) NUMBITS(1) [],
        /// IO port F clock enable
        GPIOFEN OFFSET(5) NUMBITS(1) [],
        /// IO port G clock enable
        GPIOGEN OFFSET(6) NUMBITS(1) [],
        /// IO port H clock enable
        GPIOHEN OFFSET(7) NUMBITS(1) [],
        /// IO port I clock enable
        GPIOIEN OFFSET(8) NUMBITS(1) [],
        /// IO port J clock enable
        GPIOJEN OFFSET(9) NUMBITS(1) [],
        /// IO port K clock enable
        GPIOKEN OFFSET(10) NUMBITS(1) []
    ],
    APB2ENR [
        /// System configuration controller clock enable
        SYSCFGEN OFFSET(14) NUMBITS(1) []
    ]
];

const RCC_BASE: StaticRef<RccRegisters> =
    unsafe { StaticRef::new(0x40023800 as *const RccRegisters) };

/// Enable bit of each GPIO port, indexed by `PortId`.
const GPIO_ENABLE: [Field<u32, AHB1ENR::Register>; 11] = [
    AHB1ENR::GPIOAEN,
    AHB1ENR::GPIOBEN,
    AHB1ENR::GPIOCEN,
    AHB1ENR::GPIODEN,
    AHB1ENR::GPIOEEN,
    AHB1ENR::GPIOFEN,
    AHB1ENR::GPIOGEN,
    AHB1ENR::GPIOHEN,
    AHB1ENR::GPIOIEN,
    AHB1ENR::GPIOJEN,
    AHB1ENR::GPIOKEN,
];

pub struct Rcc {
    registers: StaticRef<RccRegisters>,
}

impl Rcc {
    pub const fn new() -> Self {
        Self::with_registers(RCC_BASE)
    }

    const fn with_registers(registers: StaticRef<RccRegisters>) -> Self {
        Self { registers }
    }

    // GPIO clocks

    pub(crate) fn is_enabled_gpio_clock(&self, port: PortId) -> bool {
        self.registers.ahb1enr.is_set(GPIO_ENABLE[port.index()])
    }

    pub(crate) fn enable_gpio_clock(&self, port: PortId) {
        self.registers
            .ahb1enr
            .modify(GPIO_ENABLE[port.index()].val(1))
    }

    pub(crate) fn disable_gpio_clock(&self, port: PortId) {
        self.registers
            .ahb1enr
            .modify(GPIO_ENABLE[port.index()].val(0))
    }

    // SYSCFG clock

    pub(crate) fn is_enabled_syscfg_clock(&self) -> bool {
        self.registers.apb2enr.is_set(APB2ENR::SYSCFGEN)
    }

    pub(crate) fn enable_syscfg_clock(&self) {
        self.registers.apb2enr.modify(APB2ENR::SYSCFGEN::SET)
    }

    pub(crate) fn disable_syscfg_clock(&self) {
        self.registers.apb2enr.modify(APB2ENR::SYSCFGEN::CLEAR)
    }
}

/// Peripherals clocked from the AHB1 bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HCLK1 {
    GPIO(PortId),
}

/// Peripherals clocked from the APB2 bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PCLK2 {
    SYSCFG,
}

/// Bus domain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeripheralClockType {
    AHB1(HCLK1),
    APB2(PCLK2),
}

/// Peripheral clock gate
pub struct PeripheralClock<'a> {
    pub clock: PeripheralClockType,
    rcc: &'a Rcc,
}

impl<'a> PeripheralClock<'a> {
    pub const fn new(clock: PeripheralClockType, rcc: &'a Rcc) -> Self {
        Self { clock, rcc }
    }
}

impl ClockInterface for PeripheralClock<'_> {
    fn is_enabled(&self) -> bool {
        match self.clock {
            PeripheralClockType::AHB1(HCLK1::GPIO(port)) => self.rcc.is_enabled_gpio_clock(port),
            PeripheralClockType::APB2(PCLK2::SYSCFG) => self.rcc.is_enabled_syscfg_clock(),
        }
    }

    fn enable(&self) {
        match self.clock {
            PeripheralClockType::AHB1(HCLK1::GPIO(port)) => self.rcc.enable_gpio_clock(port),
            PeripheralClockType::APB2(PCLK2::SYSCFG) => self.rcc.enable_syscfg_clock(),
        }
    }

    fn disable(&self) {
        match self.clock {
            PeripheralClockType::AHB1(HCLK1::GPIO(port)) => self.rcc.disable_gpio_clock(port),
            PeripheralClockType::APB2(PCLK2::SYSCFG) => self.rcc.disable_syscfg_clock(),
        }
    }
}
