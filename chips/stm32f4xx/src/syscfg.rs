// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! System configuration controller: routing of GPIO pins to EXTI lines.
//!
//! EXTI line `n` can listen to pin `n` of exactly one port. The port is
//! selected by a 4-bit code in SYSCFG_EXTICR1..4, four lines per register.
//! Routing is a read-modify-write of the shared EXTICR word, so callers
//! routing lines of the same group from different contexts must serialize.

use kernel::platform::chip::ClockInterface;
use kernel::utilities::registers::interfaces::{ReadWriteable, Readable};
use kernel::utilities::registers::{register_bitfields, Field, ReadWrite};
use kernel::utilities::StaticRef;
use kernel::ErrorCode;
use log::debug;

use crate::config::CONFIG;
use crate::gpio::{PinNum, PortId};
use crate::rcc;

/// System configuration controller, up to the EXTI configuration registers
#[repr(C)]
struct SyscfgRegisters {
    /// memory remap register and peripheral mode configuration register
    _reserved0: [u32; 2],
    /// external interrupt configuration registers 1 to 4
    exticr: [ReadWrite<u32, EXTICR::Register>; 4],
}

register_bitfields![u32,
    EXTICR [
        /// Port selection of the first line of the group; lines are 4 bits apart
        EXTI OFFSET(0) NUMBITS(4) []
    ]
];

const SYSCFG_BASE: StaticRef<SyscfgRegisters> =
    unsafe { StaticRef::new(0x40013800 as *const SyscfgRegisters) };

/// The EXTICR register holding the routing of `pin` and its nibble in it.
fn exti_field(pin: PinNum) -> (usize, Field<u32, EXTICR::Register>) {
    let field = Field::new(EXTICR::EXTI.mask, 4 * (pin.index() % 4));
    (pin.index() / 4, field)
}

pub struct Syscfg<'a> {
    registers: StaticRef<SyscfgRegisters>,
    clock: rcc::PeripheralClock<'a>,
}

impl<'a> Syscfg<'a> {
    pub const fn new(rcc: &'a rcc::Rcc) -> Self {
        Self::with_registers(SYSCFG_BASE, rcc)
    }

    const fn with_registers(registers: StaticRef<SyscfgRegisters>, rcc: &'a rcc::Rcc) -> Self {
        Self {
            registers,
            clock: rcc::PeripheralClock::new(
                rcc::PeripheralClockType::APB2(rcc::PCLK2::SYSCFG),
                rcc,
            ),
        }
    }

    pub fn is_enabled_clock(&self) -> bool {
        self.clock.is_enabled()
    }

    pub fn enable_clock(&self) {
        self.clock.enable();
    }

    pub fn disable_clock(&self) {
        self.clock.disable();
    }

    /// Connect EXTI line `pin` to that pin of `port`.
    ///
    /// Any port previously routed to the line is replaced. The SYSCFG clock
    /// is turned on first, as EXTICR ignores writes while it is gated.
    pub fn route_interrupt(&self, port: PortId, pin: usize) -> Result<(), ErrorCode> {
        let pin = PinNum::new(pin)?;
        self.clock.enable();

        let (group, field) = exti_field(pin);
        self.registers.exticr[group].modify(field.val(port as u32));

        if CONFIG.trace_exti_routing {
            debug!("EXTI{} <- {}", pin, port.name());
        }
        Ok(())
    }

    /// The port currently routed to EXTI line `pin`.
    pub fn exti_source(&self, pin: usize) -> Result<PortId, ErrorCode> {
        let pin = PinNum::new(pin)?;
        if !self.clock.is_enabled() {
            return Err(ErrorCode::OFF);
        }

        let (group, field) = exti_field(pin);
        PortId::from_u32(self.registers.exticr[group].read(field)).ok_or(ErrorCode::FAIL)
    }
}
