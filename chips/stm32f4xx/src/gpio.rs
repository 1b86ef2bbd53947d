// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! GPIO port controller.
//!
//! A pin request goes through three steps: a [`NormalizedConfig`] is mapped
//! to one [`PinConfig`], the single classification of the pin's electrical
//! mode. Each hardware field (mode, output type, speed, pull) is then derived
//! from that `PinConfig` on its own, and finally [`Port`] packs the fields
//! into the per-pin slots of the port registers.
//!
//! Reference: RM0090 / RM0368, chapter "General-purpose I/Os (GPIO)".
//!
//! ## Concurrency
//!
//! Every field update is a read-modify-write of one 32-bit register that is
//! shared by all 16 pins of the port. Two contexts configuring pins of the
//! same port (for example thread code and an interrupt handler) must be
//! serialized by the caller, otherwise one of the updates is silently lost.
//! Only `set_pin` is safe to race: BSRR applies set and reset in hardware.

use core::fmt;

use kernel::hil;
use kernel::hil::gpio::{Configuration, Direction, FloatingState, NormalizedConfig};
use kernel::platform::chip::ClockInterface;
use kernel::utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use kernel::utilities::registers::{
    register_bitfields, Field, ReadOnly, ReadWrite, RegisterLongName, WriteOnly,
};
use kernel::utilities::StaticRef;
use kernel::ErrorCode;
use log::debug;

use crate::config::CONFIG;
use crate::rcc;

/// General-purpose I/Os
#[repr(C)]
struct GpioRegisters {
    /// GPIO port mode register
    moder: ReadWrite<u32, MODER::Register>,
    /// GPIO port output type register
    otyper: ReadWrite<u32, OTYPER::Register>,
    /// GPIO port output speed register
    ospeedr: ReadWrite<u32, OSPEEDR::Register>,
    /// GPIO port pull-up/pull-down register
    pupdr: ReadWrite<u32, PUPDR::Register>,
    /// GPIO port input data register
    idr: ReadOnly<u32, IDR::Register>,
    /// GPIO port output data register
    odr: ReadWrite<u32, ODR::Register>,
    /// GPIO port bit set/reset register
    bsrr: WriteOnly<u32, BSRR::Register>,
    /// GPIO port configuration lock register
    _lckr: ReadWrite<u32>,
    /// GPIO alternate function low (pins 0-7) and high (pins 8-15) registers
    afr: [ReadWrite<u32, AFR::Register>; 2],
}

// Every register holds one field per pin. Only the pin 0 slot is declared;
// `pin_field` moves it to the slot of another pin.
register_bitfields![u32,
    MODER [
        /// Port configuration bits, 2 per pin
        MODE OFFSET(0) NUMBITS(2) []
    ],
    OTYPER [
        /// Port configuration bits, 1 per pin
        OT OFFSET(0) NUMBITS(1) []
    ],
    OSPEEDR [
        /// Port configuration bits, 2 per pin
        OSPEED OFFSET(0) NUMBITS(2) []
    ],
    PUPDR [
        /// Port configuration bits, 2 per pin
        PUPD OFFSET(0) NUMBITS(2) []
    ],
    IDR [
        /// Port input data
        ID OFFSET(0) NUMBITS(1) []
    ],
    ODR [
        /// Port output data
        OD OFFSET(0) NUMBITS(1) []
    ],
    BSRR [
        /// Port set bits
        BS OFFSET(0) NUMBITS(16) [],
        /// Port reset bits
        BR OFFSET(16) NUMBITS(16) []
    ],
    AFR [
        /// Alternate function selection, 4 bits per pin
        AF OFFSET(0) NUMBITS(4) []
    ]
];

const GPIO_BASE: usize = 0x40020000;
const GPIO_PORT_SIZE: usize = 0x400;

/// Slot of `pin` in a register where each pin owns a field as wide as
/// `first`, the slot of pin 0.
fn pin_field<R: RegisterLongName>(first: Field<u32, R>, pin: PinNum) -> Field<u32, R> {
    let width = first.mask.count_ones() as usize;
    Field::new(first.mask, first.shift + width * pin.index())
}

/// Nibble of `pin` inside its alternate function register.
fn af_field(pin: PinNum) -> Field<u32, AFR::Register> {
    Field::new(AFR::AF.mask, 4 * (pin.index() % 8))
}

/// GPIO ports, numbered as the EXTI port selection expects them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum PortId {
    GPIOA = 0b0000,
    GPIOB = 0b0001,
    GPIOC = 0b0010,
    GPIOD = 0b0011,
    GPIOE = 0b0100,
    GPIOF = 0b0101,
    GPIOG = 0b0110,
    GPIOH = 0b0111,
    GPIOI = 0b1000,
    GPIOJ = 0b1001,
    GPIOK = 0b1010,
}

impl PortId {
    pub const ALL: [PortId; 11] = [
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

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_u32(value: u32) -> Option<PortId> {
        PortId::ALL.get(value as usize).copied()
    }

    /// Name the port is registered under, e.g. "GPIOA".
    pub const fn name(self) -> &'static str {
        match self {
            PortId::GPIOA => "GPIOA",
            PortId::GPIOB => "GPIOB",
            PortId::GPIOC => "GPIOC",
            PortId::GPIOD => "GPIOD",
            PortId::GPIOE => "GPIOE",
            PortId::GPIOF => "GPIOF",
            PortId::GPIOG => "GPIOG",
            PortId::GPIOH => "GPIOH",
            PortId::GPIOI => "GPIOI",
            PortId::GPIOJ => "GPIOJ",
            PortId::GPIOK => "GPIOK",
        }
    }

    /// Whether the port is bonded out on the configured chip variant.
    pub fn is_available(self) -> bool {
        CONFIG.ports.contains(&self)
    }
}

/// Index of a pin within its port, always in `0..=15`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinNum(u8);

impl PinNum {
    pub const COUNT: usize = 16;

    pub const fn new(pin: usize) -> Result<PinNum, ErrorCode> {
        if pin < PinNum::COUNT {
            Ok(PinNum(pin as u8))
        } else {
            Err(ErrorCode::INVAL)
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<usize> for PinNum {
    type Error = ErrorCode;

    fn try_from(pin: usize) -> Result<PinNum, ErrorCode> {
        PinNum::new(pin)
    }
}

impl fmt::Display for PinNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// GPIO pin mode [^1]
///
/// [^1]: Section 8.4.1, page 281 of reference manual
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Mode {
    Input = 0b00,
    GeneralPurposeOutput = 0b01,
    AlternateFunction = 0b10,
    Analog = 0b11,
}

impl Mode {
    fn from_raw(value: u32) -> Mode {
        match value & 0b11 {
            0b01 => Mode::GeneralPurposeOutput,
            0b10 => Mode::AlternateFunction,
            0b11 => Mode::Analog,
            _ => Mode::Input,
        }
    }
}

/// GPIO pin output type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum OutputType {
    PushPull = 0b0,
    OpenDrain = 0b1,
}

/// GPIO pin output speed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Speed {
    Low = 0b00,
    Medium = 0b01,
    Fast = 0b10,
    High = 0b11,
}

/// GPIO pin internal pull-up and pull-down [^1]
///
/// [^1]: Section 8.4.4, page 282 of reference manual
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum PullUpPullDown {
    NoPullUpPullDown = 0b00,
    PullUp = 0b01,
    PullDown = 0b10,
}

impl PullUpPullDown {
    // 0b11 is reserved and behaves as no pull.
    fn from_raw(value: u32) -> PullUpPullDown {
        match value & 0b11 {
            0b01 => PullUpPullDown::PullUp,
            0b10 => PullUpPullDown::PullDown,
            _ => PullUpPullDown::NoPullUpPullDown,
        }
    }
}

impl From<FloatingState> for PullUpPullDown {
    fn from(state: FloatingState) -> PullUpPullDown {
        match state {
            FloatingState::PullUp => PullUpPullDown::PullUp,
            FloatingState::PullDown => PullUpPullDown::PullDown,
            FloatingState::PullNone => PullUpPullDown::NoPullUpPullDown,
        }
    }
}

impl From<PullUpPullDown> for FloatingState {
    fn from(pull: PullUpPullDown) -> FloatingState {
        match pull {
            PullUpPullDown::PullUp => FloatingState::PullUp,
            PullUpPullDown::PullDown => FloatingState::PullDown,
            PullUpPullDown::NoPullUpPullDown => FloatingState::PullNone,
        }
    }
}

/// Alternate functions that may be assigned to a pin. Which peripheral each
/// one selects depends on the pin; see the datasheet's alternate function map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum AlternateFunction {
    AF0 = 0b0000,
    AF1 = 0b0001,
    AF2 = 0b0010,
    AF3 = 0b0011,
    AF4 = 0b0100,
    AF5 = 0b0101,
    AF6 = 0b0110,
    AF7 = 0b0111,
    AF8 = 0b1000,
    AF9 = 0b1001,
    AF10 = 0b1010,
    AF11 = 0b1011,
    AF12 = 0b1100,
    AF13 = 0b1101,
    AF14 = 0b1110,
    AF15 = 0b1111,
}

impl AlternateFunction {
    const ALL: [AlternateFunction; 16] = [
        AlternateFunction::AF0,
        AlternateFunction::AF1,
        AlternateFunction::AF2,
        AlternateFunction::AF3,
        AlternateFunction::AF4,
        AlternateFunction::AF5,
        AlternateFunction::AF6,
        AlternateFunction::AF7,
        AlternateFunction::AF8,
        AlternateFunction::AF9,
        AlternateFunction::AF10,
        AlternateFunction::AF11,
        AlternateFunction::AF12,
        AlternateFunction::AF13,
        AlternateFunction::AF14,
        AlternateFunction::AF15,
    ];

    // AFR fields are 4 bits wide, so every value names a function.
    fn from_raw(value: u32) -> AlternateFunction {
        Self::ALL[(value & 0xF) as usize]
    }
}

/// Every electrical mode a pin can be put in.
///
/// The discriminants are the raw configuration codes used by board pin
/// tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum PinConfig {
    OutputPushPull = 0,
    OutputPushPullUp = 1,
    OutputPushPullDown = 2,
    OutputOpenDrain = 3,
    OutputOpenDrainUp = 4,
    OutputOpenDrainDown = 5,
    AlternatePushPull = 6,
    AlternatePushPullUp = 7,
    AlternatePushPullDown = 8,
    AlternateOpenDrain = 9,
    AlternateOpenDrainUp = 10,
    AlternateOpenDrainDown = 11,
    /// High impedance input
    InputFloating = 12,
    InputPullUp = 13,
    InputPullDown = 14,
    Analog = 15,
}

impl PinConfig {
    const ALL: [PinConfig; 16] = [
        PinConfig::OutputPushPull,
        PinConfig::OutputPushPullUp,
        PinConfig::OutputPushPullDown,
        PinConfig::OutputOpenDrain,
        PinConfig::OutputOpenDrainUp,
        PinConfig::OutputOpenDrainDown,
        PinConfig::AlternatePushPull,
        PinConfig::AlternatePushPullUp,
        PinConfig::AlternatePushPullDown,
        PinConfig::AlternateOpenDrain,
        PinConfig::AlternateOpenDrainUp,
        PinConfig::AlternateOpenDrainDown,
        PinConfig::InputFloating,
        PinConfig::InputPullUp,
        PinConfig::InputPullDown,
        PinConfig::Analog,
    ];

    pub fn from_raw(code: u32) -> Option<PinConfig> {
        PinConfig::ALL.get(code as usize).copied()
    }

    pub fn mode(self) -> Mode {
        match self {
            PinConfig::InputFloating | PinConfig::InputPullUp | PinConfig::InputPullDown => {
                Mode::Input
            }
            PinConfig::OutputPushPull
            | PinConfig::OutputPushPullUp
            | PinConfig::OutputPushPullDown
            | PinConfig::OutputOpenDrain
            | PinConfig::OutputOpenDrainUp
            | PinConfig::OutputOpenDrainDown => Mode::GeneralPurposeOutput,
            PinConfig::AlternatePushPull
            | PinConfig::AlternatePushPullUp
            | PinConfig::AlternatePushPullDown
            | PinConfig::AlternateOpenDrain
            | PinConfig::AlternateOpenDrainUp
            | PinConfig::AlternateOpenDrainDown => Mode::AlternateFunction,
            PinConfig::Analog => Mode::Analog,
        }
    }

    pub fn output_type(self) -> OutputType {
        match self {
            PinConfig::OutputOpenDrain
            | PinConfig::OutputOpenDrainUp
            | PinConfig::OutputOpenDrainDown
            | PinConfig::AlternateOpenDrain
            | PinConfig::AlternateOpenDrainUp
            | PinConfig::AlternateOpenDrainDown => OutputType::OpenDrain,
            _ => OutputType::PushPull,
        }
    }

    /// Driven pins always run at `Fast`; there is no per-pin speed tuning.
    pub fn speed(self) -> Speed {
        match self {
            PinConfig::OutputPushPull
            | PinConfig::OutputPushPullUp
            | PinConfig::OutputPushPullDown
            | PinConfig::OutputOpenDrain
            | PinConfig::OutputOpenDrainUp
            | PinConfig::OutputOpenDrainDown
            | PinConfig::AlternatePushPull
            | PinConfig::AlternatePushPullUp
            | PinConfig::AlternatePushPullDown
            | PinConfig::AlternateOpenDrain
            | PinConfig::AlternateOpenDrainUp
            | PinConfig::AlternateOpenDrainDown => Speed::Fast,
            _ => Speed::Low,
        }
    }

    pub fn pull(self) -> PullUpPullDown {
        match self {
            PinConfig::OutputPushPull
            | PinConfig::OutputOpenDrain
            | PinConfig::AlternatePushPull
            | PinConfig::AlternateOpenDrain
            | PinConfig::InputFloating
            | PinConfig::Analog => PullUpPullDown::NoPullUpPullDown,
            PinConfig::OutputPushPullUp
            | PinConfig::OutputOpenDrainUp
            | PinConfig::AlternatePushPullUp
            | PinConfig::AlternateOpenDrainUp
            | PinConfig::InputPullUp => PullUpPullDown::PullUp,
            PinConfig::OutputPushPullDown
            | PinConfig::OutputOpenDrainDown
            | PinConfig::AlternatePushPullDown
            | PinConfig::AlternateOpenDrainDown
            | PinConfig::InputPullDown => PullUpPullDown::PullDown,
        }
    }

    pub fn field_values(self) -> FieldValues {
        FieldValues {
            mode: self.mode(),
            output_type: self.output_type(),
            speed: self.speed(),
            pull: self.pull(),
        }
    }
}

/// Map a platform-neutral request to the pin configuration implementing it.
///
/// Outputs are always push-pull; the floating state selects the pull
/// resistor that assists the driver.
pub fn normalize(config: NormalizedConfig) -> PinConfig {
    match (config.direction, config.floating) {
        (Direction::Output, FloatingState::PullUp) => PinConfig::OutputPushPullUp,
        (Direction::Output, FloatingState::PullDown) => PinConfig::OutputPushPullDown,
        (Direction::Output, FloatingState::PullNone) => PinConfig::OutputPushPull,
        (Direction::Input, FloatingState::PullUp) => PinConfig::InputPullUp,
        (Direction::Input, FloatingState::PullDown) => PinConfig::InputPullDown,
        (Direction::Input, FloatingState::PullNone) => PinConfig::InputFloating,
    }
}

impl From<NormalizedConfig> for PinConfig {
    fn from(config: NormalizedConfig) -> PinConfig {
        normalize(config)
    }
}

/// Hardware field values of one pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldValues {
    pub mode: Mode,
    pub output_type: OutputType,
    pub speed: Speed,
    pub pull: PullUpPullDown,
}

impl FieldValues {
    /// All-zero fields: a floating input.
    pub const NEUTRAL: FieldValues = FieldValues {
        mode: Mode::Input,
        output_type: OutputType::PushPull,
        speed: Speed::Low,
        pull: PullUpPullDown::NoPullUpPullDown,
    };

    /// Field values for a raw configuration code. Unknown codes give the
    /// neutral fields instead of an error.
    pub fn from_raw(code: u32) -> FieldValues {
        PinConfig::from_raw(code).map_or(FieldValues::NEUTRAL, PinConfig::field_values)
    }
}

impl From<PinConfig> for FieldValues {
    fn from(config: PinConfig) -> FieldValues {
        config.field_values()
    }
}

/// One GPIO port: 16 pins behind one register block.
///
/// The `Port` is the only handle to its register block.
pub struct Port<'a> {
    registers: StaticRef<GpioRegisters>,
    id: PortId,
    clock: rcc::PeripheralClock<'a>,
}

impl<'a> Port<'a> {
    pub const fn new(id: PortId, rcc: &'a rcc::Rcc) -> Self {
        let base = GPIO_BASE + GPIO_PORT_SIZE * id.index();
        Self::with_registers(
            id,
            unsafe { StaticRef::new(base as *const GpioRegisters) },
            rcc,
        )
    }

    const fn with_registers(
        id: PortId,
        registers: StaticRef<GpioRegisters>,
        rcc: &'a rcc::Rcc,
    ) -> Self {
        Self {
            registers,
            id,
            clock: rcc::PeripheralClock::new(
                rcc::PeripheralClockType::AHB1(rcc::HCLK1::GPIO(id)),
                rcc,
            ),
        }
    }

    pub fn id(&self) -> PortId {
        self.id
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

    /// Configure `pin` and optionally select its alternate function.
    ///
    /// The alternate function is written as given, even if `config` is not
    /// one of the `Alternate*` variants. `None` leaves AFR untouched.
    pub fn configure(
        &self,
        pin: usize,
        config: PinConfig,
        alternate: Option<AlternateFunction>,
    ) -> Result<(), ErrorCode> {
        let pin = PinNum::new(pin)?;
        self.write_config(pin, config, alternate);
        Ok(())
    }

    fn write_config(&self, pin: PinNum, config: PinConfig, alternate: Option<AlternateFunction>) {
        let fields = config.field_values();
        if CONFIG.trace_pin_config {
            debug!(
                "{} pin {}: {:?} {:?} {:?}",
                self.id.name(),
                pin,
                config,
                alternate,
                fields
            );
        }

        // Select the function before switching the mode so the pin never
        // drives the previous function's signal.
        if let Some(af) = alternate {
            self.registers.afr[pin.index() / 8].modify(af_field(pin).val(af as u32));
        }
        self.registers
            .moder
            .modify(pin_field(MODER::MODE, pin).val(fields.mode as u32));
        self.registers
            .otyper
            .modify(pin_field(OTYPER::OT, pin).val(fields.output_type as u32));
        self.registers
            .ospeedr
            .modify(pin_field(OSPEEDR::OSPEED, pin).val(fields.speed as u32));
        self.registers
            .pupdr
            .modify(pin_field(PUPDR::PUPD, pin).val(fields.pull as u32));
    }

    pub fn mode(&self, pin: PinNum) -> Mode {
        Mode::from_raw(self.registers.moder.read(pin_field(MODER::MODE, pin)))
    }

    pub fn pull(&self, pin: PinNum) -> PullUpPullDown {
        PullUpPullDown::from_raw(self.registers.pupdr.read(pin_field(PUPDR::PUPD, pin)))
    }

    /// The alternate function selected for `pin`, whether or not the pin is
    /// currently in alternate function mode.
    pub fn alternate_function(&self, pin: PinNum) -> AlternateFunction {
        let afr = &self.registers.afr[pin.index() / 8];
        AlternateFunction::from_raw(afr.read(af_field(pin)))
    }

    pub fn set_pull(&self, pin: PinNum, pull: PullUpPullDown) {
        self.registers
            .pupdr
            .modify(pin_field(PUPDR::PUPD, pin).val(pull as u32));
    }

    /// Drive `pin` high or low with a single BSRR write.
    pub fn set_pin(&self, pin: PinNum, value: bool) {
        if value {
            self.registers.bsrr.set(1 << pin.index());
        } else {
            self.registers.bsrr.set(1 << (pin.index() + 16));
        }
    }

    /// Level sampled on the pin.
    pub fn read_pin(&self, pin: PinNum) -> bool {
        self.registers.idr.is_set(pin_field(IDR::ID, pin))
    }

    /// Level the output driver is latched to.
    pub fn output_level(&self, pin: PinNum) -> bool {
        self.registers.odr.is_set(pin_field(ODR::OD, pin))
    }

    /// Invert the output latch and return the new level.
    pub fn toggle_pin(&self, pin: PinNum) -> bool {
        let level = !self.output_level(pin);
        self.set_pin(pin, level);
        level
    }
}

/// All ports of the chip, with the ones the configured variant lacks hidden.
pub struct GpioPorts<'a> {
    ports: [Port<'a>; 11],
}

impl<'a> GpioPorts<'a> {
    pub const fn new(rcc: &'a rcc::Rcc) -> Self {
        Self {
            ports: [
                Port::new(PortId::GPIOA, rcc),
                Port::new(PortId::GPIOB, rcc),
                Port::new(PortId::GPIOC, rcc),
                Port::new(PortId::GPIOD, rcc),
                Port::new(PortId::GPIOE, rcc),
                Port::new(PortId::GPIOF, rcc),
                Port::new(PortId::GPIOG, rcc),
                Port::new(PortId::GPIOH, rcc),
                Port::new(PortId::GPIOI, rcc),
                Port::new(PortId::GPIOJ, rcc),
                Port::new(PortId::GPIOK, rcc),
            ],
        }
    }

    pub fn port(&self, id: PortId) -> Result<&Port<'a>, ErrorCode> {
        if id.is_available() {
            Ok(&self.ports[id.index()])
        } else {
            Err(ErrorCode::NODEVICE)
        }
    }

    pub fn pin(&'a self, id: PortId, pin: usize) -> Result<Pin<'a>, ErrorCode> {
        let port = self.port(id)?;
        Ok(Pin::new(port, PinNum::new(pin)?))
    }
}

/// A single pin, usable through the GPIO HIL.
pub struct Pin<'a> {
    port: &'a Port<'a>,
    pin: PinNum,
}

impl<'a> Pin<'a> {
    pub const fn new(port: &'a Port<'a>, pin: PinNum) -> Self {
        Self { port, pin }
    }

    /// Route the pin to a peripheral.
    pub fn set_alternate_function(&self, config: PinConfig, af: AlternateFunction) {
        self.port.write_config(self.pin, config, Some(af));
    }
}

impl hil::gpio::Configure for Pin<'_> {
    fn configuration(&self) -> Configuration {
        match self.port.mode(self.pin) {
            Mode::Input => Configuration::Input,
            Mode::GeneralPurposeOutput => Configuration::Output,
            Mode::AlternateFunction => Configuration::Function,
            Mode::Analog => Configuration::LowPower,
        }
    }

    fn configure(&self, config: NormalizedConfig) -> Configuration {
        self.port.write_config(self.pin, normalize(config), None);
        self.configuration()
    }

    fn make_output(&self) -> Configuration {
        self.configure(NormalizedConfig::output(self.floating_state()))
    }

    fn make_input(&self) -> Configuration {
        self.configure(NormalizedConfig::input(self.floating_state()))
    }

    fn low_power(&self) {
        self.port.write_config(self.pin, PinConfig::Analog, None);
    }

    fn set_floating_state(&self, state: FloatingState) {
        self.port.set_pull(self.pin, state.into());
    }

    fn floating_state(&self) -> FloatingState {
        self.port.pull(self.pin).into()
    }
}

impl hil::gpio::Output for Pin<'_> {
    fn set(&self) {
        self.port.set_pin(self.pin, true);
    }

    fn clear(&self) {
        self.port.set_pin(self.pin, false);
    }

    fn toggle(&self) -> bool {
        self.port.toggle_pin(self.pin)
    }
}

impl hil::gpio::Input for Pin<'_> {
    fn read(&self) -> bool {
        self.port.read_pin(self.pin)
    }
}

impl hil::gpio::Pin for Pin<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_mmio::FakeMmio;
    use crate::rcc::tests::{rcc, FakeRcc, AHB1ENR_OFFSET};
    use kernel::hil::gpio::{Configure, Input, Output};

    const MODER: usize = 0x00;
    const OTYPER: usize = 0x04;
    const OSPEEDR: usize = 0x08;
    const PUPDR: usize = 0x0C;
    const IDR: usize = 0x10;
    const ODR: usize = 0x14;
    const BSRR: usize = 0x18;
    const AFRL: usize = 0x20;
    const AFRH: usize = 0x24;

    type FakeGpio = FakeMmio<10>;

    fn port<'a>(id: PortId, mmio: &FakeGpio, rcc: &'a rcc::Rcc) -> Port<'a> {
        // SAFETY: the fake block outlives the port in every test.
        Port::with_registers(id, unsafe { mmio.registers() }, rcc)
    }

    fn pin(n: usize) -> PinNum {
        PinNum::new(n).unwrap()
    }

    #[test]
    fn register_block_layout() {
        assert_eq!(core::mem::size_of::<GpioRegisters>(), AFRH + 4);
    }

    #[test]
    fn normalize_covers_every_request() {
        use FloatingState::*;
        let table = [
            (NormalizedConfig::output(PullUp), PinConfig::OutputPushPullUp),
            (NormalizedConfig::output(PullDown), PinConfig::OutputPushPullDown),
            (NormalizedConfig::output(PullNone), PinConfig::OutputPushPull),
            (NormalizedConfig::input(PullUp), PinConfig::InputPullUp),
            (NormalizedConfig::input(PullDown), PinConfig::InputPullDown),
            (NormalizedConfig::input(PullNone), PinConfig::InputFloating),
        ];
        for (request, expected) in table {
            assert_eq!(normalize(request), expected);
            assert_eq!(normalize(request), normalize(request));
            assert_eq!(PinConfig::from(request), expected);
        }
    }

    #[test]
    fn legacy_flags_fall_back_to_floating_input() {
        let config = NormalizedConfig::from_flags(0x0300);
        assert_eq!(normalize(config), PinConfig::InputFloating);
    }

    #[test]
    fn field_tables() {
        use Mode::*;
        use OutputType::*;
        use PullUpPullDown::*;
        use Speed::*;

        let table = [
            (PinConfig::OutputPushPull, GeneralPurposeOutput, PushPull, Fast, NoPullUpPullDown),
            (PinConfig::OutputPushPullUp, GeneralPurposeOutput, PushPull, Fast, PullUp),
            (PinConfig::OutputPushPullDown, GeneralPurposeOutput, PushPull, Fast, PullDown),
            (PinConfig::OutputOpenDrain, GeneralPurposeOutput, OpenDrain, Fast, NoPullUpPullDown),
            (PinConfig::OutputOpenDrainUp, GeneralPurposeOutput, OpenDrain, Fast, PullUp),
            (PinConfig::OutputOpenDrainDown, GeneralPurposeOutput, OpenDrain, Fast, PullDown),
            (PinConfig::AlternatePushPull, AlternateFunction, PushPull, Fast, NoPullUpPullDown),
            (PinConfig::AlternatePushPullUp, AlternateFunction, PushPull, Fast, PullUp),
            (PinConfig::AlternatePushPullDown, AlternateFunction, PushPull, Fast, PullDown),
            (PinConfig::AlternateOpenDrain, AlternateFunction, OpenDrain, Fast, NoPullUpPullDown),
            (PinConfig::AlternateOpenDrainUp, AlternateFunction, OpenDrain, Fast, PullUp),
            (PinConfig::AlternateOpenDrainDown, AlternateFunction, OpenDrain, Fast, PullDown),
            (PinConfig::InputFloating, Input, PushPull, Low, NoPullUpPullDown),
            (PinConfig::InputPullUp, Input, PushPull, Low, PullUp),
            (PinConfig::InputPullDown, Input, PushPull, Low, PullDown),
            (PinConfig::Analog, Analog, PushPull, Low, NoPullUpPullDown),
        ];
        for (config, mode, output_type, speed, pull) in table {
            assert_eq!(
                config.field_values(),
                FieldValues {
                    mode,
                    output_type,
                    speed,
                    pull
                },
                "{:?}",
                config
            );
        }
    }

    #[test]
    fn field_codes() {
        let push_pull = FieldValues::from(PinConfig::OutputPushPull);
        assert_eq!(
            (push_pull.mode as u32, push_pull.output_type as u32, push_pull.speed as u32, push_pull.pull as u32),
            (1, 0, 2, 0)
        );
        let pull_down = FieldValues::from(PinConfig::InputPullDown);
        assert_eq!(
            (pull_down.mode as u32, pull_down.output_type as u32, pull_down.speed as u32, pull_down.pull as u32),
            (0, 0, 0, 2)
        );
        let analog = FieldValues::from(PinConfig::Analog);
        assert_eq!(
            (analog.mode as u32, analog.output_type as u32, analog.speed as u32, analog.pull as u32),
            (3, 0, 0, 0)
        );
    }

    #[test]
    fn unknown_raw_code_is_neutral() {
        assert_eq!(PinConfig::from_raw(16), None);
        assert_eq!(FieldValues::from_raw(16), FieldValues::NEUTRAL);
        assert_eq!(FieldValues::from_raw(0xFFFF_FFFF), FieldValues::NEUTRAL);
        assert_eq!(PinConfig::from_raw(9), Some(PinConfig::AlternateOpenDrain));
        assert_eq!(FieldValues::from_raw(15).mode, Mode::Analog);
    }

    #[test]
    fn configure_writes_only_the_pin_slots() {
        let (mmio, rcc_mmio) = (FakeGpio::new(), FakeRcc::new());
        let rcc = rcc(&rcc_mmio);
        let port = port(PortId::GPIOA, &mmio, &rcc);
        for offset in [MODER, OTYPER, OSPEEDR, PUPDR, AFRL, AFRH] {
            mmio.set_word(offset, 0xFFFF_FFFF);
        }

        port.configure(5, PinConfig::InputFloating, None).unwrap();

        assert_eq!(mmio.word(MODER), !(0b11 << 10));
        assert_eq!(mmio.word(OTYPER), !(1 << 5));
        assert_eq!(mmio.word(OSPEEDR), !(0b11 << 10));
        assert_eq!(mmio.word(PUPDR), !(0b11 << 10));
        assert_eq!(mmio.word(AFRL), 0xFFFF_FFFF);
        assert_eq!(mmio.word(AFRH), 0xFFFF_FFFF);
    }

    #[test]
    fn configure_packs_fields_at_pin_offsets() {
        let (mmio, rcc_mmio) = (FakeGpio::new(), FakeRcc::new());
        let rcc = rcc(&rcc_mmio);
        let port = port(PortId::GPIOB, &mmio, &rcc);

        port.configure(15, PinConfig::OutputOpenDrainDown, None).unwrap();

        assert_eq!(mmio.word(MODER), 0b01 << 30);
        assert_eq!(mmio.word(OTYPER), 1 << 15);
        assert_eq!(mmio.word(OSPEEDR), 0b10 << 30);
        assert_eq!(mmio.word(PUPDR), 0b10 << 30);
    }

    #[test]
    fn alternate_function_nibble() {
        let (mmio, rcc_mmio) = (FakeGpio::new(), FakeRcc::new());
        let rcc = rcc(&rcc_mmio);
        let port = port(PortId::GPIOA, &mmio, &rcc);
        mmio.set_word(AFRH, 0xFFFF_FF0F);

        port.configure(9, PinConfig::AlternatePushPull, Some(AlternateFunction::AF7))
            .unwrap();
        assert_eq!(mmio.word(AFRH), 0xFFFF_FF7F);
        assert_eq!(mmio.word(AFRL), 0);
        assert_eq!(mmio.word(MODER), 0b10 << 18);

        port.configure(2, PinConfig::AlternateOpenDrainUp, Some(AlternateFunction::AF4))
            .unwrap();
        assert_eq!(mmio.word(AFRL), 0x4 << 8);
        assert_eq!(mmio.word(AFRH), 0xFFFF_FF7F);
        assert_eq!(port.alternate_function(pin(2)), AlternateFunction::AF4);
        assert_eq!(port.alternate_function(pin(9)), AlternateFunction::AF7);
        assert_eq!(port.alternate_function(pin(15)), AlternateFunction::AF15);
    }

    #[test]
    fn reconfiguring_clears_stale_fields() {
        let (mmio, rcc_mmio) = (FakeGpio::new(), FakeRcc::new());
        let rcc = rcc(&rcc_mmio);
        let port = port(PortId::GPIOC, &mmio, &rcc);

        port.configure(3, PinConfig::OutputOpenDrainUp, None).unwrap();
        port.configure(3, PinConfig::InputFloating, None).unwrap();

        assert_eq!(mmio.snapshot(), [0; 10]);
    }

    #[test]
    fn configure_is_idempotent() {
        let (mmio, rcc_mmio) = (FakeGpio::new(), FakeRcc::new());
        let rcc = rcc(&rcc_mmio);
        let port = port(PortId::GPIOA, &mmio, &rcc);
        mmio.set_word(MODER, 0xA5A5_A5A5);
        mmio.set_word(PUPDR, 0x0F0F_0F0F);

        port.configure(12, PinConfig::AlternateOpenDrain, Some(AlternateFunction::AF11))
            .unwrap();
        let once = mmio.snapshot();
        port.configure(12, PinConfig::AlternateOpenDrain, Some(AlternateFunction::AF11))
            .unwrap();
        assert_eq!(mmio.snapshot(), once);
    }

    #[test]
    fn configure_rejects_pin_out_of_range() {
        let (mmio, rcc_mmio) = (FakeGpio::new(), FakeRcc::new());
        let rcc = rcc(&rcc_mmio);
        let port = port(PortId::GPIOA, &mmio, &rcc);
        mmio.set_word(MODER, 0x1234_5678);
        let before = mmio.snapshot();

        assert_eq!(
            port.configure(16, PinConfig::OutputPushPull, Some(AlternateFunction::AF1)),
            Err(ErrorCode::INVAL)
        );
        assert_eq!(mmio.snapshot(), before);
    }

    #[test]
    fn set_pin_is_a_single_bsrr_write() {
        let (mmio, rcc_mmio) = (FakeGpio::new(), FakeRcc::new());
        let rcc = rcc(&rcc_mmio);
        let port = port(PortId::GPIOA, &mmio, &rcc);

        port.set_pin(pin(4), true);
        assert_eq!(mmio.word(BSRR), 0x10);
        port.set_pin(pin(4), false);
        assert_eq!(mmio.word(BSRR), 0x10_0000);
        assert_eq!(mmio.word(ODR), 0);
    }

    #[test]
    fn read_pin_samples_idr() {
        let (mmio, rcc_mmio) = (FakeGpio::new(), FakeRcc::new());
        let rcc = rcc(&rcc_mmio);
        let port = port(PortId::GPIOA, &mmio, &rcc);
        mmio.set_word(IDR, 1 << 13);

        assert!(port.read_pin(pin(13)));
        assert!(!port.read_pin(pin(12)));
        assert!(!port.read_pin(pin(14)));
    }

    #[test]
    fn toggle_inverts_output_latch() {
        let (mmio, rcc_mmio) = (FakeGpio::new(), FakeRcc::new());
        let rcc = rcc(&rcc_mmio);
        let port = port(PortId::GPIOA, &mmio, &rcc);

        mmio.set_word(ODR, 1 << 7);
        assert!(!port.toggle_pin(pin(7)));
        assert_eq!(mmio.word(BSRR), 1 << 23);

        mmio.set_word(ODR, 0);
        assert!(port.toggle_pin(pin(7)));
        assert_eq!(mmio.word(BSRR), 1 << 7);
    }

    #[test]
    fn port_clock_gate() {
        let (mmio, rcc_mmio) = (FakeGpio::new(), FakeRcc::new());
        let rcc = rcc(&rcc_mmio);
        let port = port(PortId::GPIOH, &mmio, &rcc);

        assert!(!port.is_enabled_clock());
        port.enable_clock();
        assert!(port.is_enabled_clock());
        assert_eq!(rcc_mmio.word(AHB1ENR_OFFSET), 1 << 7);
        port.disable_clock();
        assert_eq!(rcc_mmio.word(AHB1ENR_OFFSET), 0);
    }

    #[test]
    fn hil_pin() {
        let (mmio, rcc_mmio) = (FakeGpio::new(), FakeRcc::new());
        let rcc = rcc(&rcc_mmio);
        let port = port(PortId::GPIOE, &mmio, &rcc);
        let led = Pin::new(&port, pin(6));

        assert_eq!(led.configuration(), Configuration::Input);
        led.set_floating_state(FloatingState::PullDown);
        assert_eq!(led.make_output(), Configuration::Output);
        assert!(led.is_output());
        assert_eq!(led.floating_state(), FloatingState::PullDown);
        assert_eq!(mmio.word(MODER), 0b01 << 12);
        assert_eq!(mmio.word(OSPEEDR), 0b10 << 12);
        assert_eq!(mmio.word(PUPDR), 0b10 << 12);

        led.set();
        assert_eq!(mmio.word(BSRR), 1 << 6);
        led.write(false);
        assert_eq!(mmio.word(BSRR), 1 << 22);

        assert_eq!(led.make_input(), Configuration::Input);
        assert_eq!(mmio.word(OSPEEDR), 0);
        mmio.set_word(IDR, 1 << 6);
        assert!(led.read());

        led.low_power();
        assert_eq!(led.configuration(), Configuration::LowPower);
        assert_eq!(led.floating_state(), FloatingState::PullNone);

        led.set_alternate_function(PinConfig::AlternatePushPull, AlternateFunction::AF2);
        assert_eq!(led.configuration(), Configuration::Function);
        assert_eq!(mmio.word(AFRL), 0x2 << 24);
    }

    #[test]
    fn reserved_pull_reads_as_none() {
        let (mmio, rcc_mmio) = (FakeGpio::new(), FakeRcc::new());
        let rcc = rcc(&rcc_mmio);
        let port = port(PortId::GPIOA, &mmio, &rcc);
        mmio.set_word(PUPDR, 0b11 << 2);

        assert_eq!(port.pull(pin(1)), PullUpPullDown::NoPullUpPullDown);
    }

    #[test]
    fn pin_numbers() {
        assert_eq!(PinNum::new(15).map(PinNum::index), Ok(15));
        assert_eq!(PinNum::try_from(16), Err(ErrorCode::INVAL));
        assert_eq!(PortId::from_u32(3), Some(PortId::GPIOD));
        assert_eq!(PortId::from_u32(11), None);
        assert_eq!(PortId::GPIOK.name(), "GPIOK");
    }

    #[test]
    fn ports_missing_on_variant_are_rejected() {
        let rcc = rcc::Rcc::new();
        let ports = GpioPorts::new(&rcc);

        for id in PortId::ALL {
            match ports.port(id) {
                Ok(port) => {
                    assert!(CONFIG.ports.contains(&id));
                    assert_eq!(port.id(), id);
                }
                Err(err) => {
                    assert!(!CONFIG.ports.contains(&id));
                    assert_eq!(err, ErrorCode::NODEVICE);
                }
            }
        }
        assert!(ports.port(PortId::GPIOA).is_ok());
        assert_eq!(ports.pin(PortId::GPIOA, 16).err(), Some(ErrorCode::INVAL));
    }
}
