// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Interface for configuring and using GPIO pins.
//!
//! A user describes a pin with a [`NormalizedConfig`]: a direction and a
//! floating state. How that request becomes register contents is up to the
//! chip crate.

/// Enum for configuring any pull-up or pull-down resistors on the GPIO pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatingState {
    PullUp,
    PullDown,
    PullNone,
}

/// Whether the pin samples the line or drives it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Enum for which state the pin is in. `Function` means the pin has been
/// routed to a peripheral; which one is outside the scope of the HIL and
/// needs a chip-specific API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Configuration {
    /// Disconnected from the digital logic (analog on most chips).
    LowPower,
    Input,
    Output,
    Function,
}

/// Legacy integer encoding of a pin request.
///
/// Bit 0 carries the direction, bits 8 and 9 the pull resistor.
pub mod flags {
    pub const DIR_IN: u32 = 0 << 0;
    pub const DIR_OUT: u32 = 1 << 0;
    pub const DIR_MASK: u32 = 0x1;

    pub const PUD_SHIFT: u32 = 8;
    pub const PUD_NORMAL: u32 = 0 << PUD_SHIFT;
    pub const PUD_PULL_UP: u32 = 1 << PUD_SHIFT;
    pub const PUD_PULL_DOWN: u32 = 2 << PUD_SHIFT;
    pub const PUD_MASK: u32 = 0x3 << PUD_SHIFT;
}

/// Platform-neutral description of how a pin should be configured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NormalizedConfig {
    pub direction: Direction,
    pub floating: FloatingState,
}

impl NormalizedConfig {
    pub const fn new(direction: Direction, floating: FloatingState) -> NormalizedConfig {
        NormalizedConfig {
            direction,
            floating,
        }
    }

    pub const fn input(floating: FloatingState) -> NormalizedConfig {
        NormalizedConfig::new(Direction::Input, floating)
    }

    pub const fn output(floating: FloatingState) -> NormalizedConfig {
        NormalizedConfig::new(Direction::Output, floating)
    }

    /// Decode legacy flags.
    ///
    /// Only the direction and pull bits are looked at. The reserved pull
    /// encoding (`0x3 << 8`) decodes as `PullNone`, so any flag word yields a
    /// usable request.
    pub const fn from_flags(value: u32) -> NormalizedConfig {
        let direction = if value & flags::DIR_MASK == flags::DIR_OUT {
            Direction::Output
        } else {
            Direction::Input
        };
        let floating = match value & flags::PUD_MASK {
            flags::PUD_PULL_UP => FloatingState::PullUp,
            flags::PUD_PULL_DOWN => FloatingState::PullDown,
            _ => FloatingState::PullNone,
        };
        NormalizedConfig::new(direction, floating)
    }

    /// Encode back into legacy flags.
    pub const fn to_flags(&self) -> u32 {
        let direction = match self.direction {
            Direction::Input => flags::DIR_IN,
            Direction::Output => flags::DIR_OUT,
        };
        let pull = match self.floating {
            FloatingState::PullUp => flags::PUD_PULL_UP,
            FloatingState::PullDown => flags::PUD_PULL_DOWN,
            FloatingState::PullNone => flags::PUD_NORMAL,
        };
        direction | pull
    }
}

/// The Pin trait allows a pin to be used as either input or output and to be
/// configured.
pub trait Pin: Input + Output + Configure {}

/// Control and configure a GPIO pin.
pub trait Configure {
    /// Return the current pin configuration.
    fn configuration(&self) -> Configuration;

    /// Apply a complete request: direction and pull together.
    fn configure(&self, config: NormalizedConfig) -> Configuration;

    /// Make the pin an output, keeping its current floating state.
    fn make_output(&self) -> Configuration;

    /// Make the pin an input, keeping its current floating state.
    fn make_input(&self) -> Configuration;

    /// Disconnect the pin from the digital logic and put it in its lowest
    /// power state. Re-enabling the pin requires reconfiguring it.
    fn low_power(&self);

    /// Set the floating state of the pin without touching its direction.
    fn set_floating_state(&self, state: FloatingState);

    /// Return the current floating state of the pin.
    fn floating_state(&self) -> FloatingState;

    fn is_input(&self) -> bool {
        self.configuration() == Configuration::Input
    }

    fn is_output(&self) -> bool {
        self.configuration() == Configuration::Output
    }
}

pub trait Output {
    /// Set the GPIO pin high. If the pin is not an output, this only changes
    /// the latched output value.
    fn set(&self);

    /// Set the GPIO pin low. If the pin is not an output, this only changes
    /// the latched output value.
    fn clear(&self);

    /// Toggle the GPIO pin and return the new output value.
    fn toggle(&self) -> bool;

    fn write(&self, value: bool) {
        if value {
            self.set();
        } else {
            self.clear();
        }
    }
}

pub trait Input {
    /// Get the current state of the line, as sampled by the input stage.
    fn read(&self) -> bool;
}
