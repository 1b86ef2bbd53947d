// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Standard error enum for invoking operations

use core::fmt;

/// Standard errors returned by the GPIO and routing drivers.
///
/// Operations validate their arguments before touching any register, so an
/// `Err` always means no hardware state was changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum ErrorCode {
    /// Generic failure condition
    FAIL = 1,
    /// The component is powered down
    OFF = 4,
    /// An invalid parameter was passed
    INVAL = 6,
    /// Device does not exist
    NODEVICE = 11,
}

impl From<ErrorCode> for usize {
    fn from(err: ErrorCode) -> usize {
        err as usize
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorCode::FAIL => "generic failure",
            ErrorCode::OFF => "powered down",
            ErrorCode::INVAL => "invalid argument",
            ErrorCode::NODEVICE => "no such device",
        };
        f.write_str(text)
    }
}
