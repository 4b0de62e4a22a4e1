// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Response status codes and the errors reported through the NOP register.

use crate::Error;
use crate::ResponseFrame;
use serde::Deserialize;
use serde::Serialize;

/// The 2-bit status carried in every response frame.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[cfg_attr(test, derive(strum::EnumIter))]
#[cfg_attr(any(feature = "api-traits", test), derive(schemars::JsonSchema))]
pub enum StatusCode {
    /// The command completed normally.
    Ok,
    /// The command failed. The reason is available in the NOP register.
    ExecutionError,
    /// The register holds more data than one word; it must be read through
    /// the extended-address register.
    ExtendedRead,
    /// The command was accepted but has not yet completed.
    CommandPending,
}

impl StatusCode {
    /// Mask selecting the status bits of the first response byte.
    pub const MASK: u8 = 0b11;

    /// Extract the status code from the first byte of a response frame.
    ///
    /// Only the low two bits are used, so every byte maps to a status.
    pub const fn from_byte(byte: u8) -> Self {
        match byte & Self::MASK {
            0 => StatusCode::Ok,
            1 => StatusCode::ExecutionError,
            2 => StatusCode::ExtendedRead,
            _ => StatusCode::CommandPending,
        }
    }
}

impl From<StatusCode> for u8 {
    fn from(status: StatusCode) -> Self {
        match status {
            StatusCode::Ok => 0,
            StatusCode::ExecutionError => 1,
            StatusCode::ExtendedRead => 2,
            StatusCode::CommandPending => 3,
        }
    }
}

/// What the host must do next with a response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusOutcome {
    /// The operation is complete and carries this data word.
    Ok([u8; 2]),
    /// The device has not finished; completion is observed by polling NOP.
    Pending,
    /// Extended data is available, with the advertised length in bytes.
    ExtendedRead(u16),
    /// The device failed the command; the NOP register holds the reason.
    ExecutionFailed,
}

/// Classify a response by its status code.
pub const fn classify(response: &ResponseFrame) -> StatusOutcome {
    match response.status {
        StatusCode::Ok => StatusOutcome::Ok(response.data),
        StatusCode::ExecutionError => StatusOutcome::ExecutionFailed,
        StatusCode::ExtendedRead => StatusOutcome::ExtendedRead(u16::from_be_bytes(response.data)),
        StatusCode::CommandPending => StatusOutcome::Pending,
    }
}

/// The detailed reason for a failed command, read from the NOP register.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[cfg_attr(test, derive(strum::EnumIter))]
#[cfg_attr(any(feature = "api-traits", test), derive(schemars::JsonSchema))]
pub enum NopErrorKind {
    /// RNI: the register is not implemented.
    RegisterNotImplemented,
    /// RNW: the register is not writable.
    RegisterNotWritable,
    /// RVE: the written value is out of range for this device.
    ValueRangeError,
    /// CIP: the command was ignored because an operation is pending.
    CommandIgnoredPending,
    /// CII: the command was ignored while the module initializes.
    CommandIgnoredInitializing,
    /// ERE: the extended address is out of range.
    ///
    /// This also marks the normal end of an extended read.
    ExtendedAddressRangeError,
    /// ERO: the extended address is read-only.
    ExtendedAddressReadOnly,
    /// EXF: general execution failure.
    ExecutionGeneralFailure,
    /// CIE: the command was ignored because the optical output is enabled.
    CommandIgnoredOutputEnabled,
    /// IVC: invalid configuration, command ignored.
    InvalidConfiguration,
    /// VSE: vendor-specific error.
    VendorSpecific,
}

impl NopErrorKind {
    /// Mask selecting the error field of the NOP register.
    pub const MASK: u16 = 0x000F;

    /// Extract the error field from a NOP register data word.
    pub const fn field(data: [u8; 2]) -> u8 {
        (u16::from_be_bytes(data) & Self::MASK) as u8
    }

    /// Decode a NOP error field.
    ///
    /// A zero field means no error and yields `Ok(None)`. Codes the protocol
    /// reserves are an error.
    pub const fn from_field(code: u8) -> Result<Option<Self>, Error> {
        use NopErrorKind::*;
        let kind = match code {
            0x0 => return Ok(None),
            0x1 => RegisterNotImplemented,
            0x2 => RegisterNotWritable,
            0x3 => ValueRangeError,
            0x4 => CommandIgnoredPending,
            0x5 => CommandIgnoredInitializing,
            0x6 => ExtendedAddressRangeError,
            0x7 => ExtendedAddressReadOnly,
            0x8 => ExecutionGeneralFailure,
            0x9 => CommandIgnoredOutputEnabled,
            0xA => InvalidConfiguration,
            0xF => VendorSpecific,
            x => return Err(Error::UnknownNopCode(x)),
        };
        Ok(Some(kind))
    }

    /// The short mnemonic used by the MSA.
    pub const fn mnemonic(&self) -> &'static str {
        use NopErrorKind::*;
        match self {
            RegisterNotImplemented => "RNI",
            RegisterNotWritable => "RNW",
            ValueRangeError => "RVE",
            CommandIgnoredPending => "CIP",
            CommandIgnoredInitializing => "CII",
            ExtendedAddressRangeError => "ERE",
            ExtendedAddressReadOnly => "ERO",
            ExecutionGeneralFailure => "EXF",
            CommandIgnoredOutputEnabled => "CIE",
            InvalidConfiguration => "IVC",
            VendorSpecific => "VSE",
        }
    }
}

impl From<NopErrorKind> for u8 {
    fn from(kind: NopErrorKind) -> Self {
        use NopErrorKind::*;
        match kind {
            RegisterNotImplemented => 0x1,
            RegisterNotWritable => 0x2,
            ValueRangeError => 0x3,
            CommandIgnoredPending => 0x4,
            CommandIgnoredInitializing => 0x5,
            ExtendedAddressRangeError => 0x6,
            ExtendedAddressReadOnly => 0x7,
            ExecutionGeneralFailure => 0x8,
            CommandIgnoredOutputEnabled => 0x9,
            InvalidConfiguration => 0xA,
            VendorSpecific => 0xF,
        }
    }
}

impl core::fmt::Display for NopErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use NopErrorKind::*;
        let description = match self {
            RegisterNotImplemented => "Register not implemented",
            RegisterNotWritable => "Register not writable",
            ValueRangeError => "Register value range error",
            CommandIgnoredPending => "Command ignored due to pending operation",
            CommandIgnoredInitializing => "Command ignored while initializing",
            ExtendedAddressRangeError => "Extended address range error",
            ExtendedAddressReadOnly => "Extended address is read-only",
            ExecutionGeneralFailure => "Execution general failure",
            CommandIgnoredOutputEnabled => "Command ignored while optical output is enabled",
            InvalidConfiguration => "Invalid configuration, command ignored",
            VendorSpecific => "Vendor-specific error",
        };
        write!(f, "{}: {description}", self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::classify;
    use super::NopErrorKind;
    use super::StatusCode;
    use super::StatusOutcome;
    use crate::Error;
    use crate::ResponseFrame;
    use strum::IntoEnumIterator;

    #[test]
    fn test_status_code_from_byte_is_total() {
        for byte in 0..=255u8 {
            let status = StatusCode::from_byte(byte);
            assert_eq!(u8::from(status), byte & StatusCode::MASK);
        }
    }

    #[test]
    fn test_classify_each_status() {
        for status in StatusCode::iter() {
            let response = ResponseFrame::new(status, 0x31, [0x00, 0x04]);
            let outcome = classify(&response);
            match status {
                StatusCode::Ok => assert_eq!(outcome, StatusOutcome::Ok([0x00, 0x04])),
                StatusCode::ExecutionError => assert_eq!(outcome, StatusOutcome::ExecutionFailed),
                StatusCode::ExtendedRead => assert_eq!(outcome, StatusOutcome::ExtendedRead(4)),
                StatusCode::CommandPending => assert_eq!(outcome, StatusOutcome::Pending),
            }
        }
    }

    #[test]
    fn test_nop_error_kind_codes() {
        for kind in NopErrorKind::iter() {
            let code = u8::from(kind);
            assert_eq!(NopErrorKind::from_field(code), Ok(Some(kind)));
        }
        assert_eq!(NopErrorKind::from_field(0), Ok(None));
        for reserved in 0xB..=0xE {
            assert_eq!(
                NopErrorKind::from_field(reserved),
                Err(Error::UnknownNopCode(reserved))
            );
        }
    }

    #[test]
    fn test_nop_error_field_ignores_high_bits() {
        // Pending flags and MRDY live above the error field.
        assert_eq!(NopErrorKind::field([0xff, 0x16]), 0x6);
        assert_eq!(NopErrorKind::field([0x01, 0x10]), 0x0);
    }

    #[test]
    fn test_nop_error_kind_display() {
        assert_eq!(
            NopErrorKind::ValueRangeError.to_string(),
            "RVE: Register value range error"
        );
    }
}
