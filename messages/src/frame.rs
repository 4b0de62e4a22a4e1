// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Command and response frames.
//!
//! Host to module:
//!
//! | byte | content |
//! |------|---------|
//! | 0    | checksum (bits 7:4), write flag (bit 0) |
//! | 1    | register address |
//! | 2-3  | payload, big-endian, zero when reading |
//!
//! Module to host:
//!
//! | byte | content |
//! |------|---------|
//! | 0    | checksum (bits 7:4), CE (bit 3), status (bits 1:0) |
//! | 1    | echoed register address |
//! | 2-3  | data, big-endian |

use crate::checksum::checksum;
use crate::checksum::checksum_field;
use crate::checksum::stamp;
use crate::status::classify;
use crate::Error;
use crate::RegisterAddress;
use crate::StatusCode;
use crate::StatusOutcome;
use crate::FRAME_SIZE;
use serde::Deserialize;
use serde::Serialize;

/// The write flag in the first byte of a command frame.
const WRITE_BIT: u8 = 0b0000_0001;

/// The communication-error flag in the first byte of a response frame.
const CE_BIT: u8 = 0b0000_1000;

/// A single register command from host to module.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CommandFrame {
    pub register: RegisterAddress,
    pub write: bool,
    pub payload: u16,
}

impl CommandFrame {
    /// Construct a command reading a register.
    pub const fn read(register: RegisterAddress) -> Self {
        Self {
            register,
            write: false,
            payload: 0,
        }
    }

    /// Construct a command writing a raw 16-bit word to a register.
    pub const fn write(register: RegisterAddress, payload: u16) -> Self {
        Self {
            register,
            write: true,
            payload,
        }
    }

    /// Construct a command writing a signed value to a register, in two's
    /// complement.
    pub const fn write_signed(register: RegisterAddress, value: i16) -> Self {
        Self::write(register, value as u16)
    }

    /// Encode the command into its wire representation.
    pub const fn encode(&self) -> [u8; FRAME_SIZE] {
        let payload = self.payload.to_be_bytes();
        let header = if self.write { WRITE_BIT } else { 0 };
        stamp([header, self.register, payload[0], payload[1]])
    }

    /// Decode a command frame, as a module would.
    pub fn decode(bytes: [u8; FRAME_SIZE]) -> Result<Self, Error> {
        verify_checksum(bytes)?;
        Ok(Self {
            register: bytes[1],
            write: (bytes[0] & WRITE_BIT) != 0,
            payload: u16::from_be_bytes([bytes[2], bytes[3]]),
        })
    }
}

/// A single response from module to host.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ResponseFrame {
    /// The 4-bit checksum carried in the frame.
    pub checksum: u8,
    /// Set when the module detected a checksum error in the previous command.
    pub communication_error: bool,
    pub status: StatusCode,
    /// The echoed register address.
    pub register: RegisterAddress,
    pub data: [u8; 2],
}

impl ResponseFrame {
    /// Construct a response with its checksum filled in.
    pub fn new(status: StatusCode, register: RegisterAddress, data: [u8; 2]) -> Self {
        let mut frame = Self {
            checksum: 0,
            communication_error: false,
            status,
            register,
            data,
        };
        frame.checksum = checksum(frame.encode());
        frame
    }

    /// Decode a response frame, validating its checksum.
    ///
    /// This does not check the echoed register, see
    /// [`ResponseFrame::verify_register`].
    pub fn decode(bytes: [u8; FRAME_SIZE]) -> Result<Self, Error> {
        verify_checksum(bytes)?;
        Ok(Self {
            checksum: checksum_field(bytes),
            communication_error: (bytes[0] & CE_BIT) != 0,
            status: StatusCode::from_byte(bytes[0]),
            register: bytes[1],
            data: [bytes[2], bytes[3]],
        })
    }

    /// Decode a response and verify that it answers a command for
    /// `requested`.
    pub fn decode_for(bytes: [u8; FRAME_SIZE], requested: RegisterAddress) -> Result<Self, Error> {
        let frame = Self::decode(bytes)?;
        frame.verify_register(requested)?;
        Ok(frame)
    }

    /// Check that the echoed register matches the requested one.
    ///
    /// Responses announcing extended data may echo a different register, and
    /// are always accepted.
    pub fn verify_register(&self, requested: RegisterAddress) -> Result<(), Error> {
        if self.status == StatusCode::ExtendedRead || self.register == requested {
            Ok(())
        } else {
            Err(Error::RegisterMismatch {
                expected: requested,
                actual: self.register,
            })
        }
    }

    /// Encode the response into its wire representation, as a module would.
    ///
    /// The checksum is always recomputed from the frame contents.
    pub fn encode(&self) -> [u8; FRAME_SIZE] {
        let mut header = u8::from(self.status);
        if self.communication_error {
            header |= CE_BIT;
        }
        stamp([header, self.register, self.data[0], self.data[1]])
    }

    /// Return the data word as an unsigned integer.
    pub const fn data_u16(&self) -> u16 {
        u16::from_be_bytes(self.data)
    }

    /// Classify this response by its status code.
    pub const fn outcome(&self) -> StatusOutcome {
        classify(self)
    }
}

fn verify_checksum(bytes: [u8; FRAME_SIZE]) -> Result<(), Error> {
    let expected = checksum(bytes);
    let observed = checksum_field(bytes);
    if expected == observed {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch { expected, observed })
    }
}
