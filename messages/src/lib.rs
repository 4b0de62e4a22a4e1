// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]

//! Wire formats for the OIF-ITLA-MSA register command protocol.
//!
//! A host talks to an Integrable Tunable Laser Assembly by exchanging 4-byte
//! frames over a byte-oriented link, usually RS-232. Each command frame names
//! a single 8-bit register and either reads it or writes a 16-bit value to it;
//! each response frame carries a 2-bit status, the echoed register, and a
//! 16-bit data word.
//!
//! This crate contains the pieces of the protocol that do not depend on any
//! I/O: the frame checksum, the frame codec, the classification of response
//! status codes, the register tables for each protocol revision, and the
//! decoding of the status and trigger registers into flag sets.

extern crate alloc;

pub mod checksum;
pub mod flags;
pub mod frame;
pub mod register;
pub mod status;

pub use frame::CommandFrame;
pub use frame::ResponseFrame;
pub use register::ProtocolVersion;
pub use register::RegisterDescriptor;
pub use register::RegisterTable;
pub use status::NopErrorKind;
pub use status::StatusCode;
pub use status::StatusOutcome;

/// The size of every frame on the wire, in either direction.
pub const FRAME_SIZE: usize = 4;

/// An 8-bit register address.
pub type RegisterAddress = u8;

/// Errors building, encoding, or decoding protocol data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(any(test, feature = "std"), derive(thiserror::Error))]
pub enum Error {
    /// The checksum in a received frame does not match its contents.
    #[cfg_attr(
        any(test, feature = "std"),
        error("Frame checksum mismatch: expected 0x{expected:x}, observed 0x{observed:x}")
    )]
    ChecksumMismatch { expected: u8, observed: u8 },

    /// A response echoed a register other than the one requested.
    #[cfg_attr(
        any(test, feature = "std"),
        error("Response echoed register 0x{actual:02x}, expected 0x{expected:02x}")
    )]
    RegisterMismatch {
        expected: RegisterAddress,
        actual: RegisterAddress,
    },

    /// An extension table redefines an address already in the table.
    #[cfg_attr(
        any(test, feature = "std"),
        error("Register 0x{address:02x} is already defined with a different descriptor")
    )]
    DuplicateRegister { address: RegisterAddress },

    /// An extension table reuses a register name at a different address.
    #[cfg_attr(
        any(test, feature = "std"),
        error("Register at 0x{address:02x} reuses the name of register 0x{existing:02x}")
    )]
    DuplicateName {
        address: RegisterAddress,
        existing: RegisterAddress,
    },

    /// A descriptor violates a table invariant, e.g., a writable extended
    /// register.
    #[cfg_attr(
        any(test, feature = "std"),
        error("Invalid descriptor for register 0x{0:02x}")
    )]
    InvalidDescriptor(RegisterAddress),

    /// A value does not fit the 16-bit signed or unsigned register field.
    #[cfg_attr(
        any(test, feature = "std"),
        error("Value {value} is out of range for register 0x{register:02x}")
    )]
    ValueOutOfRange {
        register: RegisterAddress,
        value: i32,
    },

    /// An attempt to write a read-only register.
    #[cfg_attr(
        any(test, feature = "std"),
        error("Register 0x{0:02x} is not writable")
    )]
    RegisterNotWritable(RegisterAddress),

    /// The NOP error field holds a value the protocol does not define.
    #[cfg_attr(
        any(test, feature = "std"),
        error("Unknown NOP error code 0x{0:x}")
    )]
    UnknownNopCode(u8),
}
