// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! A host-side control interface for OIF-ITLA-MSA tunable lasers.
//!
//! The [`Controller`] drives a single laser module over a byte-oriented
//! [`Transport`], usually a serial port wrapped in a [`SerialLink`]. Every
//! operation is ultimately a sequence of 4-byte register commands; the
//! controller hides the protocol's pending operations and extended-address
//! reads behind plain `async` methods.

mod config;
mod controller;
mod executor;
mod profile;
mod pure_photonics;
mod transport;

#[cfg(test)]
mod test_utils;

pub use config::*;
pub use controller::Controller;
pub use itla_decode as decode;
pub use itla_messages as messages;
pub use itla_messages::NopErrorKind;
pub use itla_messages::ProtocolVersion;
pub use itla_messages::RegisterAddress;
pub use profile::DeviceProfile;
pub use profile::Vendor;
pub use transport::SerialLink;
pub use transport::Transport;

/// The largest extended read we accept before assuming the module is
/// misbehaving.
pub const MAX_EXTENDED_READ_SIZE: usize = 65536;

#[usdt::provider(provider = "itla_controller")]
mod probes {
    fn frame__sent(register: u8, data: *const u8) {}
    fn frame__received(register: u8, data: *const u8) {}
    fn bad__frame(register: u8, data: *const u8, reason: &str) {}
    fn pending__poll(register: u8, attempt: u64) {}
}

/// An error communicating with a laser module.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on the laser link")]
    Io(#[from] std::io::Error),

    #[error("Timed out waiting for the response to a command for register 0x{register:02x}")]
    Timeout { register: RegisterAddress },

    #[error("Protocol error")]
    Protocol(#[from] itla_messages::Error),

    #[error("Command for register 0x{register:02x} failed: {kind}")]
    Device {
        register: RegisterAddress,
        kind: NopErrorKind,
    },

    #[error("Command for register 0x{register:02x} still pending after {attempts} polls")]
    PendingTimeout {
        register: RegisterAddress,
        attempts: usize,
    },

    #[error("Module responses for register 0x{register:02x} are inconsistent: {reason}")]
    ProtocolInconsistency {
        register: RegisterAddress,
        reason: &'static str,
    },

    #[error("Unknown register: {0}")]
    UnknownRegister(String),

    #[error("Failed to decode register data")]
    Decode(#[from] itla_decode::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "Frequency {frequency} is outside the tuning range of the module, {} to {}",
        .range.min,
        .range.max
    )]
    FrequencyOutOfRange {
        frequency: itla_decode::Frequency,
        range: itla_decode::FrequencyRange,
    },

    #[error("Operation requires a low-noise mode, but the module is in normal mode")]
    RequiresLowNoiseMode,
}

impl Error {
    /// Return the NOP error kind, if this is a device-reported failure.
    pub fn device_kind(&self) -> Option<NopErrorKind> {
        match self {
            Error::Device { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
