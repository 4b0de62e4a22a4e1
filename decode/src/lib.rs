// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Decode the values held in tunable laser registers.
//!
//! Register words carry fixed-point values: frequencies split across two or
//! three registers, powers in hundredths of a dBm, temperatures and currents
//! as scaled signed words, and identity strings read through extended
//! addressing. The types here describe which registers make up a value and
//! how to interpret the bytes read from them.

use itla_messages::ProtocolVersion;
use itla_messages::RegisterAddress;
use thiserror::Error;

mod dither;
mod frequency;
mod ident;
mod monitors;
mod power;
mod tuning;
pub mod utils;

pub use dither::*;
pub use frequency::*;
pub use ident::*;
pub use monitors::*;
pub use power::*;
pub use tuning::*;

/// An error related to decoding or encoding register values.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum Error {
    #[error("Register data parsing failed")]
    ParseFailed,

    #[error("Frequency {0} THz cannot be represented")]
    InvalidFrequency(f64),

    #[error("Channel {channel} does not fit a {bits}-bit channel register")]
    ChannelOutOfRange { channel: u32, bits: u8 },

    #[error("{quantity} value {value} is out of range")]
    OutOfRange { quantity: &'static str, value: f64 },

    #[error("Protocol message error")]
    Messages(#[from] itla_messages::Error),
}

/// How many registers a frequency is split across.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
#[cfg_attr(any(feature = "api-traits", test), serde(rename_all = "snake_case"))]
pub enum FrequencyFormat {
    /// THz and 0.1 GHz words, with a resolution of 100 MHz.
    TwoWord,
    /// THz, 0.1 GHz, and MHz words.
    ThreeWord,
}

impl FrequencyFormat {
    pub const fn n_words(&self) -> usize {
        match self {
            FrequencyFormat::TwoWord => 2,
            FrequencyFormat::ThreeWord => 3,
        }
    }
}

/// The width of the channel number.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
#[cfg_attr(any(feature = "api-traits", test), serde(rename_all = "snake_case"))]
pub enum ChannelWidth {
    /// The channel is held in the Channel register alone.
    Bits16,
    /// The channel is split between the Channel (low) and ChannelH (high)
    /// registers.
    Bits32,
}

impl ChannelWidth {
    pub const fn bits(&self) -> u8 {
        match self {
            ChannelWidth::Bits16 => 16,
            ChannelWidth::Bits32 => 32,
        }
    }
}

/// The layout choices that differ between protocol revisions and vendors.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct VariantPolicy {
    pub channel: ChannelWidth,
    /// The format used to write the first channel frequency and grid.
    pub tuning: FrequencyFormat,
    /// The format used to read frequencies and frequency thresholds back.
    pub readback: FrequencyFormat,
}

impl VariantPolicy {
    pub const MSA_12: Self = Self {
        channel: ChannelWidth::Bits16,
        tuning: FrequencyFormat::TwoWord,
        readback: FrequencyFormat::TwoWord,
    };

    pub const MSA_13: Self = Self {
        channel: ChannelWidth::Bits32,
        tuning: FrequencyFormat::ThreeWord,
        readback: FrequencyFormat::ThreeWord,
    };

    /// Pure Photonics lasers clear FCF2 when FCF3 is written, and do not
    /// reach channels beyond 16 bits, but report frequencies with MHz
    /// resolution.
    pub const PURE_PHOTONICS: Self = Self {
        channel: ChannelWidth::Bits16,
        tuning: FrequencyFormat::TwoWord,
        readback: FrequencyFormat::ThreeWord,
    };

    /// The standard policy for a protocol revision.
    pub const fn for_version(version: ProtocolVersion) -> Self {
        match version {
            ProtocolVersion::Msa12 => Self::MSA_12,
            ProtocolVersion::Msa13 => Self::MSA_13,
        }
    }
}

/// A trait for parsing a value out of a set of register reads.
pub trait ParseFromRegisters: Sized {
    /// The registers to read, in order.
    fn reads(policy: VariantPolicy) -> Vec<RegisterAddress>;

    /// Parse the data read from each register in [`Self::reads`] into
    /// `Self`.
    fn parse<'a>(
        policy: VariantPolicy,
        reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error>;
}
