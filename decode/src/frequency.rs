// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Decode optical frequencies.
//!
//! A frequency is split across up to three registers: whole THz, tenths of
//! GHz (units of 100 MHz), and, on MSA-01.3 modules, MHz. The value is
//! `w1 + w2 * 1e-4 + w3 * 1e-6` THz.

use crate::utils::unsigned;
use crate::Error;
use crate::FrequencyFormat;
use crate::ParseFromRegisters;
use crate::VariantPolicy;
use core::fmt;
use itla_messages::register::address;
use itla_messages::RegisterAddress;

const MHZ_PER_THZ: u64 = 1_000_000;
const MHZ_PER_TENTH_GHZ: u64 = 100;

/// An optical frequency, held in MHz.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct Frequency {
    mhz: u64,
}

impl Frequency {
    pub const fn from_mhz(mhz: u64) -> Self {
        Self { mhz }
    }

    /// Construct a frequency from a value in THz, rounded to the nearest MHz.
    pub fn from_thz(thz: f64) -> Result<Self, Error> {
        let mhz = (thz * MHZ_PER_THZ as f64).round();
        let max = (u64::from(u16::MAX) + 1) * MHZ_PER_THZ;
        if !mhz.is_finite() || mhz < 0.0 || mhz >= max as f64 {
            return Err(Error::InvalidFrequency(thz));
        }
        Ok(Self { mhz: mhz as u64 })
    }

    pub const fn mhz(&self) -> u64 {
        self.mhz
    }

    pub fn thz(&self) -> f64 {
        self.mhz as f64 / MHZ_PER_THZ as f64
    }

    /// Split the frequency into register words.
    ///
    /// The two-word format drops the MHz remainder, rounding down.
    pub fn to_words(&self, format: FrequencyFormat) -> Result<Vec<u16>, Error> {
        let thz = u16::try_from(self.mhz / MHZ_PER_THZ)
            .map_err(|_| Error::InvalidFrequency(self.thz()))?;
        // Both are bounded by the modulus, and fit.
        let tenth_ghz = ((self.mhz % MHZ_PER_THZ) / MHZ_PER_TENTH_GHZ) as u16;
        let mhz = (self.mhz % MHZ_PER_TENTH_GHZ) as u16;
        let mut words = vec![thz, tenth_ghz];
        if format == FrequencyFormat::ThreeWord {
            words.push(mhz);
        }
        Ok(words)
    }

    /// Assemble a frequency from two or three register words.
    pub fn from_words(words: &[u16]) -> Result<Self, Error> {
        let (thz, tenth_ghz, mhz) = match words {
            [thz, tenth_ghz] => (*thz, *tenth_ghz, 0),
            [thz, tenth_ghz, mhz] => (*thz, *tenth_ghz, *mhz),
            _ => return Err(Error::ParseFailed),
        };
        Ok(Self {
            mhz: u64::from(thz) * MHZ_PER_THZ
                + u64::from(tenth_ghz) * MHZ_PER_TENTH_GHZ
                + u64::from(mhz),
        })
    }

    /// Parse a frequency from the reads of its component registers.
    fn parse_words<'a>(
        format: FrequencyFormat,
        reads: &mut impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        let words = reads
            .take(format.n_words())
            .map(unsigned)
            .collect::<Result<Vec<_>, _>>()?;
        if words.len() != format.n_words() {
            return Err(Error::ParseFailed);
        }
        Self::from_words(&words)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.6} THz", self.thz())
    }
}

fn registers(format: FrequencyFormat, words: [RegisterAddress; 3]) -> Vec<RegisterAddress> {
    words[..format.n_words()].to_vec()
}

/// The current operating frequency of the laser, from LF1-LF3.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct LaserFrequency(pub Frequency);

impl ParseFromRegisters for LaserFrequency {
    fn reads(policy: VariantPolicy) -> Vec<RegisterAddress> {
        registers(policy.readback, [address::LF1, address::LF2, address::LF3])
    }

    fn parse<'a>(
        policy: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        Frequency::parse_words(policy.readback, &mut reads).map(Self)
    }
}

/// The first channel frequency, from FCF1-FCF3.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct FirstChannelFrequency(pub Frequency);

impl FirstChannelFrequency {
    /// The registers written to set the first channel frequency.
    pub fn write_registers(policy: VariantPolicy) -> Vec<RegisterAddress> {
        registers(policy.tuning, [address::FCF1, address::FCF2, address::FCF3])
    }
}

impl ParseFromRegisters for FirstChannelFrequency {
    fn reads(policy: VariantPolicy) -> Vec<RegisterAddress> {
        registers(
            policy.readback,
            [address::FCF1, address::FCF2, address::FCF3],
        )
    }

    fn parse<'a>(
        policy: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        Frequency::parse_words(policy.readback, &mut reads).map(Self)
    }
}

/// The tuning range of the laser, from LFL1-LFL3 and LFH1-LFH3.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct FrequencyRange {
    pub min: Frequency,
    pub max: Frequency,
}

impl FrequencyRange {
    pub fn contains(&self, frequency: Frequency) -> bool {
        (self.min..=self.max).contains(&frequency)
    }
}

impl ParseFromRegisters for FrequencyRange {
    fn reads(policy: VariantPolicy) -> Vec<RegisterAddress> {
        let mut reads = registers(
            policy.readback,
            [address::LFL1, address::LFL2, address::LFL3],
        );
        reads.extend(registers(
            policy.readback,
            [address::LFH1, address::LFH2, address::LFH3],
        ));
        reads
    }

    fn parse<'a>(
        policy: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        let min = Frequency::parse_words(policy.readback, &mut reads)?;
        let max = Frequency::parse_words(policy.readback, &mut reads)?;
        Ok(Self { min, max })
    }
}
