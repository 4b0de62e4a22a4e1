// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Decoding of optical output power.

use crate::utils::decode_word_with_scale;
use crate::utils::encode_with_scale;
use crate::Error;
use crate::ParseFromRegisters;
use crate::VariantPolicy;
use itla_messages::register::address;
use itla_messages::RegisterAddress;

/// The resolution of power registers, in dBm.
pub const POWER_RESOLUTION: f32 = 0.01;

/// Encode a power in dBm as the signed word written to PWR.
pub fn encode_power(dbm: f64) -> Result<i16, Error> {
    encode_with_scale("power", dbm, f64::from(POWER_RESOLUTION))
}

/// The output power setting and its measured value.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct Power {
    /// The power set point, from PWR (dBm).
    pub setting: f32,

    /// The measured optical output power, from OOP (dBm).
    ///
    /// This is an approximation.
    pub output: f32,
}

impl ParseFromRegisters for Power {
    fn reads(_: VariantPolicy) -> Vec<RegisterAddress> {
        vec![address::PWR, address::OOP]
    }

    fn parse<'a>(
        _: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        let setting = reads.next().ok_or(Error::ParseFailed)?;
        let output = reads.next().ok_or(Error::ParseFailed)?;
        Ok(Self {
            setting: decode_word_with_scale::<i16>(setting, POWER_RESOLUTION)?,
            output: decode_word_with_scale::<i16>(output, POWER_RESOLUTION)?,
        })
    }
}

/// The range of power set points the module supports, from OPSL and OPSH.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct PowerRange {
    pub min: f32,
    pub max: f32,
}

impl ParseFromRegisters for PowerRange {
    fn reads(_: VariantPolicy) -> Vec<RegisterAddress> {
        vec![address::OPSL, address::OPSH]
    }

    fn parse<'a>(
        _: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        let min = reads.next().ok_or(Error::ParseFailed)?;
        let max = reads.next().ok_or(Error::ParseFailed)?;
        Ok(Self {
            min: decode_word_with_scale::<i16>(min, POWER_RESOLUTION)?,
            max: decode_word_with_scale::<i16>(max, POWER_RESOLUTION)?,
        })
    }
}
