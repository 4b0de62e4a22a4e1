// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Decode the digital dither configuration, DitherE through DitherA.

use crate::utils::extract_bit;
use crate::utils::unsigned;
use crate::Error;
use crate::ParseFromRegisters;
use crate::VariantPolicy;
use itla_messages::register::address;
use itla_messages::RegisterAddress;

/// The dither enable bit of DitherE.
const DITHER_ENABLE_BIT: u8 = 1;

/// The shift of the waveform field of DitherE.
const WAVEFORM_SHIFT: u16 = 4;

/// The dither modulation waveform.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
#[cfg_attr(any(feature = "api-traits", test), serde(rename_all = "snake_case"))]
#[cfg_attr(test, derive(strum::EnumIter))]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
}

impl Waveform {
    /// The DitherE word enabling dither with this waveform.
    pub const fn enable_word(&self) -> u16 {
        let waveform = match self {
            Waveform::Sine => 0,
            Waveform::Triangle => 1,
        };
        (waveform << WAVEFORM_SHIFT) | (1 << DITHER_ENABLE_BIT)
    }
}

/// The dither configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct Dither {
    pub enabled: bool,
    pub waveform: Waveform,
    /// The dither rate, from DitherR (kHz).
    pub rate: u16,
    /// The peak-to-peak FM deviation, from DitherF (units of 0.1 GHz).
    pub frequency: u16,
    /// The peak-to-peak AM deviation, from DitherA (units of 0.1% of optical
    /// power).
    pub amplitude: u16,
}

impl ParseFromRegisters for Dither {
    fn reads(_: VariantPolicy) -> Vec<RegisterAddress> {
        vec![
            address::DITHER_E,
            address::DITHER_R,
            address::DITHER_F,
            address::DITHER_A,
        ]
    }

    fn parse<'a>(
        _: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        let mut next = || reads.next().ok_or(Error::ParseFailed).and_then(unsigned);
        let enable = next()?;
        let waveform = match (enable >> WAVEFORM_SHIFT) & 0b11 {
            0 => Waveform::Sine,
            1 => Waveform::Triangle,
            _ => return Err(Error::ParseFailed),
        };
        Ok(Self {
            enabled: extract_bit(enable, DITHER_ENABLE_BIT)?,
            waveform,
            rate: next()?,
            frequency: next()?,
            amplitude: next()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Dither;
    use super::Waveform;
    use crate::ParseFromRegisters;
    use crate::VariantPolicy;
    use strum::IntoEnumIterator;

    #[test]
    fn test_enable_word() {
        assert_eq!(Waveform::Sine.enable_word(), 0x0002);
        assert_eq!(Waveform::Triangle.enable_word(), 0x0012);
    }

    #[test]
    fn test_parse_dither() {
        for waveform in Waveform::iter() {
            let words = [waveform.enable_word(), 10, 5, 20];
            let reads = words.map(u16::to_be_bytes);
            let dither =
                Dither::parse(VariantPolicy::MSA_13, reads.iter().map(|r| &r[..])).unwrap();
            assert!(dither.enabled);
            assert_eq!(dither.waveform, waveform);
            assert_eq!(dither.rate, 10);
            assert_eq!(dither.frequency, 5);
            assert_eq!(dither.amplitude, 20);
        }

        let reads = [0u16, 0, 0, 0].map(u16::to_be_bytes);
        let dither = Dither::parse(VariantPolicy::MSA_12, reads.iter().map(|r| &r[..])).unwrap();
        assert!(!dither.enabled);
    }
}
