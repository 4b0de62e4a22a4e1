// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Decode laser health and monitoring data.

use crate::utils::decode_word_with_scale;
use crate::utils::decode_words_with_scale;
use crate::utils::unsigned;
use crate::Error;
use crate::FrequencyFormat;
use crate::ParseFromRegisters;
use crate::VariantPolicy;
use itla_messages::register::address;
use itla_messages::RegisterAddress;

/// The resolution of temperature values, in degrees C.
pub const TEMP_RESOLUTION: f32 = 0.01;

/// The resolution of current values, in mA.
pub const CURRENT_RESOLUTION: f32 = 0.1;

/// The resolution of the power thresholds, in dB.
pub const POWER_THRESHOLD_RESOLUTION: f32 = 0.01;

/// The resolution of FFreqTh / WFreqTh, in GHz.
pub const FREQ_THRESHOLD_RESOLUTION: f32 = 0.1;

/// The resolution of FFreqTh2 / WFreqTh2, in GHz.
pub const FREQ_THRESHOLD2_RESOLUTION: f32 = 0.01;

/// Module-level monitored values.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct Monitors {
    /// The primary control temperature, from CTemp (degrees C).
    pub temperature: f32,

    /// The measured optical output power, from OOP (dBm).
    pub output_power: f32,

    /// Laser aging, from Age (percent of end of life).
    pub age: u16,
}

impl ParseFromRegisters for Monitors {
    fn reads(_: VariantPolicy) -> Vec<RegisterAddress> {
        vec![address::CTEMP, address::OOP, address::AGE]
    }

    fn parse<'a>(
        _: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        let mut next = || reads.next().ok_or(Error::ParseFailed);
        Ok(Self {
            temperature: decode_word_with_scale::<i16>(next()?, TEMP_RESOLUTION)?,
            output_power: decode_word_with_scale::<i16>(next()?, crate::POWER_RESOLUTION)?,
            age: unsigned(next()?)?,
        })
    }
}

/// Technology-specific temperatures, from the extended Temps register.
///
/// The meaning of each entry depends on the laser technology. For the common
/// case it is `[diode, case]`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct Temperatures(pub Vec<f32>);

impl ParseFromRegisters for Temperatures {
    fn reads(_: VariantPolicy) -> Vec<RegisterAddress> {
        vec![address::TEMPS]
    }

    fn parse<'a>(
        _: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        let buf = reads.next().ok_or(Error::ParseFailed)?;
        decode_words_with_scale::<i16>(buf, TEMP_RESOLUTION).map(Self)
    }
}

/// Technology-specific currents, from the extended Currents register (mA).
///
/// For the common case this is `[TEC, diode]`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct Currents(pub Vec<f32>);

impl ParseFromRegisters for Currents {
    fn reads(_: VariantPolicy) -> Vec<RegisterAddress> {
        vec![address::CURRENTS]
    }

    fn parse<'a>(
        _: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        let buf = reads.next().ok_or(Error::ParseFailed)?;
        decode_words_with_scale::<i16>(buf, CURRENT_RESOLUTION).map(Self)
    }
}

/// The deviation thresholds beyond which fatal or warning conditions are
/// asserted.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct Thresholds {
    /// Fatal power deviation, from FPowTh (dB).
    pub fatal_power: f32,
    /// Warning power deviation, from WPowTh (dB).
    pub warning_power: f32,
    /// Fatal frequency deviation, from FFreqTh and FFreqTh2 (GHz).
    pub fatal_frequency: f32,
    /// Warning frequency deviation, from WFreqTh and WFreqTh2 (GHz).
    pub warning_frequency: f32,
    /// Fatal temperature deviation, from FThermTh (degrees C).
    pub fatal_thermal: f32,
    /// Warning temperature deviation, from WThermTh (degrees C).
    pub warning_thermal: f32,
}

impl ParseFromRegisters for Thresholds {
    fn reads(policy: VariantPolicy) -> Vec<RegisterAddress> {
        let mut reads = vec![
            address::F_POW_TH,
            address::W_POW_TH,
            address::F_FREQ_TH,
            address::W_FREQ_TH,
            address::F_THERM_TH,
            address::W_THERM_TH,
        ];
        if policy.readback == FrequencyFormat::ThreeWord {
            reads.extend([address::F_FREQ_TH2, address::W_FREQ_TH2]);
        }
        reads
    }

    fn parse<'a>(
        policy: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        let mut next = |scale| {
            reads
                .next()
                .ok_or(Error::ParseFailed)
                .and_then(|buf| decode_word_with_scale::<u16>(buf, scale))
        };
        let mut thresholds = Self {
            fatal_power: next(POWER_THRESHOLD_RESOLUTION)?,
            warning_power: next(POWER_THRESHOLD_RESOLUTION)?,
            fatal_frequency: next(FREQ_THRESHOLD_RESOLUTION)?,
            warning_frequency: next(FREQ_THRESHOLD_RESOLUTION)?,
            fatal_thermal: next(TEMP_RESOLUTION)?,
            warning_thermal: next(TEMP_RESOLUTION)?,
        };
        if policy.readback == FrequencyFormat::ThreeWord {
            thresholds.fatal_frequency += next(FREQ_THRESHOLD2_RESOLUTION)?;
            thresholds.warning_frequency += next(FREQ_THRESHOLD2_RESOLUTION)?;
        }
        Ok(thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::Currents;
    use super::Monitors;
    use super::Temperatures;
    use super::Thresholds;
    use crate::ParseFromRegisters;
    use crate::VariantPolicy;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_parse_monitors() {
        let reads = [3512i16.to_be_bytes(), (-150i16).to_be_bytes(), 3u16.to_be_bytes()];
        let monitors =
            Monitors::parse(VariantPolicy::MSA_12, reads.iter().map(|r| &r[..])).unwrap();
        assert!(close(monitors.temperature, 35.12));
        assert!(close(monitors.output_power, -1.5));
        assert_eq!(monitors.age, 3);
    }

    #[test]
    fn test_parse_extended_monitors() {
        let temps = [0x09, 0xc4, 0x0b, 0xb8];
        let temps = Temperatures::parse(VariantPolicy::MSA_13, std::iter::once(&temps[..]))
            .unwrap();
        assert_eq!(temps.0.len(), 2);
        assert!(close(temps.0[0], 25.0));
        assert!(close(temps.0[1], 30.0));

        let currents = [0x01, 0xf4, 0xff, 0xf6];
        let currents = Currents::parse(VariantPolicy::MSA_13, std::iter::once(&currents[..]))
            .unwrap();
        assert!(close(currents.0[0], 50.0));
        assert!(close(currents.0[1], -1.0));

        let odd = [0x01, 0xf4, 0xff];
        assert!(Currents::parse(VariantPolicy::MSA_13, std::iter::once(&odd[..])).is_err());
    }

    #[test]
    fn test_parse_thresholds() {
        let words: [u16; 8] = [300, 150, 50, 20, 500, 250, 5, 2];
        let reads = words.map(u16::to_be_bytes);

        assert_eq!(Thresholds::reads(VariantPolicy::MSA_12).len(), 6);
        let th = Thresholds::parse(VariantPolicy::MSA_12, reads.iter().map(|r| &r[..])).unwrap();
        assert!(close(th.fatal_power, 3.0));
        assert!(close(th.warning_power, 1.5));
        assert!(close(th.fatal_frequency, 5.0));
        assert!(close(th.warning_frequency, 2.0));
        assert!(close(th.fatal_thermal, 5.0));
        assert!(close(th.warning_thermal, 2.5));

        assert_eq!(Thresholds::reads(VariantPolicy::MSA_13).len(), 8);
        let th = Thresholds::parse(VariantPolicy::MSA_13, reads.iter().map(|r| &r[..])).unwrap();
        assert!(close(th.fatal_frequency, 5.05));
        assert!(close(th.warning_frequency, 2.02));
    }
}
