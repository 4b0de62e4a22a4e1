// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Decode channel, grid spacing, and fine tuning.

use crate::utils::signed;
use crate::utils::unsigned;
use crate::ChannelWidth;
use crate::Error;
use crate::FrequencyFormat;
use crate::ParseFromRegisters;
use crate::VariantPolicy;
use itla_messages::register::address;
use itla_messages::RegisterAddress;

/// The channel number, counted in grid steps from the first channel
/// frequency.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct Channel(pub u32);

impl Channel {
    /// Return the words written to Channel and, for 32-bit channels,
    /// ChannelH.
    pub fn to_words(&self, width: ChannelWidth) -> Result<(u16, Option<u16>), Error> {
        let low = (self.0 & 0xffff) as u16;
        let high = (self.0 >> 16) as u16;
        match width {
            ChannelWidth::Bits16 if high != 0 => Err(Error::ChannelOutOfRange {
                channel: self.0,
                bits: width.bits(),
            }),
            ChannelWidth::Bits16 => Ok((low, None)),
            ChannelWidth::Bits32 => Ok((low, Some(high))),
        }
    }
}

impl ParseFromRegisters for Channel {
    fn reads(policy: VariantPolicy) -> Vec<RegisterAddress> {
        match policy.channel {
            ChannelWidth::Bits16 => vec![address::CHANNEL],
            ChannelWidth::Bits32 => vec![address::CHANNEL, address::CHANNEL_H],
        }
    }

    fn parse<'a>(
        policy: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        let low = unsigned(reads.next().ok_or(Error::ParseFailed)?)?;
        let high = match policy.channel {
            ChannelWidth::Bits16 => 0,
            ChannelWidth::Bits32 => unsigned(reads.next().ok_or(Error::ParseFailed)?)?,
        };
        Ok(Self((u32::from(high) << 16) | u32::from(low)))
    }
}

const MHZ_PER_GHZ: f64 = 1000.0;
const MHZ_PER_TENTH_GHZ: i32 = 100;

/// A grid spacing, in MHz.
///
/// Grid holds units of 0.1 GHz, and Grid2 (MSA-01.3) the remaining MHz.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct Grid {
    pub mhz: i32,
}

impl Grid {
    pub fn from_ghz(ghz: f64) -> Result<Self, Error> {
        let mhz = (ghz * MHZ_PER_GHZ).round();
        let limit = f64::from(i16::MAX) * f64::from(MHZ_PER_TENTH_GHZ);
        if !mhz.is_finite() || mhz.abs() > limit {
            return Err(Error::OutOfRange {
                quantity: "grid",
                value: ghz,
            });
        }
        Ok(Self { mhz: mhz as i32 })
    }

    pub fn ghz(&self) -> f64 {
        f64::from(self.mhz) / MHZ_PER_GHZ
    }

    /// Return the words written to Grid and, for the three-word format,
    /// Grid2. The two-word format truncates to 0.1 GHz.
    pub fn to_words(&self, format: FrequencyFormat) -> Result<(i16, Option<i16>), Error> {
        let out_of_range = |_| Error::OutOfRange {
            quantity: "grid",
            value: self.ghz(),
        };
        let tenths = i16::try_from(self.mhz / MHZ_PER_TENTH_GHZ).map_err(out_of_range)?;
        // The remainder is within (-100, 100).
        let rest = (self.mhz % MHZ_PER_TENTH_GHZ) as i16;
        match format {
            FrequencyFormat::TwoWord => Ok((tenths, None)),
            FrequencyFormat::ThreeWord => Ok((tenths, Some(rest))),
        }
    }

    fn parse_words<'a>(
        format: FrequencyFormat,
        reads: &mut impl Iterator<Item = &'a [u8]>,
        decode: impl Fn(&[u8]) -> Result<i32, Error>,
    ) -> Result<Self, Error> {
        let tenths = decode(reads.next().ok_or(Error::ParseFailed)?)?;
        let rest = match format {
            FrequencyFormat::TwoWord => 0,
            FrequencyFormat::ThreeWord => decode(reads.next().ok_or(Error::ParseFailed)?)?,
        };
        Ok(Self {
            mhz: tenths * MHZ_PER_TENTH_GHZ + rest,
        })
    }
}

impl ParseFromRegisters for Grid {
    fn reads(policy: VariantPolicy) -> Vec<RegisterAddress> {
        match policy.tuning {
            FrequencyFormat::TwoWord => vec![address::GRID],
            FrequencyFormat::ThreeWord => vec![address::GRID, address::GRID2],
        }
    }

    fn parse<'a>(
        policy: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        Grid::parse_words(policy.tuning, &mut reads, |buf| {
            signed(buf).map(i32::from)
        })
    }
}

/// The smallest grid spacing the module supports, from LGrid and LGrid2.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct MinimumGrid(pub Grid);

impl ParseFromRegisters for MinimumGrid {
    fn reads(policy: VariantPolicy) -> Vec<RegisterAddress> {
        match policy.tuning {
            FrequencyFormat::TwoWord => vec![address::LGRID],
            FrequencyFormat::ThreeWord => vec![address::LGRID, address::LGRID2],
        }
    }

    fn parse<'a>(
        policy: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        Grid::parse_words(policy.tuning, &mut reads, |buf| {
            unsigned(buf).map(i32::from)
        })
        .map(Self)
    }
}

/// The off-grid fine tuning offset, in MHz, from FTF.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct FineTuning {
    pub mhz: i16,
}

impl FineTuning {
    pub fn from_ghz(ghz: f64) -> Result<Self, Error> {
        crate::utils::encode_with_scale("fine tuning", ghz, 1.0 / MHZ_PER_GHZ)
            .map(|mhz| Self { mhz })
    }

    pub fn ghz(&self) -> f64 {
        f64::from(self.mhz) / MHZ_PER_GHZ
    }

    pub const fn is_zero(&self) -> bool {
        self.mhz == 0
    }
}

impl ParseFromRegisters for FineTuning {
    fn reads(_: VariantPolicy) -> Vec<RegisterAddress> {
        vec![address::FTF]
    }

    fn parse<'a>(
        _: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        let mhz = signed(reads.next().ok_or(Error::ParseFailed)?)?;
        Ok(Self { mhz })
    }
}

/// The fine tuning range, `[-range, +range]`, in MHz, from FTFR.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct FineTuningRange {
    pub mhz: u16,
}

impl FineTuningRange {
    pub fn ghz(&self) -> f64 {
        f64::from(self.mhz) / MHZ_PER_GHZ
    }
}

impl ParseFromRegisters for FineTuningRange {
    fn reads(_: VariantPolicy) -> Vec<RegisterAddress> {
        vec![address::FTFR]
    }

    fn parse<'a>(
        _: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        let mhz = unsigned(reads.next().ok_or(Error::ParseFailed)?)?;
        Ok(Self { mhz })
    }
}

#[cfg(test)]
mod tests {
    use super::Channel;
    use super::FineTuning;
    use super::Grid;
    use super::MinimumGrid;
    use crate::ChannelWidth;
    use crate::Error;
    use crate::FrequencyFormat;
    use crate::ParseFromRegisters;
    use crate::VariantPolicy;
    use itla_messages::register::address;

    #[test]
    fn test_channel_words() {
        assert_eq!(
            Channel(1).to_words(ChannelWidth::Bits16).unwrap(),
            (1, None)
        );
        assert_eq!(
            Channel(0x0001_0002).to_words(ChannelWidth::Bits32).unwrap(),
            (2, Some(1))
        );
        assert_eq!(
            Channel(0x0001_0000).to_words(ChannelWidth::Bits16).unwrap_err(),
            Error::ChannelOutOfRange {
                channel: 0x0001_0000,
                bits: 16
            }
        );
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!(
            Channel::reads(VariantPolicy::MSA_13),
            vec![address::CHANNEL, address::CHANNEL_H]
        );
        let reads = [[0x00, 0x02], [0x00, 0x01]];
        let channel =
            Channel::parse(VariantPolicy::MSA_13, reads.iter().map(|r| &r[..])).unwrap();
        assert_eq!(channel, Channel(0x0001_0002));
        let channel =
            Channel::parse(VariantPolicy::MSA_12, reads.iter().map(|r| &r[..])).unwrap();
        assert_eq!(channel, Channel(2));
    }

    #[test]
    fn test_grid_words() {
        let grid = Grid::from_ghz(50.025).unwrap();
        assert_eq!(grid.mhz, 50_025);
        assert_eq!(
            grid.to_words(FrequencyFormat::ThreeWord).unwrap(),
            (500, Some(25))
        );
        assert_eq!(grid.to_words(FrequencyFormat::TwoWord).unwrap(), (500, None));

        let grid = Grid::from_ghz(-0.15).unwrap();
        assert_eq!(
            grid.to_words(FrequencyFormat::ThreeWord).unwrap(),
            (-1, Some(-50))
        );
        assert!(Grid::from_ghz(1.0e7).is_err());
    }

    #[test]
    fn test_parse_grid() {
        let reads = [500i16.to_be_bytes(), 25i16.to_be_bytes()];
        let grid = Grid::parse(VariantPolicy::MSA_13, reads.iter().map(|r| &r[..])).unwrap();
        assert!((grid.ghz() - 50.025).abs() < 1e-9);

        let reads = [(-1i16).to_be_bytes(), (-50i16).to_be_bytes()];
        let grid = Grid::parse(VariantPolicy::MSA_13, reads.iter().map(|r| &r[..])).unwrap();
        assert_eq!(grid.mhz, -150);

        let reads = [[0x00, 0x7d]];
        let grid =
            MinimumGrid::parse(VariantPolicy::PURE_PHOTONICS, reads.iter().map(|r| &r[..]))
                .unwrap();
        assert_eq!(grid.0.mhz, 12_500);
    }

    #[test]
    fn test_fine_tuning() {
        let ftf = FineTuning::from_ghz(-1.5).unwrap();
        assert_eq!(ftf.mhz, -1500);
        assert!((ftf.ghz() + 1.5).abs() < 1e-9);
        assert!(FineTuning::from_ghz(0.0).unwrap().is_zero());
        assert!(FineTuning::from_ghz(100.0).is_err());
    }
}
