// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Vendor registers of Pure Photonics lasers.
//!
//! These modules implement OIF-ITLA-MSA-01.2 plus a set of vendor registers
//! controlling the low-noise modes, the "clean sweep" frequency ramp, and the
//! "clean jump" precalibrated frequency hop.

use super::RegisterDescriptor as R;

pub mod address {
    use crate::RegisterAddress;

    /// Clean-jump calibration: write the number of points, then poll.
    pub const CJ_CALIBRATION: RegisterAddress = 0xd2;
    /// Low-noise mode, see [`super::Mode`].
    pub const MODE: RegisterAddress = 0x90;
    /// Clean-sweep range, in GHz.
    pub const CS_RANGE: RegisterAddress = 0xe4;
    pub const CS_START: RegisterAddress = 0xe5;
    pub const CS_OFFSET: RegisterAddress = 0xe6;
    pub const CJ_THZ: RegisterAddress = 0xea;
    pub const CJ_GHZ: RegisterAddress = 0xeb;
    pub const CJ_START: RegisterAddress = 0xed;
    /// Clean-sweep rate, in MHz/s.
    pub const CS_RATE: RegisterAddress = 0xf1;
}

use address::*;

/// The vendor extension table.
pub static REGISTERS: &[R] = &[
    R::read_write(MODE, "Mode"),
    R::read_write(CJ_CALIBRATION, "CJCalibration"),
    R::read_write(CS_RANGE, "CSRange"),
    R::read_write(CS_START, "CSStart"),
    R::read_write(CS_OFFSET, "CSOffset"),
    R::read_write(CJ_THZ, "CJThz"),
    R::read_write(CJ_GHZ, "CJGhz"),
    R::read_write(CJ_START, "CJStart"),
    R::read_write(CS_RATE, "CSRate"),
];

/// The low-noise operating modes selected through the Mode register.
#[derive(Clone, Copy, Debug, serde::Deserialize, Eq, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "std", derive(clap::ValueEnum))]
#[cfg_attr(any(feature = "api-traits", test), derive(schemars::JsonSchema))]
pub enum Mode {
    /// Standard dithered operation.
    Normal,
    /// Dither disabled. Some firmware treats this as `Whisper`.
    NoDither,
    /// All control loops disabled.
    Whisper,
}

impl Mode {
    pub const fn from_word(word: u16) -> Option<Self> {
        match word {
            0 => Some(Mode::Normal),
            1 => Some(Mode::NoDither),
            2 => Some(Mode::Whisper),
            _ => None,
        }
    }

    pub const fn word(&self) -> u16 {
        match self {
            Mode::Normal => 0,
            Mode::NoDither => 1,
            Mode::Whisper => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Mode;
    use super::REGISTERS;
    use crate::register::msa;

    #[test]
    fn test_no_overlap_with_standard_registers() {
        for descriptor in REGISTERS {
            assert!(msa::MSA_12
                .iter()
                .chain(msa::MSA_13)
                .all(|d| d.address != descriptor.address && d.name != descriptor.name));
        }
    }

    #[test]
    fn test_mode_words() {
        for mode in [Mode::Normal, Mode::NoDither, Mode::Whisper] {
            assert_eq!(Mode::from_word(mode.word()), Some(mode));
        }
        assert_eq!(Mode::from_word(3), None);
    }
}
