// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Operations on the vendor registers of Pure Photonics lasers.
//!
//! The clean sweep and clean jump features need one of the low-noise modes.
//! These fail with [`Error::UnknownRegister`] on a controller whose profile
//! lacks the vendor registers.

use crate::Controller;
use crate::Error;
use crate::Transport;
use itla_decode::Frequency;
use itla_decode::FrequencyFormat;
use itla_messages::register::pure_photonics::address;
use itla_messages::register::pure_photonics::Mode;
use slog::debug;

impl<T: Transport> Controller<T> {
    /// Return the low-noise mode of the laser.
    pub async fn mode(&self) -> Result<Mode, Error> {
        let word = self.read_word(address::MODE).await?;
        Mode::from_word(word).ok_or(Error::Decode(itla_decode::Error::ParseFailed))
    }

    pub async fn set_mode(&self, mode: Mode) -> Result<(), Error> {
        debug!(self.log, "setting laser mode"; "mode" => ?mode);
        self.write_word(address::MODE, mode.word()).await
    }

    async fn require_low_noise_mode(&self) -> Result<(), Error> {
        match self.mode().await? {
            Mode::Normal => Err(Error::RequiresLowNoiseMode),
            _ => Ok(()),
        }
    }

    /// Start a clean sweep, ramping the frequency around its current value
    /// by half the sweep amplitude either way.
    pub async fn clean_sweep_enable(&self) -> Result<(), Error> {
        self.require_low_noise_mode().await?;
        self.write_word(address::CS_START, 1).await
    }

    pub async fn clean_sweep_disable(&self) -> Result<(), Error> {
        self.write_word(address::CS_START, 0).await
    }

    /// Return the peak-to-peak clean sweep amplitude, in GHz.
    pub async fn clean_sweep_amplitude(&self) -> Result<u16, Error> {
        self.read_word(address::CS_RANGE).await
    }

    pub async fn set_clean_sweep_amplitude(&self, ghz: u16) -> Result<(), Error> {
        self.write_word(address::CS_RANGE, ghz).await
    }

    /// Return the clean sweep rate, in MHz/s.
    pub async fn clean_sweep_rate(&self) -> Result<u16, Error> {
        self.read_word(address::CS_RATE).await
    }

    pub async fn set_clean_sweep_rate(&self, rate: u16) -> Result<(), Error> {
        self.write_word(address::CS_RATE, rate).await
    }

    /// Set the target of the next clean jump.
    ///
    /// The module keeps 0.1 GHz resolution; any finer part is dropped.
    pub async fn set_clean_jump_target(&self, frequency: Frequency) -> Result<(), Error> {
        let words = frequency.to_words(FrequencyFormat::TwoWord)?;
        for (register, word) in [address::CJ_THZ, address::CJ_GHZ].into_iter().zip(words) {
            self.write_word(register, word).await?;
        }
        Ok(())
    }

    /// Jump to the clean jump target.
    ///
    /// The jump must already be calibrated on the module.
    pub async fn clean_jump(&self) -> Result<(), Error> {
        self.require_low_noise_mode().await?;
        self.write_word(address::CJ_START, 1).await
    }
}
