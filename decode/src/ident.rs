// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Decoding of laser identifying information.

use crate::utils::null_terminated;
use crate::Error;
use crate::ParseFromRegisters;
use crate::VariantPolicy;
use core::fmt;
use itla_messages::register::address;
use itla_messages::RegisterAddress;

/// The identity strings of a module.
///
/// Each is read through extended addressing from its own register, and is
/// null-terminated on the wire.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct Identity {
    /// DevTyp, e.g., "CW ITLA".
    pub device_type: String,
    /// MFGR.
    pub manufacturer: String,
    /// Model.
    pub model: String,
    /// SerNo.
    pub serial_number: String,
    /// MFGDate.
    pub manufacturing_date: String,
    /// Release, the firmware release.
    pub release: String,
    /// RelBack, the oldest release this one is backwards compatible with.
    pub release_backwards: String,
}

impl ParseFromRegisters for Identity {
    fn reads(_: VariantPolicy) -> Vec<RegisterAddress> {
        vec![
            address::DEVICE_TYPE,
            address::MANUFACTURER,
            address::MODEL,
            address::SERIAL_NUMBER,
            address::MANUFACTURING_DATE,
            address::RELEASE,
            address::RELEASE_BACKWARDS,
        ]
    }

    fn parse<'a>(
        _: VariantPolicy,
        mut reads: impl Iterator<Item = &'a [u8]>,
    ) -> Result<Self, Error> {
        let mut next = || reads.next().map(null_terminated).ok_or(Error::ParseFailed);
        Ok(Self {
            device_type: next()?,
            manufacturer: next()?,
            model: next()?,
            serial_number: next()?,
            manufacturing_date: next()?,
            release: next()?,
            release_backwards: next()?,
        })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Device type:        {}", self.device_type)?;
        writeln!(f, "Manufacturer:       {}", self.manufacturer)?;
        writeln!(f, "Model:              {}", self.model)?;
        writeln!(f, "Serial number:      {}", self.serial_number)?;
        writeln!(f, "Manufacturing date: {}", self.manufacturing_date)?;
        writeln!(f, "Release:            {}", self.release)?;
        write!(f, "Compatible with:    {}", self.release_backwards)
    }
}
