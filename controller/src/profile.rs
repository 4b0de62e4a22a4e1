// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Description of the kind of module a controller talks to.

use crate::Error;
use itla_decode::VariantPolicy;
use itla_messages::register::pure_photonics;
use itla_messages::ProtocolVersion;
use itla_messages::RegisterAddress;
use itla_messages::RegisterDescriptor;
use itla_messages::RegisterTable;
use std::sync::Arc;

/// A laser vendor with behavior beyond the MSA.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
#[cfg_attr(feature = "api-traits", derive(schemars::JsonSchema))]
pub enum Vendor {
    /// A module implementing only the MSA.
    #[default]
    Generic,
    /// A Pure Photonics PPCL-series laser.
    PurePhotonics,
}

impl Vendor {
    /// The registers this vendor adds to the MSA tables.
    pub fn registers(&self) -> &'static [RegisterDescriptor] {
        match self {
            Vendor::Generic => &[],
            Vendor::PurePhotonics => pure_photonics::REGISTERS,
        }
    }

    /// How modules from this vendor encode channels and frequencies.
    ///
    /// Pure Photonics lasers read back three-word frequencies when the MSA-1.3
    /// registers are present, but misbehave when FCF3 or ChannelH is written.
    pub const fn policy(&self, version: ProtocolVersion) -> VariantPolicy {
        match (self, version) {
            (Vendor::PurePhotonics, ProtocolVersion::Msa13) => VariantPolicy::PURE_PHOTONICS,
            (_, version) => VariantPolicy::for_version(version),
        }
    }
}

/// Everything the controller needs to know about a module: the protocol
/// revision, the registers it implements, and its encoding quirks.
///
/// The register table is immutable once built and shared between clones.
#[derive(Clone, Debug)]
pub struct DeviceProfile {
    version: ProtocolVersion,
    vendor: Vendor,
    table: Arc<RegisterTable>,
    policy: VariantPolicy,
}

impl DeviceProfile {
    /// Build the profile of a module from a vendor.
    pub fn new(version: ProtocolVersion, vendor: Vendor) -> Result<Self, Error> {
        Self::with_registers(version, vendor, &[])
    }

    /// Build a profile with additional registers, beyond those of the
    /// protocol revision and vendor.
    pub fn with_registers(
        version: ProtocolVersion,
        vendor: Vendor,
        registers: &[RegisterDescriptor],
    ) -> Result<Self, Error> {
        let table = RegisterTable::build(version, [vendor.registers(), registers])?;
        Ok(Self {
            version,
            vendor,
            table: Arc::new(table),
            policy: vendor.policy(version),
        })
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn policy(&self) -> VariantPolicy {
        self.policy
    }

    pub fn table(&self) -> &RegisterTable {
        &self.table
    }

    /// Look up a register by address.
    pub fn register(&self, address: RegisterAddress) -> Result<&RegisterDescriptor, Error> {
        self.table
            .get(address)
            .ok_or_else(|| Error::UnknownRegister(format!("0x{address:02x}")))
    }

    /// Look up a register by name, ignoring case.
    pub fn register_by_name(&self, name: &str) -> Result<&RegisterDescriptor, Error> {
        self.table
            .by_name(name)
            .ok_or_else(|| Error::UnknownRegister(name.to_string()))
    }
}
