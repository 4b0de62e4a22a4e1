// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Register descriptors, tables, and the accessors built from them.
//!
//! Every register a laser exposes is described once by a
//! [`RegisterDescriptor`]. A [`RegisterTable`] collects the descriptors for a
//! protocol revision, optionally extended with vendor-specific registers, and
//! is immutable once built. Reads and writes of any register go through the
//! same two accessor types, which build the [`CommandFrame`] for an operation
//! and validate values against the descriptor.

use crate::CommandFrame;
use crate::Error;
use crate::RegisterAddress;
use alloc::borrow::Cow;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use serde::Deserialize;
use serde::Serialize;

pub mod msa;
pub mod pure_photonics;

pub use msa::address;

/// Whether the host may write a register.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[cfg_attr(any(feature = "api-traits", test), derive(schemars::JsonSchema))]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// The OIF-ITLA-MSA revision a module implements.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[cfg_attr(feature = "std", derive(clap::ValueEnum))]
#[cfg_attr(any(feature = "api-traits", test), derive(schemars::JsonSchema))]
pub enum ProtocolVersion {
    /// OIF-ITLA-MSA-01.2
    Msa12,
    /// OIF-ITLA-MSA-01.3
    Msa13,
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProtocolVersion::Msa12 => write!(f, "OIF-ITLA-MSA-01.2"),
            ProtocolVersion::Msa13 => write!(f, "OIF-ITLA-MSA-01.3"),
        }
    }
}

/// The description of a single register.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[cfg_attr(any(feature = "api-traits", test), derive(schemars::JsonSchema))]
pub struct RegisterDescriptor {
    pub address: RegisterAddress,
    pub name: Cow<'static, str>,
    pub access: Access,
    /// The register holds a two's complement value.
    #[serde(default)]
    pub signed: bool,
    /// The register holds more than one word, read through the extended
    /// address register.
    #[serde(default)]
    pub extended: bool,
}

impl RegisterDescriptor {
    /// A read-only, unsigned, single-word register.
    pub const fn read_only(address: RegisterAddress, name: &'static str) -> Self {
        Self {
            address,
            name: Cow::Borrowed(name),
            access: Access::ReadOnly,
            signed: false,
            extended: false,
        }
    }

    /// A writable, unsigned, single-word register.
    pub const fn read_write(address: RegisterAddress, name: &'static str) -> Self {
        Self {
            address,
            name: Cow::Borrowed(name),
            access: Access::ReadWrite,
            signed: false,
            extended: false,
        }
    }

    /// Mark the register as holding a signed value.
    pub const fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    /// Mark the register as holding extended data.
    pub const fn extended(mut self) -> Self {
        self.extended = true;
        self
    }

    pub const fn is_writable(&self) -> bool {
        matches!(self.access, Access::ReadWrite)
    }

    /// Check the invariants every descriptor in a table must satisfy.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() || (self.extended && self.is_writable()) {
            return Err(Error::InvalidDescriptor(self.address));
        }
        Ok(())
    }

    /// Return the accessor used to read this register.
    pub const fn reader(&self) -> ReadAccessor<'_> {
        ReadAccessor { descriptor: self }
    }

    /// Return the accessor used to write this register, if it is writable.
    pub const fn writer(&self) -> Option<WriteAccessor<'_>> {
        if self.is_writable() {
            Some(WriteAccessor { descriptor: self })
        } else {
            None
        }
    }
}

/// Builds read commands for one register.
#[derive(Clone, Copy, Debug)]
pub struct ReadAccessor<'a> {
    descriptor: &'a RegisterDescriptor,
}

impl<'a> ReadAccessor<'a> {
    pub const fn descriptor(&self) -> &'a RegisterDescriptor {
        self.descriptor
    }

    pub const fn command(&self) -> CommandFrame {
        CommandFrame::read(self.descriptor.address)
    }

    /// Wrap the bytes returned for this register.
    pub fn value(&self, bytes: Vec<u8>) -> RegisterValue {
        RegisterValue {
            register: self.descriptor.address,
            signed: self.descriptor.signed,
            bytes,
        }
    }
}

/// Builds write commands for one writable register.
#[derive(Clone, Copy, Debug)]
pub struct WriteAccessor<'a> {
    descriptor: &'a RegisterDescriptor,
}

impl<'a> WriteAccessor<'a> {
    pub const fn descriptor(&self) -> &'a RegisterDescriptor {
        self.descriptor
    }

    /// Build the command writing `value`.
    ///
    /// Signed registers accept `i16` values, unsigned registers `u16` values.
    pub fn command(&self, value: i32) -> Result<CommandFrame, Error> {
        let register = self.descriptor.address;
        let out_of_range = |_| Error::ValueOutOfRange { register, value };
        if self.descriptor.signed {
            let value = i16::try_from(value).map_err(out_of_range)?;
            Ok(CommandFrame::write_signed(register, value))
        } else {
            let value = u16::try_from(value).map_err(out_of_range)?;
            Ok(CommandFrame::write(register, value))
        }
    }
}

/// The data read from a register: the exact wire bytes and the signedness of
/// the register they came from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegisterValue {
    pub register: RegisterAddress,
    pub signed: bool,
    pub bytes: Vec<u8>,
}

impl RegisterValue {
    /// The value as an unsigned word, if this is a single-word value.
    pub fn word(&self) -> Option<u16> {
        match self.bytes.as_slice() {
            [hi, lo] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }

    /// The value of a single word, interpreted per the register's signedness.
    pub fn value(&self) -> Option<i32> {
        let word = self.word()?;
        if self.signed {
            Some(i32::from(word as i16))
        } else {
            Some(i32::from(word))
        }
    }

    /// Interpret the bytes as a null-terminated string.
    ///
    /// Bytes after the first NUL are ignored. Returns `None` if the text is
    /// not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        let end = self
            .bytes
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(self.bytes.len());
        core::str::from_utf8(&self.bytes[..end]).ok()
    }

    /// Interpret the bytes as a sequence of big-endian signed words.
    pub fn signed_words(&self) -> impl Iterator<Item = i16> + '_ {
        self.bytes
            .chunks_exact(2)
            .map(|w| i16::from_be_bytes([w[0], w[1]]))
    }
}

/// The registers implemented by a module, keyed by address.
///
/// Names are unique, and are looked up without regard to ASCII case.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RegisterTable {
    registers: BTreeMap<RegisterAddress, RegisterDescriptor>,
    names: BTreeMap<String, RegisterAddress>,
}

impl RegisterTable {
    /// Build the base table for a protocol revision.
    pub fn base(version: ProtocolVersion) -> Result<Self, Error> {
        let mut table = Self::default();
        let parts: &[&[RegisterDescriptor]] = match version {
            ProtocolVersion::Msa12 => &[msa::MSA_12],
            ProtocolVersion::Msa13 => &[msa::MSA_12, msa::MSA_13],
        };
        for descriptor in parts.iter().flat_map(|p| p.iter()) {
            table.insert(descriptor.clone())?;
        }
        Ok(table)
    }

    /// Build a table from the base for `version` and zero or more extension
    /// tables, merged in order.
    pub fn build<'a, I>(version: ProtocolVersion, extensions: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = &'a [RegisterDescriptor]>,
    {
        let mut table = Self::base(version)?;
        for extension in extensions {
            table.merge(extension)?;
        }
        Ok(table)
    }

    /// Merge an extension table into this one.
    ///
    /// Re-declaring a register with an identical descriptor is accepted. On
    /// error, `self` is left unmodified.
    pub fn merge(&mut self, extension: &[RegisterDescriptor]) -> Result<(), Error> {
        let mut merged = self.clone();
        for descriptor in extension {
            merged.insert(descriptor.clone())?;
        }
        *self = merged;
        Ok(())
    }

    fn insert(&mut self, descriptor: RegisterDescriptor) -> Result<(), Error> {
        descriptor.validate()?;
        let address = descriptor.address;
        if let Some(existing) = self.registers.get(&address) {
            if *existing == descriptor {
                return Ok(());
            }
            return Err(Error::DuplicateRegister { address });
        }
        let key = descriptor.name.to_ascii_uppercase();
        if let Some(existing) = self.names.get(&key) {
            return Err(Error::DuplicateName {
                address,
                existing: *existing,
            });
        }
        self.names.insert(key, address);
        self.registers.insert(address, descriptor);
        Ok(())
    }

    pub fn get(&self, address: RegisterAddress) -> Option<&RegisterDescriptor> {
        self.registers.get(&address)
    }

    pub fn by_name(&self, name: &str) -> Option<&RegisterDescriptor> {
        self.names
            .get(&name.to_ascii_uppercase())
            .and_then(|address| self.registers.get(address))
    }

    pub fn contains(&self, address: RegisterAddress) -> bool {
        self.registers.contains_key(&address)
    }

    /// Iterate over the descriptors in address order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisterDescriptor> + '_ {
        self.registers.values()
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}
