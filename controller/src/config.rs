// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Configuration of the laser controller.

use crate::DeviceProfile;
use crate::Error;
use crate::Vendor;
use itla_messages::ProtocolVersion;
use itla_messages::RegisterDescriptor;
use std::time::Duration;

/// Return the default protocol revision.
pub const fn default_protocol() -> ProtocolVersion {
    ProtocolVersion::Msa13
}

/// Return the default time to wait for each response frame.
///
/// Modules are required to answer within a few milliseconds; this leaves
/// room for USB-serial adapters.
pub const fn default_response_timeout() -> Duration {
    Duration::from_millis(500)
}

/// Return the default interval between NOP polls of a pending operation.
pub const fn default_poll_interval() -> Duration {
    Duration::from_millis(10)
}

/// Return the default baud rate of the serial link.
pub const fn default_baud_rate() -> u32 {
    9600
}

/// Configuration for a [`crate::Controller`].
///
/// The [`ConfigBuilder`] can be used to construct this with defaults that
/// work for most modules.
#[derive(Clone, Debug)]
pub struct Config {
    /// The MSA revision the module implements.
    pub protocol: ProtocolVersion,

    /// The vendor of the module, selecting extension registers and encoding
    /// quirks.
    pub vendor: Vendor,

    /// Registers the module implements beyond the protocol and vendor tables.
    pub extra_registers: Vec<RegisterDescriptor>,

    /// The time to wait for each response frame before failing.
    pub response_timeout: Duration,

    /// The delay before each NOP poll of a pending operation.
    ///
    /// `None` polls back-to-back.
    pub poll_interval: Option<Duration>,

    /// The number of NOP polls of a pending operation before failing.
    ///
    /// `None` polls until the operation completes.
    pub max_pending_polls: Option<usize>,
}

impl Config {
    /// Build the device profile this configuration describes.
    pub fn profile(&self) -> Result<DeviceProfile, Error> {
        DeviceProfile::with_registers(self.protocol, self.vendor, &self.extra_registers)
    }
}

/// A builder interface for generating controller configuration.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    protocol: Option<ProtocolVersion>,
    vendor: Vendor,
    extra_registers: Vec<RegisterDescriptor>,
    response_timeout: Option<Duration>,
    poll_interval: Option<Duration>,
    no_poll_interval: bool,
    max_pending_polls: Option<usize>,
}

impl ConfigBuilder {
    /// Create a new builder for a module from `vendor`.
    pub fn new(vendor: Vendor) -> Self {
        Self {
            vendor,
            ..Default::default()
        }
    }

    /// Set the MSA revision of the module.
    pub fn protocol(mut self, protocol: ProtocolVersion) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Add registers beyond the protocol and vendor tables.
    pub fn extra_registers(mut self, registers: impl IntoIterator<Item = RegisterDescriptor>) -> Self {
        self.extra_registers.extend(registers);
        self
    }

    /// Set the time to wait for each response frame.
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }

    /// Set the delay before each NOP poll of a pending operation.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self.no_poll_interval = false;
        self
    }

    /// Poll pending operations back-to-back, without delay.
    pub fn no_poll_interval(mut self) -> Self {
        self.poll_interval = None;
        self.no_poll_interval = true;
        self
    }

    /// Set the number of NOP polls of a pending operation before failing.
    pub fn max_pending_polls(mut self, polls: usize) -> Self {
        self.max_pending_polls = Some(polls);
        self
    }

    /// Build a `Config` from `self`.
    ///
    /// This fails if the timeouts are zero or if the extra registers
    /// conflict with the protocol or vendor tables.
    pub fn build(self) -> Result<Config, Error> {
        let response_timeout = self
            .response_timeout
            .unwrap_or_else(default_response_timeout);
        if response_timeout.is_zero() {
            return Err(Error::InvalidConfig(String::from(
                "response timeout must be nonzero",
            )));
        }
        if self.max_pending_polls == Some(0) {
            return Err(Error::InvalidConfig(String::from(
                "at least one pending poll is required",
            )));
        }
        let poll_interval = if self.no_poll_interval {
            None
        } else {
            Some(self.poll_interval.unwrap_or_else(default_poll_interval))
        };
        let config = Config {
            protocol: self.protocol.unwrap_or_else(default_protocol),
            vendor: self.vendor,
            extra_registers: self.extra_registers,
            response_timeout,
            poll_interval,
            max_pending_polls: self.max_pending_polls,
        };
        config.profile()?;
        Ok(config)
    }
}
