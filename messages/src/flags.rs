// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Flag sets decoded from the status, trigger and control registers.
//!
//! Each register has its own bit table; the same mnemonic does not always
//! land on the same bit position in different registers. See OIF-ITLA-MSA
//! 01.3, sections 9.5 and 9.6.

use serde::Deserialize;
use serde::Serialize;

bitflags::bitflags! {
    /// The fatal status register, StatusF (0x20).
    ///
    /// Bits 3:0 report current conditions. Bits 11:4 are latched, and
    /// writing a one to a latched bit clears it. A status reset writes
    /// [`FatalError::LATCHED`], which leaves the latched faults in bits 11:8
    /// alone.
    #[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
    pub struct FatalError: u16 {
        /// Output power fault.
        const FPWR      = 1 << 0;
        /// Thermal fault.
        const FTHERM    = 1 << 1;
        /// Frequency fault.
        const FFREQ     = 1 << 2;
        /// Vendor-specific fatal fault.
        const FVSF      = 1 << 3;
        /// Latched: a communication reset occurred.
        const CRL       = 1 << 4;
        /// Latched: a module restart occurred.
        const MRL       = 1 << 5;
        /// Latched: a communication error was detected.
        const CEL       = 1 << 6;
        /// Latched: an execution error occurred.
        const XEL       = 1 << 7;
        /// Latched: output power fault.
        const FPWRL     = 1 << 8;
        /// Latched: thermal fault.
        const FTHERML   = 1 << 9;
        /// Latched: frequency fault.
        const FFREQL    = 1 << 10;
        /// Latched: vendor-specific fatal fault.
        const FVSFL     = 1 << 11;
        /// The module's output is disabled by a fatal condition.
        const DIS       = 1 << 12;
        /// A fatal condition selected by FatalT is asserted.
        const FATAL     = 1 << 13;
        /// An alarm condition selected by ALMT is asserted.
        const ALM       = 1 << 14;
        /// A service request selected by SRQT is asserted.
        const SRQ       = 1 << 15;
    }
}

bitflags::bitflags! {
    /// The warning status register, StatusW (0x21).
    #[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
    pub struct WarningError: u16 {
        const WPWR      = 1 << 0;
        const WTHERM    = 1 << 1;
        const WFREQ     = 1 << 2;
        const WVSF      = 1 << 3;
        const CRL       = 1 << 4;
        const MRL       = 1 << 5;
        const CEL       = 1 << 6;
        const XEL       = 1 << 7;
        const WPWRL     = 1 << 8;
        const WTHERML   = 1 << 9;
        const WFREQL    = 1 << 10;
        const WVSFL     = 1 << 11;
        const DIS       = 1 << 12;
        const FATAL     = 1 << 13;
        const ALM       = 1 << 14;
        const SRQ       = 1 << 15;
    }
}

bitflags::bitflags! {
    /// The service-request trigger register, SRQT (0x28).
    ///
    /// Each set bit selects a condition that asserts SRQ.
    #[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
    pub struct SrqTrigger: u16 {
        const FPWRL     = 1 << 0;
        const FTHERML   = 1 << 1;
        const FFREQL    = 1 << 2;
        const FVSFL     = 1 << 3;
        const CRL       = 1 << 4;
        const MRL       = 1 << 5;
        const CEL       = 1 << 6;
        const XEL       = 1 << 7;
        const WPWRL     = 1 << 8;
        const WTHERML   = 1 << 9;
        const WFREQL    = 1 << 10;
        const WVSFL     = 1 << 11;
        const DIS       = 1 << 12;
    }
}

bitflags::bitflags! {
    /// The fatal trigger register, FatalT (0x29).
    ///
    /// Each set bit selects a latched condition that asserts FATAL.
    #[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
    pub struct FatalTrigger: u16 {
        const FPWRL     = 1 << 0;
        const FTHERML   = 1 << 1;
        const FFREQL    = 1 << 2;
        const FVSFL     = 1 << 3;
        const WPWRL     = 1 << 8;
        const WTHERML   = 1 << 9;
        const WFREQL    = 1 << 10;
        const WVSFL     = 1 << 11;
    }
}

bitflags::bitflags! {
    /// The alarm trigger register, ALMT (0x2A).
    ///
    /// Each set bit selects a condition that asserts ALM.
    #[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
    pub struct AlarmTrigger: u16 {
        const FPWR      = 1 << 0;
        const FTHERM    = 1 << 1;
        const FFREQ     = 1 << 2;
        const FVSF      = 1 << 3;
        const WPWR      = 1 << 8;
        const WTHERM    = 1 << 9;
        const WFREQ     = 1 << 10;
        const WVSF      = 1 << 11;
    }
}

bitflags::bitflags! {
    /// The reset / enable register, ResEna (0x32).
    #[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
    pub struct ResetEnable: u16 {
        /// Module reset.
        const MR        = 1 << 0;
        /// Soft reset.
        const SR        = 1 << 1;
        /// Software enable of the optical output.
        const SENA      = 1 << 3;
    }
}

bitflags::bitflags! {
    /// The module configuration behavior register, MCB (0x33).
    #[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
    pub struct ModuleConfig: u16 {
        /// Alarm during tuning.
        const ADT       = 1 << 1;
        /// Shut down the output on a fatal condition.
        const SDF       = 1 << 2;
    }
}

bitflags::bitflags! {
    /// The data word of the NOP register (0x00), less its error field.
    ///
    /// The error field in bits 3:0 is decoded separately, see
    /// [`crate::NopErrorKind`].
    #[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
    pub struct NopStatus: u16 {
        /// The module is ready to accept commands.
        const MRDY      = 1 << 4;
        /// Pending-operation flags, one per outstanding operation.
        const PENDING   = 0xff00;
    }
}

impl FatalError {
    /// The mask written to reset the register: the latched events in bits
    /// 7:4 and the condition bits 3:0.
    pub const LATCHED: Self = Self::from_bits_truncate(0x00ff);
}

impl WarningError {
    /// The mask written to reset the register, as for [`FatalError::LATCHED`].
    pub const LATCHED: Self = Self::from_bits_truncate(0x00ff);
}

impl FatalTrigger {
    /// Return true if this trigger mask shares a set bit with `status`.
    ///
    /// The comparison is of raw bits. FatalT's `FPWRL` (bit 0) lines up with
    /// StatusF's `FPWR`, not with StatusF's `FPWRL` (bit 8).
    pub const fn fires_on(&self, status: FatalError) -> bool {
        (self.bits() & status.bits()) != 0
    }
}

impl NopStatus {
    /// Return true if any operation is still pending.
    pub const fn is_pending(&self) -> bool {
        self.intersects(Self::PENDING)
    }
}

#[cfg(test)]
mod tests {
    use super::AlarmTrigger;
    use super::FatalError;
    use super::FatalTrigger;
    use super::ModuleConfig;
    use super::NopStatus;
    use super::ResetEnable;
    use super::SrqTrigger;
    use super::WarningError;

    #[test]
    fn test_empty_and_full_decode() {
        assert!(FatalError::from_bits_truncate(0).is_empty());
        assert!(WarningError::from_bits_truncate(0).is_empty());
        assert!(SrqTrigger::from_bits_truncate(0).is_empty());
        assert!(FatalTrigger::from_bits_truncate(0).is_empty());
        assert!(AlarmTrigger::from_bits_truncate(0).is_empty());

        assert_eq!(FatalError::from_bits_truncate(0xffff), FatalError::all());
        assert_eq!(WarningError::from_bits_truncate(0xffff), WarningError::all());
        assert_eq!(SrqTrigger::from_bits_truncate(0xffff), SrqTrigger::all());
        assert_eq!(FatalTrigger::from_bits_truncate(0xffff), FatalTrigger::all());
        assert_eq!(AlarmTrigger::from_bits_truncate(0xffff), AlarmTrigger::all());

        assert_eq!(FatalError::all().iter_names().count(), 16);
        assert_eq!(SrqTrigger::all().iter_names().count(), 13);
        assert_eq!(FatalTrigger::all().iter_names().count(), 8);
        assert_eq!(AlarmTrigger::all().iter_names().count(), 8);
    }

    #[test]
    fn test_fatal_error_bit_positions() {
        let table = [
            ("FPWR", 0),
            ("FTHERM", 1),
            ("FFREQ", 2),
            ("FVSF", 3),
            ("CRL", 4),
            ("MRL", 5),
            ("CEL", 6),
            ("XEL", 7),
            ("FPWRL", 8),
            ("FTHERML", 9),
            ("FFREQL", 10),
            ("FVSFL", 11),
            ("DIS", 12),
            ("FATAL", 13),
            ("ALM", 14),
            ("SRQ", 15),
        ];
        for (name, bit) in table {
            let flag = FatalError::from_name(name).unwrap();
            assert_eq!(flag.bits(), 1 << bit, "{name}");
            assert!(FatalError::from_bits_truncate(1 << bit).contains(flag));
        }
    }

    #[test]
    fn test_trigger_bit_positions() {
        for (name, bit) in [("FPWRL", 0), ("FVSFL", 3), ("WPWRL", 8), ("WVSFL", 11)] {
            assert_eq!(FatalTrigger::from_name(name).unwrap().bits(), 1 << bit);
        }
        for (name, bit) in [("FPWR", 0), ("FFREQ", 2), ("WTHERM", 9), ("WVSF", 11)] {
            assert_eq!(AlarmTrigger::from_name(name).unwrap().bits(), 1 << bit);
        }
        for (name, bit) in [("FTHERML", 1), ("XEL", 7), ("WFREQL", 10), ("DIS", 12)] {
            assert_eq!(SrqTrigger::from_name(name).unwrap().bits(), 1 << bit);
        }
        for (name, bit) in [("WPWR", 0), ("WVSF", 3), ("CEL", 6), ("WTHERML", 9)] {
            assert_eq!(WarningError::from_name(name).unwrap().bits(), 1 << bit);
        }
        assert_eq!(ResetEnable::SENA.bits(), 0x0008);
        assert_eq!(ModuleConfig::SDF.bits(), 0x0004);
    }

    #[test]
    fn test_unnamed_bits_are_dropped() {
        // Bits 7:4 are reserved in FatalT.
        assert!(FatalTrigger::from_bits_truncate(0x00f0).is_empty());
        assert_eq!(
            AlarmTrigger::from_bits_truncate(0x0101),
            AlarmTrigger::FPWR | AlarmTrigger::WPWR
        );
    }

    #[test]
    fn test_fatal_trigger_intersection() {
        let trigger = FatalTrigger::FPWRL | FatalTrigger::FTHERML;
        assert!(trigger.fires_on(FatalError::FTHERM | FatalError::DIS));
        assert!(trigger.fires_on(FatalError::FPWR));
        // Bit 9 of StatusF is not bit 1 of FatalT.
        assert!(!trigger.fires_on(FatalError::FTHERML | FatalError::DIS));
        assert!(!trigger.fires_on(FatalError::FFREQ | FatalError::DIS));
        assert!(FatalTrigger::WPWRL.fires_on(FatalError::FPWRL));
        assert!(!FatalTrigger::empty().fires_on(FatalError::all()));
    }

    #[test]
    fn test_latched_masks() {
        assert_eq!(FatalError::LATCHED.bits(), 0x00ff);
        assert!(FatalError::LATCHED.contains(FatalError::XEL));
        assert!(!FatalError::LATCHED.contains(FatalError::FPWRL));
        assert_eq!(WarningError::LATCHED.bits(), 0x00ff);
    }

    #[test]
    fn test_nop_status() {
        let status = NopStatus::from_bits_truncate(0x0110);
        assert!(status.contains(NopStatus::MRDY));
        assert!(status.is_pending());
        assert!(!NopStatus::from_bits_truncate(0x0010).is_pending());
    }
}
