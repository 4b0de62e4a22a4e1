// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! The standard OIF-ITLA-MSA register tables.

use super::RegisterDescriptor as R;

/// Addresses of the standard registers.
pub mod address {
    use crate::RegisterAddress;

    pub const NOP: RegisterAddress = 0x00;
    pub const DEVICE_TYPE: RegisterAddress = 0x01;
    pub const MANUFACTURER: RegisterAddress = 0x02;
    pub const MODEL: RegisterAddress = 0x03;
    pub const SERIAL_NUMBER: RegisterAddress = 0x04;
    pub const MANUFACTURING_DATE: RegisterAddress = 0x05;
    pub const RELEASE: RegisterAddress = 0x06;
    pub const RELEASE_BACKWARDS: RegisterAddress = 0x07;
    pub const GEN_CFG: RegisterAddress = 0x08;
    pub const AEA_EAC: RegisterAddress = 0x09;
    pub const AEA_EA: RegisterAddress = 0x0a;
    /// The register through which extended data is drained.
    pub const AEA_EAR: RegisterAddress = 0x0b;
    pub const IO_CAP: RegisterAddress = 0x0d;
    pub const EAC: RegisterAddress = 0x0e;
    pub const EA: RegisterAddress = 0x0f;
    pub const EAR: RegisterAddress = 0x10;
    pub const LAST_RESPONSE: RegisterAddress = 0x13;
    pub const DL_CONFIG: RegisterAddress = 0x14;
    pub const DL_STATUS: RegisterAddress = 0x15;
    pub const STATUS_F: RegisterAddress = 0x20;
    pub const STATUS_W: RegisterAddress = 0x21;
    pub const F_POW_TH: RegisterAddress = 0x22;
    pub const W_POW_TH: RegisterAddress = 0x23;
    pub const F_FREQ_TH: RegisterAddress = 0x24;
    pub const W_FREQ_TH: RegisterAddress = 0x25;
    pub const F_THERM_TH: RegisterAddress = 0x26;
    pub const W_THERM_TH: RegisterAddress = 0x27;
    pub const SRQ_T: RegisterAddress = 0x28;
    pub const FATAL_T: RegisterAddress = 0x29;
    pub const ALM_T: RegisterAddress = 0x2a;
    pub const CHANNEL: RegisterAddress = 0x30;
    pub const PWR: RegisterAddress = 0x31;
    pub const RES_ENA: RegisterAddress = 0x32;
    pub const MCB: RegisterAddress = 0x33;
    pub const GRID: RegisterAddress = 0x34;
    pub const FCF1: RegisterAddress = 0x35;
    pub const FCF2: RegisterAddress = 0x36;
    pub const LF1: RegisterAddress = 0x40;
    pub const LF2: RegisterAddress = 0x41;
    pub const OOP: RegisterAddress = 0x42;
    pub const CTEMP: RegisterAddress = 0x43;
    pub const FTFR: RegisterAddress = 0x4f;
    pub const OPSL: RegisterAddress = 0x50;
    pub const OPSH: RegisterAddress = 0x51;
    pub const LFL1: RegisterAddress = 0x52;
    pub const LFL2: RegisterAddress = 0x53;
    pub const LFH1: RegisterAddress = 0x54;
    pub const LFH2: RegisterAddress = 0x55;
    pub const LGRID: RegisterAddress = 0x56;
    pub const CURRENTS: RegisterAddress = 0x57;
    pub const TEMPS: RegisterAddress = 0x58;
    pub const DITHER_E: RegisterAddress = 0x59;
    pub const DITHER_R: RegisterAddress = 0x5a;
    pub const DITHER_F: RegisterAddress = 0x5b;
    pub const DITHER_A: RegisterAddress = 0x5c;
    pub const TBTFL: RegisterAddress = 0x5d;
    pub const TBTFH: RegisterAddress = 0x5e;
    pub const F_AGE_TH: RegisterAddress = 0x5f;
    pub const W_AGE_TH: RegisterAddress = 0x60;
    pub const AGE: RegisterAddress = 0x61;
    pub const FTF: RegisterAddress = 0x62;

    // MSA-01.3 only.
    pub const F_FREQ_TH2: RegisterAddress = 0x63;
    pub const W_FREQ_TH2: RegisterAddress = 0x64;
    pub const CHANNEL_H: RegisterAddress = 0x65;
    pub const GRID2: RegisterAddress = 0x66;
    pub const FCF3: RegisterAddress = 0x67;
    pub const LF3: RegisterAddress = 0x68;
    pub const LFL3: RegisterAddress = 0x69;
    pub const LFH3: RegisterAddress = 0x6a;
    pub const LGRID2: RegisterAddress = 0x6b;
}

use address::*;

/// Registers defined by OIF-ITLA-MSA-01.2.
pub static MSA_12: &[R] = &[
    R::read_write(NOP, "NOP"),
    R::read_only(DEVICE_TYPE, "DevTyp").extended(),
    R::read_only(MANUFACTURER, "MFGR").extended(),
    R::read_only(MODEL, "Model").extended(),
    R::read_only(SERIAL_NUMBER, "SerNo").extended(),
    R::read_only(MANUFACTURING_DATE, "MFGDate").extended(),
    R::read_only(RELEASE, "Release").extended(),
    R::read_only(RELEASE_BACKWARDS, "RelBack").extended(),
    R::read_write(GEN_CFG, "GenCfg"),
    R::read_only(AEA_EAC, "AEA-EAC"),
    R::read_only(AEA_EA, "AEA-EA"),
    R::read_write(AEA_EAR, "AEA-EAR"),
    R::read_write(IO_CAP, "IOCap"),
    R::read_write(EAC, "EAC"),
    R::read_write(EA, "EA"),
    R::read_write(EAR, "EAR"),
    R::read_only(LAST_RESPONSE, "LstResp"),
    R::read_write(DL_CONFIG, "DLConfig"),
    R::read_only(DL_STATUS, "DLStatus"),
    R::read_write(STATUS_F, "StatusF"),
    R::read_write(STATUS_W, "StatusW"),
    R::read_write(F_POW_TH, "FPowTh"),
    R::read_write(W_POW_TH, "WPowTh"),
    R::read_write(F_FREQ_TH, "FFreqTh"),
    R::read_write(W_FREQ_TH, "WFreqTh"),
    R::read_write(F_THERM_TH, "FThermTh"),
    R::read_write(W_THERM_TH, "WThermTh"),
    R::read_write(SRQ_T, "SRQT"),
    R::read_write(FATAL_T, "FatalT"),
    R::read_write(ALM_T, "ALMT"),
    R::read_write(CHANNEL, "Channel"),
    R::read_write(PWR, "PWR").signed(),
    R::read_write(RES_ENA, "ResEna"),
    R::read_write(MCB, "MCB"),
    R::read_write(GRID, "Grid").signed(),
    R::read_write(FCF1, "FCF1"),
    R::read_write(FCF2, "FCF2"),
    R::read_only(LF1, "LF1"),
    R::read_only(LF2, "LF2"),
    R::read_only(OOP, "OOP").signed(),
    R::read_only(CTEMP, "CTemp").signed(),
    R::read_only(FTFR, "FTFR"),
    R::read_only(OPSL, "OPSL").signed(),
    R::read_only(OPSH, "OPSH").signed(),
    R::read_only(LFL1, "LFL1"),
    R::read_only(LFL2, "LFL2"),
    R::read_only(LFH1, "LFH1"),
    R::read_only(LFH2, "LFH2"),
    R::read_only(LGRID, "LGrid"),
    R::read_only(CURRENTS, "Currents").signed().extended(),
    R::read_only(TEMPS, "Temps").signed().extended(),
    R::read_write(DITHER_E, "DitherE"),
    R::read_write(DITHER_R, "DitherR"),
    R::read_write(DITHER_F, "DitherF"),
    R::read_write(DITHER_A, "DitherA"),
    R::read_write(TBTFL, "TBTFL").signed(),
    R::read_write(TBTFH, "TBTFH").signed(),
    R::read_write(F_AGE_TH, "FAgeTh"),
    R::read_write(W_AGE_TH, "WAgeTh"),
    R::read_only(AGE, "Age"),
    R::read_write(FTF, "FTF").signed(),
];

/// Registers added by OIF-ITLA-MSA-01.3.
pub static MSA_13: &[R] = &[
    R::read_write(F_FREQ_TH2, "FFreqTh2"),
    R::read_write(W_FREQ_TH2, "WFreqTh2"),
    R::read_write(CHANNEL_H, "ChannelH"),
    R::read_write(GRID2, "Grid2").signed(),
    R::read_write(FCF3, "FCF3"),
    R::read_only(LF3, "LF3"),
    R::read_only(LFL3, "LFL3"),
    R::read_only(LFH3, "LFH3"),
    R::read_only(LGRID2, "LGrid2"),
];
