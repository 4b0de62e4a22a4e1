// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! The 4-bit frame checksum.
//!
//! OIF-ITLA-MSA frames are protected by a BIP-4 checksum: the 32-bit frame is
//! folded into 4 bits by XOR, with the checksum field itself (the high nibble
//! of the first byte) treated as zero. The same computation stamps outgoing
//! commands and validates incoming responses.

use crate::FRAME_SIZE;

/// Mask selecting the checksum field of the first frame byte.
pub const CHECKSUM_MASK: u8 = 0xF0;

/// Compute the BIP-4 checksum of a frame.
///
/// The high nibble of `frame[0]` is ignored, so this can be applied to a
/// frame whether or not its checksum field has been filled in.
pub const fn checksum(frame: [u8; FRAME_SIZE]) -> u8 {
    let bip8 = (frame[0] & !CHECKSUM_MASK) ^ frame[1] ^ frame[2] ^ frame[3];
    ((bip8 & 0xF0) >> 4) ^ (bip8 & 0x0F)
}

/// Return the checksum field carried in a frame.
pub const fn checksum_field(frame: [u8; FRAME_SIZE]) -> u8 {
    (frame[0] & CHECKSUM_MASK) >> 4
}

/// Fill in the checksum field of a frame, returning the stamped frame.
pub const fn stamp(mut frame: [u8; FRAME_SIZE]) -> [u8; FRAME_SIZE] {
    let sum = checksum(frame);
    frame[0] = (frame[0] & !CHECKSUM_MASK) | (sum << 4);
    frame
}

#[cfg(test)]
mod tests {
    use super::checksum;
    use super::checksum_field;
    use super::stamp;

    #[test]
    fn test_checksum_known_frames() {
        // NOP read: all zero.
        assert_eq!(checksum([0x00, 0x00, 0x00, 0x00]), 0x0);

        // Write 0x0008 (SENA) to ResEna (0x32).
        //
        // bip8 = 0x01 ^ 0x32 ^ 0x00 ^ 0x08 = 0x3b, bip4 = 0x3 ^ 0xb = 0x8.
        assert_eq!(checksum([0x01, 0x32, 0x00, 0x08]), 0x8);

        // Read of the power setting (0x31).
        //
        // bip8 = 0x31, bip4 = 0x3 ^ 0x1 = 0x2.
        assert_eq!(checksum([0x00, 0x31, 0x00, 0x00]), 0x2);
    }

    #[test]
    fn test_checksum_ignores_checksum_field() {
        let frame = [0x01, 0x32, 0x00, 0x08];
        for nibble in 0..16u8 {
            let mut f = frame;
            f[0] |= nibble << 4;
            assert_eq!(checksum(f), checksum(frame));
        }
    }

    #[test]
    fn test_checksum_is_four_bits() {
        for b1 in 0..=255u8 {
            for b0 in 0..16u8 {
                assert!(checksum([b0, b1, b1.rotate_left(3), !b1]) < 16);
            }
        }
    }

    #[test]
    fn test_stamp_roundtrip() {
        let stamped = stamp([0x01, 0x32, 0x00, 0x08]);
        assert_eq!(stamped, [0x81, 0x32, 0x00, 0x08]);
        assert_eq!(checksum_field(stamped), checksum(stamped));
    }

    #[test]
    fn test_checksum_detects_single_bit_flips() {
        // BIP-4 catches every single-bit error: each bit of the frame feeds
        // exactly one bit of the checksum.
        let frame = stamp([0x00, 0x43, 0x0b, 0xb8]);
        for byte in 1..4 {
            for bit in 0..8 {
                let mut corrupt = frame;
                corrupt[byte] ^= 1 << bit;
                assert_ne!(checksum(corrupt), checksum_field(corrupt));
            }
        }
    }
}
