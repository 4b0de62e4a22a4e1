// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Utilities to make decoding register data less terrible.

use crate::Error;

/// Extract a bit from a register word.
pub const fn extract_bit(word: u16, bit: u8) -> Result<bool, Error> {
    if bit > 15 {
        return Err(Error::ParseFailed);
    }
    Ok((word & (1 << bit)) != 0)
}

mod private {
    pub trait ScalableSealed: Sized + Copy + Into<f32> {}
}

pub trait Scalable: private::ScalableSealed {
    fn from_bytes(buf: [u8; 2]) -> Self;
}

impl private::ScalableSealed for i16 {}

impl Scalable for i16 {
    fn from_bytes(buf: [u8; 2]) -> Self {
        Self::from_be_bytes(buf)
    }
}

impl private::ScalableSealed for u16 {}

impl Scalable for u16 {
    fn from_bytes(buf: [u8; 2]) -> Self {
        Self::from_be_bytes(buf)
    }
}

/// Return the bytes of a single-word read.
pub fn word(buf: &[u8]) -> Result<[u8; 2], Error> {
    buf.try_into().map_err(|_| Error::ParseFailed)
}

/// Decode a single-word read as a `u16`.
pub fn unsigned(buf: &[u8]) -> Result<u16, Error> {
    word(buf).map(u16::from_be_bytes)
}

/// Decode a single-word read as an `i16`.
pub fn signed(buf: &[u8]) -> Result<i16, Error> {
    word(buf).map(i16::from_be_bytes)
}

/// Decode a 2-byte word into a float with a defined scale factor.
pub fn decode_with_scale<T: Scalable>(buf: [u8; 2], scale: f32) -> f32 {
    T::from_bytes(buf).into() * scale
}

/// Decode a single-word read into a float with a defined scale factor.
pub fn decode_word_with_scale<T: Scalable>(buf: &[u8], scale: f32) -> Result<f32, Error> {
    word(buf).map(|w| decode_with_scale::<T>(w, scale))
}

/// Decode an extended read holding a sequence of words, each scaled.
pub fn decode_words_with_scale<T: Scalable>(buf: &[u8], scale: f32) -> Result<Vec<f32>, Error> {
    if buf.len() % 2 != 0 {
        return Err(Error::ParseFailed);
    }
    Ok(buf
        .chunks_exact(2)
        .map(|w| decode_with_scale::<T>([w[0], w[1]], scale))
        .collect())
}

/// Encode a value into a signed word, in units of `resolution`.
///
/// The value is rounded to the nearest unit.
pub fn encode_with_scale(
    quantity: &'static str,
    value: f64,
    resolution: f64,
) -> Result<i16, Error> {
    let units = (value / resolution).round();
    if units.is_finite() && units >= f64::from(i16::MIN) && units <= f64::from(i16::MAX) {
        Ok(units as i16)
    } else {
        Err(Error::OutOfRange { quantity, value })
    }
}

/// Decode a null-terminated string read through extended addressing.
///
/// Trailing whitespace is removed. Decoding stops at the first byte that is
/// not valid UTF-8.
pub fn null_terminated(buf: &[u8]) -> String {
    let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    let buf = &buf[..end];
    let text = match std::str::from_utf8(buf) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&buf[..e.valid_up_to()]).unwrap_or_default(),
    };
    text.trim_end().to_string()
}
