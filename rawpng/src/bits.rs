// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Fixed big-endian wire representation of integers, independent
//! of the host byte order.

use byteorder::{BigEndian, ByteOrder};

#[inline]
pub fn u32_to_be_bytes(n: u32) -> [u8; 4] {
  let mut buf = [0; 4];
  BigEndian::write_u32(&mut buf, n);
  buf
}

/// Read a big-endian u32 from the first four bytes of `buf`.
///
/// Panics if `buf` is shorter than four bytes.
#[inline]
pub fn be_bytes_to_u32(buf: &[u8]) -> u32 {
  BigEndian::read_u32(&buf[..4])
}

#[allow(non_snake_case)]
#[inline]
pub fn BEu32(buf: &[u8], pos: usize) -> u32 {
  BigEndian::read_u32(&buf[pos..pos + 4])
}

/// Serialize 16 bit samples the way they are laid out in
/// the pixel buffer of a 16 bit image.
pub fn u16_samples_to_be(samples: &[u16]) -> Vec<u8> {
  let mut buf = vec![0; samples.len() * 2];
  BigEndian::write_u16_into(samples, &mut buf);
  buf
}

/// Inverse of [`u16_samples_to_be`], a trailing odd byte is ignored.
pub fn be_to_u16_samples(buf: &[u8]) -> Vec<u16> {
  let even = buf.len() & !1;
  let mut samples = vec![0; even / 2];
  BigEndian::read_u16_into(&buf[..even], &mut samples);
  samples
}
