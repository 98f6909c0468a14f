// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Table driven CRC32 (reflected polynomial 0xEDB88320) as used
//! for the chunk checksums.

use lazy_static::lazy_static;

const CRC32_POLY: u32 = 0xEDB8_8320;

lazy_static! {
  static ref CRC_TABLE: [u32; 256] = build_crc_table();
}

fn build_crc_table() -> [u32; 256] {
  let mut tbl = [0; 256];
  for (k, entry) in tbl.iter_mut().enumerate() {
    let mut c = k as u32;
    for _ in 0..8 {
      if c & 1 != 0 {
        c = CRC32_POLY ^ (c >> 1);
      } else {
        c >>= 1;
      }
    }
    *entry = c;
  }
  tbl
}

/// Fold `bytes` into a running (non-inverted) CRC state.
#[inline]
pub fn crc32_update(mut crc: u32, bytes: &[u8]) -> u32 {
  let tbl: &[u32; 256] = &CRC_TABLE;
  for &byte in bytes {
    crc = tbl[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
  }
  crc
}

/// CRC32 of `bytes`
pub fn crc32(bytes: &[u8]) -> u32 {
  crc32_update(0xFFFF_FFFF, bytes) ^ 0xFFFF_FFFF
}

/// Incremental CRC32, for checksums over data that is not contiguous
/// (chunk type followed by payload).
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
  state: u32,
}

impl Default for Crc32 {
  fn default() -> Self {
    Self::new()
  }
}

impl Crc32 {
  pub fn new() -> Self {
    Self { state: 0xFFFF_FFFF }
  }

  pub fn update(&mut self, bytes: &[u8]) -> &mut Self {
    self.state = crc32_update(self.state, bytes);
    self
  }

  pub fn finalize(&self) -> u32 {
    self.state ^ 0xFFFF_FFFF
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reference_vectors() {
    crate::init_test_logger();
    assert_eq!(crc32(&[]), 0x0000_0000);
    assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    assert_eq!(crc32(b"IEND"), 0xAE42_6082);
  }

  #[test]
  fn table_entries() {
    let tbl = build_crc_table();
    assert_eq!(tbl[0], 0);
    assert_eq!(tbl[1], 0x7707_3096);
    assert_eq!(tbl[255], 0x2D02_EF8D);
  }

  #[test]
  fn incremental_matches_oneshot() {
    let mut hasher = Crc32::new();
    hasher.update(b"IHDR").update(&[0, 0, 0, 2, 0, 0, 0, 2, 8, 2, 0, 0, 0]);
    let mut joined = b"IHDR".to_vec();
    joined.extend_from_slice(&[0, 0, 0, 2, 0, 0, 0, 2, 8, 2, 0, 0, 0]);
    assert_eq!(hasher.finalize(), crc32(&joined));
  }

  #[test]
  fn concurrent_first_use() {
    let handles: Vec<_> = (0..8).map(|_| std::thread::spawn(|| crc32(b"IEND"))).collect();
    for h in handles {
      assert_eq!(h.join().unwrap(), 0xAE42_6082);
    }
  }
}
