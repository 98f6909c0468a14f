// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Byte pattern search over buffers and seekable streams

use std::io::{Read, Seek, SeekFrom};

use crate::Result;

const STREAM_BLOCK_SIZE: usize = 64 * 1024;

/// Offset of the first occurrence of `needle` at or after `from`
pub fn find_pattern(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
  if needle.is_empty() || from >= haystack.len() {
    return None;
  }
  haystack[from..].windows(needle.len()).position(|w| w == needle).map(|pos| pos + from)
}

/// Offsets of all non-overlapping occurrences, in ascending order
pub fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
  let mut hits = Vec::new();
  let mut from = 0;
  while let Some(pos) = find_pattern(haystack, needle, from) {
    hits.push(pos);
    from = pos + needle.len();
  }
  hits
}

/// Search `needle` from the current stream position onwards and return its
/// absolute offset. The stream position is restored before returning.
pub fn find_pattern_in<R: Read + Seek + ?Sized>(reader: &mut R, needle: &[u8]) -> Result<Option<u64>> {
  let start = reader.stream_position()?;
  let result = scan_stream(reader, needle, start);
  reader.seek(SeekFrom::Start(start))?;
  result
}

fn scan_stream<R: Read + Seek + ?Sized>(reader: &mut R, needle: &[u8], start: u64) -> Result<Option<u64>> {
  if needle.is_empty() {
    return Ok(None);
  }
  let keep = needle.len() - 1;
  let mut window: Vec<u8> = Vec::with_capacity(STREAM_BLOCK_SIZE + keep);
  let mut block = vec![0; STREAM_BLOCK_SIZE];
  // stream offset of window[0]
  let mut window_offset = start;
  loop {
    let n = reader.read(&mut block)?;
    if n == 0 {
      return Ok(None);
    }
    window.extend_from_slice(&block[..n]);
    if let Some(pos) = find_pattern(&window, needle, 0) {
      return Ok(Some(window_offset + pos as u64));
    }
    // carry the tail over, a match may straddle two blocks
    let drop = window.len().saturating_sub(keep);
    window.drain(..drop);
    window_offset += drop as u64;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  #[test]
  fn pattern_in_buffer() {
    let buf = b"xxIDATyyIDATzz";
    assert_eq!(find_pattern(buf, b"IDAT", 0), Some(2));
    assert_eq!(find_pattern(buf, b"IDAT", 3), Some(8));
    assert_eq!(find_pattern(buf, b"IDAT", 9), None);
    assert_eq!(find_pattern(buf, b"IEND", 0), None);
    assert_eq!(find_pattern(buf, b"", 0), None);
    assert_eq!(find_pattern(b"ID", b"IDAT", 0), None);
    assert_eq!(find_all(buf, b"IDAT"), vec![2, 8]);
    assert_eq!(find_all(b"aaaa", b"aa"), vec![0, 2]);
  }

  #[test]
  fn pattern_across_block_boundary() -> std::result::Result<(), Box<dyn std::error::Error>> {
    crate::init_test_logger();
    let mut data = vec![0_u8; STREAM_BLOCK_SIZE * 2];
    data[STREAM_BLOCK_SIZE - 2..STREAM_BLOCK_SIZE + 2].copy_from_slice(b"pHYs");
    let mut stream = Cursor::new(data);
    assert_eq!(find_pattern_in(&mut stream, b"pHYs")?, Some(STREAM_BLOCK_SIZE as u64 - 2));
    assert_eq!(stream.position(), 0);
    Ok(())
  }

  #[test]
  fn stream_position_restored() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut stream = Cursor::new(b"IHDR....IHDR....".to_vec());
    stream.set_position(3);
    assert_eq!(find_pattern_in(&mut stream, b"IHDR")?, Some(8));
    assert_eq!(stream.position(), 3);
    assert_eq!(find_pattern_in(&mut stream, b"IEND")?, None);
    assert_eq!(stream.position(), 3);
    Ok(())
  }
}
