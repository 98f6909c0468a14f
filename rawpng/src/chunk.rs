// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::fmt;
use std::io::{self, Write};

use log::debug;

use crate::bits::{BEu32, u32_to_be_bytes};
use crate::compress::{self, CompressionLevel};
use crate::crc::Crc32;
use crate::format::{BitDepth, COMPRESSION_METHOD_DEFLATE, ColorType, FILTER_METHOD_ADAPTIVE, INTERLACE_NONE, PhysicalDensity};
use crate::scanlines::{self, FilterStrategy, ScanlineLayout};
use crate::{PngError, Result};

pub const HEADER_PAYLOAD_LEN: usize = 13;
pub const PHYS_PAYLOAD_LEN: usize = 9;

/// Four byte ASCII chunk tag
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
  pub const IHDR: ChunkType = ChunkType(*b"IHDR");
  pub const PHYS: ChunkType = ChunkType(*b"pHYs");
  pub const IDAT: ChunkType = ChunkType(*b"IDAT");
  pub const IEND: ChunkType = ChunkType(*b"IEND");

  /// Critical chunks have an uppercase first letter
  pub fn is_critical(&self) -> bool {
    self.0[0].is_ascii_uppercase()
  }

  pub fn as_bytes(&self) -> &[u8; 4] {
    &self.0
  }
}

impl fmt::Display for ChunkType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", String::from_utf8_lossy(&self.0))
  }
}

impl fmt::Debug for ChunkType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ChunkType({})", self)
  }
}

/// Checksum over type followed by payload
pub fn chunk_crc(kind: &ChunkType, payload: &[u8]) -> u32 {
  Crc32::new().update(&kind.0).update(payload).finalize()
}

/// Fields a chunk needs to know about the image it describes
pub trait ChunkSource {
  fn dimensions(&self) -> (u32, u32);
  fn bit_depth(&self) -> BitDepth;
  fn color_type(&self) -> ColorType;
  fn pixels(&self) -> &[u8];
}

/// A complete chunk. The checksum is fixed at construction from the
/// same data that is later serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
  kind: ChunkType,
  payload: Vec<u8>,
  crc: u32,
}

impl Chunk {
  pub fn new(kind: ChunkType, payload: Vec<u8>) -> Self {
    let crc = chunk_crc(&kind, &payload);
    Self { kind, payload, crc }
  }

  pub fn kind(&self) -> ChunkType {
    self.kind
  }

  pub fn payload(&self) -> &[u8] {
    &self.payload
  }

  pub fn len(&self) -> usize {
    self.payload.len()
  }

  pub fn is_empty(&self) -> bool {
    self.payload.is_empty()
  }

  pub fn crc(&self) -> u32 {
    self.crc
  }

  /// Bytes occupied in a file: length, type, payload and checksum
  pub fn encoded_len(&self) -> usize {
    12 + self.payload.len()
  }

  /// Serialize as length(4) | type(4) | payload | crc(4)
  pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
    let len = u32::try_from(self.payload.len())
      .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("{} payload exceeds 4 GiB", self.kind)))?;
    writer.write_all(&u32_to_be_bytes(len))?;
    writer.write_all(&self.kind.0)?;
    writer.write_all(&self.payload)?;
    writer.write_all(&u32_to_be_bytes(self.crc))?;
    Ok(())
  }
}

pub fn header_chunk<S: ChunkSource + ?Sized>(src: &S) -> Chunk {
  let (width, height) = src.dimensions();
  let mut payload = Vec::with_capacity(HEADER_PAYLOAD_LEN);
  payload.extend_from_slice(&u32_to_be_bytes(width));
  payload.extend_from_slice(&u32_to_be_bytes(height));
  payload.push(src.bit_depth().into());
  payload.push(src.color_type().into());
  payload.push(COMPRESSION_METHOD_DEFLATE);
  payload.push(FILTER_METHOD_ADAPTIVE);
  payload.push(INTERLACE_NONE);
  Chunk::new(ChunkType::IHDR, payload)
}

/// Physical dimension chunk, `None` if the density is absent
pub fn phys_chunk(density: &PhysicalDensity) -> Option<Chunk> {
  if !density.is_present() {
    return None;
  }
  let mut payload = Vec::with_capacity(PHYS_PAYLOAD_LEN);
  payload.extend_from_slice(&u32_to_be_bytes(density.ppu_x));
  payload.extend_from_slice(&u32_to_be_bytes(density.ppu_y));
  payload.push(density.unit.into());
  Some(Chunk::new(ChunkType::PHYS, payload))
}

/// Filter and compress the pixels of `src` into an image data chunk
pub fn data_chunk<S: ChunkSource + ?Sized>(src: &S, level: CompressionLevel, strategy: FilterStrategy) -> Result<Chunk> {
  let (width, height) = src.dimensions();
  let layout = ScanlineLayout::new(width, height, src.color_type().channels() * src.bit_depth().bytes_per_channel())?;
  let filtered = scanlines::encode_scanlines(src.pixels(), &layout, strategy)?;
  let payload = compress::deflate(&filtered, level)?;
  debug!(
    "Compressed {} scanline bytes into {} bytes ({:?})",
    filtered.len(),
    payload.len(),
    level
  );
  Ok(Chunk::new(ChunkType::IDAT, payload))
}

pub fn end_chunk() -> Chunk {
  Chunk::new(ChunkType::IEND, Vec::new())
}

/// Borrowed view on a single chunk inside a file buffer
#[derive(Debug, Clone, Copy)]
pub struct RawChunk<'a> {
  /// Offset of the length field
  pub offset: usize,
  pub kind: ChunkType,
  pub payload: &'a [u8],
  pub crc: u32,
}

impl<'a> RawChunk<'a> {
  /// Offset of the next chunk's length field
  pub fn next_offset(&self) -> usize {
    self.offset + 12 + self.payload.len()
  }

  pub fn verify(&self) -> Result<()> {
    let computed = chunk_crc(&self.kind, self.payload);
    if computed != self.crc {
      return Err(PngError::ChecksumMismatch {
        chunk: self.kind,
        stored: self.crc,
        computed,
      });
    }
    Ok(())
  }
}

/// Read the chunk whose length field starts at `offset`
pub fn read_chunk(buf: &[u8], offset: usize) -> Result<RawChunk<'_>> {
  let header_end = offset.checked_add(8).filter(|end| *end <= buf.len());
  let Some(header_end) = header_end else {
    return Err(PngError::Format(format!("Truncated chunk header at offset {}", offset)));
  };
  let len = BEu32(buf, offset) as usize;
  let kind = ChunkType([buf[offset + 4], buf[offset + 5], buf[offset + 6], buf[offset + 7]]);
  let crc_end = header_end.checked_add(len).and_then(|end| end.checked_add(4)).filter(|end| *end <= buf.len());
  let Some(crc_end) = crc_end else {
    return Err(PngError::Format(format!(
      "Truncated {} chunk at offset {}: declared length {} exceeds file size {}",
      kind,
      offset,
      len,
      buf.len()
    )));
  };
  Ok(RawChunk {
    offset,
    kind,
    payload: &buf[header_end..header_end + len],
    crc: BEu32(buf, crc_end - 4),
  })
}
