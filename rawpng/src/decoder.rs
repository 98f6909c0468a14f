// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use log::{debug, trace, warn};
use num_enum::TryFromPrimitive;

use crate::bits::BEu32;
use crate::chunk::{ChunkType, HEADER_PAYLOAD_LEN, PHYS_PAYLOAD_LEN, RawChunk, read_chunk};
use crate::compress;
use crate::envparams::{rawpng_pattern_scan, rawpng_verify_crc};
use crate::format::{BitDepth, COMPRESSION_METHOD_DEFLATE, ColorType, DensityUnit, FILTER_METHOD_ADAPTIVE, INTERLACE_NONE, PNG_SIGNATURE, PhysicalDensity};
use crate::image::PngImage;
use crate::rawsource::PngSource;
use crate::scanlines::{ScanlineLayout, decode_scanlines};
use crate::scanner::{find_all, find_pattern};
use crate::{PngError, Result};

/// How chunks following the header are located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkWalk {
  /// Follow the declared chunk lengths from one chunk to the next
  #[default]
  Sequential,
  /// Search the chunk tags anywhere behind the header
  PatternScan,
}

#[derive(Debug, Clone)]
pub struct DecodeParams {
  pub verify_crc: bool,
  pub walk: ChunkWalk,
}

impl Default for DecodeParams {
  fn default() -> Self {
    Self {
      verify_crc: rawpng_verify_crc(),
      walk: if rawpng_pattern_scan() { ChunkWalk::PatternScan } else { ChunkWalk::Sequential },
    }
  }
}

/// Validated content of the header chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
  pub width: u32,
  pub height: u32,
  pub bit_depth: BitDepth,
  pub color_type: ColorType,
}

impl ImageHeader {
  pub fn parse(payload: &[u8]) -> Result<Self> {
    if payload.len() != HEADER_PAYLOAD_LEN {
      return Err(PngError::Format(format!("IHDR payload has {} bytes, expected {}", payload.len(), HEADER_PAYLOAD_LEN)));
    }
    let width = BEu32(payload, 0);
    let height = BEu32(payload, 4);
    if width == 0 || height == 0 {
      return Err(PngError::Format(format!("Invalid image dimensions {}x{}", width, height)));
    }
    let bit_depth = BitDepth::from_raw(payload[8])?;
    let color_type = ColorType::from_raw(payload[9])?;
    if payload[10] != COMPRESSION_METHOD_DEFLATE {
      return Err(PngError::UnsupportedMethod {
        what: "compression",
        value: payload[10],
      });
    }
    if payload[11] != FILTER_METHOD_ADAPTIVE {
      return Err(PngError::UnsupportedMethod {
        what: "filter",
        value: payload[11],
      });
    }
    if payload[12] != INTERLACE_NONE {
      return Err(PngError::UnsupportedInterlace(payload[12]));
    }
    Ok(Self {
      width,
      height,
      bit_depth,
      color_type,
    })
  }

  pub fn bytes_per_pixel(&self) -> usize {
    self.color_type.channels() * self.bit_depth.bytes_per_channel()
  }
}

/// Chunks consumed by the decoder, in file order
#[derive(Debug)]
struct ChunkIndex<'a> {
  header: RawChunk<'a>,
  phys: Option<RawChunk<'a>>,
  data: Vec<RawChunk<'a>>,
}

impl<'a> ChunkIndex<'a> {
  fn verify(&self) -> Result<()> {
    self.header.verify()?;
    if let Some(phys) = &self.phys {
      phys.verify()?;
    }
    for chunk in &self.data {
      chunk.verify()?;
    }
    Ok(())
  }
}

/// Offset of the header chunk's length field
fn locate_header(buf: &[u8]) -> Result<usize> {
  if !buf.starts_with(&PNG_SIGNATURE) {
    warn!("File signature is missing, searching for the image header");
  }
  match find_pattern(buf, ChunkType::IHDR.as_bytes(), 0) {
    Some(pos) if pos >= 4 => Ok(pos - 4),
    Some(pos) => Err(PngError::Format(format!("IHDR tag at offset {} has no length field", pos))),
    None => Err(PngError::Format("No IHDR chunk found".into())),
  }
}

fn index_sequential(buf: &[u8], header_offset: usize) -> Result<ChunkIndex<'_>> {
  let header = read_chunk(buf, header_offset)?;
  let mut index = ChunkIndex {
    header,
    phys: None,
    data: Vec::new(),
  };
  let mut offset = header.next_offset();
  loop {
    if offset >= buf.len() {
      return Err(PngError::Format("Missing IEND chunk".into()));
    }
    let chunk = read_chunk(buf, offset)?;
    trace!("Found {} chunk with {} bytes at offset {}", chunk.kind, chunk.payload.len(), offset);
    match chunk.kind {
      ChunkType::IHDR => return Err(PngError::Format(format!("Duplicate IHDR chunk at offset {}", offset))),
      ChunkType::PHYS if index.phys.is_some() => warn!("Ignoring duplicate pHYs chunk at offset {}", offset),
      ChunkType::PHYS => index.phys = Some(chunk),
      ChunkType::IDAT => index.data.push(chunk),
      ChunkType::IEND => break,
      other => debug!("Skipping {} chunk with {} bytes at offset {}", other, chunk.payload.len(), offset),
    }
    offset = chunk.next_offset();
  }
  Ok(index)
}

fn index_by_pattern(buf: &[u8], header_offset: usize) -> Result<ChunkIndex<'_>> {
  let header = read_chunk(buf, header_offset)?;
  let body = header.next_offset();

  let mut data: Vec<RawChunk> = Vec::new();
  for pos in find_all(buf, ChunkType::IDAT.as_bytes()) {
    let inside_previous = data.last().is_some_and(|prev| pos < prev.next_offset());
    if pos < body + 4 || inside_previous {
      continue;
    }
    data.push(read_chunk(buf, pos - 4)?);
  }

  // pHYs must precede the image data, later hits are payload bytes
  let phys_limit = data.first().map_or(buf.len(), |first| first.offset);
  let phys = match find_pattern(&buf[..phys_limit], ChunkType::PHYS.as_bytes(), body + 4) {
    Some(pos) => Some(read_chunk(buf, pos - 4)?),
    None => None,
  };

  let tail = data.last().map(|c| c.next_offset()).unwrap_or(body);
  if find_pattern(buf, ChunkType::IEND.as_bytes(), tail).is_none() {
    return Err(PngError::Format("Missing IEND chunk".into()));
  }
  Ok(ChunkIndex { header, phys, data })
}

fn parse_density(chunk: &RawChunk) -> Option<PhysicalDensity> {
  let payload = chunk.payload;
  if payload.len() != PHYS_PAYLOAD_LEN {
    warn!("Ignoring pHYs chunk with {} bytes", payload.len());
    return None;
  }
  let unit = DensityUnit::try_from_primitive(payload[8]).unwrap_or_else(|_| {
    warn!("Unknown pHYs unit {}, using unspecified", payload[8]);
    DensityUnit::Unspecified
  });
  Some(PhysicalDensity::new(BEu32(payload, 0), BEu32(payload, 4), unit)).filter(PhysicalDensity::is_present)
}

/// Decode a complete file held in `buf`
pub fn decode_bytes(buf: &[u8], params: &DecodeParams) -> Result<PngImage> {
  let header_offset = locate_header(buf)?;
  let index = match params.walk {
    ChunkWalk::Sequential => index_sequential(buf, header_offset)?,
    ChunkWalk::PatternScan => index_by_pattern(buf, header_offset)?,
  };
  if params.verify_crc {
    index.verify()?;
  }

  let header = ImageHeader::parse(index.header.payload)?;
  debug!(
    "Image {}x{}, {:?}, {:?}, {} data chunks",
    header.width,
    header.height,
    header.bit_depth,
    header.color_type,
    index.data.len()
  );
  if index.data.is_empty() {
    return Err(PngError::Format("No IDAT chunk found".into()));
  }

  let layout = ScanlineLayout::new(header.width, header.height, header.bytes_per_pixel())?;
  let segments: Vec<&[u8]> = index.data.iter().map(|chunk| chunk.payload).collect();
  let scanlines = compress::inflate(&segments, layout.buffer_len())?;
  let pixels = decode_scanlines(&scanlines, &layout)?;

  match index.phys.as_ref().and_then(parse_density) {
    Some(density) => PngImage::with_density(pixels, header.width, header.height, header.bit_depth, header.color_type, density),
    None => PngImage::new(pixels, header.width, header.height, header.bit_depth, header.color_type),
  }
}

pub fn decode_source(source: &PngSource, params: &DecodeParams) -> Result<PngImage> {
  decode_bytes(source.buf(), params).inspect_err(|err| debug!("Decoding {:?} failed: {}", source, err))
}
