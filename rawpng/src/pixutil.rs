// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Helpers to prepare raw 8 bit pixel buffers for encoding

use crate::{PngError, Result};

/// Interleave equally sized planes into one buffer,
/// e.g. gray `[g1, g2]` and alpha `[a1, a2]` into `[g1, a1, g2, a2]`.
pub fn mix_channels(planes: &[&[u8]]) -> Result<Vec<u8>> {
  if planes.len() < 2 {
    return Err(PngError::InvalidArgument(format!("At least 2 planes are required for mixing, got {}", planes.len())));
  }
  let plane_len = planes[0].len();
  if let Some(bad) = planes.iter().position(|p| p.len() != plane_len) {
    return Err(PngError::InvalidArgument(format!(
      "Plane {} has {} samples, expected {}",
      bad,
      planes[bad].len(),
      plane_len
    )));
  }
  let mut out = vec![0; plane_len * planes.len()];
  for (i, pixel) in out.chunks_exact_mut(planes.len()).enumerate() {
    for (sample, plane) in pixel.iter_mut().zip(planes) {
      *sample = plane[i];
    }
  }
  Ok(out)
}

/// Reverse of [`mix_channels`]
pub fn split_channels(buf: &[u8], channels: usize) -> Result<Vec<Vec<u8>>> {
  if channels == 0 || buf.len() % channels != 0 {
    return Err(PngError::InvalidArgument(format!("Buffer of {} bytes can't be split into {} channels", buf.len(), channels)));
  }
  let mut planes = vec![Vec::with_capacity(buf.len() / channels); channels];
  for pixel in buf.chunks_exact(channels) {
    for (plane, sample) in planes.iter_mut().zip(pixel) {
      plane.push(*sample);
    }
  }
  Ok(planes)
}

/// Keep only channel `keep` of every pixel, all other samples are set to 0
pub fn isolate_channel(buf: &[u8], channels: usize, keep: usize) -> Result<Vec<u8>> {
  if keep >= channels || buf.len() % channels != 0 {
    return Err(PngError::InvalidArgument(format!("Invalid channel {} for {} channels", keep, channels)));
  }
  let mut out = vec![0; buf.len()];
  for (dst, src) in out.chunks_exact_mut(channels).zip(buf.chunks_exact(channels)) {
    dst[keep] = src[keep];
  }
  Ok(out)
}

/// Reverse the row order in place (bottom-up buffers become top-down)
pub fn flip_vertical(buf: &mut [u8], row_bytes: usize) -> Result<()> {
  if row_bytes == 0 || buf.len() % row_bytes != 0 {
    return Err(PngError::InvalidArgument(format!("Buffer of {} bytes has no rows of {} bytes", buf.len(), row_bytes)));
  }
  let rows = buf.len() / row_bytes;
  for top in 0..rows / 2 {
    let bottom = rows - 1 - top;
    let (upper, lower) = buf.split_at_mut(bottom * row_bytes);
    upper[top * row_bytes..(top + 1) * row_bytes].swap_with_slice(&mut lower[..row_bytes]);
  }
  Ok(())
}

/// Drop the alpha sample of every pixel
pub fn rgba_to_rgb(buf: &[u8]) -> Result<Vec<u8>> {
  if buf.len() % 4 != 0 {
    return Err(PngError::InvalidArgument(format!("RGBA buffer length {} is not a multiple of 4", buf.len())));
  }
  Ok(buf.chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]).collect())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mix_and_split() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let gray: &[u8] = &[1, 2, 3, 4];
    let alpha: &[u8] = &[10, 20, 30, 40];
    let mixed = mix_channels(&[gray, alpha])?;
    assert_eq!(mixed, vec![1, 10, 2, 20, 3, 30, 4, 40]);
    assert_eq!(split_channels(&mixed, 2)?, vec![gray.to_vec(), alpha.to_vec()]);

    assert!(mix_channels(&[gray]).is_err());
    assert!(mix_channels(&[gray, &alpha[..3]]).is_err());
    assert!(split_channels(&mixed, 3).is_err());
    Ok(())
  }

  #[test]
  fn isolate_green() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let rgb = [1, 2, 3, 4, 5, 6];
    assert_eq!(isolate_channel(&rgb, 3, 1)?, vec![0, 2, 0, 0, 5, 0]);
    assert!(isolate_channel(&rgb, 3, 3).is_err());
    Ok(())
  }

  #[test]
  fn flip_rows() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut buf = vec![1, 1, 2, 2, 3, 3];
    flip_vertical(&mut buf, 2)?;
    assert_eq!(buf, vec![3, 3, 2, 2, 1, 1]);
    let mut even = vec![1, 2, 3, 4];
    flip_vertical(&mut even, 1)?;
    assert_eq!(even, vec![4, 3, 2, 1]);
    assert!(flip_vertical(&mut even, 3).is_err());
    Ok(())
  }

  #[test]
  fn strip_alpha() -> std::result::Result<(), Box<dyn std::error::Error>> {
    assert_eq!(rgba_to_rgb(&[1, 2, 3, 255, 4, 5, 6, 0])?, vec![1, 2, 3, 4, 5, 6]);
    assert!(rgba_to_rgb(&[1, 2, 3]).is_err());
    Ok(())
  }
}
