// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Reversible per-scanline transforms applied before compression.
//!
//! All transforms work on bytes, with `bpp` (bytes per complete pixel)
//! as the distance to the left neighbour. Bytes left of the row start and
//! the whole prior row of the first scanline are treated as zero.

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum FilterType {
  None = 0,
  Sub = 1,
  Up = 2,
  Average = 3,
  Paeth = 4,
}

/// Filters in order of preference when scores are equal
pub const ALL_FILTERS: [FilterType; 5] = [FilterType::None, FilterType::Sub, FilterType::Up, FilterType::Average, FilterType::Paeth];

/// Pick the neighbour closest to `left + up - upper_left`,
/// ties resolved in the order left, up, upper left.
#[inline(always)]
pub fn paeth_predictor(left: u8, up: u8, upper_left: u8) -> u8 {
  let p = left as i16 + up as i16 - upper_left as i16;
  let pa = (p - left as i16).abs();
  let pb = (p - up as i16).abs();
  let pc = (p - upper_left as i16).abs();
  if pa <= pb && pa <= pc {
    left
  } else if pb <= pc {
    up
  } else {
    upper_left
  }
}

/// Filter `row` into `out` (same length). `prior` is the raw row above.
pub fn filter_row(filter: FilterType, bpp: usize, row: &[u8], prior: Option<&[u8]>, out: &mut [u8]) {
  debug_assert_eq!(row.len(), out.len());
  let len = row.len();
  let lead = bpp.min(len);
  match (filter, prior) {
    (FilterType::None, _) | (FilterType::Up, None) => out.copy_from_slice(row),
    (FilterType::Sub, _) => {
      out[..lead].copy_from_slice(&row[..lead]);
      for i in lead..len {
        out[i] = row[i].wrapping_sub(row[i - bpp]);
      }
    }
    (FilterType::Up, Some(up)) => {
      for i in 0..len {
        out[i] = row[i].wrapping_sub(up[i]);
      }
    }
    (FilterType::Average, None) => {
      out[..lead].copy_from_slice(&row[..lead]);
      for i in lead..len {
        out[i] = row[i].wrapping_sub(row[i - bpp] >> 1);
      }
    }
    (FilterType::Average, Some(up)) => {
      for i in 0..lead {
        out[i] = row[i].wrapping_sub(up[i] >> 1);
      }
      for i in lead..len {
        out[i] = row[i].wrapping_sub(((row[i - bpp] as u16 + up[i] as u16) >> 1) as u8);
      }
    }
    (FilterType::Paeth, None) => {
      // only the left neighbour is available, so the predictor degrades to Sub
      out[..lead].copy_from_slice(&row[..lead]);
      for i in lead..len {
        out[i] = row[i].wrapping_sub(paeth_predictor(row[i - bpp], 0, 0));
      }
    }
    (FilterType::Paeth, Some(up)) => {
      for i in 0..lead {
        out[i] = row[i].wrapping_sub(paeth_predictor(0, up[i], 0));
      }
      for i in lead..len {
        out[i] = row[i].wrapping_sub(paeth_predictor(row[i - bpp], up[i], up[i - bpp]));
      }
    }
  }
}

/// Reverse [`filter_row`] in place. `prior` must be the already
/// reconstructed row above.
pub fn unfilter_row(filter: FilterType, bpp: usize, row: &mut [u8], prior: Option<&[u8]>) {
  let len = row.len();
  let lead = bpp.min(len);
  match (filter, prior) {
    (FilterType::None, _) | (FilterType::Up, None) => {}
    (FilterType::Sub, _) => {
      for i in lead..len {
        row[i] = row[i].wrapping_add(row[i - bpp]);
      }
    }
    (FilterType::Up, Some(up)) => {
      for i in 0..len {
        row[i] = row[i].wrapping_add(up[i]);
      }
    }
    (FilterType::Average, None) => {
      for i in lead..len {
        row[i] = row[i].wrapping_add(row[i - bpp] >> 1);
      }
    }
    (FilterType::Average, Some(up)) => {
      for i in 0..lead {
        row[i] = row[i].wrapping_add(up[i] >> 1);
      }
      for i in lead..len {
        row[i] = row[i].wrapping_add(((row[i - bpp] as u16 + up[i] as u16) >> 1) as u8);
      }
    }
    (FilterType::Paeth, None) => {
      for i in lead..len {
        row[i] = row[i].wrapping_add(paeth_predictor(row[i - bpp], 0, 0));
      }
    }
    (FilterType::Paeth, Some(up)) => {
      for i in 0..lead {
        row[i] = row[i].wrapping_add(paeth_predictor(0, up[i], 0));
      }
      for i in lead..len {
        row[i] = row[i].wrapping_add(paeth_predictor(row[i - bpp], up[i], up[i - bpp]));
      }
    }
  }
}

/// Number of distinct byte values in `buf`
pub fn distinct_values(buf: &[u8]) -> usize {
  let mut seen = [false; 256];
  let mut count = 0;
  for &v in buf {
    if !seen[v as usize] {
      seen[v as usize] = true;
      count += 1;
    }
  }
  count
}

/// Choose the filter whose output has the fewest distinct byte values.
/// `scratch` must be as long as `row` and holds the winning output on return.
pub fn select_filter(bpp: usize, row: &[u8], prior: Option<&[u8]>, scratch: &mut [u8]) -> FilterType {
  let mut trial = vec![0; row.len()];
  let mut best = FilterType::None;
  let mut best_score = usize::MAX;
  for filter in ALL_FILTERS {
    filter_row(filter, bpp, row, prior, &mut trial);
    let score = distinct_values(&trial);
    // strict comparison keeps the lowest numbered filter on ties
    if score < best_score {
      best = filter;
      best_score = score;
      scratch.copy_from_slice(&trial);
    }
  }
  best
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_rows() -> (Vec<u8>, Vec<u8>) {
    let row: Vec<u8> = (0..24_u32).map(|i| ((i * 37 + 11) % 256) as u8).collect();
    let prior: Vec<u8> = (0..24_u32).map(|i| ((i * 91 + 200) % 256) as u8).collect();
    (row, prior)
  }

  #[test]
  fn paeth_tie_breaking() {
    assert_eq!(paeth_predictor(100, 100, 100), 100);
    assert_eq!(paeth_predictor(0, 0, 0), 0);
    assert_eq!(paeth_predictor(100, 50, 50), 100);
    assert_eq!(paeth_predictor(50, 100, 50), 100);
    assert_eq!(paeth_predictor(50, 50, 100), 50);
    assert_eq!(paeth_predictor(10, 20, 30), 10);
    assert_eq!(paeth_predictor(30, 20, 10), 30);
  }

  #[test]
  fn filter_unfilter_inverse() {
    crate::init_test_logger();
    let (row, prior) = sample_rows();
    for bpp in [1, 2, 3, 4, 6, 8] {
      for filter in ALL_FILTERS {
        for prior in [None, Some(prior.as_slice())] {
          let mut filtered = vec![0; row.len()];
          filter_row(filter, bpp, &row, prior, &mut filtered);
          unfilter_row(filter, bpp, &mut filtered, prior);
          assert_eq!(filtered, row, "filter {:?}, bpp {}, prior {}", filter, bpp, prior.is_some());
        }
      }
    }
  }

  #[test]
  fn row_shorter_than_pixel() {
    let row = [9_u8, 200];
    let prior = [1_u8, 255];
    for filter in ALL_FILTERS {
      let mut filtered = [0; 2];
      filter_row(filter, 4, &row, Some(&prior), &mut filtered);
      unfilter_row(filter, 4, &mut filtered, Some(&prior));
      assert_eq!(filtered, row);
    }
  }

  #[test]
  fn known_filter_outputs() {
    let row = [10_u8, 20, 30, 40, 50, 60];
    let prior = [5_u8, 5, 5, 5, 5, 5];
    let mut out = [0; 6];

    filter_row(FilterType::Sub, 3, &row, None, &mut out);
    assert_eq!(out, [10, 20, 30, 30, 30, 30]);

    filter_row(FilterType::Up, 3, &row, Some(&prior), &mut out);
    assert_eq!(out, [5, 15, 25, 35, 45, 55]);

    filter_row(FilterType::Up, 3, &row, None, &mut out);
    assert_eq!(out, row);

    filter_row(FilterType::Average, 3, &row, Some(&prior), &mut out);
    assert_eq!(out, [8, 18, 28, 33, 38, 43]);

    filter_row(FilterType::Sub, 1, &[5, 3], None, &mut out[..2]);
    assert_eq!(&out[..2], &[5, 254]);
  }

  #[test]
  fn distinct_value_count() {
    assert_eq!(distinct_values(&[]), 0);
    assert_eq!(distinct_values(&[1, 1, 1]), 1);
    assert_eq!(distinct_values(&[0, 255, 0, 7]), 3);
    let all: Vec<u8> = (0..=255).collect();
    assert_eq!(distinct_values(&all), 256);
  }

  #[test]
  fn selection_prefers_lowest_on_tie() {
    // constant row without a prior row scores 1 for None and Up, 2 for the rest
    let row = [7_u8; 12];
    let mut scratch = [0; 12];
    assert_eq!(select_filter(3, &row, None, &mut scratch), FilterType::None);
    assert_eq!(scratch, row);

    // gradient rows collapse under Sub
    let row: Vec<u8> = (0..12).map(|i| i * 3).collect();
    let mut scratch = vec![0; 12];
    assert_eq!(select_filter(1, &row, None, &mut scratch), FilterType::Sub);
    assert_eq!(distinct_values(&scratch), 2);

    // a row equal to its predecessor collapses under Up
    let prior: Vec<u8> = (0..12).map(|i| (i * 41 % 256) as u8).collect();
    assert_eq!(select_filter(1, &prior, Some(&prior), &mut scratch), FilterType::Up);
    assert!(scratch.iter().all(|v| *v == 0));
  }

  #[test]
  fn selection_is_deterministic() {
    let (row, prior) = sample_rows();
    let mut a = vec![0; row.len()];
    let mut b = vec![0; row.len()];
    let first = select_filter(3, &row, Some(&prior), &mut a);
    let second = select_filter(3, &row, Some(&prior), &mut b);
    assert_eq!(first, second);
    assert_eq!(a, b);
  }

  #[test]
  fn filter_tags() {
    assert_eq!(FilterType::try_from_primitive(4).ok(), Some(FilterType::Paeth));
    assert!(FilterType::try_from_primitive(5).is_err());
    assert_eq!(u8::from(FilterType::Average), 3);
  }
}
