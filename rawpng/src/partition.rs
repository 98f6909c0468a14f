// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::ops::Range;

/// Number of workers for filtering `height` rows with `available` threads.
/// Falls back to a single worker if there are fewer rows than threads.
pub fn worker_count(height: usize, available: usize) -> usize {
  if available <= 1 || height < available { 1 } else { available }
}

/// Contiguous group of rows handed to one worker
#[derive(Debug, Clone)]
pub struct RowPartition<'a> {
  pub index: usize,
  pub rows: Range<usize>,
  /// Raw pixel rows of this group
  pub data: &'a [u8],
  /// Raw row immediately above the first row of the group
  pub prior: Option<&'a [u8]>,
}

/// Split an image into row groups whose sizes differ by at most one row
pub struct RowPartitioner<'a> {
  data: &'a [u8],
  row_bytes: usize,
  height: usize,
  parts: Range<usize>,
  count: usize,
}

impl<'a> RowPartitioner<'a> {
  pub fn new(data: &'a [u8], row_bytes: usize, height: usize, count: usize) -> Self {
    assert!(data.len() >= height * row_bytes);
    let count = count.clamp(1, height.max(1));
    Self {
      data,
      row_bytes,
      height,
      parts: Range { start: 0, end: count },
      count,
    }
  }

  pub fn partition_count(&self) -> usize {
    self.count
  }

  fn first_row(&self, part: usize) -> usize {
    let base = self.height / self.count;
    let extra = self.height % self.count;
    part * base + part.min(extra)
  }
}

impl<'a> Iterator for RowPartitioner<'a> {
  type Item = RowPartition<'a>;

  fn next(&mut self) -> Option<Self::Item> {
    let i = self.parts.next()?;
    let start = self.first_row(i);
    let end = self.first_row(i + 1);
    let prior = if start == 0 {
      None
    } else {
      Some(&self.data[(start - 1) * self.row_bytes..start * self.row_bytes])
    };
    Some(RowPartition {
      index: i,
      rows: start..end,
      data: &self.data[start * self.row_bytes..end * self.row_bytes],
      prior,
    })
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.parts.len(), Some(self.parts.len()))
  }
}

impl<'a> ExactSizeIterator for RowPartitioner<'a> {}
