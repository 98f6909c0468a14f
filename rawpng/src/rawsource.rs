// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{
  fmt::Debug,
  fs::File,
  io::Read,
  ops::Deref,
  path::{Path, PathBuf},
  sync::Arc,
};

use log::debug;
use memmap2::MmapOptions;

use crate::{PngError, Result};

/// Complete byte content of an encoded image, either mapped from disk
/// or held in memory.
pub struct PngSource {
  path: PathBuf,
  inner: PngSourceImpl,
}

enum PngSourceImpl {
  Memmap(memmap2::Mmap),
  Memory(Arc<Vec<u8>>),
}

impl PngSource {
  pub fn new(path: &Path) -> Result<Self> {
    let file = File::open(path).map_err(|err| PngError::with_io_error(path, err))?;
    let len = file.metadata().map_err(|err| PngError::with_io_error(path, err))?.len();
    // zero length files can't be mapped
    let inner = if len == 0 {
      PngSourceImpl::Memory(Arc::new(Vec::new()))
    } else {
      let mmap = unsafe { MmapOptions::new().populate().map(&file) }.map_err(|err| PngError::with_io_error(path, err))?;
      #[cfg(unix)]
      {
        mmap.advise(memmap2::Advice::Sequential).map_err(|err| PngError::with_io_error(path, err))?;
      }
      PngSourceImpl::Memmap(mmap)
    };
    debug!("Opened {:?} with {} bytes", path, len);
    Ok(Self {
      path: path.canonicalize().unwrap_or_else(|_| path.to_owned()),
      inner,
    })
  }

  /// Consume a reader until EOF
  pub fn from_reader(reader: &mut dyn Read) -> Result<Self> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(Self::from_vec(buf))
  }

  pub fn from_vec(buf: Vec<u8>) -> Self {
    Self {
      path: PathBuf::default(),
      inner: PngSourceImpl::Memory(Arc::new(buf)),
    }
  }

  pub fn buf(&self) -> &[u8] {
    self.deref()
  }
}

impl Deref for PngSource {
  type Target = [u8];

  fn deref(&self) -> &Self::Target {
    match &self.inner {
      PngSourceImpl::Memmap(mmap) => mmap.deref(),
      PngSourceImpl::Memory(mem) => mem.deref(),
    }
  }
}

impl Debug for PngSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PngSource").field("path", &self.path).field("len", &self.len()).finish()
  }
}
