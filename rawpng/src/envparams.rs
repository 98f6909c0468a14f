// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use log::warn;

pub(crate) fn rawpng_filter_threads() -> Option<usize> {
  match std::env::var("RAWPNG_FILTER_THREADS").map(|val| val.parse::<usize>()) {
    Ok(Ok(0)) => {
      warn!("RAWPNG_FILTER_THREADS must be at least 1");
      None
    }
    Ok(Ok(value)) => Some(value),
    Ok(Err(_)) => {
      warn!("Invalid value for RAWPNG_FILTER_THREADS");
      None
    }
    Err(_) => None,
  }
}

pub(crate) fn rawpng_verify_crc() -> bool {
  match std::env::var("RAWPNG_VERIFY_CRC").map(|val| val.parse::<u32>()) {
    Ok(Ok(value)) => value != 0,
    Ok(Err(_)) => {
      warn!("Invalid value for RAWPNG_VERIFY_CRC");
      true
    }
    Err(_) => true,
  }
}

pub(crate) fn rawpng_pattern_scan() -> bool {
  match std::env::var("RAWPNG_PATTERN_SCAN").map(|val| val.parse::<u32>()) {
    Ok(Ok(value)) => value == 1,
    Ok(Err(_)) => {
      warn!("Invalid value for RAWPNG_PATTERN_SCAN");
      false
    }
    Err(_) => false,
  }
}
