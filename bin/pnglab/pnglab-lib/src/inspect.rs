// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use clap::ArgMatches;
use log::debug;
use rawpng::PngImage;
use serde::Serialize;
use std::path::PathBuf;

fn print_output<T: Serialize + ?Sized>(obj: &T, options: &ArgMatches) -> crate::Result<()> {
  if options.get_flag("yaml") {
    let yaml = serde_yaml::to_string(obj)?;
    println!("{}", yaml);
  } else {
    let json = serde_json::to_string_pretty(obj)?;
    println!("{}", json);
  }
  Ok(())
}

/// Entry point for Clap sub command `inspect`
pub fn inspect(options: &ArgMatches) -> crate::Result<()> {
  let in_file: &PathBuf = options.get_one("FILE").expect("FILE not available");
  debug!("Infile: {:?}", in_file);

  if !in_file.exists() {
    return Err(crate::AppError::NotFound(in_file.clone()));
  }
  let image = PngImage::open(in_file)?;
  print_output(&image.info(), options)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rawpng::{BitDepth, ColorType};

  #[test]
  fn info_serializes() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let image = PngImage::new(vec![0; 8], 2, 2, BitDepth::Eight, ColorType::GrayscaleAlpha)?;
    let json = serde_json::to_value(image.info())?;
    assert_eq!(json["width"], 2);
    assert_eq!(json["channels"], 2);
    assert_eq!(json["color_type"], "GrayscaleAlpha");
    assert!(json["density"].is_null());
    let yaml = serde_yaml::to_string(&image.info())?;
    assert!(yaml.contains("bit_depth: 8"));
    Ok(())
  }
}
