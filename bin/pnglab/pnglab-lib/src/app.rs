// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::path::PathBuf;

use clap::builder::{NonEmptyStringValueParser, PossibleValuesParser, TypedValueParser};
use clap::{Arg, ArgAction, ArgGroup, Command, crate_version, value_parser};
use log::debug;
use rawpng::{ColorType, CompressionLevel, DensityUnit};

pub fn create_app() -> Command {
  debug!("Creating CLAP app configuration");
  Command::new("pnglab")
    .version(crate_version!())
    .author("Daniel V. <daniel@chaospixel.com>")
    .about("PNGLab - Encode raw pixel buffers to PNG and back")
    .subcommand_required(true)
    .arg_required_else_help(true)
    .arg(
      Arg::new("debug")
        .short('d')
        .action(ArgAction::Count)
        .global(true)
        .help("Sets the level of debugging information"),
    )
    .subcommand(
      Command::new("inspect")
        .about("Print image metadata")
        .arg(Arg::new("json").long("json").action(ArgAction::SetTrue).help("Format metadata as JSON"))
        .arg(Arg::new("yaml").long("yaml").action(ArgAction::SetTrue).help("Format metadata as YAML"))
        .group(ArgGroup::new("format").args(["json", "yaml"]))
        .arg(input_arg("FILE", "Input file")),
    )
    .subcommand(
      Command::new("encode")
        .about("Encode a raw pixel dump into a PNG file")
        .arg(
          Arg::new("width")
            .long("width")
            .required(true)
            .value_parser(value_parser!(u32).range(1..))
            .help("Image width in pixels"),
        )
        .arg(
          Arg::new("height")
            .long("height")
            .required(true)
            .value_parser(value_parser!(u32).range(1..))
            .help("Image height in pixels"),
        )
        .arg(
          Arg::new("depth")
            .long("depth")
            .default_value("8")
            .value_parser(PossibleValuesParser::new(["8", "16"]))
            .help("Bits per sample, 16 bit samples are read big-endian"),
        )
        .arg(
          Arg::new("color")
            .long("color")
            .default_value("rgb")
            .value_parser(ColorTypeArgParser)
            .help("Color type: gray, graya, rgb or rgba"),
        )
        .arg(Arg::new("ppu_x").long("ppu-x").value_parser(value_parser!(u32)).requires("ppu_y").help("Horizontal pixels per unit"))
        .arg(Arg::new("ppu_y").long("ppu-y").value_parser(value_parser!(u32)).requires("ppu_x").help("Vertical pixels per unit"))
        .arg(
          Arg::new("unit")
            .long("unit")
            .default_value("meter")
            .value_parser(DensityUnitArgParser)
            .help("Unit for pixels per unit: 'none' or 'meter'"),
        )
        .arg(compression_arg())
        .arg(override_arg())
        .arg(input_arg("INPUT", "Raw pixel file"))
        .arg(output_arg()),
    )
    .subcommand(
      Command::new("decode")
        .about("Decode a PNG file into a raw pixel dump")
        .arg(override_arg())
        .arg(input_arg("INPUT", "Input file"))
        .arg(output_arg()),
    )
    .subcommand(
      Command::new("recompress")
        .about("Decode a PNG file and encode it again")
        .arg(compression_arg())
        .arg(override_arg())
        .arg(input_arg("INPUT", "Input file"))
        .arg(output_arg()),
    )
}

fn input_arg(name: &'static str, help: &'static str) -> Arg {
  Arg::new(name).required(true).value_parser(value_parser!(PathBuf)).help(help)
}

fn output_arg() -> Arg {
  Arg::new("OUTPUT").required(true).value_parser(value_parser!(PathBuf)).help("Output file")
}

fn override_arg() -> Arg {
  Arg::new("override").short('f').long("override").action(ArgAction::SetTrue).help("Override existing files")
}

fn compression_arg() -> Arg {
  Arg::new("compression")
    .short('c')
    .long("compression")
    .default_value("default")
    .value_parser(CompressionLevelArgParser)
    .help("'none', 'fast', 'default' or 'best'")
}

#[derive(Clone)]
pub struct CompressionLevelArgParser;

impl TypedValueParser for CompressionLevelArgParser {
  type Value = CompressionLevel;

  fn parse_ref(&self, cmd: &Command, arg: Option<&Arg>, value: &std::ffi::OsStr) -> std::result::Result<Self::Value, clap::Error> {
    let val = NonEmptyStringValueParser::new().parse_ref(cmd, arg, value)?;
    CompressionLevel::from_name(&val)
      .ok_or_else(|| clap::Error::raw(clap::error::ErrorKind::InvalidValue, format!("'{}' is not a valid compression level\n", val)))
  }
}

#[derive(Clone)]
pub struct ColorTypeArgParser;

impl TypedValueParser for ColorTypeArgParser {
  type Value = ColorType;

  fn parse_ref(&self, cmd: &Command, arg: Option<&Arg>, value: &std::ffi::OsStr) -> std::result::Result<Self::Value, clap::Error> {
    let val = NonEmptyStringValueParser::new().parse_ref(cmd, arg, value)?;
    ColorType::from_name(&val).ok_or_else(|| clap::Error::raw(clap::error::ErrorKind::InvalidValue, format!("'{}' is not a valid color type\n", val)))
  }
}

#[derive(Clone)]
pub struct DensityUnitArgParser;

impl TypedValueParser for DensityUnitArgParser {
  type Value = DensityUnit;

  fn parse_ref(&self, cmd: &Command, arg: Option<&Arg>, value: &std::ffi::OsStr) -> std::result::Result<Self::Value, clap::Error> {
    let val = NonEmptyStringValueParser::new().parse_ref(cmd, arg, value)?;
    match val.as_str() {
      "none" | "unspecified" => Ok(DensityUnit::Unspecified),
      "meter" | "m" => Ok(DensityUnit::Meter),
      _ => Err(clap::Error::raw(clap::error::ErrorKind::InvalidValue, format!("'{}' is not a valid density unit\n", val))),
    }
  }
}
