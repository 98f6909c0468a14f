// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use fern::colors::{Color, ColoredLevelConfig};
use pnglab_lib::{app, convert, inspect};

/// Main entry function
///
/// We initialize the fern logger here, create a Clap command line
/// parser and dispatch to the sub command.
fn main() -> anyhow::Result<()> {
  let app = app::create_app();
  let matches = app.try_get_matches().unwrap_or_else(|e| e.exit());

  let colors = ColoredLevelConfig::new().debug(Color::Magenta);
  fern::Dispatch::new()
    .chain(std::io::stderr())
    .level({
      match matches.get_count("debug") {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
      }
    })
    .format(move |out, message, record| {
      out.finish(format_args!(
        "[{:6}][{}] {} ({}:{})",
        colors.color(record.level()),
        record.target(),
        message,
        record.file().unwrap_or("<undefined>"),
        record.line().unwrap_or(0)
      ))
    })
    .apply()
    .expect("Invalid fern configuration, exiting");

  match matches.subcommand() {
    Some(("inspect", sc)) => inspect::inspect(sc)?,
    Some(("encode", sc)) => convert::encode(sc)?,
    Some(("decode", sc)) => convert::decode(sc)?,
    Some(("recompress", sc)) => convert::recompress(sc)?,
    _ => panic!("Unknown subcommand was used"),
  }
  Ok(())
}
