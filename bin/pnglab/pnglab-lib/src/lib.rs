// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::path::PathBuf;

use rawpng::PngError;
use thiserror::Error;

pub mod app;
pub mod convert;
pub mod inspect;

#[derive(Error, Debug)]
pub enum AppError {
  #[error("{}", _0)]
  General(String),
  #[error("Invalid arguments: {}", _0)]
  InvalidCmdSwitch(String),
  #[error("I/O error: {}", _0)]
  Io(#[from] std::io::Error),
  #[error("Not found: {}", _0.display())]
  NotFound(PathBuf),
  #[error("Already exists: {}", _0.display())]
  AlreadyExists(PathBuf),
  #[error("Decoder failed: {}", _0)]
  DecoderFailed(String),
  #[error("Encoder failed: {}", _0)]
  EncoderFailed(String),
  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for AppError {
  fn from(value: serde_json::Error) -> Self {
    anyhow::Error::new(value).into()
  }
}

impl From<serde_yaml::Error> for AppError {
  fn from(value: serde_yaml::Error) -> Self {
    anyhow::Error::new(value).into()
  }
}

impl From<PngError> for AppError {
  fn from(value: PngError) -> Self {
    match value {
      PngError::Io(err) => Self::Io(err),
      PngError::FileIo { path, source } if source.kind() == std::io::ErrorKind::NotFound => Self::NotFound(path),
      PngError::FileIo { path, source } => Self::General(format!("{}: {}", path.display(), source)),
      PngError::InvalidArgument(msg) => Self::EncoderFailed(msg),
      err if err.is_format() => Self::DecoderFailed(err.to_string()),
      err => anyhow::Error::new(err).into(),
    }
  }
}

pub type Result<T> = std::result::Result<T, AppError>;
