// 该文件是 Nominal （面值识别） 项目的一部分。
// src/input/image_directory.rs - 图像目录输入
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::{
  path::{Path, PathBuf},
  thread,
  time::Duration,
};

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Error, Debug)]
pub enum ImageDirectoryInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("参数格式错误: {0}")]
  InvalidParam(String),
  #[error("目录中没有图像: {0}")]
  Empty(PathBuf),
}

/// 按文件名顺序读取目录中的图片，模拟相机帧流
///
/// `folder:///path/to/frames?interval_ms=33`，`interval_ms` 为两帧之间的间隔。
/// 无法解码的文件记录警告后跳过。
pub struct ImageDirectoryInput {
  paths: std::vec::IntoIter<PathBuf>,
  interval: Option<Duration>,
  started: bool,
}

fn is_image(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| {
      IMAGE_EXTENSIONS
        .iter()
        .any(|known| ext.eq_ignore_ascii_case(known))
    })
    .unwrap_or(false)
}

impl ImageDirectoryInput {
  pub fn open(
    dir: impl AsRef<Path>,
    interval: Option<Duration>,
  ) -> Result<Self, ImageDirectoryInputError> {
    let dir = dir.as_ref();
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
      let path = entry?.path();
      if path.is_file() && is_image(&path) {
        paths.push(path);
      }
    }
    if paths.is_empty() {
      error!("目录中没有图像: {}", dir.display());
      return Err(ImageDirectoryInputError::Empty(dir.to_path_buf()));
    }
    paths.sort();
    info!("图像目录 {} 共 {} 帧", dir.display(), paths.len());

    Ok(Self {
      paths: paths.into_iter(),
      interval,
      started: false,
    })
  }

  pub fn remaining(&self) -> usize {
    self.paths.len()
  }
}

impl FromUrlWithScheme for ImageDirectoryInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for ImageDirectoryInput {
  type Error = ImageDirectoryInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageDirectoryInputError::SchemeMismatch);
    }

    let mut interval = None;
    for (k, v) in url.query_pairs() {
      if k == "interval_ms" {
        let ms = v
          .parse::<u64>()
          .map_err(|_| ImageDirectoryInputError::InvalidParam(format!("interval_ms '{}'", v)))?;
        interval = Some(Duration::from_millis(ms));
      }
    }

    Self::open(url.path(), interval)
  }
}

impl Iterator for ImageDirectoryInput {
  type Item = RgbImage;

  fn next(&mut self) -> Option<Self::Item> {
    for path in self.paths.by_ref() {
      if self.started {
        if let Some(interval) = self.interval {
          thread::sleep(interval);
        }
      }
      self.started = true;

      let image = ImageReader::open(&path)
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.decode());
      match image {
        Ok(image) => {
          debug!("读取帧: {}", path.display());
          return Some(image.to_rgb8());
        }
        Err(e) => warn!("跳过无法解码的文件 {}: {}", path.display(), e),
      }
    }
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  fn write_frames(dir: &Path) {
    for (name, value) in [("b.png", 20u8), ("a.png", 10), ("c.jpg", 30)] {
      RgbImage::from_pixel(4, 4, Rgb([value, value, value]))
        .save(dir.join(name))
        .unwrap();
    }
    std::fs::write(dir.join("notes.txt"), "not an image").unwrap();
    std::fs::write(dir.join("broken.png"), "not a png").unwrap();
  }

  #[test]
  fn test_sorted_frames_skip_broken() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path());

    let input = ImageDirectoryInput::open(dir.path(), None).unwrap();
    assert_eq!(input.remaining(), 4);
    let frames: Vec<RgbImage> = input.collect();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].get_pixel(0, 0)[0], 10);
    assert_eq!(frames[1].get_pixel(0, 0)[0], 20);
  }

  #[test]
  fn test_from_url_with_interval() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path());
    let url = Url::parse(&format!("folder://{}?interval_ms=1", dir.path().display())).unwrap();
    let input = ImageDirectoryInput::from_url(&url).unwrap();
    assert_eq!(input.interval, Some(Duration::from_millis(1)));
  }

  #[test]
  fn test_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
      ImageDirectoryInput::open(dir.path(), None),
      Err(ImageDirectoryInputError::Empty(_))
    ));
  }

  #[test]
  fn test_invalid_interval() {
    let url = Url::parse("folder:///tmp?interval_ms=fast").unwrap();
    assert!(matches!(
      ImageDirectoryInput::from_url(&url),
      Err(ImageDirectoryInputError::InvalidParam(_))
    ));
  }
}
