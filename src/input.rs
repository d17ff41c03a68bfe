// 该文件是 Xunlu （巡路拾遗） 项目的一部分。
// src/input.rs - 静态图片输入
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::Path;

use image::ImageReader;
use thiserror::Error;
use tracing::debug;

use crate::frame::Frame;

/// 输入错误
#[derive(Error, Debug)]
pub enum InputError {
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("图片解码失败: {0}")]
  Image(#[from] image::ImageError),
}

/// 图片文件输入源，打开后恰好产出一帧。
/// 对应相册选图的单张工作流。
#[derive(Debug)]
pub struct ImageSource {
  frame: Option<Frame>,
}

impl ImageSource {
  pub fn open(path: impl AsRef<Path>) -> Result<Self, InputError> {
    let path = path.as_ref();
    let image = ImageReader::open(path)?.decode()?;
    debug!("已解码图片: {}", path.display());

    Ok(Self {
      frame: Some(Frame::new(image.into())),
    })
  }
}

impl Iterator for ImageSource {
  type Item = Frame;

  fn next(&mut self) -> Option<Self::Item> {
    self.frame.take()
  }
}

#[cfg(test)]
mod tests {
  use image::{Rgb, RgbImage};

  use super::*;

  fn temp_png(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("xunlu-input-test-{name}.png"));
    RgbImage::from_pixel(6, 4, Rgb([10, 20, 30]))
      .save(&path)
      .expect("写入测试图片应当成功");
    path
  }

  #[test]
  fn open_decodes_one_frame() {
    let path = temp_png("decode");
    let mut source = ImageSource::open(&path).expect("打开应当成功");

    let frame = source.next().expect("应当有一帧");
    assert_eq!((frame.width(), frame.height()), (6, 4));
    assert_eq!(frame.image.get_pixel(0, 0), &Rgb([10, 20, 30]));
    assert!(source.next().is_none());

    let _ = std::fs::remove_file(path);
  }

  #[test]
  fn open_missing_file_is_io_error() {
    let err = ImageSource::open("/nonexistent/xunlu-missing.png").unwrap_err();
    assert!(matches!(err, InputError::Io(_)));
  }

  #[test]
  fn open_non_image_file_is_decode_error() {
    let path = std::env::temp_dir().join("xunlu-input-test-not-image.png");
    std::fs::write(&path, b"not an image").expect("写入测试文件应当成功");

    let err = ImageSource::open(&path).unwrap_err();
    assert!(matches!(err, InputError::Image(_)));

    let _ = std::fs::remove_file(path);
  }
}
