// 该文件是 Xunlu （巡路拾遗） 项目的一部分。
// src/frame.rs - 图像帧定义
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

use image::{RgbImage, imageops};

/// 帧转正所需的顺时针旋转角度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
  #[default]
  Deg0,
  Deg90,
  Deg180,
  Deg270,
}

impl Rotation {
  /// 从角度构造旋转，角度先归一化到 [0, 360)。
  /// 仅支持 90 度的整数倍，其余返回 None。
  pub fn from_degrees(degrees: i32) -> Option<Rotation> {
    match degrees.rem_euclid(360) {
      0 => Some(Rotation::Deg0),
      90 => Some(Rotation::Deg90),
      180 => Some(Rotation::Deg180),
      270 => Some(Rotation::Deg270),
      _ => None,
    }
  }

  pub fn degrees(&self) -> u32 {
    match self {
      Rotation::Deg0 => 0,
      Rotation::Deg90 => 90,
      Rotation::Deg180 => 180,
      Rotation::Deg270 => 270,
    }
  }
}

/// 帧数据
#[derive(Clone, Debug)]
pub struct Frame {
  /// RGB 图像数据
  pub image: RgbImage,
  /// 转正所需的顺时针旋转角度
  pub rotation: Rotation,
}

impl Frame {
  /// 创建一个已经是正向的帧
  pub fn new(image: RgbImage) -> Self {
    Self {
      image,
      rotation: Rotation::Deg0,
    }
  }

  /// 创建一个携带旋转元数据的帧
  pub fn with_rotation(image: RgbImage, rotation: Rotation) -> Self {
    Self { image, rotation }
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn is_empty(&self) -> bool {
    self.width() == 0 || self.height() == 0
  }

  /// 按旋转元数据将像素转正。90/270 度时宽高互换。
  pub fn into_upright(self) -> Frame {
    let image = match self.rotation {
      Rotation::Deg0 => self.image,
      Rotation::Deg90 => imageops::rotate90(&self.image),
      Rotation::Deg180 => imageops::rotate180(&self.image),
      Rotation::Deg270 => imageops::rotate270(&self.image),
    };

    Frame {
      image,
      rotation: Rotation::Deg0,
    }
  }
}

#[cfg(test)]
mod tests {
  use image::Rgb;

  use super::*;

  fn two_pixel_row() -> RgbImage {
    let mut image = RgbImage::new(2, 1);
    image.put_pixel(0, 0, Rgb([255, 0, 0]));
    image.put_pixel(1, 0, Rgb([0, 255, 0]));
    image
  }

  #[test]
  fn rotation_from_degrees_accepts_quarter_turns() {
    assert_eq!(Rotation::from_degrees(0), Some(Rotation::Deg0));
    assert_eq!(Rotation::from_degrees(90), Some(Rotation::Deg90));
    assert_eq!(Rotation::from_degrees(180), Some(Rotation::Deg180));
    assert_eq!(Rotation::from_degrees(270), Some(Rotation::Deg270));
  }

  #[test]
  fn rotation_from_degrees_normalizes_angle() {
    assert_eq!(Rotation::from_degrees(450), Some(Rotation::Deg90));
    assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Deg270));
    assert_eq!(Rotation::from_degrees(720), Some(Rotation::Deg0));
  }

  #[test]
  fn rotation_from_degrees_rejects_other_angles() {
    assert_eq!(Rotation::from_degrees(45), None);
    assert_eq!(Rotation::from_degrees(91), None);
  }

  #[test]
  fn upright_without_rotation_keeps_pixels() {
    let frame = Frame::new(two_pixel_row()).into_upright();
    assert_eq!((frame.width(), frame.height()), (2, 1));
    assert_eq!(frame.image.get_pixel(0, 0), &Rgb([255, 0, 0]));
    assert_eq!(frame.rotation, Rotation::Deg0);
  }

  #[test]
  fn upright_quarter_turn_swaps_dimensions() {
    let frame = Frame::with_rotation(two_pixel_row(), Rotation::Deg90).into_upright();
    assert_eq!((frame.width(), frame.height()), (1, 2));
    // 顺时针旋转后左端像素移到顶端
    assert_eq!(frame.image.get_pixel(0, 0), &Rgb([255, 0, 0]));
    assert_eq!(frame.image.get_pixel(0, 1), &Rgb([0, 255, 0]));
    assert_eq!(frame.rotation, Rotation::Deg0);
  }

  #[test]
  fn upright_half_turn_reverses_pixels() {
    let frame = Frame::with_rotation(two_pixel_row(), Rotation::Deg180).into_upright();
    assert_eq!((frame.width(), frame.height()), (2, 1));
    assert_eq!(frame.image.get_pixel(0, 0), &Rgb([0, 255, 0]));
    assert_eq!(frame.image.get_pixel(1, 0), &Rgb([255, 0, 0]));
  }

  #[test]
  fn upright_three_quarter_turn_matches_counterclockwise() {
    let frame = Frame::with_rotation(two_pixel_row(), Rotation::Deg270).into_upright();
    assert_eq!((frame.width(), frame.height()), (1, 2));
    assert_eq!(frame.image.get_pixel(0, 0), &Rgb([0, 255, 0]));
    assert_eq!(frame.image.get_pixel(0, 1), &Rgb([255, 0, 0]));
  }
}
