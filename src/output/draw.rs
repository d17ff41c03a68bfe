// 该文件是 Xunlu （巡路拾遗） 项目的一部分。
// src/output/draw.rs - 检测结果标注
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

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use thiserror::Error;

use crate::detector::Detection;

/// 标注错误
#[derive(Error, Debug)]
pub enum DrawError {
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("字体数据无效")]
  InvalidFont,
}

/// 把检测框与标签画到图像上。
/// 未加载字体时只画框不写字。
#[derive(Debug)]
pub struct Visualizer {
  font: Option<FontArc>,
  font_scale: PxScale,
}

impl Default for Visualizer {
  fn default() -> Self {
    Self::new()
  }
}

impl Visualizer {
  pub fn new() -> Self {
    Self {
      font: None,
      font_scale: PxScale::from(16.0),
    }
  }

  /// 从字体文件加载标签字体
  pub fn with_font_path(self, path: impl AsRef<Path>) -> Result<Self, DrawError> {
    let data = std::fs::read(path)?;
    self.with_font_bytes(data)
  }

  pub fn with_font_bytes(mut self, data: Vec<u8>) -> Result<Self, DrawError> {
    let font = FontArc::try_from_vec(data).map_err(|_| DrawError::InvalidFont)?;
    self.font = Some(font);
    Ok(self)
  }

  /// 由标签文本导出稳定的框颜色，同一标签总是同色
  fn label_color(label: &str) -> Rgb<u8> {
    let hash = label
      .bytes()
      .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    hsv_to_rgb((hash % 360) as f32, 0.8, 0.9)
  }

  /// 在图像上绘制检测结果
  pub fn draw_detections(&self, image: &mut RgbImage, detections: &[Detection]) {
    for detection in detections {
      let color = Self::label_color(&detection.label);

      let x = detection.bbox_x as i32;
      let y = detection.bbox_y as i32;
      let width = detection.bbox_width;
      let height = detection.bbox_height;

      if width > 0 && height > 0 {
        let rect = Rect::at(x, y).of_size(width, height);
        draw_hollow_rect_mut(image, rect, color);

        // 双层边框增强可见度
        if width > 2 && height > 2 {
          let inner = Rect::at(x + 1, y + 1).of_size(width - 2, height - 2);
          draw_hollow_rect_mut(image, inner, color);
        }
      }

      if let Some(font) = &self.font {
        let label = format!("{}: {:.1}%", detection.label, detection.confidence);
        let text_y = (y - 20).max(0);
        draw_text_mut(image, color, x, text_y, self.font_scale, font, &label);
      }
    }
  }
}

/// HSV 转 RGB
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
  let c = v * s;
  let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
  let m = v - c;

  let (r, g, b) = if h < 60.0 {
    (c, x, 0.0)
  } else if h < 120.0 {
    (x, c, 0.0)
  } else if h < 180.0 {
    (0.0, c, x)
  } else if h < 240.0 {
    (0.0, x, c)
  } else if h < 300.0 {
    (x, 0.0, c)
  } else {
    (c, 0.0, x)
  };

  Rgb([
    ((r + m) * 255.0) as u8,
    ((g + m) * 255.0) as u8,
    ((b + m) * 255.0) as u8,
  ])
}
