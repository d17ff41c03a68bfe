// 该文件是 Xunlu （巡路拾遗） 项目的一部分。
// src/detector/preprocess.rs - 帧预处理
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

use image::imageops::{self, FilterType};
use thiserror::Error;

use crate::frame::Frame;

/// 预处理错误
#[derive(Error, Debug)]
pub enum PrepareError {
  #[error("输入帧为空")]
  EmptyFrame,
}

/// 把帧缩放到 side × side 并归一化为 RGB 浮点缓冲区。
/// 输出按行主序排列，每像素三个通道，取值为字节值除以 255。
/// 直接拉伸到方形输入，不保持纵横比，也不做 letterbox 填充。
pub fn prepare(frame: &Frame, input_side: u32) -> Result<Vec<f32>, PrepareError> {
  if frame.is_empty() {
    return Err(PrepareError::EmptyFrame);
  }

  let resized = imageops::resize(&frame.image, input_side, input_side, FilterType::Triangle);

  Ok(
    resized
      .into_raw()
      .into_iter()
      .map(|v| v as f32 / 255.0)
      .collect(),
  )
}
