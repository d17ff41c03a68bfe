// 该文件是 Xunlu （巡路拾遗） 项目的一部分。
// src/detector/decode.rs - 输出张量解码
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

use thiserror::Error;

use crate::detector::Detection;
use crate::model::ModelDescriptor;

/// 解码错误
#[derive(Error, Debug)]
pub enum DecodeError {
  #[error("输出张量长度与模型描述不符: 期望 {expected}, 实际 {actual}")]
  ShapeMismatch { expected: usize, actual: usize },
}

/// 把 [A, N] 输出张量解码为原图像素空间的候选框，未排序未抑制。
///
/// 张量按行主序排布，第 r 行第 i 个元素位于 output[r * N + i]，
/// 按候选框逐列读取即可，无需实际转置。
/// 前 4 行是边界框中心与宽高（相对输入尺寸的比例），
/// 其余行是各类别分数，只有严格大于阈值的最高分才会产生候选框。
pub fn decode(
  output: &[f32],
  descriptor: &ModelDescriptor,
  orig_width: u32,
  orig_height: u32,
  confidence_threshold: f32,
) -> Result<Vec<Detection>, DecodeError> {
  if output.len() != descriptor.output_len() {
    return Err(DecodeError::ShapeMismatch {
      expected: descriptor.output_len(),
      actual: output.len(),
    });
  }

  let n = descriptor.candidates();
  let labels = descriptor.labels();
  let ow = orig_width as f32;
  let oh = orig_height as f32;

  let mut candidates = Vec::new();

  for i in 0..n {
    // 取分数最高的类别，分数相同取先出现者
    let mut best_class = 0usize;
    let mut best_score = output[4 * n + i];
    for class in 1..labels.len() {
      let score = output[(4 + class) * n + i];
      if score > best_score {
        best_score = score;
        best_class = class;
      }
    }

    // 等于阈值的分数不通过
    if best_score > confidence_threshold {
      let cx = output[i];
      let cy = output[n + i];
      let w = output[2 * n + i];
      let h = output[3 * n + i];

      // 几何量含 NaN 或无穷时丢弃该候选框，
      // 否则后续 clamp 会以 NaN 作为边界而崩溃
      if !(cx.is_finite() && cy.is_finite() && w.is_finite() && h.is_finite()) {
        continue;
      }

      // 中心点转左上角，换算到原图像素
      let xmin = (cx - w / 2.0) * ow;
      let ymin = (cy - h / 2.0) * oh;

      // 左上角限制在图像内，宽高裁剪到不越出图像边界
      let safe_x = xmin.clamp(0.0, (ow - 1.0).max(0.0));
      let safe_y = ymin.clamp(0.0, (oh - 1.0).max(0.0));
      let safe_w = (w * ow).clamp(0.0, ow - safe_x);
      let safe_h = (h * oh).clamp(0.0, oh - safe_y);

      candidates.push(Detection {
        label: labels[best_class].clone(),
        confidence: best_score * 100.0,
        bbox_x: safe_x as u32,
        bbox_y: safe_y as u32,
        bbox_width: safe_w as u32,
        bbox_height: safe_h as u32,
      });
    }
  }

  Ok(candidates)
}
