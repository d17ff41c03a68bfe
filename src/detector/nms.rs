// 该文件是 Xunlu （巡路拾遗） 项目的一部分。
// src/detector/nms.rs - 非极大值抑制
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

use crate::detector::Detection;

/// 贪心非极大值抑制。
///
/// 候选框按置信度降序稳定排序（同分保持原有顺序），依次保留，
/// 每保留一个就剔除与其 IoU 超过阈值的后续候选框。
/// 抑制跨类别全局进行，高置信度框会压掉不同类别的重叠框。
pub fn suppress(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
  candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

  let mut active = vec![true; candidates.len()];
  let mut result = Vec::new();

  for i in 0..candidates.len() {
    if !active[i] {
      continue;
    }
    result.push(candidates[i].clone());

    for j in (i + 1)..candidates.len() {
      if active[j] && iou(&candidates[i], &candidates[j]) > iou_threshold {
        active[j] = false;
      }
    }
  }

  result
}

/// 轴对齐矩形的交并比，并集面积非正时返回 0
pub fn iou(a: &Detection, b: &Detection) -> f32 {
  let x1 = (a.bbox_x as f32).max(b.bbox_x as f32);
  let y1 = (a.bbox_y as f32).max(b.bbox_y as f32);
  let x2 = ((a.bbox_x + a.bbox_width) as f32).min((b.bbox_x + b.bbox_width) as f32);
  let y2 = ((a.bbox_y + a.bbox_height) as f32).min((b.bbox_y + b.bbox_height) as f32);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = (a.bbox_width * a.bbox_height) as f32;
  let area_b = (b.bbox_width * b.bbox_height) as f32;
  let union = area_a + area_b - intersection;

  if union > 0.0 { intersection / union } else { 0.0 }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn det(label: &str, confidence: f32, x: u32, y: u32, w: u32, h: u32) -> Detection {
    Detection {
      label: label.to_string(),
      confidence,
      bbox_x: x,
      bbox_y: y,
      bbox_width: w,
      bbox_height: h,
    }
  }

  #[test]
  fn iou_of_identical_boxes_is_one() {
    let a = det("d00", 90.0, 10, 10, 20, 20);
    assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
  }

  #[test]
  fn iou_of_disjoint_boxes_is_zero() {
    let a = det("d00", 90.0, 0, 0, 10, 10);
    let b = det("d00", 80.0, 50, 50, 10, 10);
    assert_eq!(iou(&a, &b), 0.0);
  }

  #[test]
  fn iou_of_half_overlap() {
    // 两个 10x10 的框水平错开 5 像素，交 50，并 150
    let a = det("d00", 90.0, 0, 0, 10, 10);
    let b = det("d00", 80.0, 5, 0, 10, 10);
    assert!((iou(&a, &b) - 50.0 / 150.0).abs() < 1e-6);
  }

  #[test]
  fn iou_of_zero_area_boxes_is_zero() {
    let a = det("d00", 90.0, 10, 10, 0, 0);
    let b = det("d00", 80.0, 10, 10, 0, 0);
    assert_eq!(iou(&a, &b), 0.0);
  }

  #[test]
  fn suppress_removes_overlapping_same_label() {
    // IoU 0.6 > 0.45，仅保留高置信度框
    let kept = det("d00", 90.0, 0, 0, 30, 40);
    let dropped = det("d00", 70.0, 0, 10, 30, 40);
    assert!(iou(&kept, &dropped) > 0.45);

    let result = suppress(vec![dropped, kept.clone()], 0.45);
    assert_eq!(result, vec![kept]);
  }

  #[test]
  fn suppress_is_global_across_labels() {
    // 不同类别的重叠框同样被抑制
    let kept = det("d00", 90.0, 0, 0, 30, 40);
    let dropped = det("d10", 70.0, 0, 10, 30, 40);

    let result = suppress(vec![dropped, kept.clone()], 0.45);
    assert_eq!(result, vec![kept]);
  }

  #[test]
  fn suppress_keeps_disjoint_boxes() {
    let a = det("d00", 90.0, 0, 0, 10, 10);
    let b = det("d10", 70.0, 50, 50, 10, 10);

    let result = suppress(vec![b.clone(), a.clone()], 0.45);
    assert_eq!(result, vec![a, b]);
  }

  #[test]
  fn suppress_keeps_boxes_at_threshold_iou() {
    // IoU 恰好等于阈值时不抑制（严格大于才剔除）
    let a = det("d00", 90.0, 0, 0, 10, 10);
    let b = det("d00", 80.0, 5, 0, 10, 10);
    let threshold = iou(&a, &b);

    let result = suppress(vec![a.clone(), b.clone()], threshold);
    assert_eq!(result, vec![a, b]);
  }

  #[test]
  fn suppress_sort_is_stable_on_ties() {
    // 同分不相交的框保持输入顺序
    let first = det("d00", 80.0, 0, 0, 10, 10);
    let second = det("d10", 80.0, 50, 0, 10, 10);
    let third = det("d20", 80.0, 0, 50, 10, 10);

    let result = suppress(vec![first.clone(), second.clone(), third.clone()], 0.45);
    assert_eq!(result, vec![first, second, third]);
  }

  #[test]
  fn suppress_chains_do_not_revive_boxes() {
    // B 被 A 压掉后，不再参与对 C 的抑制判断；
    // C 与 A 重叠不足，因而保留
    let a = det("d00", 90.0, 0, 0, 20, 20);
    let b = det("d00", 80.0, 5, 0, 20, 20);
    let c = det("d00", 70.0, 10, 0, 20, 20);
    assert!(iou(&a, &b) > 0.45);
    assert!(iou(&b, &c) > 0.45);
    assert!(iou(&a, &c) < 0.45);

    let result = suppress(vec![a.clone(), b, c.clone()], 0.45);
    assert_eq!(result, vec![a, c]);
  }

  #[test]
  fn suppress_result_pairs_stay_under_threshold() {
    let candidates = vec![
      det("d00", 95.0, 0, 0, 40, 40),
      det("d10", 85.0, 10, 10, 40, 40),
      det("d00", 75.0, 60, 60, 40, 40),
      det("d10", 65.0, 70, 70, 40, 40),
      det("d00", 55.0, 30, 30, 40, 40),
    ];

    let result = suppress(candidates, 0.45);
    for (i, a) in result.iter().enumerate() {
      for b in result.iter().skip(i + 1) {
        assert!(iou(a, b) <= 0.45);
      }
    }
  }

  #[test]
  fn suppress_empty_input_yields_empty() {
    assert!(suppress(Vec::new(), 0.45).is_empty());
  }
}
