// 该文件是 Xunlu （巡路拾遗） 项目的一部分。
// src/output/record.rs - JSON 检测记录
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

use chrono::Utc;
use serde_json::json;
use thiserror::Error;

use crate::detector::Detection;

/// 记录输出错误
#[derive(Error, Debug)]
pub enum RecordError {
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("JSON 序列化失败: {0}")]
  Json(#[from] serde_json::Error),
}

/// 把一次检测的结果写成 JSON 记录文件。
/// 字段名与上报接口的检测负载一致，另附拍摄时间与帧尺寸。
pub fn write_detection_record(
  path: impl AsRef<Path>,
  frame_width: u32,
  frame_height: u32,
  detections: &[Detection],
) -> Result<(), RecordError> {
  let path = path.as_ref();
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }

  let record = json!({
    "captured_at": Utc::now().to_rfc3339(),
    "frame_width": frame_width,
    "frame_height": frame_height,
    "detections": detections
      .iter()
      .map(|d| {
        json!({
          "label": d.label,
          "confidence": d.confidence,
          "bbox_x": d.bbox_x,
          "bbox_y": d.bbox_y,
          "bbox_width": d.bbox_width,
          "bbox_height": d.bbox_height,
        })
      })
      .collect::<Vec<_>>(),
  });

  std::fs::write(path, serde_json::to_string_pretty(&record)?)?;
  Ok(())
}
