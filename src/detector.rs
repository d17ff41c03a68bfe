// 该文件是 Xunlu （巡路拾遗） 项目的一部分。
// src/detector.rs - 检测流水线
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
use tracing::debug;

use crate::frame::Frame;
use crate::model::{Engine, EngineError, ModelDescriptor};

mod decode;
mod nms;
mod preprocess;

pub use self::decode::{DecodeError, decode};
pub use self::nms::{iou, suppress};
pub use self::preprocess::{PrepareError, prepare};

/// 默认置信度阈值
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
/// 默认 NMS IoU 阈值
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

/// 检测结果
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
  /// 类别标签
  pub label: String,
  /// 置信度（0 - 100）
  pub confidence: f32,
  /// 边界框左上角 x 坐标（原图像素）
  pub bbox_x: u32,
  /// 边界框左上角 y 坐标（原图像素）
  pub bbox_y: u32,
  /// 边界框宽度（原图像素）
  pub bbox_width: u32,
  /// 边界框高度（原图像素）
  pub bbox_height: u32,
}

/// 检测流水线错误
#[derive(Error, Debug)]
pub enum DetectError {
  #[error("预处理失败: {0}")]
  Prepare(#[from] PrepareError),
  #[error("推理失败: {0}")]
  Engine(#[from] EngineError),
  #[error("解码失败: {0}")]
  Decode(#[from] DecodeError),
}

/// 检测器，组合预处理、推理、解码与抑制
pub struct Detector {
  engine: Box<dyn Engine>,
  descriptor: ModelDescriptor,
  confidence_threshold: f32,
  iou_threshold: f32,
}

impl Detector {
  /// 用默认阈值创建检测器
  pub fn new(engine: Box<dyn Engine>, descriptor: ModelDescriptor) -> Self {
    Self {
      engine,
      descriptor,
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
    }
  }

  /// 调整判定阈值
  pub fn with_thresholds(mut self, confidence: f32, iou: f32) -> Self {
    self.confidence_threshold = confidence;
    self.iou_threshold = iou;
    self
  }

  pub fn descriptor(&self) -> &ModelDescriptor {
    &self.descriptor
  }

  pub fn confidence_threshold(&self) -> f32 {
    self.confidence_threshold
  }

  pub fn iou_threshold(&self) -> f32 {
    self.iou_threshold
  }

  /// 对一帧执行完整流水线：预处理、推理、解码、抑制。
  /// 实时路径与单次路径共用此函数。
  pub fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, DetectError> {
    let input = prepare(frame, self.descriptor.input_side())?;
    let output = self.engine.infer(&input)?;
    let candidates = decode(
      &output,
      &self.descriptor,
      frame.width(),
      frame.height(),
      self.confidence_threshold,
    )?;
    debug!("解码得到 {} 个候选框", candidates.len());

    Ok(suppress(candidates, self.iou_threshold))
  }
}
