// 该文件是 Xunlu （巡路拾遗） 项目的一部分。
// src/model.rs - 推理引擎与模型描述
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

/// YOLOv8 检测头的下采样步长，候选框总数由各头网格大小之和得出
const YOLOV8_STRIDES: [usize; 3] = [8, 16, 32];

/// 模型描述或标签文件错误
#[derive(Error, Debug)]
pub enum ModelError {
  #[error("标签数量与输出形状不符: 期望 {expected} 个, 实际 {actual} 个")]
  LabelCountMismatch { expected: usize, actual: usize },
  #[error("标签列表为空")]
  EmptyLabels,
  #[error("模型输出形状无效: [{attributes}, {candidates}]")]
  InvalidShape { attributes: usize, candidates: usize },
  #[error("模型输入边长无效: {0}")]
  InvalidInputSide(u32),
  #[error("标签文件不是有效的 UTF-8 文本")]
  LabelsNotUtf8,
}

/// 推理引擎错误
#[derive(Error, Debug)]
pub enum EngineError {
  #[error("模型加载失败: {0}")]
  ModelLoad(String),
  #[error("推理执行失败: {0}")]
  Inference(String),
  #[error("输入缓冲区长度不符: 期望 {expected}, 实际 {actual}")]
  InputLength { expected: usize, actual: usize },
}

/// 推理引擎抽象。
/// 输入为预处理后的 S*S*3 RGB 浮点缓冲区，
/// 输出为按行主序展开的 [A, N] 检测张量。
pub trait Engine: Send + Sync {
  fn infer(&self, input: &[f32]) -> Result<Vec<f32>, EngineError>;
}

/// 模型几何描述。
/// 构造时校验属性数 A 等于 4 个坐标行加标签数，
/// 解码阶段据此保证类别索引不会越界。
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
  /// 方形输入边长 S
  input_side: u32,
  /// 输出张量每候选框的属性数 A
  attributes: usize,
  /// 输出张量候选框数 N
  candidates: usize,
  /// 有序类别标签，长度为 A - 4
  labels: Vec<String>,
}

impl ModelDescriptor {
  /// 创建模型描述，output_shape 为 [A, N]
  pub fn new(
    input_side: u32,
    output_shape: [usize; 2],
    labels: Vec<String>,
  ) -> Result<Self, ModelError> {
    let [attributes, candidates] = output_shape;

    if input_side == 0 {
      return Err(ModelError::InvalidInputSide(input_side));
    }
    if attributes < 5 || candidates == 0 {
      return Err(ModelError::InvalidShape {
        attributes,
        candidates,
      });
    }
    if labels.is_empty() {
      return Err(ModelError::EmptyLabels);
    }
    if attributes != 4 + labels.len() {
      return Err(ModelError::LabelCountMismatch {
        expected: attributes - 4,
        actual: labels.len(),
      });
    }

    Ok(Self {
      input_side,
      attributes,
      candidates,
      labels,
    })
  }

  /// 按 YOLOv8 检测头几何推导输出形状，例如边长 640 对应 8400 个候选框
  pub fn for_yolov8(input_side: u32, labels: Vec<String>) -> Result<Self, ModelError> {
    let side = input_side as usize;
    let candidates = YOLOV8_STRIDES
      .iter()
      .map(|&stride| (side / stride) * (side / stride))
      .sum();
    let attributes = 4 + labels.len();

    Self::new(input_side, [attributes, candidates], labels)
  }

  pub fn input_side(&self) -> u32 {
    self.input_side
  }

  pub fn attributes(&self) -> usize {
    self.attributes
  }

  pub fn candidates(&self) -> usize {
    self.candidates
  }

  pub fn labels(&self) -> &[String] {
    &self.labels
  }

  pub fn class_count(&self) -> usize {
    self.labels.len()
  }

  /// 预处理缓冲区的期望长度
  pub fn input_len(&self) -> usize {
    self.input_side as usize * self.input_side as usize * 3
  }

  /// 输出张量的期望长度
  pub fn output_len(&self) -> usize {
    self.attributes * self.candidates
  }
}

/// 解析按行分隔的标签文件内容，行首尾空白去除，空行跳过
pub fn parse_labels(data: &[u8]) -> Result<Vec<String>, ModelError> {
  let text = std::str::from_utf8(data).map_err(|_| ModelError::LabelsNotUtf8)?;

  let labels: Vec<String> = text
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(str::to_string)
    .collect();

  if labels.is_empty() {
    return Err(ModelError::EmptyLabels);
  }

  Ok(labels)
}

#[cfg(feature = "engine_tract")]
mod tract;
#[cfg(feature = "engine_tract")]
pub use self::tract::TractEngine;
