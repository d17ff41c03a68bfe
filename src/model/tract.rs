// 该文件是 Xunlu （巡路拾遗） 项目的一部分。
// src/model/tract.rs - Tract ONNX 推理引擎
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

use tracing::{debug, info};
use tract_onnx::prelude::*;

use crate::model::{Engine, EngineError, ModelDescriptor};

/// 基于 tract-onnx 的推理引擎，纯 CPU 执行
pub struct TractEngine {
  plan: TypedRunnableModel<TypedModel>,
  input_side: usize,
  output_len: usize,
}

impl TractEngine {
  /// 加载 ONNX 模型并把输入形状固定为 [1, 3, S, S]
  pub fn from_path(
    path: impl AsRef<Path>,
    descriptor: &ModelDescriptor,
  ) -> Result<Self, EngineError> {
    let path = path.as_ref();
    let side = descriptor.input_side() as usize;

    info!("加载 ONNX 模型: {}", path.display());
    let plan = tract_onnx::onnx()
      .model_for_path(path)
      .map_err(|e| EngineError::ModelLoad(format!("读取模型失败: {e}")))?
      .with_input_fact(
        0,
        InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)),
      )
      .map_err(|e| EngineError::ModelLoad(format!("设置输入形状失败: {e}")))?
      .into_optimized()
      .map_err(|e| EngineError::ModelLoad(format!("优化模型失败: {e}")))?
      .into_runnable()
      .map_err(|e| EngineError::ModelLoad(format!("构建执行计划失败: {e}")))?;
    info!("模型加载完成");

    Ok(Self {
      plan,
      input_side: side,
      output_len: descriptor.output_len(),
    })
  }
}

impl Engine for TractEngine {
  fn infer(&self, input: &[f32]) -> Result<Vec<f32>, EngineError> {
    let side = self.input_side;
    let expected = side * side * 3;
    if input.len() != expected {
      return Err(EngineError::InputLength {
        expected,
        actual: input.len(),
      });
    }

    // HWC 缓冲区重排为 NCHW 张量
    let tensor = tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, channel, y, x)| {
      input[(y * side + x) * 3 + channel]
    })
    .into_tensor();

    debug!("执行 ONNX 推理");
    let outputs = self
      .plan
      .run(tvec!(tensor.into()))
      .map_err(|e| EngineError::Inference(e.to_string()))?;

    let output = outputs
      .first()
      .ok_or_else(|| EngineError::Inference("模型没有输出张量".to_string()))?;
    let view = output
      .to_array_view::<f32>()
      .map_err(|e| EngineError::Inference(format!("输出张量不是 f32: {e}")))?;
    let raw: Vec<f32> = view.iter().copied().collect();

    if raw.len() != self.output_len {
      return Err(EngineError::Inference(format!(
        "输出张量长度不符: 期望 {}, 实际 {}",
        self.output_len,
        raw.len()
      )));
    }

    Ok(raw)
  }
}
