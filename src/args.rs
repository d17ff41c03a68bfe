// 该文件是 Xunlu （巡路拾遗） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;

/// Xunlu 路面损伤检测
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型文件路径
  #[arg(long, value_name = "FILE")]
  pub model: String,

  /// 标签文件路径（按行分隔，顺序与模型输出一致）
  #[arg(long, value_name = "FILE")]
  pub labels: String,

  /// 待检测的图片文件
  #[arg(long, value_name = "IMAGE")]
  pub input: String,

  /// 标注结果图片输出路径（可选）
  #[arg(long, value_name = "IMAGE")]
  pub output: Option<String>,

  /// JSON 检测记录输出路径（可选）
  #[arg(long, value_name = "FILE")]
  pub record: Option<String>,

  /// 模型方形输入边长
  #[arg(long, default_value = "640", value_name = "SIDE")]
  pub input_side: u32,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.25", value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.45", value_name = "THRESHOLD")]
  pub iou: f32,

  /// 输入图片转正所需的顺时针旋转角度（0/90/180/270）
  #[arg(long, default_value = "0", value_name = "DEGREES")]
  pub rotation: i32,

  /// 标注用字体文件路径（可选，缺省时只画框不写字）
  #[arg(long, value_name = "FILE")]
  pub font: Option<String>,
}
