// 该文件是 Xunlu （巡路拾遗） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;

use xunlu::detector::Detector;
use xunlu::frame::{Frame, Rotation};
use xunlu::input::ImageSource;
use xunlu::model::{ModelDescriptor, TractEngine, parse_labels};
use xunlu::output::{Visualizer, write_detection_record};
use xunlu::session::DetectionSession;

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();
  let args = args::Args::parse();

  let rotation = Rotation::from_degrees(args.rotation)
    .ok_or_else(|| anyhow!("仅支持 0/90/180/270 度旋转: {}", args.rotation))?;

  let labels = std::fs::read(&args.labels)
    .with_context(|| format!("读取标签文件失败: {}", args.labels))?;
  let labels = parse_labels(&labels)?;
  info!("已加载 {} 个类别标签", labels.len());

  let descriptor = ModelDescriptor::for_yolov8(args.input_side, labels)?;
  let engine = TractEngine::from_path(&args.model, &descriptor)
    .with_context(|| format!("加载模型失败: {}", args.model))?;
  let detector = Detector::new(Box::new(engine), descriptor)
    .with_thresholds(args.confidence, args.iou);
  let session = DetectionSession::new(Arc::new(detector));

  let mut source =
    ImageSource::open(&args.input).with_context(|| format!("打开输入图片失败: {}", args.input))?;
  let frame = source.next().ok_or_else(|| anyhow!("没有输入帧"))?;
  let frame = Frame::with_rotation(frame.image, rotation);

  let detections = session
    .detect_once(frame)
    .ok_or_else(|| anyhow!("检测会话被占用"))?;

  println!("检测到 {} 处路面损伤", detections.len());
  for det in &detections {
    println!(
      "  - {}: {:.1}% at ({}, {}, {}x{})",
      det.label, det.confidence, det.bbox_x, det.bbox_y, det.bbox_width, det.bbox_height
    );
  }

  let frame = session
    .current_frame()
    .ok_or_else(|| anyhow!("会话中没有当前帧"))?;

  if let Some(output) = &args.output {
    let mut visualizer = Visualizer::new();
    if let Some(font) = &args.font {
      visualizer = visualizer
        .with_font_path(font)
        .with_context(|| format!("加载字体失败: {font}"))?;
    }

    let mut annotated = frame.image.clone();
    visualizer.draw_detections(&mut annotated, &detections);
    annotated
      .save(output)
      .with_context(|| format!("保存标注图片失败: {output}"))?;
    println!("标注图片已保存: {output}");
  }

  if let Some(record) = &args.record {
    write_detection_record(record, frame.width(), frame.height(), &detections)
      .with_context(|| format!("写入检测记录失败: {record}"))?;
    println!("检测记录已保存: {record}");
  }

  Ok(())
}
