// 该文件是 Nominal （面值识别） 项目的一部分。
// src/args.rs - 命令行参数
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;

use clap::Args;
use tracing::info;
use url::Url;

use crate::{
  config::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_INPUT_SIZE, DEFAULT_IOU_THRESHOLD,
    DEFAULT_MAX_DETECTIONS, DetectorConfig,
  },
  error::DetectError,
  model::{BoxConvention, LabelTable, NmsPolicy},
  preprocess::ResizePolicy,
  tensor::TensorLayout,
};

/// 模型、输入、输出与检测参数，两个二进制共用
#[derive(Args, Debug, Clone)]
pub struct DetectorArgs {
  /// 推理引擎: replay:///path/record.json 或 onnx:///path/model.onnx?input=..&output=..
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源: image:///path/note.jpg 或 folder:///path/frames
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出: log://, json:///path/records.jsonl 或 folder:///path/records
  #[arg(long, value_name = "OUTPUT", default_value = "log://")]
  pub output: Url,
  /// 标签文件，每行一个标签；缺省使用内置的印尼盾面值表
  #[arg(long, value_name = "FILE")]
  pub labels: Option<PathBuf>,

  /// 模型输入边长
  #[arg(long, default_value_t = DEFAULT_INPUT_SIZE)]
  pub input_size: u32,
  /// 输入张量布局: nhwc / nchw
  #[arg(long, default_value = "nhwc")]
  pub layout: TensorLayout,
  /// 缩放策略: stretch / letterbox
  #[arg(long, default_value = "stretch")]
  pub resize: ResizePolicy,
  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD, value_name = "THRESHOLD")]
  pub confidence: f32,
  /// NMS IoU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD, value_name = "THRESHOLD")]
  pub iou: f32,
  /// NMS 策略: agnostic / aware / best
  #[arg(long, default_value = "agnostic")]
  pub nms: NmsPolicy,
  /// 模型输出框坐标约定: normalized / pixels
  #[arg(long, default_value = "normalized")]
  pub boxes: BoxConvention,
  /// 每帧最多保留的检测数
  #[arg(long, default_value_t = DEFAULT_MAX_DETECTIONS)]
  pub max_detections: usize,
}

impl DetectorArgs {
  pub fn config(&self) -> DetectorConfig {
    DetectorConfig::builder()
      .input_size(self.input_size)
      .layout(self.layout)
      .resize(self.resize)
      .confidence(self.confidence)
      .iou(self.iou)
      .nms(self.nms)
      .boxes(self.boxes)
      .max_detections(self.max_detections)
      .build()
  }

  pub fn labels(&self) -> Result<LabelTable, DetectError> {
    match &self.labels {
      Some(path) => LabelTable::from_file(path),
      None => {
        info!("使用内置面值标签表");
        Ok(LabelTable::rupiah())
      }
    }
  }
}
