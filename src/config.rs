// 该文件是 Nominal （面值识别） 项目的一部分。
// src/config.rs - 检测器配置
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

use crate::{
  model::{BoxConvention, DecoderConfig, NmsPolicy},
  preprocess::{Preprocessor, ResizePolicy},
  tensor::TensorLayout,
};

/// 随应用打包的 YOLOv8 模型：640x640 NHWC 输入，拉伸缩放
pub const DEFAULT_INPUT_SIZE: u32 = 640;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.3;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;
pub const DEFAULT_MAX_DETECTIONS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
  pub input_size: u32,
  pub layout: TensorLayout,
  pub resize: ResizePolicy,
  pub confidence_threshold: f32,
  pub iou_threshold: f32,
  pub nms: NmsPolicy,
  pub boxes: BoxConvention,
  pub max_detections: usize,
}

impl Default for DetectorConfig {
  fn default() -> Self {
    Self {
      input_size: DEFAULT_INPUT_SIZE,
      layout: TensorLayout::default(),
      resize: ResizePolicy::default(),
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      nms: NmsPolicy::default(),
      boxes: BoxConvention::default(),
      max_detections: DEFAULT_MAX_DETECTIONS,
    }
  }
}

impl DetectorConfig {
  pub fn builder() -> DetectorConfigBuilder {
    DetectorConfigBuilder::default()
  }

  pub fn preprocessor(&self) -> Preprocessor {
    Preprocessor::new(self.input_size, self.layout, self.resize)
  }

  pub fn decoder_config(&self) -> DecoderConfig {
    DecoderConfig {
      confidence_threshold: self.confidence_threshold,
      iou_threshold: self.iou_threshold,
      nms: self.nms,
      boxes: self.boxes,
      max_detections: self.max_detections,
    }
  }
}

#[derive(Debug, Default)]
pub struct DetectorConfigBuilder {
  config: DetectorConfig,
}

impl DetectorConfigBuilder {
  pub fn input_size(mut self, size: u32) -> Self {
    self.config.input_size = size;
    self
  }

  pub fn layout(mut self, layout: TensorLayout) -> Self {
    self.config.layout = layout;
    self
  }

  pub fn resize(mut self, resize: ResizePolicy) -> Self {
    self.config.resize = resize;
    self
  }

  pub fn confidence(mut self, threshold: f32) -> Self {
    self.config.confidence_threshold = threshold;
    self
  }

  pub fn iou(mut self, threshold: f32) -> Self {
    self.config.iou_threshold = threshold;
    self
  }

  pub fn nms(mut self, nms: NmsPolicy) -> Self {
    self.config.nms = nms;
    self
  }

  pub fn boxes(mut self, boxes: BoxConvention) -> Self {
    self.config.boxes = boxes;
    self
  }

  pub fn max_detections(mut self, max: usize) -> Self {
    self.config.max_detections = max;
    self
  }

  pub fn build(self) -> DetectorConfig {
    self.config
  }
}
