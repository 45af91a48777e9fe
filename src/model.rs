// 该文件是 Nominal （面值识别） 项目的一部分。
// src/model.rs - 模型与检测结果
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::time::Duration;

use serde::Serialize;

use crate::tensor::Tensor;

/// 推理引擎：只关心输入输出张量的约定
///
/// 引擎内部状态、模型文件映射与线程由实现自己管理。
pub trait InferenceEngine {
  type Error: std::error::Error + Send + Sync + 'static;

  fn input_shape(&self) -> &[usize];
  fn output_shape(&self) -> &[usize];
  fn infer(&mut self, input: &Tensor) -> Result<Tensor, Self::Error>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
  type Error = E::Error;

  fn input_shape(&self) -> &[usize] {
    (**self).input_shape()
  }

  fn output_shape(&self) -> &[usize] {
    (**self).output_shape()
  }

  fn infer(&mut self, input: &Tensor) -> Result<Tensor, Self::Error> {
    (**self).infer(input)
  }
}

/// 轴对齐边界框，原图像素坐标
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BoundingBox {
  pub x_min: f32,
  pub y_min: f32,
  pub x_max: f32,
  pub y_max: f32,
}

impl BoundingBox {
  pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
    Self {
      x_min,
      y_min,
      x_max,
      y_max,
    }
  }

  /// 中心点与宽高
  pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
    Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
  }

  pub fn width(&self) -> f32 {
    (self.x_max - self.x_min).max(0.0)
  }

  pub fn height(&self) -> f32 {
    (self.y_max - self.y_min).max(0.0)
  }

  pub fn area(&self) -> f32 {
    self.width() * self.height()
  }

  pub fn center(&self) -> (f32, f32) {
    (
      (self.x_min + self.x_max) / 2.0,
      (self.y_min + self.y_max) / 2.0,
    )
  }

  /// 归一化到 [0, 1]，用于叠加显示
  pub fn normalized(&self, width: u32, height: u32) -> [f32; 4] {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    [
      self.x_min / w,
      self.y_min / h,
      self.x_max / w,
      self.y_max / h,
    ]
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectItem {
  pub class_id: usize,
  pub label: String,
  pub score: f32,
  pub bbox: BoundingBox,
}

/// 一次推理的检测结果，按置信度降序排列
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectResult {
  pub items: Box<[DetectItem]>,
  #[serde(rename = "inference_time_ms", serialize_with = "serialize_millis")]
  pub inference_time: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
  s.serialize_u64(d.as_millis() as u64)
}

impl DetectResult {
  pub fn new(items: Vec<DetectItem>) -> Self {
    Self {
      items: items.into_boxed_slice(),
      inference_time: Duration::ZERO,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, DetectItem> {
    self.items.iter()
  }

  /// 置信度最高的检测；结果已排序，即第一个元素
  pub fn best(&self) -> Option<&DetectItem> {
    self.items.first()
  }

  pub fn with_inference_time(mut self, elapsed: Duration) -> Self {
    self.inference_time = elapsed;
    self
  }
}

impl<'a> IntoIterator for &'a DetectResult {
  type Item = &'a DetectItem;
  type IntoIter = std::slice::Iter<'a, DetectItem>;

  fn into_iter(self) -> Self::IntoIter {
    self.items.iter()
  }
}

pub mod decode;
mod engine;
mod labels;
#[cfg(feature = "onnx")]
mod onnx;
mod replay;

pub use self::decode::{BoxConvention, Decoder, DecoderConfig, NmsPolicy, iou};
pub use self::engine::{EngineError, EngineWrapper};
pub use self::labels::LabelTable;
#[cfg(feature = "onnx")]
pub use self::onnx::{OnnxEngine, OnnxEngineError};
pub use self::replay::{ReplayEngine, ReplayEngineError};
