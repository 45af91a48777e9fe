// 该文件是 Nominal （面值识别） 项目的一部分。
// src/detector.rs - 检测流水线
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::time::Instant;

use image::{DynamicImage, RgbImage};
use tracing::{debug, error, info};

use crate::{
  config::DetectorConfig,
  error::DetectError,
  model::{DetectResult, Decoder, InferenceEngine, LabelTable, decode::BOX_CHANNELS},
  preprocess::Preprocessor,
};

/// 单帧检测：图像进，检测结果出
pub trait Detect {
  fn detect(&mut self, image: &RgbImage) -> Result<DetectResult, DetectError>;
}

/// 预处理 -> 推理 -> 解码
///
/// 构造时校验引擎输入输出形状与标签表，之后每一帧互不相关。
pub struct Detector<E> {
  engine: E,
  preprocessor: Preprocessor,
  decoder: Decoder,
}

impl<E: InferenceEngine> Detector<E> {
  pub fn new(engine: E, labels: LabelTable, config: DetectorConfig) -> Result<Self, DetectError> {
    let preprocessor = config.preprocessor();

    let expected_input = preprocessor.shape();
    if engine.input_shape() != expected_input.as_slice() {
      error!(
        "模型输入形状为 {:?}, 预处理输出为 {:?}",
        engine.input_shape(),
        expected_input
      );
      return Err(DetectError::shape(&expected_input, engine.input_shape()));
    }

    let output_shape = engine.output_shape();
    let classes = match output_shape {
      [1, c, _] if *c >= BOX_CHANNELS => c - BOX_CHANNELS,
      _ => {
        let n = output_shape.get(2).copied().unwrap_or(0);
        error!("模型输出形状无效: {:?}", output_shape);
        return Err(DetectError::shape(
          &[1, BOX_CHANNELS + labels.len(), n],
          output_shape,
        ));
      }
    };
    labels.ensure_classes(classes)?;

    info!(
      "检测器就绪: 输入 {:?}, 输出 {:?}, {} 个类别, NMS {:?}",
      expected_input, output_shape, classes, config.nms
    );

    Ok(Self {
      engine,
      preprocessor,
      decoder: Decoder::new(labels, config.decoder_config()),
    })
  }

  pub fn engine(&self) -> &E {
    &self.engine
  }

  pub fn preprocessor(&self) -> &Preprocessor {
    &self.preprocessor
  }

  pub fn decoder(&self) -> &Decoder {
    &self.decoder
  }

  pub fn detect(&mut self, image: &RgbImage) -> Result<DetectResult, DetectError> {
    let (tensor, transform) = self.preprocessor.preprocess(image)?;

    let now = Instant::now();
    let output = self
      .engine
      .infer(&tensor)
      .map_err(DetectError::inference)?;
    let elapsed = now.elapsed();
    debug!("推理完成，耗时: {:.2?}", elapsed);

    let result = self.decoder.decode(&output, &transform)?;
    Ok(result.with_inference_time(elapsed))
  }

  pub fn detect_dynamic(&mut self, image: &DynamicImage) -> Result<DetectResult, DetectError> {
    match image {
      DynamicImage::ImageRgb8(rgb) => self.detect(rgb),
      other => self.detect(&other.to_rgb8()),
    }
  }

  /// 已编码的图像数据（PNG / JPEG）
  pub fn detect_encoded(&mut self, bytes: &[u8]) -> Result<DetectResult, DetectError> {
    let image = image::load_from_memory(bytes)
      .map_err(|e| DetectError::invalid_image(format!("无法解码图像: {}", e)))?;
    self.detect_dynamic(&image)
  }
}

impl<E: InferenceEngine> Detect for Detector<E> {
  fn detect(&mut self, image: &RgbImage) -> Result<DetectResult, DetectError> {
    Detector::detect(self, image)
  }
}
