// 该文件是 Nominal （面值识别） 项目的一部分。
// src/error.rs - 核心错误定义
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

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 检测流水线错误
///
/// 没有检测结果用空的 [`DetectResult`](crate::DetectResult) 表示，不是错误。
#[derive(Error, Debug)]
pub enum DetectError {
  #[error("无效图像: {0}")]
  InvalidImage(String),
  #[error("标签数量不匹配: 标签表有 {labels} 项, 模型输出 {classes} 个类别")]
  LabelMismatch { labels: usize, classes: usize },
  #[error("张量形状不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  ShapeMismatch {
    expected: Vec<usize>,
    actual: Vec<usize>,
  },
  #[error("张量数据长度 {len} 与形状 {shape:?} 不符")]
  InvalidTensor { shape: Vec<usize>, len: usize },
  #[error("推理失败: {0}")]
  Inference(#[source] BoxedError),
  #[error("标签文件读取错误: {0}")]
  LabelIo(#[from] std::io::Error),
}

impl DetectError {
  pub fn invalid_image(msg: impl Into<String>) -> Self {
    DetectError::InvalidImage(msg.into())
  }

  pub fn shape(expected: &[usize], actual: &[usize]) -> Self {
    DetectError::ShapeMismatch {
      expected: expected.to_vec(),
      actual: actual.to_vec(),
    }
  }

  pub fn inference<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    DetectError::Inference(Box::new(err))
  }
}
