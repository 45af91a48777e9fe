// 该文件是 Nominal （面值识别） 项目的一部分。
// src/tensor.rs - 张量定义
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

use serde::{Deserialize, Serialize};

use crate::error::DetectError;

pub const RGB_CHANNELS: usize = 3;

/// 输入张量的内存布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
  /// `[1, H, W, 3]`，TFLite 默认
  #[default]
  Nhwc,
  /// `[1, 3, H, W]`
  Nchw,
}

impl TensorLayout {
  /// 边长为 `size` 的正方形 RGB 输入张量形状
  pub fn input_shape(&self, size: usize) -> [usize; 4] {
    match self {
      TensorLayout::Nhwc => [1, size, size, RGB_CHANNELS],
      TensorLayout::Nchw => [1, RGB_CHANNELS, size, size],
    }
  }

  /// 像素 (y, x) 第 c 个通道在扁平缓冲区中的位置
  #[inline]
  pub fn index(&self, y: usize, x: usize, c: usize, size: usize) -> usize {
    match self {
      TensorLayout::Nhwc => (y * size + x) * RGB_CHANNELS + c,
      TensorLayout::Nchw => c * size * size + y * size + x,
    }
  }
}

impl std::str::FromStr for TensorLayout {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "nhwc" => Ok(TensorLayout::Nhwc),
      "nchw" => Ok(TensorLayout::Nchw),
      other => Err(format!("未知的张量布局: {}", other)),
    }
  }
}

/// 固定形状的 f32 张量，行主序存储
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
  shape: Box<[usize]>,
  data: Box<[f32]>,
}

impl Tensor {
  pub fn new(shape: &[usize], data: Vec<f32>) -> Result<Self, DetectError> {
    let expected: usize = shape.iter().product();
    if expected != data.len() {
      return Err(DetectError::InvalidTensor {
        shape: shape.to_vec(),
        len: data.len(),
      });
    }

    Ok(Self {
      shape: shape.into(),
      data: data.into_boxed_slice(),
    })
  }

  pub fn zeros(shape: &[usize]) -> Self {
    let size = shape.iter().product();
    Self {
      shape: shape.into(),
      data: vec![0.0; size].into_boxed_slice(),
    }
  }

  pub fn shape(&self) -> &[usize] {
    &self.shape
  }

  pub fn data(&self) -> &[f32] {
    &self.data
  }

  pub fn into_data(self) -> Box<[f32]> {
    self.data
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }
}

impl AsRef<[f32]> for Tensor {
  fn as_ref(&self) -> &[f32] {
    &self.data
  }
}

impl AsMut<[f32]> for Tensor {
  fn as_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }
}
