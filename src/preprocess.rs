// 该文件是 Nominal （面值识别） 项目的一部分。
// src/preprocess.rs - 图像预处理
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

use image::{DynamicImage, ImageBuffer, Rgb, RgbImage, imageops::FilterType};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
  error::DetectError,
  tensor::{RGB_CHANNELS, Tensor, TensorLayout},
};

const LETTERBOX_COLOR: u8 = 114;

/// 缩放策略，必须与训练时一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizePolicy {
  /// 直接拉伸到 S×S，不保持宽高比
  #[default]
  Stretch,
  /// 等比缩放后居中，四周填充灰色
  Letterbox,
}

impl std::str::FromStr for ResizePolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "stretch" => Ok(ResizePolicy::Stretch),
      "letterbox" => Ok(ResizePolicy::Letterbox),
      other => Err(format!("未知的缩放策略: {}", other)),
    }
  }
}

/// 原图坐标与输入张量坐标之间的映射
///
/// `input = original * scale + pad`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTransform {
  pub orig_width: u32,
  pub orig_height: u32,
  pub input_size: u32,
  pub scale_x: f32,
  pub scale_y: f32,
  pub pad_x: f32,
  pub pad_y: f32,
}

impl ScaleTransform {
  /// 不做任何缩放的映射，原图即输入
  pub fn identity(size: u32) -> Self {
    Self {
      orig_width: size,
      orig_height: size,
      input_size: size,
      scale_x: 1.0,
      scale_y: 1.0,
      pad_x: 0.0,
      pad_y: 0.0,
    }
  }

  /// 输入张量坐标 -> 原图像素坐标，结果限制在原图范围内
  pub fn to_original(&self, x: f32, y: f32) -> (f32, f32) {
    let ox = ((x - self.pad_x) / self.scale_x).clamp(0.0, self.orig_width as f32);
    let oy = ((y - self.pad_y) / self.scale_y).clamp(0.0, self.orig_height as f32);
    (ox, oy)
  }

  /// 原图像素坐标 -> 输入张量坐标
  pub fn to_input(&self, x: f32, y: f32) -> (f32, f32) {
    (x * self.scale_x + self.pad_x, y * self.scale_y + self.pad_y)
  }
}

/// 图像预处理器：缩放、按布局展开、除以 255
#[derive(Debug, Clone)]
pub struct Preprocessor {
  size: u32,
  layout: TensorLayout,
  policy: ResizePolicy,
}

impl Preprocessor {
  pub fn new(size: u32, layout: TensorLayout, policy: ResizePolicy) -> Self {
    Self {
      size,
      layout,
      policy,
    }
  }

  pub fn size(&self) -> u32 {
    self.size
  }

  pub fn layout(&self) -> TensorLayout {
    self.layout
  }

  pub fn policy(&self) -> ResizePolicy {
    self.policy
  }

  /// 输出张量的形状
  pub fn shape(&self) -> [usize; 4] {
    self.layout.input_shape(self.size as usize)
  }

  /// 任意颜色格式的图像，透明通道被丢弃
  pub fn preprocess_dynamic(
    &self,
    image: &DynamicImage,
  ) -> Result<(Tensor, ScaleTransform), DetectError> {
    match image {
      DynamicImage::ImageRgb8(rgb) => self.preprocess(rgb),
      other => self.preprocess(&other.to_rgb8()),
    }
  }

  pub fn preprocess(&self, image: &RgbImage) -> Result<(Tensor, ScaleTransform), DetectError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return Err(DetectError::invalid_image(format!(
        "图像尺寸为 {}x{}",
        width, height
      )));
    }
    if self.size == 0 {
      return Err(DetectError::invalid_image("输入尺寸为 0"));
    }

    trace!(width, height, size = self.size, policy = ?self.policy, "预处理图像");

    let (resized, transform) = match self.policy {
      ResizePolicy::Stretch => self.stretch(image),
      ResizePolicy::Letterbox => self.letterbox(image),
    };

    let tensor = self.normalize(&resized);
    debug!("预处理完成: 形状 {:?}, 映射 {:?}", tensor.shape(), transform);

    Ok((tensor, transform))
  }

  fn resize(&self, image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
      return image.clone();
    }
    image::imageops::resize(image, width, height, FilterType::Triangle)
  }

  fn stretch(&self, image: &RgbImage) -> (RgbImage, ScaleTransform) {
    let (width, height) = image.dimensions();
    let resized = self.resize(image, self.size, self.size);
    let transform = ScaleTransform {
      orig_width: width,
      orig_height: height,
      input_size: self.size,
      scale_x: self.size as f32 / width as f32,
      scale_y: self.size as f32 / height as f32,
      pad_x: 0.0,
      pad_y: 0.0,
    };
    (resized, transform)
  }

  fn letterbox(&self, image: &RgbImage) -> (RgbImage, ScaleTransform) {
    let (width, height) = image.dimensions();
    let scale = (self.size as f32 / width as f32).min(self.size as f32 / height as f32);
    let new_width = ((width as f32 * scale).round() as u32).clamp(1, self.size);
    let new_height = ((height as f32 * scale).round() as u32).clamp(1, self.size);
    let offset_x = (self.size - new_width) / 2;
    let offset_y = (self.size - new_height) / 2;

    let resized = self.resize(image, new_width, new_height);
    let mut canvas: RgbImage = ImageBuffer::from_pixel(
      self.size,
      self.size,
      Rgb([LETTERBOX_COLOR, LETTERBOX_COLOR, LETTERBOX_COLOR]),
    );
    image::imageops::overlay(&mut canvas, &resized, offset_x as i64, offset_y as i64);

    let transform = ScaleTransform {
      orig_width: width,
      orig_height: height,
      input_size: self.size,
      scale_x: scale,
      scale_y: scale,
      pad_x: offset_x as f32,
      pad_y: offset_y as f32,
    };
    (canvas, transform)
  }

  fn normalize(&self, image: &RgbImage) -> Tensor {
    let size = self.size as usize;
    let mut tensor = Tensor::zeros(&self.shape());
    let slice = tensor.as_mut();

    for (x, y, pixel) in image.enumerate_pixels() {
      for c in 0..RGB_CHANNELS {
        let index = self.layout.index(y as usize, x as usize, c, size);
        slice[index] = pixel[c] as f32 / 255.0;
      }
    }
    tensor
  }
}
