// 该文件是 Nominal （面值识别） 项目的一部分。
// src/output/log_output.rs - 日志输出
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{DetectItem, DetectResult},
  output::Render,
};

#[derive(Error, Debug)]
pub enum LogOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// 把每帧的最佳检测写进日志
///
/// `log://?all` 时逐条列出全部检测。
#[derive(Debug, Default)]
pub struct LogOutput {
  all: bool,
}

impl LogOutput {
  pub fn new(all: bool) -> Self {
    Self { all }
  }

  /// 一帧的摘要文本；没有检测时单独区分
  pub fn summary(result: &DetectResult) -> String {
    match result.best() {
      Some(best) => format!(
        "{} ({:.1}%), 共 {} 个检测, 推理 {} ms",
        best.label,
        best.score * 100.0,
        result.len(),
        result.inference_time.as_millis()
      ),
      None => format!("未检测到纸币, 推理 {} ms", result.inference_time.as_millis()),
    }
  }

  fn item_line(item: &DetectItem) -> String {
    format!(
      "[{}] {} {:.4} ({:.4}, {:.4}, {:.4}, {:.4})",
      item.class_id,
      item.label,
      item.score,
      item.bbox.x_min,
      item.bbox.y_min,
      item.bbox.x_max,
      item.bbox.y_max
    )
  }
}

impl FromUrlWithScheme for LogOutput {
  const SCHEME: &'static str = "log";
}

impl FromUrl for LogOutput {
  type Error = LogOutputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(LogOutputError::SchemeMismatch);
    }
    let all = url.query_pairs().any(|(k, _)| k == "all");
    Ok(Self::new(all))
  }
}

impl Render<RgbImage, DetectResult> for LogOutput {
  type Error = LogOutputError;

  fn render_result(&self, frame: &RgbImage, result: &DetectResult) -> Result<(), Self::Error> {
    let (width, height) = frame.dimensions();
    info!("{}x{}: {}", width, height, Self::summary(result));
    if self.all {
      for item in result {
        debug!("{}", Self::item_line(item));
      }
    }
    Ok(())
  }
}
