// 该文件是 Nominal （面值识别） 项目的一部分。
// src/output/json_record.rs - JSON 行记录输出
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::{
  fs::{File, OpenOptions},
  io::{BufWriter, Write},
  path::Path,
  sync::Mutex,
};

use chrono::Utc;
use image::RgbImage;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::{FromUrl, FromUrlWithScheme, model::DetectResult, output::Render};

#[derive(Error, Debug)]
pub enum JsonRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct Line<'a> {
  frame: u64,
  timestamp: String,
  width: u32,
  height: u32,
  #[serde(flatten)]
  result: &'a DetectResult,
}

struct Writer {
  out: BufWriter<File>,
  frame: u64,
}

/// 每帧一行 JSON，追加写入
///
/// `json:///path/records.jsonl`
pub struct JsonRecordOutput {
  writer: Mutex<Writer>,
}

impl JsonRecordOutput {
  pub fn create(path: impl AsRef<Path>) -> Result<Self, JsonRecordOutputError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    info!("检测记录写入: {}", path.display());
    Ok(Self {
      writer: Mutex::new(Writer {
        out: BufWriter::new(file),
        frame: 0,
      }),
    })
  }
}

impl FromUrlWithScheme for JsonRecordOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(JsonRecordOutputError::SchemeMismatch);
    }
    Self::create(url.path())
  }
}

impl Render<RgbImage, DetectResult> for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn render_result(&self, frame: &RgbImage, result: &DetectResult) -> Result<(), Self::Error> {
    let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
    writer.frame += 1;
    let line = Line {
      frame: writer.frame,
      timestamp: Utc::now().to_rfc3339(),
      width: frame.width(),
      height: frame.height(),
      result,
    };
    serde_json::to_writer(&mut writer.out, &line)?;
    writer.out.write_all(b"\n")?;
    writer.out.flush()?;
    Ok(())
  }
}
