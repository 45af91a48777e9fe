// 该文件是 Nominal （面值识别） 项目的一部分。
// src/model/labels.rs - 类别标签表
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::{
  fs::File,
  io::{BufRead, BufReader},
  path::Path,
};

use tracing::{debug, error, info};

use crate::error::DetectError;

/// 印尼盾纸币面额，按模型类别顺序
pub const RUPIAH_LABELS: [&str; 7] = ["1000", "2000", "5000", "10000", "20000", "50000", "100000"];

/// 有序标签表，下标即类别编号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
  labels: Box<[String]>,
}

impl LabelTable {
  pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
    Self {
      labels: labels.into_iter().map(Into::into).collect(),
    }
  }

  /// 内置的印尼盾面额标签
  pub fn rupiah() -> Self {
    Self::new(RUPIAH_LABELS)
  }

  /// 每行一个标签，遇到第一个空行即停止
  pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, DetectError> {
    let mut labels = Vec::new();
    for line in reader.lines() {
      let line = line?;
      let label = line.trim();
      if label.is_empty() {
        break;
      }
      labels.push(label.to_string());
    }
    Ok(Self::new(labels))
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DetectError> {
    let path = path.as_ref();
    info!("加载标签文件: {}", path.display());
    let table = Self::from_reader(BufReader::new(File::open(path)?))?;
    debug!("标签数量: {}", table.len());
    Ok(table)
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  pub fn get(&self, class_id: usize) -> Option<&str> {
    self.labels.get(class_id).map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.labels.iter().map(String::as_str)
  }

  /// 标签数量必须与模型类别数一致
  pub fn ensure_classes(&self, classes: usize) -> Result<(), DetectError> {
    if self.len() != classes {
      error!(
        "标签数量不匹配: 标签表有 {} 项, 模型输出 {} 个类别",
        self.len(),
        classes
      );
      return Err(DetectError::LabelMismatch {
        labels: self.len(),
        classes,
      });
    }
    Ok(())
  }
}
