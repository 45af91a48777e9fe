// 该文件是 Nominal （面值识别） 项目的一部分。
// src/model/replay.rs - 回放推理引擎
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::{fs::File, io::BufReader, path::Path};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, model::InferenceEngine, tensor::Tensor};

#[derive(Error, Debug)]
pub enum ReplayEngineError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("录制数据无效: {0}")]
  InvalidRecord(String),
  #[error("输入形状不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  InputShape {
    expected: Vec<usize>,
    actual: Vec<usize>,
  },
}

/// 录制文件格式
#[derive(Debug, Deserialize)]
struct Record {
  input_shape: Vec<usize>,
  output_shape: Vec<usize>,
  output: Vec<f32>,
}

/// 每次推理都返回同一个录制好的输出张量
///
/// 用于没有推理运行时的环境，或者回放设备上抓取的原始输出。
#[derive(Debug, Clone)]
pub struct ReplayEngine {
  input_shape: Vec<usize>,
  output: Tensor,
}

impl ReplayEngine {
  pub fn new(input_shape: &[usize], output: Tensor) -> Self {
    Self {
      input_shape: input_shape.to_vec(),
      output,
    }
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ReplayEngineError> {
    let path = path.as_ref();
    info!("加载回放文件: {}", path.display());
    let record: Record = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    let output = Tensor::new(&record.output_shape, record.output).map_err(|e| {
      error!("回放文件无效: {}", e);
      ReplayEngineError::InvalidRecord(e.to_string())
    })?;
    debug!(
      "回放输入形状 {:?}, 输出形状 {:?}",
      record.input_shape,
      output.shape()
    );
    Ok(Self::new(&record.input_shape, output))
  }
}

impl FromUrlWithScheme for ReplayEngine {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayEngine {
  type Error = ReplayEngineError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayEngineError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }
    Self::from_file(url.path())
  }
}

impl InferenceEngine for ReplayEngine {
  type Error = ReplayEngineError;

  fn input_shape(&self) -> &[usize] {
    &self.input_shape
  }

  fn output_shape(&self) -> &[usize] {
    self.output.shape()
  }

  fn infer(&mut self, input: &Tensor) -> Result<Tensor, Self::Error> {
    if input.shape() != self.input_shape.as_slice() {
      return Err(ReplayEngineError::InputShape {
        expected: self.input_shape.clone(),
        actual: input.shape().to_vec(),
      });
    }
    Ok(self.output.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_from_url() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
      file,
      r#"{{"input_shape":[1,2,2,3],"output_shape":[1,5,2],"output":[0,1,2,3,4,5,6,7,8,9]}}"#
    )
    .unwrap();

    let url = Url::parse(&format!("replay://{}", file.path().display())).unwrap();
    let mut engine = ReplayEngine::from_url(&url).unwrap();
    assert_eq!(engine.input_shape(), &[1, 2, 2, 3]);
    assert_eq!(engine.output_shape(), &[1, 5, 2]);

    let output = engine.infer(&Tensor::zeros(&[1, 2, 2, 3])).unwrap();
    assert_eq!(output.data()[9], 9.0);
  }

  #[test]
  fn test_invalid_record_length() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
      file,
      r#"{{"input_shape":[1,2,2,3],"output_shape":[1,5,2],"output":[0,1,2]}}"#
    )
    .unwrap();
    let err = ReplayEngine::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ReplayEngineError::InvalidRecord(_)));
  }

  #[test]
  fn test_scheme_mismatch() {
    let url = Url::parse("onnx:///tmp/model.onnx").unwrap();
    assert!(matches!(
      ReplayEngine::from_url(&url),
      Err(ReplayEngineError::SchemeMismatch(_))
    ));
  }

  #[test]
  fn test_input_shape_checked() {
    let mut engine = ReplayEngine::new(&[1, 4, 4, 3], Tensor::zeros(&[1, 5, 1]));
    let err = engine.infer(&Tensor::zeros(&[1, 3, 4, 4])).unwrap_err();
    assert!(matches!(err, ReplayEngineError::InputShape { .. }));
  }
}
