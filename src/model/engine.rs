// 该文件是 Nominal （面值识别） 项目的一部分。
// src/model/engine.rs - 按 URL 方案选择推理引擎
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{InferenceEngine, ReplayEngine, ReplayEngineError},
  tensor::Tensor,
};

#[cfg(feature = "onnx")]
use crate::model::{OnnxEngine, OnnxEngineError};

#[derive(Error, Debug)]
pub enum EngineError {
  #[error("回放引擎错误: {0}")]
  ReplayEngineError(#[from] ReplayEngineError),
  #[cfg(feature = "onnx")]
  #[error("ONNX 引擎错误: {0}")]
  OnnxEngineError(#[from] OnnxEngineError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum EngineWrapper {
  Replay(ReplayEngine),
  #[cfg(feature = "onnx")]
  Onnx(Box<OnnxEngine>),
}

impl FromUrl for EngineWrapper {
  type Error = EngineError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      ReplayEngine::SCHEME => Ok(EngineWrapper::Replay(ReplayEngine::from_url(url)?)),
      #[cfg(feature = "onnx")]
      OnnxEngine::SCHEME => Ok(EngineWrapper::Onnx(Box::new(OnnxEngine::from_url(url)?))),
      other => Err(EngineError::SchemeMismatch(other.to_string())),
    }
  }
}

impl InferenceEngine for EngineWrapper {
  type Error = EngineError;

  fn input_shape(&self) -> &[usize] {
    match self {
      EngineWrapper::Replay(engine) => engine.input_shape(),
      #[cfg(feature = "onnx")]
      EngineWrapper::Onnx(engine) => engine.input_shape(),
    }
  }

  fn output_shape(&self) -> &[usize] {
    match self {
      EngineWrapper::Replay(engine) => engine.output_shape(),
      #[cfg(feature = "onnx")]
      EngineWrapper::Onnx(engine) => engine.output_shape(),
    }
  }

  fn infer(&mut self, input: &Tensor) -> Result<Tensor, Self::Error> {
    match self {
      EngineWrapper::Replay(engine) => engine.infer(input).map_err(EngineError::from),
      #[cfg(feature = "onnx")]
      EngineWrapper::Onnx(engine) => engine.infer(input).map_err(EngineError::from),
    }
  }
}
