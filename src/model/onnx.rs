// 该文件是 Nominal （面值识别） 项目的一部分。
// src/model/onnx.rs - ONNX Runtime 推理引擎
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use ndarray::{ArrayViewD, IxDyn};
use ort::{
  session::{Session, builder::GraphOptimizationLevel},
  value::TensorRef,
};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, model::InferenceEngine, tensor::Tensor};

const DEFAULT_INTRA_THREADS: usize = 4;

#[derive(Error, Debug)]
pub enum OnnxEngineError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("缺少参数: {0}")]
  MissingParam(&'static str),
  #[error("参数格式错误: {0}")]
  InvalidParam(String),
  #[error("ONNX Runtime 错误: {0}")]
  Ort(#[from] ort::Error),
  #[error("张量错误: {0}")]
  Tensor(String),
}

/// ONNX Runtime 会话，输入输出形状由部署配置给定
pub struct OnnxEngine {
  session: Session,
  input_shape: Vec<usize>,
  output_shape: Vec<usize>,
}

impl OnnxEngine {
  pub fn load(
    path: &str,
    input_shape: &[usize],
    output_shape: &[usize],
    intra_threads: usize,
  ) -> Result<Self, OnnxEngineError> {
    // 重复初始化无副作用
    let _ = ort::init().commit();

    info!("加载 ONNX 模型: {}", path);
    // 构建器的错误携带构建器本身，先收窄为普通错误
    let session = Session::builder()
      .map_err(ort::Error::from)?
      .with_optimization_level(GraphOptimizationLevel::Level3)
      .map_err(ort::Error::from)?
      .with_intra_threads(intra_threads)
      .map_err(ort::Error::from)?
      .commit_from_file(path)
      .map_err(ort::Error::from)?;
    info!("模型加载完成");

    Ok(Self {
      session,
      input_shape: input_shape.to_vec(),
      output_shape: output_shape.to_vec(),
    })
  }
}

fn parse_shape(value: &str) -> Result<Vec<usize>, OnnxEngineError> {
  value
    .split(',')
    .map(|dim| {
      dim
        .trim()
        .parse::<usize>()
        .map_err(|_| OnnxEngineError::InvalidParam(format!("形状 '{}'", value)))
    })
    .collect()
}

impl FromUrlWithScheme for OnnxEngine {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for OnnxEngine {
  type Error = OnnxEngineError;

  /// `onnx:///path/model.onnx?input=1,640,640,3&output=1,11,8400&threads=4`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OnnxEngineError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let mut input = None;
    let mut output = None;
    let mut threads = DEFAULT_INTRA_THREADS;
    for (k, v) in url.query_pairs() {
      match k.as_ref() {
        "input" => input = Some(parse_shape(&v)?),
        "output" => output = Some(parse_shape(&v)?),
        "threads" => {
          threads = v
            .parse()
            .map_err(|_| OnnxEngineError::InvalidParam(format!("threads '{}'", v)))?
        }
        _ => {}
      }
    }

    let input = input.ok_or(OnnxEngineError::MissingParam("input"))?;
    let output = output.ok_or(OnnxEngineError::MissingParam("output"))?;
    Self::load(url.path(), &input, &output, threads)
  }
}

impl InferenceEngine for OnnxEngine {
  type Error = OnnxEngineError;

  fn input_shape(&self) -> &[usize] {
    &self.input_shape
  }

  fn output_shape(&self) -> &[usize] {
    &self.output_shape
  }

  fn infer(&mut self, input: &Tensor) -> Result<Tensor, Self::Error> {
    let view = ArrayViewD::from_shape(IxDyn(input.shape()), input.data())
      .map_err(|e| OnnxEngineError::Tensor(e.to_string()))?;

    let outputs = self
      .session
      .run(ort::inputs![
        TensorRef::from_array_view(view)?
      ])?;

    let array = outputs[0].try_extract_array::<f32>()?;
    let shape = array.shape().to_vec();
    let data: Vec<f32> = array.iter().copied().collect();
    debug!("模型输出形状: {:?}", shape);

    Tensor::new(&shape, data).map_err(|e| OnnxEngineError::Tensor(e.to_string()))
  }
}
