// 该文件是 Nominal （面值识别） 项目的一部分。
// src/bin/simple_oneshot.rs - 单张图片面值识别
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nominal::{
  Detector, FromUrl,
  args::DetectorArgs,
  input::InputWrapper,
  model::EngineWrapper,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};

/// Nominal 单张图片识别
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(flatten)]
  pub detector: DetectorArgs,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  info!("模型: {}", args.detector.model);
  info!("输入来源: {}", args.detector.input);
  info!("输出: {}", args.detector.output);

  let input = InputWrapper::from_url(&args.detector.input)?;
  let engine = EngineWrapper::from_url(&args.detector.model)?;
  let detector = Detector::new(engine, args.detector.labels()?, args.detector.config())?;
  let output = OutputWrapper::from_url(&args.detector.output)?;

  OneShotTask.run_task(input, detector, output)?;

  Ok(())
}
