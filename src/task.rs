// 该文件是 Nominal （面值识别） 项目的一部分。
// src/task.rs - 检测任务
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

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  thread,
  time::{Duration, Instant},
};

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::{
  context::LastResult, detector::Detect, model::DetectResult, output::Render, stream::LatestFrame,
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 只处理第一帧
pub struct OneShotTask;

impl<RE, I, M, O> Task<I, M, O> for OneShotTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = RgbImage>,
  M: Detect,
  O: Render<RgbImage, DetectResult, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, mut model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");
    let now = Instant::now();
    let result = model.detect(&frame)?;
    info!(
      "检测完成，推理耗时: {:.2?}, 总耗时: {:.2?}",
      result.inference_time,
      now.elapsed()
    );
    output.render_result(&frame, &result)?;
    info!("渲染完成");

    Ok(())
  }
}

/// 相机式连续检测
///
/// 采集线程把帧放进 [`LatestFrame`]，推理跟不上时旧帧被覆盖；
/// 当前线程总是检测最新一帧，结果写入 [`LastResult`] 后渲染。
#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  last: LastResult,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 与其他线程（例如重复播报）共享最近一次结果
  pub fn with_last_result(mut self, last: LastResult) -> Self {
    self.last = last;
    self
  }

  pub fn last_result(&self) -> LastResult {
    self.last.clone()
  }
}

fn install_interrupt(stop: Arc<AtomicBool>, frames: LatestFrame<RgbImage>) {
  let installed = ctrlc::set_handler(move || {
    info!("收到中断信号，准备退出...");
    stop.store(true, Ordering::SeqCst);
    frames.close();
    thread::spawn(|| {
      thread::sleep(Duration::from_secs(30));
      warn!("强制退出程序");
      std::process::exit(1);
    });
  });
  if let Err(e) = installed {
    warn!("无法注册 Ctrl-C 处理: {}", e);
  }
}

impl<RE, I, M, O> Task<I, M, O> for ContinuousTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = RgbImage> + Send + 'static,
  M: Detect,
  O: Render<RgbImage, DetectResult, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, mut model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frames = LatestFrame::new();
    let stop = Arc::new(AtomicBool::new(false));
    install_interrupt(stop.clone(), frames.clone());

    let capture = {
      let frames = frames.clone();
      let stop = stop.clone();
      thread::spawn(move || {
        let mut captured = 0usize;
        for frame in input {
          if stop.load(Ordering::SeqCst) || frames.is_closed() {
            break;
          }
          captured += 1;
          if frames.offer(frame) {
            debug!("推理跟不上采集，丢弃旧帧");
          }
        }
        frames.close();
        captured
      })
    };

    let mut frame_index = 0usize;
    let run = (|| -> anyhow::Result<()> {
      let mut now = Instant::now();
      while let Some(frame) = frames.take() {
        frame_index += 1;
        debug!("处理第 {} 帧图像", frame_index);
        let result = model.detect(&frame)?;
        if result.is_empty() {
          warn!("第 {} 帧未检测到纸币", frame_index);
        }
        output.render_result(&frame, &result)?;
        let inference_time = result.inference_time;
        self.last.replace(result);
        info!(
          "推理完成，耗时: {:.2?} / {:.2?}",
          inference_time,
          now.elapsed()
        );
        now = Instant::now();

        if self.frame_number.map(|n| frame_index >= n).unwrap_or(false) {
          info!("达到指定帧数 {}, 退出任务循环", frame_index);
          break;
        }
        if stop.load(Ordering::SeqCst) {
          warn!("中断信号接收，退出任务循环");
          break;
        }
      }
      Ok(())
    })();

    stop.store(true, Ordering::SeqCst);
    frames.close();
    let captured = capture
      .join()
      .map_err(|_| anyhow::anyhow!("采集线程异常退出"))?;
    info!(
      "任务完成，采集 {} 帧, 检测 {} 帧, 丢弃 {} 帧",
      captured,
      frame_index,
      frames.dropped()
    );
    run
  }
}
