// 该文件是 Nominal （面值识别） 项目的一部分。
// src/stream.rs - 只保留最新一帧的帧槽
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

use std::sync::{
  Arc, Mutex,
  atomic::{AtomicUsize, Ordering},
};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select};
use tracing::trace;

/// 采集线程与推理线程之间的单帧缓冲
///
/// 容量为 1 的通道；推理跟不上采集时，放入新帧前先取走未处理的旧帧，
/// 推理线程拿到的永远是最新一帧。
#[derive(Debug)]
pub struct LatestFrame<T> {
  tx: Sender<T>,
  rx: Receiver<T>,
  // 关闭即丢弃唯一的发送端，等待中的 `take` 随之醒来
  done_tx: Arc<Mutex<Option<Sender<()>>>>,
  done_rx: Receiver<()>,
  dropped: Arc<AtomicUsize>,
}

impl<T> Clone for LatestFrame<T> {
  fn clone(&self) -> Self {
    Self {
      tx: self.tx.clone(),
      rx: self.rx.clone(),
      done_tx: self.done_tx.clone(),
      done_rx: self.done_rx.clone(),
      dropped: self.dropped.clone(),
    }
  }
}

impl<T> Default for LatestFrame<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> LatestFrame<T> {
  pub fn new() -> Self {
    let (tx, rx) = bounded(1);
    let (done_tx, done_rx) = bounded(0);
    Self {
      tx,
      rx,
      done_tx: Arc::new(Mutex::new(Some(done_tx))),
      done_rx,
      dropped: Arc::new(AtomicUsize::new(0)),
    }
  }

  /// 放入一帧；若覆盖了尚未取走的旧帧返回 true。关闭后放入的帧被丢弃。
  pub fn offer(&self, frame: T) -> bool {
    if self.is_closed() {
      return false;
    }

    let mut frame = frame;
    let mut replaced = false;
    loop {
      match self.tx.try_send(frame) {
        Ok(()) => break,
        Err(TrySendError::Full(back)) => {
          if self.rx.try_recv().is_ok() {
            replaced = true;
            let n = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            trace!("丢弃旧帧，累计 {}", n);
          }
          frame = back;
        }
        Err(TrySendError::Disconnected(_)) => return false,
      }
    }
    replaced
  }

  /// 阻塞直到有新帧；关闭且槽为空时返回 None
  pub fn take(&self) -> Option<T> {
    select! {
      recv(self.rx) -> frame => frame.ok(),
      recv(self.done_rx) -> _ => self.rx.try_recv().ok(),
    }
  }

  pub fn try_take(&self) -> Option<T> {
    self.rx.try_recv().ok()
  }

  /// 关闭后不再接受新帧，槽里剩下的一帧仍可取走
  pub fn close(&self) {
    self
      .done_tx
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .take();
  }

  pub fn is_closed(&self) -> bool {
    self
      .done_tx
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .is_none()
  }

  /// 被覆盖而未处理的帧数
  pub fn dropped(&self) -> usize {
    self.dropped.load(Ordering::Relaxed)
  }
}
