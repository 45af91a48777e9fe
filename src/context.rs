// 该文件是 Nominal （面值识别） 项目的一部分。
// src/context.rs - 最近一次检测结果
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

use std::sync::{Arc, Mutex, MutexGuard};

use crate::model::{DetectItem, DetectResult};

/// 跨线程共享的最近一次检测结果
///
/// 推理线程写入，播报/界面线程随时读取；每次写入整体替换，不会读到半个结果。
#[derive(Debug, Clone, Default)]
pub struct LastResult {
  inner: Arc<Mutex<Option<Arc<DetectResult>>>>,
}

impl LastResult {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, Option<Arc<DetectResult>>> {
    // 持锁期间只做指针替换，不会在中途 panic
    self.inner.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// 写入新结果，返回被替换的旧结果
  pub fn replace(&self, result: DetectResult) -> Option<Arc<DetectResult>> {
    self.lock().replace(Arc::new(result))
  }

  pub fn latest(&self) -> Option<Arc<DetectResult>> {
    self.lock().clone()
  }

  /// 最近一次结果中置信度最高的检测
  pub fn best(&self) -> Option<DetectItem> {
    self.latest().and_then(|r| r.best().cloned())
  }

  pub fn clear(&self) -> Option<Arc<DetectResult>> {
    self.lock().take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::BoundingBox;
  use std::thread;

  fn result(label: &str, score: f32) -> DetectResult {
    DetectResult::new(vec![DetectItem {
      class_id: 0,
      label: label.to_string(),
      score,
      bbox: BoundingBox::new(0.1, 0.1, 0.5, 0.5),
    }])
  }

  #[test]
  fn test_empty() {
    let last = LastResult::new();
    assert!(last.latest().is_none());
    assert!(last.best().is_none());
  }

  #[test]
  fn test_replace_returns_previous() {
    let last = LastResult::new();
    assert!(last.replace(result("1000", 0.4)).is_none());
    let previous = last.replace(result("5000", 0.9)).unwrap();
    assert_eq!(previous.best().unwrap().label, "1000");
    assert_eq!(last.best().unwrap().label, "5000");
  }

  #[test]
  fn test_empty_result_has_no_best() {
    let last = LastResult::new();
    last.replace(result("1000", 0.4));
    last.replace(DetectResult::default());
    assert!(last.latest().is_some());
    assert!(last.best().is_none());
  }

  #[test]
  fn test_shared_between_threads() {
    let last = LastResult::new();
    let writer = last.clone();
    thread::spawn(move || {
      writer.replace(result("20000", 0.8));
    })
    .join()
    .unwrap();
    assert_eq!(last.best().unwrap().label, "20000");
    assert!(last.clear().is_some());
    assert!(last.latest().is_none());
  }
}
