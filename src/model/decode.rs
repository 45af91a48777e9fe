// 该文件是 Nominal （面值识别） 项目的一部分。
// src/model/decode.rs - 输出张量解码与非极大值抑制
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
  config::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_DETECTIONS},
  error::DetectError,
  model::{BoundingBox, DetectItem, DetectResult, LabelTable},
  preprocess::ScaleTransform,
  tensor::Tensor,
};

/// 每个候选框的几何通道数: cx, cy, w, h
pub const BOX_CHANNELS: usize = 4;

/// 重叠框的抑制策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NmsPolicy {
  /// 不区分类别，任何重叠框都参与抑制
  #[default]
  ClassAgnostic,
  /// 只抑制同一类别的重叠框
  ClassAware,
  /// 不做 NMS，只取全部 N×K 分数中的全局最大值
  BestOnly,
}

impl std::str::FromStr for NmsPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "agnostic" | "class-agnostic" => Ok(NmsPolicy::ClassAgnostic),
      "aware" | "class-aware" => Ok(NmsPolicy::ClassAware),
      "best" | "best-only" => Ok(NmsPolicy::BestOnly),
      other => Err(format!("未知的 NMS 策略: {}", other)),
    }
  }
}

/// 输出张量中框坐标的约定，由模型决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoxConvention {
  /// 相对输入张量归一化到 [0, 1]
  #[default]
  Normalized,
  /// 输入张量像素坐标
  InputPixels,
}

impl std::str::FromStr for BoxConvention {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "normalized" => Ok(BoxConvention::Normalized),
      "pixels" | "input-pixels" => Ok(BoxConvention::InputPixels),
      other => Err(format!("未知的坐标约定: {}", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderConfig {
  pub confidence_threshold: f32,
  pub iou_threshold: f32,
  pub nms: NmsPolicy,
  pub boxes: BoxConvention,
  pub max_detections: usize,
}

impl Default for DecoderConfig {
  fn default() -> Self {
    Self {
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      nms: NmsPolicy::default(),
      boxes: BoxConvention::default(),
      max_detections: DEFAULT_MAX_DETECTIONS,
    }
  }
}

/// 阈值过滤后的候选框
#[derive(Debug, Clone, Copy)]
struct Candidate {
  class_id: usize,
  score: f32,
  bbox: BoundingBox,
}

/// 将 `[1, 4 + K, N]` 输出张量解码为检测结果
#[derive(Debug, Clone)]
pub struct Decoder {
  labels: LabelTable,
  config: DecoderConfig,
}

impl Decoder {
  pub fn new(labels: LabelTable, config: DecoderConfig) -> Self {
    Self { labels, config }
  }

  pub fn labels(&self) -> &LabelTable {
    &self.labels
  }

  pub fn config(&self) -> &DecoderConfig {
    &self.config
  }

  pub fn num_classes(&self) -> usize {
    self.labels.len()
  }

  /// 校验输出形状，返回候选框数量 N
  ///
  /// 秩或批次不对是形状错误；`[1, C, N]` 但类别数与标签表不符是标签错误。
  pub fn check_shape(&self, shape: &[usize]) -> Result<usize, DetectError> {
    let channels = BOX_CHANNELS + self.num_classes();
    match shape {
      [1, c, n] if *c == channels => Ok(*n),
      [1, c, _] if *c >= BOX_CHANNELS => Err(DetectError::LabelMismatch {
        labels: self.num_classes(),
        classes: c - BOX_CHANNELS,
      }),
      _ => {
        let n = shape.get(2).copied().unwrap_or(0);
        Err(DetectError::shape(&[1, channels, n], shape))
      }
    }
  }

  pub fn decode(
    &self,
    output: &Tensor,
    transform: &ScaleTransform,
  ) -> Result<DetectResult, DetectError> {
    let n = self.check_shape(output.shape())?;
    let data = output.data();

    let items = match self.config.nms {
      NmsPolicy::BestOnly => self.decode_best(data, n, transform),
      policy => {
        let candidates = self.collect_candidates(data, n, transform);
        trace!("阈值过滤后候选框 {} 个", candidates.len());
        self.suppress(candidates, policy == NmsPolicy::ClassAware)
      }
    };

    debug!("解码完成: {} 个候选, 保留 {} 个检测", n, items.len());
    Ok(DetectResult::new(items))
  }

  fn collect_candidates(
    &self,
    data: &[f32],
    n: usize,
    transform: &ScaleTransform,
  ) -> Vec<Candidate> {
    let num_classes = self.num_classes();
    let mut candidates = Vec::new();

    for i in 0..n {
      let (score, class_id) = {
        let mut max_score = f32::NEG_INFINITY;
        let mut cls_idx = None;
        for c in 0..num_classes {
          let score = data[(BOX_CHANNELS + c) * n + i];
          if score > max_score {
            max_score = score;
            cls_idx = Some(c);
          }
        }
        match cls_idx {
          Some(c) => (max_score, c),
          None => continue,
        }
      };

      if score < self.config.confidence_threshold {
        continue;
      }

      if let Some(bbox) = self.decode_box(data, n, i, transform) {
        candidates.push(Candidate {
          class_id,
          score,
          bbox,
        });
      }
    }

    candidates
  }

  /// 全局最大分数，严格大于才替换，相同分数先出现者胜出
  fn decode_best(&self, data: &[f32], n: usize, transform: &ScaleTransform) -> Vec<DetectItem> {
    let num_classes = self.num_classes();
    let mut best_score = 0.0f32;
    let mut best = None;

    for i in 0..n {
      for c in 0..num_classes {
        let score = data[(BOX_CHANNELS + c) * n + i];
        if score > best_score {
          best_score = score;
          best = Some((i, c));
        }
      }
    }

    let Some((index, class_id)) = best else {
      return Vec::new();
    };
    if best_score < self.config.confidence_threshold {
      return Vec::new();
    }

    // 纯分类头没有有效的框，分数本身即结果
    let bbox = self
      .decode_box(data, n, index, transform)
      .unwrap_or_default();
    vec![self.to_item(Candidate {
      class_id,
      score: best_score,
      bbox,
    })]
  }

  /// 中心点格式 -> 原图角点格式，裁剪后面积为 0 的框丢弃
  fn decode_box(
    &self,
    data: &[f32],
    n: usize,
    index: usize,
    transform: &ScaleTransform,
  ) -> Option<BoundingBox> {
    let unit = match self.config.boxes {
      BoxConvention::Normalized => transform.input_size as f32,
      BoxConvention::InputPixels => 1.0,
    };

    let cx = data[index] * unit;
    let cy = data[n + index] * unit;
    let w = data[2 * n + index] * unit;
    let h = data[3 * n + index] * unit;

    let input = BoundingBox::from_center(cx, cy, w, h);
    let (x_min, y_min) = transform.to_original(input.x_min, input.y_min);
    let (x_max, y_max) = transform.to_original(input.x_max, input.y_max);
    let bbox = BoundingBox::new(x_min, y_min, x_max, y_max);

    (bbox.area() > 0.0).then_some(bbox)
  }

  fn suppress(&self, mut candidates: Vec<Candidate>, class_aware: bool) -> Vec<DetectItem> {
    // 稳定排序，分数相同时保持原始顺序
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
      if kept.len() >= self.config.max_detections {
        break;
      }

      let overlapped = kept.iter().any(|k| {
        (!class_aware || k.class_id == candidate.class_id)
          && iou(&k.bbox, &candidate.bbox) >= self.config.iou_threshold
      });
      if !overlapped {
        kept.push(candidate);
      }
    }

    kept.into_iter().map(|c| self.to_item(c)).collect()
  }

  fn to_item(&self, candidate: Candidate) -> DetectItem {
    DetectItem {
      class_id: candidate.class_id,
      label: self
        .labels
        .get(candidate.class_id)
        .unwrap_or("unknown")
        .to_string(),
      score: candidate.score,
      bbox: candidate.bbox,
    }
  }
}

/// 计算两个边界框的 IoU
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
  let x1 = a.x_min.max(b.x_min);
  let y1 = a.y_min.max(b.y_min);
  let x2 = a.x_max.min(b.x_max);
  let y2 = a.y_max.min(b.y_max);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let union = a.area() + b.area() - intersection;

  if union > 0.0 {
    intersection / union
  } else {
    0.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    preprocess::{Preprocessor, ResizePolicy},
    tensor::TensorLayout,
  };
  use image::RgbImage;
  use proptest::prelude::*;

  /// 候选框: 归一化 cxcywh 与 K 个类别分数
  fn create_output(candidates: &[([f32; 4], Vec<f32>)], num_classes: usize) -> Tensor {
    let n = candidates.len();
    let channels = BOX_CHANNELS + num_classes;
    let mut data = vec![0.0f32; channels * n];
    for (i, (geometry, scores)) in candidates.iter().enumerate() {
      for (c, v) in geometry.iter().enumerate() {
        data[c * n + i] = *v;
      }
      for (c, v) in scores.iter().enumerate() {
        data[(BOX_CHANNELS + c) * n + i] = *v;
      }
    }
    Tensor::new(&[1, channels, n], data).unwrap()
  }

  fn labels(k: usize) -> LabelTable {
    LabelTable::new((0..k).map(|i| format!("class-{}", i)))
  }

  fn decoder(k: usize, confidence: f32, nms: NmsPolicy) -> Decoder {
    Decoder::new(
      labels(k),
      DecoderConfig {
        confidence_threshold: confidence,
        iou_threshold: 0.5,
        nms,
        ..Default::default()
      },
    )
  }

  fn assert_close(a: f32, b: f32) {
    assert!((a - b).abs() < 1e-3, "{} != {}", a, b);
  }

  #[test]
  fn test_iou() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
    assert_close(iou(&a, &b), 50.0 / 150.0);
    assert_eq!(iou(&a, &BoundingBox::new(20.0, 20.0, 30.0, 30.0)), 0.0);
    assert_eq!(iou(&a, &a), 1.0);
    let empty = BoundingBox::default();
    assert_eq!(iou(&empty, &empty), 0.0);
  }

  #[test]
  fn test_single_candidate_label_and_score() {
    let output = create_output(
      &[(
        [0.5, 0.5, 0.2, 0.2],
        vec![0.1, 0.5, 0.3, 0.9, 0.2, 0.0, 0.4],
      )],
      7,
    );
    let decoder = decoder(7, 0.25, NmsPolicy::ClassAgnostic);
    let result = decoder
      .decode(&output, &ScaleTransform::identity(640))
      .unwrap();

    assert_eq!(result.len(), 1);
    let det = result.best().unwrap();
    assert_eq!(det.class_id, 3);
    assert_eq!(det.label, "class-3");
    assert_close(det.score, 0.9);
  }

  #[test]
  fn test_overlapping_same_class_suppressed() {
    let output = create_output(
      &[
        ([0.50, 0.50, 0.2, 0.2], vec![0.8, 0.0]),
        ([0.51, 0.50, 0.2, 0.2], vec![0.9, 0.0]),
      ],
      2,
    );
    let result = decoder(2, 0.25, NmsPolicy::ClassAgnostic)
      .decode(&output, &ScaleTransform::identity(640))
      .unwrap();

    assert_eq!(result.len(), 1);
    assert_close(result.items[0].score, 0.9);
  }

  #[test]
  fn test_disjoint_boxes_kept_in_score_order() {
    let output = create_output(
      &[
        ([0.2, 0.2, 0.1, 0.1], vec![0.8, 0.0]),
        ([0.8, 0.8, 0.1, 0.1], vec![0.9, 0.0]),
      ],
      2,
    );
    let result = decoder(2, 0.25, NmsPolicy::ClassAgnostic)
      .decode(&output, &ScaleTransform::identity(640))
      .unwrap();

    let scores: Vec<f32> = result.iter().map(|d| d.score).collect();
    assert_eq!(scores, vec![0.9, 0.8]);
  }

  #[test]
  fn test_class_aware_keeps_other_class() {
    let candidates = [
      ([0.50, 0.50, 0.2, 0.2], vec![0.9, 0.0]),
      ([0.50, 0.51, 0.2, 0.2], vec![0.0, 0.8]),
    ];
    let output = create_output(&candidates, 2);
    let transform = ScaleTransform::identity(640);

    let aware = decoder(2, 0.25, NmsPolicy::ClassAware)
      .decode(&output, &transform)
      .unwrap();
    assert_eq!(aware.len(), 2);
    assert_eq!(aware.items[1].class_id, 1);

    let agnostic = decoder(2, 0.25, NmsPolicy::ClassAgnostic)
      .decode(&output, &transform)
      .unwrap();
    assert_eq!(agnostic.len(), 1);
    assert_eq!(agnostic.items[0].class_id, 0);
  }

  #[test]
  fn test_equal_scores_first_seen_wins() {
    let output = create_output(
      &[
        ([0.50, 0.50, 0.2, 0.2], vec![0.0, 0.7]),
        ([0.50, 0.50, 0.2, 0.2], vec![0.7, 0.0]),
      ],
      2,
    );
    let result = decoder(2, 0.25, NmsPolicy::ClassAgnostic)
      .decode(&output, &ScaleTransform::identity(640))
      .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.items[0].class_id, 1);
  }

  #[test]
  fn test_below_threshold_is_empty_not_error() {
    let output = create_output(&[([0.5, 0.5, 0.2, 0.2], vec![0.2, 0.1])], 2);
    let result = decoder(2, 0.25, NmsPolicy::ClassAgnostic)
      .decode(&output, &ScaleTransform::identity(640))
      .unwrap();
    assert!(result.is_empty());
    assert!(result.best().is_none());
  }

  #[test]
  fn test_threshold_is_inclusive() {
    let output = create_output(&[([0.5, 0.5, 0.2, 0.2], vec![0.25])], 1);
    let result = decoder(1, 0.25, NmsPolicy::ClassAgnostic)
      .decode(&output, &ScaleTransform::identity(640))
      .unwrap();
    assert_eq!(result.len(), 1);
  }

  #[test]
  fn test_nan_scores_never_selected() {
    let output = create_output(
      &[
        ([0.2, 0.2, 0.1, 0.1], vec![f32::NAN, f32::NAN]),
        ([0.8, 0.8, 0.1, 0.1], vec![f32::NAN, 0.6]),
      ],
      2,
    );
    let result = decoder(2, 0.25, NmsPolicy::ClassAgnostic)
      .decode(&output, &ScaleTransform::identity(640))
      .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.items[0].class_id, 1);
  }

  #[test]
  fn test_shape_mismatch() {
    let decoder = decoder(7, 0.25, NmsPolicy::ClassAgnostic);
    for shape in [vec![11, 8400], vec![2, 11, 8400], vec![1, 3, 8400]] {
      let output = Tensor::zeros(&shape);
      let err = decoder
        .decode(&output, &ScaleTransform::identity(640))
        .unwrap_err();
      assert!(
        matches!(err, DetectError::ShapeMismatch { .. }),
        "{:?}",
        shape
      );
    }
    assert_eq!(decoder.check_shape(&[1, 11, 8400]).unwrap(), 8400);
  }

  #[test]
  fn test_class_count_differs_from_labels() {
    let decoder = Decoder::new(LabelTable::rupiah(), DecoderConfig::default());
    for classes in [0usize, 6, 8] {
      let output = Tensor::zeros(&[1, BOX_CHANNELS + classes, 8400]);
      match decoder.decode(&output, &ScaleTransform::identity(640)) {
        Err(DetectError::LabelMismatch { labels, classes: c }) => {
          assert_eq!(labels, 7);
          assert_eq!(c, classes);
        }
        other => panic!("K={}: {:?}", classes, other),
      }
    }
  }

  #[test]
  fn test_zero_candidates() {
    let output = Tensor::zeros(&[1, 6, 0]);
    let result = decoder(2, 0.25, NmsPolicy::ClassAgnostic)
      .decode(&output, &ScaleTransform::identity(640))
      .unwrap();
    assert!(result.is_empty());
  }

  #[test]
  fn test_box_round_trip_stretch() {
    // 原图 1280x960 拉伸到 640x640，已知框 (320, 240)-(640, 480)
    let transform = ScaleTransform {
      orig_width: 1280,
      orig_height: 960,
      input_size: 640,
      scale_x: 0.5,
      scale_y: 640.0 / 960.0,
      pad_x: 0.0,
      pad_y: 0.0,
    };
    let (x1, y1) = transform.to_input(320.0, 240.0);
    let (x2, y2) = transform.to_input(640.0, 480.0);
    let input = BoundingBox::new(x1, y1, x2, y2);
    let (cx, cy) = input.center();
    let geometry = [
      cx / 640.0,
      cy / 640.0,
      input.width() / 640.0,
      input.height() / 640.0,
    ];

    let output = create_output(&[(geometry, vec![0.95])], 1);
    let result = decoder(1, 0.25, NmsPolicy::ClassAgnostic)
      .decode(&output, &transform)
      .unwrap();

    let bbox = result.best().unwrap().bbox;
    assert_close(bbox.x_min, 320.0);
    assert_close(bbox.y_min, 240.0);
    assert_close(bbox.x_max, 640.0);
    assert_close(bbox.y_max, 480.0);
  }

  #[test]
  fn test_box_round_trip_letterbox_pixels() {
    // 800x600 -> 512: scale 0.64, 上下各填充 64
    let transform = ScaleTransform {
      orig_width: 800,
      orig_height: 600,
      input_size: 512,
      scale_x: 0.64,
      scale_y: 0.64,
      pad_x: 0.0,
      pad_y: 64.0,
    };
    let output = create_output(&[([256.0, 256.0, 102.4, 102.4], vec![0.9])], 1);
    let decoder = Decoder::new(
      labels(1),
      DecoderConfig {
        boxes: BoxConvention::InputPixels,
        ..Default::default()
      },
    );
    let bbox = decoder.decode(&output, &transform).unwrap().items[0].bbox;
    assert_close(bbox.x_min, 320.0);
    assert_close(bbox.y_min, 220.0);
    assert_close(bbox.x_max, 480.0);
    assert_close(bbox.y_max, 380.0);
  }

  #[test]
  fn test_boxes_clamped_and_degenerate_dropped() {
    let output = create_output(
      &[
        ([0.0, 0.0, 0.2, 0.2], vec![0.9]),
        ([1.5, 1.5, 0.2, 0.2], vec![0.8]),
      ],
      1,
    );
    let result = decoder(1, 0.25, NmsPolicy::ClassAgnostic)
      .decode(&output, &ScaleTransform::identity(100))
      .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.items[0].bbox, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
  }

  #[test]
  fn test_max_detections() {
    let candidates: Vec<_> = (0..10)
      .map(|i| ([0.05 + i as f32 * 0.1, 0.5, 0.05, 0.05], vec![0.5 + i as f32 * 0.01]))
      .collect();
    let output = create_output(&candidates, 1);
    let decoder = Decoder::new(
      labels(1),
      DecoderConfig {
        max_detections: 3,
        ..Default::default()
      },
    );
    let result = decoder
      .decode(&output, &ScaleTransform::identity(640))
      .unwrap();
    assert_eq!(result.len(), 3);
    assert_close(result.items[0].score, 0.59);
  }

  #[test]
  fn test_best_only_global_max() {
    let output = create_output(
      &[
        ([0.2, 0.2, 0.1, 0.1], vec![0.3, 0.6, 0.1]),
        ([0.8, 0.8, 0.1, 0.1], vec![0.7, 0.2, 0.7]),
        ([0.5, 0.5, 0.1, 0.1], vec![0.1, 0.1, 0.65]),
      ],
      3,
    );
    let result = decoder(3, 0.0, NmsPolicy::BestOnly)
      .decode(&output, &ScaleTransform::identity(640))
      .unwrap();
    assert_eq!(result.len(), 1);
    // 0.7 出现两次，先扫描到的类别 0 胜出
    assert_eq!(result.items[0].class_id, 0);
    assert_close(result.items[0].score, 0.7);
  }

  #[test]
  fn test_best_only_all_zero_is_empty() {
    let output = create_output(&[([0.5, 0.5, 0.1, 0.1], vec![0.0, 0.0])], 2);
    let result = decoder(2, 0.0, NmsPolicy::BestOnly)
      .decode(&output, &ScaleTransform::identity(640))
      .unwrap();
    assert!(result.is_empty());
  }

  #[test]
  fn test_best_only_classifier_head_without_boxes() {
    let mut scores = vec![0.0; 7];
    scores[5] = 0.9;
    let output = create_output(&[([0.0, 0.0, 0.0, 0.0], scores)], 7);
    let decoder = Decoder::new(
      LabelTable::rupiah(),
      DecoderConfig {
        confidence_threshold: 0.0,
        nms: NmsPolicy::BestOnly,
        ..Default::default()
      },
    );
    let result = decoder
      .decode(&output, &ScaleTransform::identity(640))
      .unwrap();
    let best = result.best().unwrap();
    assert_eq!(best.label, "50000");
    assert_close(best.score, 0.9);
    assert_eq!(best.bbox, BoundingBox::default());
  }

  #[test]
  fn test_best_only_respects_threshold() {
    let output = create_output(&[([0.5, 0.5, 0.1, 0.1], vec![0.2, 0.1])], 2);
    let result = decoder(2, 0.25, NmsPolicy::BestOnly)
      .decode(&output, &ScaleTransform::identity(640))
      .unwrap();
    assert!(result.is_empty());
  }

  #[test]
  fn test_best_only_matches_full_decode_for_single_candidate() {
    let output = create_output(
      &[(
        [0.4, 0.6, 0.3, 0.2],
        vec![0.05, 0.42, 0.88, 0.13, 0.6, 0.0, 0.2],
      )],
      7,
    );
    let transform = ScaleTransform::identity(640);
    let full = decoder(7, 0.25, NmsPolicy::ClassAgnostic)
      .decode(&output, &transform)
      .unwrap();
    let best = decoder(7, 0.25, NmsPolicy::BestOnly)
      .decode(&output, &transform)
      .unwrap();
    assert_eq!(full, best);
  }

  #[test]
  fn test_policy_from_str() {
    assert_eq!("aware".parse::<NmsPolicy>(), Ok(NmsPolicy::ClassAware));
    assert_eq!("best-only".parse::<NmsPolicy>(), Ok(NmsPolicy::BestOnly));
    assert_eq!(
      "pixels".parse::<BoxConvention>(),
      Ok(BoxConvention::InputPixels)
    );
  }

  proptest! {
    #[test]
    fn test_box_survives_preprocess_transform(
      width in 16u32..400,
      height in 16u32..400,
      size in 32u32..320,
      letterbox in any::<bool>(),
      (x0, x1) in (0.0f32..0.4, 0.6f32..=1.0),
      (y0, y1) in (0.0f32..0.4, 0.6f32..=1.0),
    ) {
      let policy = if letterbox { ResizePolicy::Letterbox } else { ResizePolicy::Stretch };
      let pre = Preprocessor::new(size, TensorLayout::Nhwc, policy);
      let (_, transform) = pre.preprocess(&RgbImage::new(width, height)).unwrap();

      let expected = BoundingBox::new(
        x0 * width as f32,
        y0 * height as f32,
        x1 * width as f32,
        y1 * height as f32,
      );
      let (ix_min, iy_min) = transform.to_input(expected.x_min, expected.y_min);
      let (ix_max, iy_max) = transform.to_input(expected.x_max, expected.y_max);
      let input = BoundingBox::new(ix_min, iy_min, ix_max, iy_max);
      let (cx, cy) = input.center();
      let output = create_output(
        &[([cx, cy, input.width(), input.height()], vec![0.0, 0.9])],
        2,
      );

      let decoder = Decoder::new(
        labels(2),
        DecoderConfig {
          boxes: BoxConvention::InputPixels,
          ..Default::default()
        },
      );
      let result = decoder.decode(&output, &transform).unwrap();
      prop_assert_eq!(result.len(), 1);
      let bbox = result.items[0].bbox;
      let tolerance = 0.05;
      prop_assert!((bbox.x_min - expected.x_min).abs() < tolerance, "{:?} != {:?}", bbox, expected);
      prop_assert!((bbox.y_min - expected.y_min).abs() < tolerance, "{:?} != {:?}", bbox, expected);
      prop_assert!((bbox.x_max - expected.x_max).abs() < tolerance, "{:?} != {:?}", bbox, expected);
      prop_assert!((bbox.y_max - expected.y_max).abs() < tolerance, "{:?} != {:?}", bbox, expected);
    }
  }
}
