//! 脚本化模型
//!
//! 按预先排好的队列返回结果，用于演示和测试，不依赖真实模型

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::buffer::Frame;
use crate::error::OracleError;
use super::oracle::{AttributeOracle, GestureOracle};
use super::types::{FaceBox, FaceEstimate, GestureScore, HandObservation, Landmark};

/// 脚本化人脸属性模型
///
/// 接近检测队列耗尽后一直返回"没有人脸"
#[derive(Default)]
pub struct ScriptedAttributeOracle {
    warm_up_error: Option<String>,
    singles: Mutex<VecDeque<Result<Option<FaceBox>, OracleError>>>,
    batch: Mutex<Option<Result<Vec<FaceEstimate>, OracleError>>>,
    batch_delay: Duration,
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
}

impl ScriptedAttributeOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟模型加载失败
    pub fn failing_warm_up(mut self, reason: impl Into<String>) -> Self {
        self.warm_up_error = Some(reason.into());
        self
    }

    /// 追加一段人脸框宽度序列，`None` 表示该帧没有人脸
    pub fn with_box_widths(self, widths: impl IntoIterator<Item = Option<f32>>) -> Self {
        {
            let mut singles = self.singles.lock();
            for width in widths {
                singles.push_back(Ok(width.map(|width_px| FaceBox { width_px })));
            }
        }
        self
    }

    /// 追加一次检测失败
    pub fn with_single_error(self, reason: impl Into<String>) -> Self {
        self.singles
            .lock()
            .push_back(Err(OracleError::Inference(reason.into())));
        self
    }

    /// 多人脸分析结果 (每次调用都返回同一份)
    pub fn with_batch(self, faces: Vec<FaceEstimate>) -> Self {
        *self.batch.lock() = Some(Ok(faces));
        self
    }

    pub fn with_batch_error(self, reason: impl Into<String>) -> Self {
        *self.batch.lock() = Some(Err(OracleError::Inference(reason.into())));
        self
    }

    /// 多人脸分析耗时
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttributeOracle for ScriptedAttributeOracle {
    async fn warm_up(&self) -> Result<(), OracleError> {
        match &self.warm_up_error {
            Some(reason) => Err(OracleError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    async fn analyze_single(&self, _frame: &Frame) -> Result<Option<FaceBox>, OracleError> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        self.singles.lock().pop_front().unwrap_or(Ok(None))
    }

    async fn analyze_batch(&self, _frame: &Frame) -> Result<Vec<FaceEstimate>, OracleError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if !self.batch_delay.is_zero() {
            tokio::time::sleep(self.batch_delay).await;
        }
        self.batch.lock().clone().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// 脚本化手势模型
///
/// 队列耗尽后一直返回"没有手"
#[derive(Default)]
pub struct ScriptedGestureOracle {
    warm_up_error: Option<String>,
    frames: Mutex<VecDeque<Result<Option<HandObservation>, OracleError>>>,
    calls: AtomicUsize,
}

impl ScriptedGestureOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟模型加载失败
    pub fn failing_warm_up(mut self, reason: impl Into<String>) -> Self {
        self.warm_up_error = Some(reason.into());
        self
    }

    /// 追加原始观测
    pub fn push(&self, observation: Option<HandObservation>) {
        self.frames.lock().push_back(Ok(observation));
    }

    /// 追加一次分析失败
    pub fn push_error(&self, reason: impl Into<String>) {
        self.frames
            .lock()
            .push_back(Err(OracleError::Inference(reason.into())));
    }

    /// 追加 n 帧静态手势 (手腕不动)
    pub fn push_static(&self, label: &str, confidence: f32, n: usize) {
        for _ in 0..n {
            self.push(Some(HandObservation {
                static_gesture: Some(GestureScore::new(label, confidence)),
                landmarks: vec![Landmark { x: 0.5, y: 0.5 }],
            }));
        }
    }

    /// 追加一段手腕轨迹 (无静态手势)
    pub fn push_wrist_path(&self, points: &[(f32, f32)]) {
        for &(x, y) in points {
            self.push(Some(HandObservation {
                static_gesture: Some(GestureScore::new("None", 0.9)),
                landmarks: vec![Landmark { x, y }],
            }));
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GestureOracle for ScriptedGestureOracle {
    async fn warm_up(&self) -> Result<(), OracleError> {
        match &self.warm_up_error {
            Some(reason) => Err(OracleError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    async fn analyze_frame(
        &self,
        _frame: &Frame,
        _timestamp_ms: u64,
    ) -> Result<Option<HandObservation>, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.frames.lock().pop_front().unwrap_or(Ok(None))
    }
}

/// 构造一张人脸估计，表情分布按给定顺序
pub fn face(age: f32, gender: &str, confidence: f32, expressions: &[(&str, f32)]) -> FaceEstimate {
    FaceEstimate {
        age,
        gender_label: gender.to_string(),
        gender_confidence: confidence,
        expression_scores: expressions
            .iter()
            .map(|(label, score)| (label.to_string(), *score))
            .collect(),
    }
}
