//! 接近触发
//!
//! 访客走近到阈值以内时触发一次，之后锁定直到会话重置

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ProximityConfig;
use crate::sensing::FaceBox;

/// 人脸无效时的距离
const FAR_AWAY: f32 = 9999.0;

/// 距离估计 (参考宽度 / 人脸框宽度)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DistanceSample(pub f32);

impl DistanceSample {
    pub fn from_box(face: &FaceBox, reference_width_px: f32) -> Self {
        if face.width_px > 0.0 {
            Self(reference_width_px / face.width_px)
        } else {
            Self(FAR_AWAY)
        }
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

/// 触发状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerState {
    /// 等待访客走近
    Searching,
    /// 瞬时状态，随即进入 Locked
    Triggered,
    /// 已触发，不再采样
    Locked,
}

/// 展示层动画锚点 (Logo 顶部位置百分比)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationAnchor {
    pub logo_top_percent: f32,
}

impl AnimationAnchor {
    pub const RESTING: Self = Self { logo_top_percent: 50.0 };
    pub const RAISED: Self = Self { logo_top_percent: 20.0 };
}

/// 单次采样的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerOutcome {
    /// 仍在等待
    Waiting,
    /// 本次采样触发
    Fired { distance: DistanceSample, anchor: AnimationAnchor },
    /// 已锁定，采样被忽略
    Suppressed,
}

/// 接近触发状态机
#[derive(Debug, Clone)]
pub struct ProximityTrigger {
    threshold: f32,
    reference_width_px: f32,
    state: TriggerState,
    last_distance: Option<DistanceSample>,
    anchor: AnimationAnchor,
}

impl ProximityTrigger {
    pub fn new(config: &ProximityConfig) -> Self {
        Self {
            threshold: config.threshold,
            reference_width_px: config.reference_width_px,
            state: TriggerState::Searching,
            last_distance: None,
            anchor: AnimationAnchor::RESTING,
        }
    }

    /// 处理一次采样，`None` 表示画面中没有人脸
    pub fn observe(&mut self, face: Option<&FaceBox>) -> TriggerOutcome {
        if self.state != TriggerState::Searching {
            return TriggerOutcome::Suppressed;
        }

        let Some(face) = face else {
            self.last_distance = None;
            return TriggerOutcome::Waiting;
        };

        let distance = DistanceSample::from_box(face, self.reference_width_px);
        self.last_distance = Some(distance);
        debug!("distance={:.3}", distance.value());

        if distance.value() < self.threshold {
            self.state = TriggerState::Triggered;
            self.anchor = AnimationAnchor::RAISED;
            self.state = TriggerState::Locked;
            info!("访客接近，触发锁定 (distance={:.3})", distance.value());
            return TriggerOutcome::Fired { distance, anchor: self.anchor };
        }

        TriggerOutcome::Waiting
    }

    /// 是否仍需要采样
    pub fn is_armed(&self) -> bool {
        self.state == TriggerState::Searching
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn last_distance(&self) -> Option<DistanceSample> {
        self.last_distance
    }

    pub fn anchor(&self) -> AnimationAnchor {
        self.anchor
    }

    /// 回到 Searching 并清掉缓存的距离
    pub fn reset(&mut self) {
        self.state = TriggerState::Searching;
        self.last_distance = None;
        self.anchor = AnimationAnchor::RESTING;
    }
}

impl Default for ProximityTrigger {
    fn default() -> Self {
        Self::new(&ProximityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(width_px: f32) -> FaceBox {
        FaceBox { width_px }
    }

    #[test]
    fn test_distance_sample() {
        assert_eq!(DistanceSample::from_box(&face(200.0), 200.0).value(), 1.0);
        assert_eq!(DistanceSample::from_box(&face(400.0), 200.0).value(), 0.5);
        assert_eq!(DistanceSample::from_box(&face(0.0), 200.0).value(), FAR_AWAY);
    }

    #[test]
    fn test_far_face_does_not_fire() {
        let mut trigger = ProximityTrigger::default();
        // 距离正好等于阈值不触发
        assert_eq!(trigger.observe(Some(&face(200.0))), TriggerOutcome::Waiting);
        assert_eq!(trigger.observe(Some(&face(100.0))), TriggerOutcome::Waiting);
        assert_eq!(trigger.observe(None), TriggerOutcome::Waiting);
        assert!(trigger.is_armed());
        assert!(trigger.last_distance().is_none());
    }

    #[test]
    fn test_fires_at_most_once() {
        let mut trigger = ProximityTrigger::default();
        let mut fired = 0;

        for _ in 0..5 {
            if let TriggerOutcome::Fired { anchor, .. } = trigger.observe(Some(&face(250.0))) {
                assert_eq!(anchor, AnimationAnchor::RAISED);
                fired += 1;
            }
        }
        for _ in 0..7 {
            assert_eq!(trigger.observe(Some(&face(400.0))), TriggerOutcome::Suppressed);
        }

        assert_eq!(fired, 1);
        assert_eq!(trigger.state(), TriggerState::Locked);
        assert!(!trigger.is_armed());
    }

    #[test]
    fn test_reset_rearms() {
        let mut trigger = ProximityTrigger::default();
        assert!(matches!(trigger.observe(Some(&face(300.0))), TriggerOutcome::Fired { .. }));

        trigger.reset();
        assert_eq!(trigger.state(), TriggerState::Searching);
        assert_eq!(trigger.anchor(), AnimationAnchor::RESTING);
        assert!(trigger.last_distance().is_none());

        assert!(matches!(trigger.observe(Some(&face(300.0))), TriggerOutcome::Fired { .. }));
    }
}
