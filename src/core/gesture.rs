//! 手势分类器
//!
//! 把逐帧的手势模型输出变成离散的导航事件。两条独立的防抖窗口：
//! - 静态手势 (张开手掌 / 握拳): 置信度超过下限且连续若干帧相同
//! - 方向手势 (上下左右): 手腕位移方向连续若干帧一致
//!
//! 事件之间的冷却由调用方负责 (见 `navigation`)。

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GestureConfig;
use crate::sensing::{HandObservation, Landmark};

/// 参与导航的静态手势
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaticGesture {
    OpenPalm,
    ClosedFist,
}

impl StaticGesture {
    /// 从模型标签解析，非导航手势返回 `None`
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Open_Palm" => Some(Self::OpenPalm),
            "Closed_Fist" => Some(Self::ClosedFist),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenPalm => "open-palm",
            Self::ClosedFist => "closed-fist",
        }
    }
}

/// 手腕移动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// 由相邻两帧的位移判断方向，位移不足返回 `None`
    fn classify(dx: f32, dy: f32, threshold: f32) -> Option<Self> {
        if dx.abs() > dy.abs() {
            if dx > threshold {
                Some(Self::Right)
            } else if dx < -threshold {
                Some(Self::Left)
            } else {
                None
            }
        } else if dy > threshold {
            Some(Self::Down)
        } else if dy < -threshold {
            Some(Self::Up)
        } else {
            None
        }
    }
}

/// 手势事件
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GestureEvent {
    Static { gesture: StaticGesture, confidence: f32 },
    Directional { direction: Direction },
}

impl GestureEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static { gesture, .. } => gesture.as_str(),
            Self::Directional { direction } => direction.as_str(),
        }
    }
}

/// 静态手势防抖状态
#[derive(Debug, Clone, Default, PartialEq)]
struct StaticRun {
    label: Option<StaticGesture>,
    count: u32,
}

/// 方向手势防抖状态
#[derive(Debug, Clone, Default, PartialEq)]
struct DirectionalRun {
    last_position: Option<Landmark>,
    last_direction: Option<Direction>,
    count: u32,
}

/// 手势分类器
///
/// 每个实例持有自己的防抖状态，可以并存多个互不影响
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    config: GestureConfig,
    static_run: StaticRun,
    directional_run: DirectionalRun,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            static_run: StaticRun::default(),
            directional_run: DirectionalRun::default(),
        }
    }

    /// 处理一帧，`None` 表示没有检测到手
    pub fn classify(&mut self, observation: Option<&HandObservation>) -> Option<GestureEvent> {
        let Some(obs) = observation.filter(|o| o.has_hand()) else {
            // 遮挡不能跨帧桥接
            self.clear();
            return None;
        };

        if let Some(event) = self.classify_static(obs) {
            return Some(event);
        }

        self.classify_directional(obs)
    }

    fn classify_static(&mut self, obs: &HandObservation) -> Option<GestureEvent> {
        let qualifying = obs
            .static_gesture
            .as_ref()
            .filter(|g| g.confidence > self.config.static_confidence)
            .and_then(|g| StaticGesture::from_label(&g.label).map(|s| (s, g.confidence)));

        let Some((gesture, confidence)) = qualifying else {
            self.static_run = StaticRun::default();
            return None;
        };

        if self.static_run.label == Some(gesture) {
            self.static_run.count += 1;
        } else {
            self.static_run.label = Some(gesture);
            self.static_run.count = 1;
        }

        if self.static_run.count >= self.config.static_frames {
            debug!("静态手势: {} ({:.2})", gesture.as_str(), confidence);
            // 消费掉，不重复触发
            self.static_run = StaticRun::default();
            return Some(GestureEvent::Static { gesture, confidence });
        }

        None
    }

    fn classify_directional(&mut self, obs: &HandObservation) -> Option<GestureEvent> {
        let wrist = obs.wrist()?;
        let run = &mut self.directional_run;

        let Some(previous) = run.last_position.replace(wrist) else {
            return None;
        };

        let current = Direction::classify(
            wrist.x - previous.x,
            wrist.y - previous.y,
            self.config.movement_threshold,
        );

        run.count = match current {
            Some(dir) if run.last_direction == Some(dir) => run.count + 1,
            Some(_) => 1,
            None => 0,
        };
        run.last_direction = current;

        if run.count >= self.config.direction_frames {
            // 保留 last_direction
            run.count = 0;
            let direction = current?;
            debug!("方向手势: {}", direction.as_str());
            return Some(GestureEvent::Directional { direction });
        }

        None
    }

    /// 清空全部防抖状态
    pub fn clear(&mut self) {
        self.static_run = StaticRun::default();
        self.directional_run = DirectionalRun::default();
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::GestureScore;

    fn pose(label: &str, confidence: f32) -> HandObservation {
        HandObservation {
            static_gesture: Some(GestureScore::new(label, confidence)),
            landmarks: vec![Landmark { x: 0.5, y: 0.5 }],
        }
    }

    fn wrist(x: f32, y: f32) -> HandObservation {
        HandObservation {
            static_gesture: None,
            landmarks: vec![Landmark { x, y }],
        }
    }

    fn run(classifier: &mut GestureClassifier, frames: &[Option<HandObservation>]) -> Vec<GestureEvent> {
        frames
            .iter()
            .filter_map(|f| classifier.classify(f.as_ref()))
            .collect()
    }

    #[test]
    fn test_closed_fist_fires_once() {
        let mut classifier = GestureClassifier::default();
        let frames: Vec<_> = (0..6).map(|_| Some(pose("Closed_Fist", 0.9))).collect();

        let events = run(&mut classifier, &frames[..5]);
        assert_eq!(
            events,
            vec![GestureEvent::Static { gesture: StaticGesture::ClosedFist, confidence: 0.9 }]
        );

        // 第 6 帧不再触发
        assert!(classifier.classify(frames[5].as_ref()).is_none());
    }

    #[test]
    fn test_low_confidence_resets_static_run() {
        let mut classifier = GestureClassifier::default();
        let mut frames: Vec<_> = (0..4).map(|_| Some(pose("Open_Palm", 0.95))).collect();
        frames.push(Some(pose("Open_Palm", 0.8)));
        frames.extend((0..4).map(|_| Some(pose("Open_Palm", 0.95))));

        assert!(run(&mut classifier, &frames).is_empty());
        assert_eq!(
            classifier.classify(Some(&pose("Open_Palm", 0.95))),
            Some(GestureEvent::Static { gesture: StaticGesture::OpenPalm, confidence: 0.95 })
        );
    }

    #[test]
    fn test_label_switch_restarts_count() {
        let mut classifier = GestureClassifier::default();
        let mut frames: Vec<_> = (0..3).map(|_| Some(pose("Open_Palm", 0.9))).collect();
        frames.extend((0..3).map(|_| Some(pose("Closed_Fist", 0.9))));
        frames.push(Some(pose("Thumb_Up", 0.99)));
        assert!(run(&mut classifier, &frames).is_empty());
    }

    #[test]
    fn test_swipe_right_fires_once() {
        let mut classifier = GestureClassifier::default();
        // 第一帧只记录位置，之后三帧各向右移动 0.1
        let frames: Vec<_> = [0.1, 0.2, 0.3, 0.4]
            .iter()
            .map(|&x| Some(wrist(x, 0.5)))
            .collect();

        assert_eq!(
            run(&mut classifier, &frames),
            vec![GestureEvent::Directional { direction: Direction::Right }]
        );
    }

    #[test]
    fn test_no_hand_breaks_directional_run() {
        let mut classifier = GestureClassifier::default();
        let frames = vec![
            Some(wrist(0.1, 0.5)),
            Some(wrist(0.2, 0.5)),
            Some(wrist(0.3, 0.5)),
            None,
            Some(wrist(0.4, 0.5)),
            Some(wrist(0.5, 0.5)),
            Some(wrist(0.6, 0.5)),
        ];
        assert!(run(&mut classifier, &frames).is_empty());
    }

    #[test]
    fn test_vertical_and_small_moves() {
        let mut classifier = GestureClassifier::default();
        let up: Vec<_> = [0.9, 0.8, 0.7, 0.6].iter().map(|&y| Some(wrist(0.5, y))).collect();
        assert_eq!(
            run(&mut classifier, &up),
            vec![GestureEvent::Directional { direction: Direction::Up }]
        );

        classifier.clear();
        let jitter: Vec<_> = [0.50, 0.55, 0.60, 0.65, 0.70].iter().map(|&x| Some(wrist(x, 0.5))).collect();
        assert!(run(&mut classifier, &jitter).is_empty());
    }

    #[test]
    fn test_empty_landmarks_counts_as_no_hand() {
        let mut classifier = GestureClassifier::default();
        let frames: Vec<_> = (0..4).map(|_| Some(pose("Closed_Fist", 0.9))).collect();
        assert!(run(&mut classifier, &frames).is_empty());

        let no_landmarks = HandObservation {
            static_gesture: Some(GestureScore::new("Closed_Fist", 0.9)),
            landmarks: Vec::new(),
        };
        assert!(classifier.classify(Some(&no_landmarks)).is_none());
        // 计数已清零，需要重新累计 5 帧
        assert!(classifier.classify(Some(&pose("Closed_Fist", 0.9))).is_none());
    }

    #[test]
    fn test_independent_instances() {
        let mut a = GestureClassifier::default();
        let mut b = GestureClassifier::default();
        for _ in 0..4 {
            a.classify(Some(&pose("Open_Palm", 0.9)));
        }
        assert!(b.classify(Some(&pose("Open_Palm", 0.9))).is_none());
        assert!(a.classify(Some(&pose("Open_Palm", 0.9))).is_some());
    }
}
