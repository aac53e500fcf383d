//! 传感器输出类型定义
//!
//! 模型和天气服务返回的原始数据，未经防抖或归一化

use serde::{Deserialize, Serialize};

/// 单人脸检测框 (接近触发用)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub width_px: f32,
}

/// 单张人脸的属性估计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceEstimate {
    /// 估计年龄 (未取整)
    pub age: f32,
    /// 性别标签, 例如 "male" / "female"
    pub gender_label: String,
    /// 性别置信度 [0, 1]
    pub gender_confidence: f32,
    /// 表情分布，保持模型输出顺序
    pub expression_scores: Vec<(String, f32)>,
}

/// 静态手势标签及其置信度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureScore {
    /// 模型原始标签, 例如 "Open_Palm" / "Closed_Fist"
    pub label: String,
    pub confidence: f32,
}

impl GestureScore {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self { label: label.into(), confidence }
    }
}

/// 二维关键点 (手部为归一化坐标，人脸为像素坐标)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

/// 单帧手部观测
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HandObservation {
    /// 得分最高的静态手势
    pub static_gesture: Option<GestureScore>,
    /// 手部关键点，下标 0 为手腕
    pub landmarks: Vec<Landmark>,
}

impl HandObservation {
    /// 手腕位置
    pub fn wrist(&self) -> Option<Landmark> {
        self.landmarks.first().copied()
    }

    /// 是否真的看到了手
    pub fn has_hand(&self) -> bool {
        !self.landmarks.is_empty()
    }
}

/// 天气状况
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    Rain,
    Snow,
}

impl WeatherCondition {
    /// WMO 天气代码映射
    ///
    /// 71..=77 为降雪，其余 ≥ 61 为降雨，其他视为晴
    pub fn from_code(code: i32) -> Self {
        if (71..=77).contains(&code) {
            Self::Snow
        } else if code >= 61 {
            Self::Rain
        } else {
            Self::Clear
        }
    }

    /// 雨雪天
    pub fn is_wet(&self) -> bool {
        matches!(self, Self::Rain | Self::Snow)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Rain => "rain",
            Self::Snow => "snow",
        }
    }
}

/// 天气读数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub condition_code: i32,
    pub temperature_c: f32,
}

impl WeatherReading {
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_code(self.condition_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_code_mapping() {
        assert_eq!(WeatherCondition::from_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_code(3), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_code(61), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_code(71), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_code(77), WeatherCondition::Snow);
        // 雷暴代码落在降雨区间
        assert_eq!(WeatherCondition::from_code(95), WeatherCondition::Rain);
    }

    #[test]
    fn test_wrist_is_first_landmark() {
        let obs = HandObservation {
            static_gesture: None,
            landmarks: vec![Landmark { x: 0.4, y: 0.6 }, Landmark { x: 0.5, y: 0.5 }],
        };
        assert_eq!(obs.wrist(), Some(Landmark { x: 0.4, y: 0.6 }));
        assert!(!HandObservation::default().has_hand());
    }
}
