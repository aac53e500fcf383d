//! 配置
//!
//! 所有阈值都有默认值，配置文件 (JSON) 只需写要覆盖的字段。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{KioskError, Result};

/// 接近触发配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    /// 采样周期 (毫秒)
    pub tick_interval_ms: u64,
    /// 参考人脸框宽度 (像素)，距离 = 参考宽度 / 实际宽度
    pub reference_width_px: f32,
    /// 距离低于该值即触发
    pub threshold: f32,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            reference_width_px: 200.0,
            threshold: 1.0,
        }
    }
}

/// 访客画像配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// 触发锁定后等待人脸稳定的时间 (毫秒)
    pub settle_delay_ms: u64,
    /// 老年人年龄下限
    pub elderly_age: u32,
    /// 未成年人年龄上限 (不含)
    pub minor_age: u32,
    /// 老年人占比达到该值即视为老年多数
    pub majority_share: f32,
    /// 单一性别占比达到该值即视为主导性别
    pub gender_share: f32,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 500,
            elderly_age: 45,
            minor_age: 15,
            majority_share: 0.5,
            gender_share: 0.7,
        }
    }
}

/// 手势识别配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// 静态手势置信度下限 (严格大于)
    pub static_confidence: f32,
    /// 静态手势需要连续的帧数
    pub static_frames: u32,
    /// 手腕位移阈值 (归一化坐标)
    pub movement_threshold: f32,
    /// 方向手势需要连续的帧数
    pub direction_frames: u32,
    /// 手势采样周期 (毫秒)
    pub frame_interval_ms: u64,
    /// 导航锁定时长 (毫秒)
    pub lockout_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            static_confidence: 0.8,
            static_frames: 5,
            movement_threshold: 0.08,
            direction_frames: 3,
            frame_interval_ms: 33,
            lockout_ms: 2000,
        }
    }
}

/// 推荐配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub top_n: usize,
    /// 随机位候选池大小
    pub wildcard_pool: usize,
    /// 气温达到该值偏好冰饮
    pub iced_from_celsius: f32,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            top_n: 3,
            wildcard_pool: 5,
            iced_from_celsius: 20.0,
        }
    }
}

/// 天气服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com".to_string(),
            latitude: 33.4996,
            longitude: 126.5312,
            timeout_secs: 10,
        }
    }
}

/// 整体配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    pub proximity: ProximityConfig,
    pub profiler: ProfilerConfig,
    pub gesture: GestureConfig,
    pub recommend: RecommendConfig,
    pub weather: WeatherConfig,
    /// 外部菜单文件，缺省使用内置菜单
    pub catalog_path: Option<PathBuf>,
}

impl KioskConfig {
    /// 从 JSON 文件加载
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;
        info!("配置已加载: {}", path.display());
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 检查阈值是否合理
    pub fn validate(&self) -> Result<()> {
        if self.proximity.tick_interval_ms == 0 {
            return Err(KioskError::Config("proximity.tick_interval_ms must be > 0".into()));
        }
        if self.proximity.reference_width_px <= 0.0 || self.proximity.threshold <= 0.0 {
            return Err(KioskError::Config("proximity thresholds must be > 0".into()));
        }
        if self.gesture.static_frames == 0 || self.gesture.direction_frames == 0 {
            return Err(KioskError::Config("gesture windows must be at least one frame".into()));
        }
        if self.gesture.frame_interval_ms == 0 {
            return Err(KioskError::Config("gesture.frame_interval_ms must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.profiler.majority_share)
            || !(0.0..=1.0).contains(&self.profiler.gender_share)
        {
            return Err(KioskError::Config("profiler shares must lie in [0, 1]".into()));
        }
        if self.recommend.top_n == 0 {
            return Err(KioskError::Config("recommend.top_n must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KioskConfig::default();
        assert_eq!(config.proximity.tick_interval_ms, 100);
        assert_eq!(config.profiler.settle_delay_ms, 500);
        assert_eq!(config.gesture.static_frames, 5);
        assert_eq!(config.gesture.direction_frames, 3);
        assert_eq!(config.gesture.lockout_ms, 2000);
        assert_eq!(config.recommend.top_n, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = KioskConfig::from_json(r#"{ "gesture": { "lockout_ms": 1500 } }"#).unwrap();
        assert_eq!(config.gesture.lockout_ms, 1500);
        // 未写的字段走默认值
        assert_eq!(config.gesture.static_frames, 5);
        assert_eq!(config.proximity.threshold, 1.0);
    }

    #[test]
    fn test_invalid_rejected() {
        let err = KioskConfig::from_json(r#"{ "gesture": { "static_frames": 0 } }"#).unwrap_err();
        assert!(matches!(err, KioskError::Config(_)));
    }
}
