//! 错误类型
//!
//! 只有会打断流程的失败才是错误。"没有人脸" / "没有手" 属于正常信号，
//! 分别由空名单和手势状态清零表示，不在这里。

use thiserror::Error;

/// 模型 (oracle) 调用失败
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    /// 模型未加载 / 初始化失败
    #[error("model unavailable: {0}")]
    Unavailable(String),
    /// 单帧推理失败
    #[error("inference failed: {0}")]
    Inference(String),
}

/// 单机核心错误
#[derive(Error, Debug)]
pub enum KioskError {
    #[error("{oracle} model unavailable: {reason}")]
    ModelUnavailable { oracle: &'static str, reason: String },

    /// 原文透传给用户
    #[error("{0}")]
    WeatherUnavailable(String),

    #[error("catalog has no eligible drinks")]
    CatalogEmpty,

    /// 画像尚未完成，推荐请求被挂起
    #[error("recognition not ready")]
    NotReady,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, KioskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_message_is_verbatim() {
        let err = KioskError::WeatherUnavailable("위치 권한이 거부되었습니다".to_string());
        assert_eq!(err.to_string(), "위치 권한이 거부되었습니다");
    }

    #[test]
    fn test_model_unavailable_display() {
        let err = KioskError::ModelUnavailable {
            oracle: "attribute",
            reason: "weights missing".to_string(),
        };
        assert_eq!(err.to_string(), "attribute model unavailable: weights missing");
    }
}
