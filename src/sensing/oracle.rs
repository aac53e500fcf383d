//! 模型接口
//!
//! 人脸属性模型和手势模型都被当作黑盒，每帧调用一次。
//! 具体实现 (浏览器端 / ONNX / 远程服务) 不在本库内。

use async_trait::async_trait;

use crate::buffer::Frame;
use crate::error::OracleError;
use super::types::{FaceBox, FaceEstimate, HandObservation};

/// 人脸属性模型
#[async_trait]
pub trait AttributeOracle: Send + Sync {
    /// 加载模型，失败时整条识别流程停在触发前
    async fn warm_up(&self) -> Result<(), OracleError> {
        Ok(())
    }

    /// 单人脸检测，仅返回检测框，`None` 表示没有人脸
    async fn analyze_single(&self, frame: &Frame) -> Result<Option<FaceBox>, OracleError>;

    /// 多人脸属性分析 (年龄、性别、表情)
    async fn analyze_batch(&self, frame: &Frame) -> Result<Vec<FaceEstimate>, OracleError>;
}

/// 手势模型
#[async_trait]
pub trait GestureOracle: Send + Sync {
    async fn warm_up(&self) -> Result<(), OracleError> {
        Ok(())
    }

    /// 单帧手势分析，`None` 表示没有检测到手
    async fn analyze_frame(
        &self,
        frame: &Frame,
        timestamp_ms: u64,
    ) -> Result<Option<HandObservation>, OracleError>;
}
