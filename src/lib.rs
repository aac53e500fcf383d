//! 无接触点单机核心库
//!
//! 核心流程：
//! - 接近检测 → 触发锁定
//! - 多人脸画像 → 访客名单 + 聚合指标
//! - 名单 + 天气 + 时间 → 多样化推荐
//! - 手势 → 导航

pub mod buffer;
pub mod catalog;
pub mod config;
pub mod core;
pub mod error;
pub mod sensing;
pub mod utils;

// Re-exports - 运行时
pub use core::kiosk::{KioskEvent, KioskRuntime};
pub use core::session::{ProfilingStatus, RecognitionSession, SessionHandle};

// Re-exports - 组件
pub use core::gaze::GazeGrid;
pub use core::gesture::{Direction, GestureClassifier, GestureEvent, StaticGesture};
pub use core::navigation::{NavigationAction, NavigationGate};
pub use core::profiler::{
    DominantGender, LastDetected, RecognitionAggregates, Roster, VisitorProfiler, VisitorRecord,
};
pub use core::proximity::{AnimationAnchor, DistanceSample, ProximityTrigger, TriggerOutcome, TriggerState};
pub use core::recommend::{RecognitionContext, Recommendation, RecommendationEngine, ScoredItem};

// Re-exports - 数据
pub use buffer::{Frame, FrameBuffer, FrameSource};
pub use catalog::{Catalog, MenuItem, ServingType};
pub use config::KioskConfig;
pub use error::{KioskError, OracleError, Result};
