//! 核心流水线

pub mod gaze;
pub mod gesture;
pub mod kiosk;
pub mod navigation;
pub mod profiler;
pub mod proximity;
pub mod recommend;
pub mod session;
