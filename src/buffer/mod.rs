//! 缓冲区模块

pub mod frame;

pub use frame::{Frame, FrameBuffer, FrameSource};
