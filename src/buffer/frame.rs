//! 帧缓冲区
//!
//! 摄像头线程写入，识别流程读取最新一帧

use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::Arc;
use parking_lot::RwLock;

/// 视频帧
#[derive(Clone, Debug)]
pub struct Frame {
    /// 帧数据 (RGB, 零拷贝)
    pub data: Bytes,
    /// 时间戳 (毫秒)
    pub timestamp_ms: u64,
    /// 宽度
    pub width: u32,
    /// 高度
    pub height: u32,
}

impl Frame {
    pub fn new(data: Bytes, timestamp_ms: u64, width: u32, height: u32) -> Self {
        Self { data, timestamp_ms, width, height }
    }

    /// 从 Vec<u8> 创建
    pub fn from_vec(data: Vec<u8>, timestamp_ms: u64, width: u32, height: u32) -> Self {
        Self {
            data: Bytes::from(data),
            timestamp_ms,
            width,
            height,
        }
    }
}

/// 帧来源
///
/// 摄像头采集不在本库范围内，流程只需要"当前最新一帧"
pub trait FrameSource: Send + Sync {
    fn latest(&self) -> Option<Frame>;
}

/// 帧缓冲区
///
/// 线程安全的环形缓冲区，保存最近的若干帧
pub struct FrameBuffer {
    frames: Arc<RwLock<VecDeque<Frame>>>,
    max_size: usize,
}

impl FrameBuffer {
    /// 创建新的帧缓冲区
    ///
    /// # Arguments
    /// * `max_size` - 最大帧数 (至少 1)
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            frames: Arc::new(RwLock::new(VecDeque::with_capacity(max_size))),
            max_size,
        }
    }

    /// 添加帧
    pub fn push(&self, frame: Frame) {
        let mut frames = self.frames.write();
        if frames.len() >= self.max_size {
            frames.pop_front();
        }
        frames.push_back(frame);
    }

    /// 清空缓冲区 (视频源释放时)
    pub fn clear(&self) {
        self.frames.write().clear();
    }

    pub fn len(&self) -> usize {
        self.frames.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.read().is_empty()
    }
}

impl FrameSource for FrameBuffer {
    fn latest(&self) -> Option<Frame> {
        self.frames.read().back().cloned()
    }
}

impl Clone for FrameBuffer {
    fn clone(&self) -> Self {
        Self {
            frames: Arc::clone(&self.frames),
            max_size: self.max_size,
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(30) // 1秒 @ 30fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_buffer() {
        let buffer = FrameBuffer::new(5);
        assert!(buffer.latest().is_none());

        for i in 0..10 {
            buffer.push(Frame::from_vec(vec![0u8; 100], i * 33, 10, 10));
        }

        // 只保留 5 帧
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.latest().unwrap().timestamp_ms, 9 * 33);
    }

    #[test]
    fn test_clone_shares_storage() {
        let writer = FrameBuffer::new(3);
        let reader = writer.clone();
        writer.push(Frame::from_vec(vec![1, 2, 3], 7, 1, 1));
        assert_eq!(reader.latest().unwrap().timestamp_ms, 7);

        writer.clear();
        assert!(reader.is_empty());
    }
}
