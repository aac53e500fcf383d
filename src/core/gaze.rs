//! 视线落点
//!
//! 把人脸关键点 (68 点，像素坐标) 映射到 2×2 菜单分类卡片之一。
//! 摄像头画面是镜像的，所以横坐标要翻转。

use crate::sensing::Landmark;

const LEFT_EYE: std::ops::Range<usize> = 36..42;
const RIGHT_EYE: std::ops::Range<usize> = 42..48;
const NOSE_TIP: usize = 30;

/// 卡片编号，按行优先排列
const AREA_INDEX: [[u8; 2]; 2] = [[1, 2], [3, 4]];

/// 2×2 视线网格
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeGrid {
    width: f32,
    height: f32,
}

impl GazeGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
        }
    }

    /// 视线点 (已镜像)，关键点不足时返回 `None`
    pub fn gaze_point(&self, landmarks: &[Landmark]) -> Option<Landmark> {
        if landmarks.len() < RIGHT_EYE.end {
            return None;
        }

        let left = centroid(&landmarks[LEFT_EYE]);
        let right = centroid(&landmarks[RIGHT_EYE]);
        let nose = landmarks[NOSE_TIP];

        let eye_x = (left.x + right.x) / 2.0;
        let eye_y = (left.y + right.y) / 2.0;

        Some(Landmark {
            x: self.width - (eye_x + nose.x) / 2.0,
            y: (eye_y + nose.y) / 2.0,
        })
    }

    /// 当前注视的卡片 (1..=4)，没有人脸时返回 `None`
    pub fn focus(&self, landmarks: &[Landmark]) -> Option<u8> {
        let point = self.gaze_point(landmarks)?;
        let row = cell(point.y, self.height);
        let col = cell(point.x, self.width);
        Some(AREA_INDEX[row][col])
    }
}

fn cell(value: f32, extent: f32) -> usize {
    ((value / extent * 2.0).floor().max(0.0) as usize).min(1)
}

fn centroid(points: &[Landmark]) -> Landmark {
    let n = points.len() as f32;
    Landmark {
        x: points.iter().map(|p| p.x).sum::<f32>() / n,
        y: points.iter().map(|p| p.y).sum::<f32>() / n,
    }
}
