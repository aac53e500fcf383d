//! 手势导航
//!
//! 把手势事件映射成页面跳转，并在每次跳转后锁定一段时间

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::gesture::{Direction, GestureEvent, StaticGesture};

/// 导航目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationAction {
    /// 结账
    Payment,
    /// 完整菜单
    MenuView,
}

impl NavigationAction {
    pub fn for_event(event: &GestureEvent) -> Self {
        match event {
            GestureEvent::Directional { direction: Direction::Up | Direction::Down }
            | GestureEvent::Static { gesture: StaticGesture::OpenPalm, .. } => Self::Payment,
            GestureEvent::Directional { direction: Direction::Left | Direction::Right }
            | GestureEvent::Static { gesture: StaticGesture::ClosedFist, .. } => Self::MenuView,
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            Self::Payment => "/payment",
            Self::MenuView => "/menuview",
        }
    }
}

/// 带锁定的导航闸门
#[derive(Debug, Clone)]
pub struct NavigationGate {
    lockout_ms: u64,
    locked_until_ms: Option<u64>,
}

impl NavigationGate {
    pub fn new(lockout_ms: u64) -> Self {
        Self {
            lockout_ms,
            locked_until_ms: None,
        }
    }

    /// 锁定期内的事件直接丢弃
    pub fn accept(&mut self, event: &GestureEvent, now_ms: u64) -> Option<NavigationAction> {
        if self.is_locked(now_ms) {
            debug!("手势 {} 在锁定期内被忽略", event.as_str());
            return None;
        }

        self.locked_until_ms = Some(now_ms + self.lockout_ms);
        let action = NavigationAction::for_event(event);
        info!("手势 {} → {}", event.as_str(), action.route());
        Some(action)
    }

    pub fn is_locked(&self, now_ms: u64) -> bool {
        self.locked_until_ms.map(|until| now_ms < until).unwrap_or(false)
    }

    /// 摄像头重启后解除锁定
    pub fn reset(&mut self) {
        self.locked_until_ms = None;
    }
}
