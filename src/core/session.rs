//! 识别会话
//!
//! 一次访客接待的全部状态：触发锁、名单、画像进度。
//! 由运行时显式持有并按引用传递，不使用全局状态。

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::KioskConfig;
use super::profiler::{LastDetected, ProfileOutcome, RecognitionAggregates, Roster};
use super::proximity::ProximityTrigger;

/// 运行时共享的会话句柄
pub type SessionHandle = Arc<Mutex<RecognitionSession>>;

/// 画像进度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilingStatus {
    Idle,
    /// 模型调用进行中
    InFlight { epoch: u64 },
    Complete,
}

/// 画像许可
///
/// 由 `begin_profiling` 发放，记录发放时的会话代数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileTicket {
    epoch: u64,
}

impl ProfileTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// 识别会话
#[derive(Debug)]
pub struct RecognitionSession {
    session_id: Uuid,
    /// 每次重置加一，异步结果凭此判断是否过期
    epoch: u64,
    trigger: ProximityTrigger,
    roster: Roster,
    profiling: ProfilingStatus,
    last_detected: Option<LastDetected>,
}

impl RecognitionSession {
    pub fn new(config: &KioskConfig) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            epoch: 0,
            trigger: ProximityTrigger::new(&config.proximity),
            roster: Roster::empty(),
            profiling: ProfilingStatus::Idle,
            last_detected: None,
        }
    }

    pub fn into_handle(self) -> SessionHandle {
        Arc::new(Mutex::new(self))
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn trigger(&self) -> &ProximityTrigger {
        &self.trigger
    }

    pub fn trigger_mut(&mut self) -> &mut ProximityTrigger {
        &mut self.trigger
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn aggregates(&self) -> &RecognitionAggregates {
        self.roster.aggregates()
    }

    pub fn profiling(&self) -> ProfilingStatus {
        self.profiling
    }

    pub fn is_profiled(&self) -> bool {
        self.profiling == ProfilingStatus::Complete
    }

    pub fn last_detected(&self) -> Option<&LastDetected> {
        self.last_detected.as_ref()
    }

    /// 申请画像，已完成或进行中时返回 `None`
    pub fn begin_profiling(&mut self) -> Option<ProfileTicket> {
        match self.profiling {
            ProfilingStatus::Idle => {
                self.profiling = ProfilingStatus::InFlight { epoch: self.epoch };
                debug!("画像开始 (epoch={})", self.epoch);
                Some(ProfileTicket { epoch: self.epoch })
            }
            ProfilingStatus::InFlight { .. } | ProfilingStatus::Complete => None,
        }
    }

    /// 写入画像结果
    ///
    /// 名单、聚合指标和完成标记一起更新；许可过期时丢弃结果并返回 false
    pub fn complete_profiling(&mut self, ticket: ProfileTicket, outcome: ProfileOutcome) -> bool {
        if ticket.epoch != self.epoch || self.profiling != (ProfilingStatus::InFlight { epoch: ticket.epoch }) {
            warn!(
                "丢弃过期画像结果 (ticket epoch={}, session epoch={})",
                ticket.epoch, self.epoch
            );
            return false;
        }

        self.roster = outcome.roster;
        self.last_detected = Some(outcome.last_detected);
        self.profiling = ProfilingStatus::Complete;
        true
    }

    /// 重置为初始空状态
    ///
    /// 名单、聚合指标、触发锁一起清空；可以随时调用，重复调用无副作用
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.session_id = Uuid::new_v4();
        self.trigger.reset();
        self.roster = Roster::empty();
        self.profiling = ProfilingStatus::Idle;
        self.last_detected = None;
        info!("会话已重置 (epoch={}, id={})", self.epoch, self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::core::profiler::VisitorProfiler;
    use crate::core::proximity::TriggerState;
    use crate::sensing::scripted::face;
    use crate::sensing::FaceBox;

    fn outcome() -> ProfileOutcome {
        VisitorProfiler::default().profile(vec![face(70.0, "male", 0.9, &[("neutral", 1.0)])], Utc::now())
    }

    #[test]
    fn test_profiling_runs_once() {
        let mut session = RecognitionSession::new(&KioskConfig::default());
        let ticket = session.begin_profiling().unwrap();
        // 进行中不能再次申请
        assert!(session.begin_profiling().is_none());

        assert!(session.complete_profiling(ticket, outcome()));
        assert!(session.is_profiled());
        assert_eq!(session.roster().len(), 1);
        assert!(session.aggregates().has_elderly_majority);
        // 完成后也不能再次申请
        assert!(session.begin_profiling().is_none());
    }

    #[test]
    fn test_stale_result_rejected() {
        let mut session = RecognitionSession::new(&KioskConfig::default());
        let ticket = session.begin_profiling().unwrap();

        session.reset();
        assert!(!session.complete_profiling(ticket, outcome()));
        assert!(session.roster().is_empty());
        assert_eq!(session.profiling(), ProfilingStatus::Idle);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = RecognitionSession::new(&KioskConfig::default());
        let first_id = session.session_id();
        session.trigger_mut().observe(Some(&FaceBox { width_px: 400.0 }));
        let ticket = session.begin_profiling().unwrap();
        session.complete_profiling(ticket, outcome());

        session.reset();
        session.reset();

        assert_eq!(session.epoch(), 2);
        assert_ne!(session.session_id(), first_id);
        assert_eq!(session.trigger().state(), TriggerState::Searching);
        assert!(session.roster().is_empty());
        assert!(!session.aggregates().has_elderly_majority);
        assert!(session.last_detected().is_none());
        assert_eq!(session.profiling(), ProfilingStatus::Idle);
    }
}
