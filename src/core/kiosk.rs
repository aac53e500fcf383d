//! 单机运行时
//!
//! 把各个组件串成一条流水线：
//! 1. 接近检测 (每 100ms 一次单人脸检测) → 触发锁定
//! 2. 等待画面稳定 → 一次多人脸画像
//! 3. 天气 + 名单 + 时间 → 推荐
//! 4. 推荐页上的手势 → 导航
//!
//! 异步任务都带着启动时的会话代数，会话重置后旧结果一律丢弃。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::buffer::FrameSource;
use crate::catalog::Catalog;
use crate::config::{GestureConfig, KioskConfig};
use crate::error::{KioskError, Result};
use crate::sensing::{AttributeOracle, GestureOracle, WeatherReading, WeatherService};
use super::gesture::{GestureClassifier, GestureEvent};
use super::navigation::{NavigationAction, NavigationGate};
use super::profiler::{LastDetected, VisitorProfiler};
use super::proximity::{AnimationAnchor, TriggerOutcome};
use super::recommend::{RecognitionContext, Recommendation, RecommendationEngine};
use super::session::{RecognitionSession, SessionHandle};

/// 运行时事件
#[derive(Debug, Clone)]
pub enum KioskEvent {
    /// 模型加载失败，流程停在触发前
    ModelUnavailable { oracle: &'static str, reason: String },
    /// 访客接近
    Triggered { distance: f32, anchor: AnimationAnchor },
    /// 画像完成
    ProfileComplete {
        session_id: Uuid,
        visitors: usize,
        last_detected: LastDetected,
    },
    WeatherResolved(WeatherReading),
    /// 原文透传
    WeatherUnavailable(String),
    /// 手势导航
    Navigate { event: GestureEvent, action: NavigationAction },
    SessionReset { session_id: Uuid },
}

type EventSender = Option<mpsc::UnboundedSender<KioskEvent>>;

fn emit(tx: &EventSender, event: KioskEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event);
    }
}

/// 天气状态
#[derive(Debug, Clone)]
enum WeatherState {
    Pending,
    Resolved(WeatherReading),
    Failed(String),
}

/// 单机运行时
pub struct KioskRuntime {
    config: KioskConfig,
    session: SessionHandle,
    catalog: Arc<Catalog>,
    attributes: Arc<dyn AttributeOracle>,
    gestures: Arc<dyn GestureOracle>,
    frames: Arc<dyn FrameSource>,
    weather_service: Arc<dyn WeatherService>,
    engine: RecommendationEngine,
    weather: Mutex<WeatherState>,
    /// 人脸模型已就绪
    ready: AtomicBool,
    proximity_task: Mutex<Option<JoinHandle<()>>>,
    gesture_task: Mutex<Option<JoinHandle<()>>>,
    event_tx: EventSender,
}

impl KioskRuntime {
    pub fn new(
        config: KioskConfig,
        catalog: Catalog,
        attributes: Arc<dyn AttributeOracle>,
        gestures: Arc<dyn GestureOracle>,
        frames: Arc<dyn FrameSource>,
        weather_service: Arc<dyn WeatherService>,
    ) -> Result<Self> {
        config.validate()?;
        if catalog.drinks().next().is_none() {
            return Err(KioskError::CatalogEmpty);
        }

        let session = RecognitionSession::new(&config).into_handle();
        info!("运行时初始化: 菜单 {} 项", catalog.len());

        Ok(Self {
            engine: RecommendationEngine::new(config.recommend.clone()),
            config,
            session,
            catalog: Arc::new(catalog),
            attributes,
            gestures,
            frames,
            weather_service,
            weather: Mutex::new(WeatherState::Pending),
            ready: AtomicBool::new(false),
            proximity_task: Mutex::new(None),
            gesture_task: Mutex::new(None),
            event_tx: None,
        })
    }

    /// 设置事件通道
    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<KioskEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn session(&self) -> SessionHandle {
        Arc::clone(&self.session)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn session_id(&self) -> Uuid {
        self.session.lock().session_id()
    }

    pub fn is_profiled(&self) -> bool {
        self.session.lock().is_profiled()
    }

    pub fn last_detected(&self) -> Option<LastDetected> {
        self.session.lock().last_detected().cloned()
    }

    /// 加载人脸模型并开始接近检测
    ///
    /// 加载失败时不会开始采样，返回 `ModelUnavailable`
    pub async fn start(&self) -> Result<()> {
        if let Err(e) = self.attributes.warm_up().await {
            error!("人脸模型加载失败: {}", e);
            emit(
                &self.event_tx,
                KioskEvent::ModelUnavailable { oracle: "attribute", reason: e.to_string() },
            );
            return Err(KioskError::ModelUnavailable {
                oracle: "attribute",
                reason: e.to_string(),
            });
        }

        self.ready.store(true, Ordering::SeqCst);
        self.arm();
        Ok(())
    }

    /// 启动接近检测任务 (替换已有任务)
    pub fn arm(&self) {
        let task = ProximityTask {
            epoch: self.session.lock().epoch(),
            session: Arc::clone(&self.session),
            attributes: Arc::clone(&self.attributes),
            frames: Arc::clone(&self.frames),
            profiler: VisitorProfiler::new(self.config.profiler.clone()),
            tick: Duration::from_millis(self.config.proximity.tick_interval_ms),
            settle: Duration::from_millis(self.config.profiler.settle_delay_ms),
            event_tx: self.event_tx.clone(),
        };
        debug!("接近检测启动 (epoch={})", task.epoch);

        let handle = tokio::spawn(task.run());
        if let Some(previous) = self.proximity_task.lock().replace(handle) {
            previous.abort();
        }
    }

    /// 启动推荐页手势识别
    pub fn start_gestures(&self) {
        let task = GestureTask {
            gestures: Arc::clone(&self.gestures),
            frames: Arc::clone(&self.frames),
            config: self.config.gesture.clone(),
            event_tx: self.event_tx.clone(),
        };

        let handle = tokio::spawn(task.run());
        if let Some(previous) = self.gesture_task.lock().replace(handle) {
            previous.abort();
        }
    }

    /// 离开推荐页时停止手势识别
    pub fn stop_gestures(&self) {
        if let Some(handle) = self.gesture_task.lock().take() {
            handle.abort();
            debug!("手势识别已停止");
        }
    }

    /// 查询天气，失败时记下原始消息
    pub async fn refresh_weather(&self) -> Result<WeatherReading> {
        let (latitude, longitude) = (self.config.weather.latitude, self.config.weather.longitude);

        match self.weather_service.lookup(latitude, longitude).await {
            Ok(reading) => {
                info!(
                    "天气: {} {:.1}°C",
                    reading.condition().as_str(),
                    reading.temperature_c
                );
                *self.weather.lock() = WeatherState::Resolved(reading);
                emit(&self.event_tx, KioskEvent::WeatherResolved(reading));
                Ok(reading)
            }
            Err(e) => {
                let message = e.to_string();
                warn!("天气获取失败: {}", message);
                *self.weather.lock() = WeatherState::Failed(message.clone());
                emit(&self.event_tx, KioskEvent::WeatherUnavailable(message.clone()));
                Err(KioskError::WeatherUnavailable(message))
            }
        }
    }

    /// 为当前名单生成推荐
    ///
    /// 画像未完成返回 `NotReady`，天气未就绪返回 `WeatherUnavailable`
    pub fn recommend<R: Rng>(&self, now: NaiveDateTime, rng: &mut R) -> Result<Vec<Recommendation>> {
        let (visitors, aggregates) = {
            let session = self.session.lock();
            if !session.is_profiled() {
                return Err(KioskError::NotReady);
            }
            (session.roster().visitors().to_vec(), *session.aggregates())
        };

        let reading = match &*self.weather.lock() {
            WeatherState::Resolved(reading) => *reading,
            WeatherState::Failed(message) => {
                return Err(KioskError::WeatherUnavailable(message.clone()))
            }
            WeatherState::Pending => {
                return Err(KioskError::WeatherUnavailable("weather not resolved yet".to_string()))
            }
        };

        let ctx = RecognitionContext {
            visitors: &visitors,
            aggregates,
            weather: reading.condition(),
            temperature_c: reading.temperature_c,
            now,
        };
        let picks = self.engine.recommend(&self.catalog, &ctx, rng);

        info!(
            "推荐: {}",
            picks
                .iter()
                .map(|p| format!("{}({}, {:.0})", p.id(), p.serving.as_str(), p.score()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(picks)
    }

    /// 回到初始状态 (操作员按 R)
    ///
    /// 取消进行中的任务，清空会话，然后重新开始接近检测
    pub fn reset(&self) {
        self.abort_tasks();

        let session_id = {
            let mut session = self.session.lock();
            session.reset();
            session.session_id()
        };
        emit(&self.event_tx, KioskEvent::SessionReset { session_id });

        if self.ready.load(Ordering::SeqCst) {
            self.arm();
        }
    }

    fn abort_tasks(&self) {
        if let Some(handle) = self.proximity_task.lock().take() {
            handle.abort();
        }
        if let Some(handle) = self.gesture_task.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for KioskRuntime {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// 接近检测 + 画像任务
struct ProximityTask {
    epoch: u64,
    session: SessionHandle,
    attributes: Arc<dyn AttributeOracle>,
    frames: Arc<dyn FrameSource>,
    profiler: VisitorProfiler,
    tick: Duration,
    settle: Duration,
    event_tx: EventSender,
}

impl ProximityTask {
    async fn run(self) {
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(frame) = self.frames.latest() else {
                continue;
            };

            let face = match self.attributes.analyze_single(&frame).await {
                Ok(face) => face,
                Err(e) => {
                    warn!("单人脸检测失败: {}", e);
                    None
                }
            };

            let outcome = {
                let mut session = self.session.lock();
                if session.epoch() != self.epoch {
                    return;
                }
                session.trigger_mut().observe(face.as_ref())
            };

            match outcome {
                TriggerOutcome::Waiting => {}
                TriggerOutcome::Suppressed => return,
                TriggerOutcome::Fired { distance, anchor } => {
                    emit(
                        &self.event_tx,
                        KioskEvent::Triggered { distance: distance.value(), anchor },
                    );
                    break;
                }
            }
        }

        // 等动画结束、画面稳定
        sleep(self.settle).await;
        self.profile().await;
    }

    async fn profile(&self) {
        let ticket = {
            let mut session = self.session.lock();
            if session.epoch() != self.epoch {
                return;
            }
            session.begin_profiling()
        };
        let Some(ticket) = ticket else {
            return;
        };

        let faces = match self.frames.latest() {
            Some(frame) => match self.attributes.analyze_batch(&frame).await {
                Ok(faces) => faces,
                Err(e) => {
                    warn!("多人脸分析失败: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let outcome = self.profiler.profile(faces, Utc::now());
        let visitors = outcome.roster.len();
        let last_detected = outcome.last_detected.clone();

        let session_id = {
            let mut session = self.session.lock();
            if !session.complete_profiling(ticket, outcome) {
                return;
            }
            session.session_id()
        };

        info!("最近识别: {}", last_detected);
        emit(
            &self.event_tx,
            KioskEvent::ProfileComplete { session_id, visitors, last_detected },
        );
    }
}

/// 手势识别任务
struct GestureTask {
    gestures: Arc<dyn GestureOracle>,
    frames: Arc<dyn FrameSource>,
    config: GestureConfig,
    event_tx: EventSender,
}

impl GestureTask {
    async fn run(self) {
        if let Err(e) = self.gestures.warm_up().await {
            error!("手势模型加载失败: {}", e);
            emit(
                &self.event_tx,
                KioskEvent::ModelUnavailable { oracle: "gesture", reason: e.to_string() },
            );
            return;
        }

        let started = Instant::now();
        let mut classifier = GestureClassifier::new(self.config.clone());
        let mut gate = NavigationGate::new(self.config.lockout_ms);
        let mut last_timestamp: Option<u64> = None;

        let mut ticker = interval(Duration::from_millis(self.config.frame_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(frame) = self.frames.latest() else {
                continue;
            };
            // 同一帧只处理一次
            match last_timestamp {
                Some(ts) if frame.timestamp_ms == ts => continue,
                Some(ts) if frame.timestamp_ms < ts => {
                    debug!("帧时间戳回退 ({} → {})，视为摄像头重启", ts, frame.timestamp_ms);
                    classifier.clear();
                    gate.reset();
                }
                _ => {}
            }
            last_timestamp = Some(frame.timestamp_ms);

            let observation = match self.gestures.analyze_frame(&frame, frame.timestamp_ms).await {
                Ok(observation) => observation,
                Err(e) => {
                    warn!("手势分析失败: {}", e);
                    None
                }
            };

            let Some(event) = classifier.classify(observation.as_ref()) else {
                continue;
            };

            let now_ms = started.elapsed().as_millis() as u64;
            if let Some(action) = gate.accept(&event, now_ms) {
                emit(&self.event_tx, KioskEvent::Navigate { event, action });
            }
        }
    }
}
