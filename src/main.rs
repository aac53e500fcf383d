//! 无接触点单机 - 端到端演示
//!
//! 用脚本化模型走一遍完整流程：
//! 接近 → 触发 → 画像 → 天气 → 推荐 → 手势 → 重置

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use ai_kiosk::sensing::scripted::{face, ScriptedAttributeOracle, ScriptedGestureOracle};
use ai_kiosk::sensing::{FaceEstimate, FixedWeather, Landmark, OpenMeteoClient, WeatherReading, WeatherService};
use ai_kiosk::utils::time::{at_hour, format_mmss_ms, local_now, now_ms};
use ai_kiosk::{Catalog, Frame, FrameBuffer, GazeGrid, KioskConfig, KioskEvent, KioskRuntime};

#[derive(Parser, Debug)]
#[command(name = "ai-kiosk", about = "Touchless kiosk pipeline demo")]
struct Cli {
    /// JSON config file (defaults when absent)
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Scenario: elderly, kids, or friends
    #[arg(long, default_value = "elderly")]
    scenario: String,

    /// Seed for the wildcard pick
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Override the local hour (0-23)
    #[arg(long)]
    hour: Option<u32>,

    /// Query Open-Meteo instead of the scenario's fixed weather
    #[arg(long)]
    live_weather: bool,
}

/// 演示场景
struct Scenario {
    name: &'static str,
    faces: Vec<FaceEstimate>,
    weather: WeatherReading,
    hour: u32,
}

impl Scenario {
    fn by_name(name: &str) -> Option<Self> {
        let scenario = match name {
            "elderly" => Self {
                name: "老年访客 / 雨天早晨",
                faces: vec![
                    face(70.0, "female", 0.93, &[("neutral", 0.7), ("happy", 0.2)]),
                    face(66.0, "male", 0.88, &[("neutral", 0.8)]),
                ],
                weather: WeatherReading { condition_code: 63, temperature_c: 5.0 },
                hour: 9,
            },
            "kids" => Self {
                name: "亲子 / 夏日午后",
                faces: vec![
                    face(8.0, "female", 0.81, &[("happy", 0.9)]),
                    face(38.0, "female", 0.95, &[("happy", 0.6), ("neutral", 0.3)]),
                ],
                weather: WeatherReading { condition_code: 0, temperature_c: 28.0 },
                hour: 15,
            },
            "friends" => Self {
                name: "年轻朋友 / 晴朗傍晚",
                faces: vec![
                    face(24.0, "male", 0.97, &[("happy", 0.5), ("surprised", 0.3)]),
                    face(27.0, "male", 0.91, &[("neutral", 0.6)]),
                    face(22.0, "female", 0.89, &[("happy", 0.8)]),
                ],
                weather: WeatherReading { condition_code: 2, temperature_c: 24.0 },
                hour: 20,
            },
            _ => return None,
        };
        Some(scenario)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ai_kiosk=info".into()),
        )
        .init();

    let Some(scenario) = Scenario::by_name(&cli.scenario) else {
        anyhow::bail!("unknown scenario: {}. Use: elderly, kids, or friends", cli.scenario);
    };

    let config = match &cli.config {
        Some(path) => KioskConfig::from_file(path)?,
        None => KioskConfig::default(),
    };
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::builtin()?,
    };

    info!("╔══════════════════════════════════════════════╗");
    info!("║     无接触点单机 - 推荐流程演示              ║");
    info!("╚══════════════════════════════════════════════╝");
    info!("场景: {}", scenario.name);
    let started_ms = now_ms();

    // 摄像头: 演示里只放一帧，手势阶段再逐帧推进
    let frames = FrameBuffer::default();
    frames.push(Frame::from_vec(vec![0u8; 640 * 480], now_ms(), 640, 480));

    // 访客从远处走近
    let attributes = Arc::new(
        ScriptedAttributeOracle::new()
            .with_box_widths([None, Some(90.0), Some(150.0), Some(190.0), Some(240.0)])
            .with_batch(scenario.faces.clone()),
    );

    let gestures = Arc::new(ScriptedGestureOracle::new());
    gestures.push_static("Closed_Fist", 0.92, 5);
    gestures.push(None);
    gestures.push_wrist_path(&[(0.8, 0.5), (0.7, 0.5), (0.6, 0.5), (0.5, 0.5)]);

    let weather: Arc<dyn WeatherService> = if cli.live_weather {
        Arc::new(OpenMeteoClient::new(&config.weather)?)
    } else {
        Arc::new(FixedWeather(scenario.weather))
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let logger = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            log_event(&event);
        }
    });

    let runtime = KioskRuntime::new(
        config,
        catalog,
        attributes,
        gestures,
        Arc::new(frames.clone()),
        weather,
    )?
    .with_event_channel(tx);

    if let Err(e) = runtime.start().await {
        error!("无法启动: {}", e);
        return Ok(());
    }

    // 等待触发和画像
    for _ in 0..50 {
        if runtime.is_profiled() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    if !runtime.is_profiled() {
        warn!("访客没有靠近，演示结束");
        return Ok(());
    }

    // 推荐页
    match runtime.refresh_weather().await {
        Ok(_) => {
            let base = local_now();
            let hour = cli.hour.unwrap_or(scenario.hour);
            let now = at_hour(base, hour).unwrap_or(base);
            let mut rng = StdRng::seed_from_u64(cli.seed);

            let picks = runtime.recommend(now, &mut rng)?;
            info!("\n=== 推荐 ({}) ===", now.format("%H:%M"));
            for (rank, pick) in picks.iter().enumerate() {
                info!(
                    "  {}. {} [{}] 分数={:.0} 图片={}",
                    rank + 1,
                    pick.scored.item.name,
                    pick.serving.as_str(),
                    pick.score(),
                    pick.asset.as_deref().unwrap_or("-")
                );
                for reason in &pick.scored.reasons {
                    info!("       - {}", reason);
                }
            }
        }
        Err(e) => warn!("跳过推荐: {}", e),
    }

    // 视线落在哪张分类卡片上
    let grid = GazeGrid::new(640, 480);
    let gaze_face = vec![Landmark { x: 180.0, y: 140.0 }; 68];
    if let Some(card) = grid.focus(&gaze_face) {
        info!("视线: 分类卡片 {}", card);
    }

    // 手势: 逐帧推进画面
    runtime.start_gestures();
    for _ in 0..12 {
        tokio::time::sleep(Duration::from_millis(40)).await;
        frames.push(Frame::from_vec(vec![0u8; 640 * 480], now_ms(), 640, 480));
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    runtime.stop_gestures();

    // 操作员重置
    runtime.reset();
    tokio::time::sleep(Duration::from_millis(200)).await;

    drop(runtime);
    let _ = tokio::time::timeout(Duration::from_millis(200), logger).await;
    info!("演示结束，耗时 {}", format_mmss_ms(now_ms().saturating_sub(started_ms)));

    Ok(())
}

fn log_event(event: &KioskEvent) {
    match event {
        KioskEvent::ModelUnavailable { oracle, reason } => {
            error!("[事件] {} 模型不可用: {}", oracle, reason)
        }
        KioskEvent::Triggered { distance, anchor } => info!(
            "[事件] 触发: distance={:.2}, logo → {:.0}%",
            distance, anchor.logo_top_percent
        ),
        KioskEvent::ProfileComplete { session_id, visitors, last_detected } => info!(
            "[事件] 画像完成: session={} 人数={} ({})",
            session_id, visitors, last_detected
        ),
        KioskEvent::WeatherResolved(reading) => info!(
            "[事件] 天气: {} {:.1}°C",
            reading.condition().as_str(),
            reading.temperature_c
        ),
        KioskEvent::WeatherUnavailable(message) => warn!("[事件] 天气不可用: {}", message),
        KioskEvent::Navigate { event, action } => {
            info!("[事件] 手势 {} → {}", event.as_str(), action.route())
        }
        KioskEvent::SessionReset { session_id } => info!("[事件] 会话重置: {}", session_id),
    }
}
