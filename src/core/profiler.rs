//! 访客画像
//!
//! 把一次多人脸分析的原始输出整理成名单和聚合指标

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ProfilerConfig;
use crate::sensing::FaceEstimate;

/// 访客记录 (创建后不可变)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitorRecord {
    pub age: u32,
    pub gender_label: String,
    pub gender_confidence: f32,
    pub dominant_expression: String,
    pub expression_scores: BTreeMap<String, f32>,
    pub captured_at: DateTime<Utc>,
}

impl VisitorRecord {
    /// 展示用性别文本, 例如 "female (93.1%)"
    pub fn gender_display(&self) -> String {
        format!("{} ({:.1}%)", self.gender_label, self.gender_confidence * 100.0)
    }

    pub fn is_male(&self) -> bool {
        self.gender_label.eq_ignore_ascii_case("male")
    }
}

/// 主导性别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantGender {
    Male,
    Female,
    Mixed,
}

/// 名单聚合指标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecognitionAggregates {
    pub has_elderly_majority: bool,
    pub dominant_gender: DominantGender,
    pub average_age: f32,
    pub has_minor: bool,
}

impl RecognitionAggregates {
    pub fn empty() -> Self {
        Self {
            has_elderly_majority: false,
            dominant_gender: DominantGender::Mixed,
            average_age: 0.0,
            has_minor: false,
        }
    }

    fn compute(visitors: &[VisitorRecord], config: &ProfilerConfig) -> Self {
        if visitors.is_empty() {
            return Self::empty();
        }

        let n = visitors.len() as f32;
        let elderly = visitors.iter().filter(|v| v.age >= config.elderly_age).count() as f32;
        let male = visitors.iter().filter(|v| v.is_male()).count() as f32;
        let female = n - male;

        let dominant_gender = if male / n >= config.gender_share {
            DominantGender::Male
        } else if female / n >= config.gender_share {
            DominantGender::Female
        } else {
            DominantGender::Mixed
        };

        Self {
            has_elderly_majority: elderly / n >= config.majority_share,
            dominant_gender,
            average_age: visitors.iter().map(|v| v.age as f32).sum::<f32>() / n,
            has_minor: visitors.iter().any(|v| v.age < config.minor_age),
        }
    }
}

/// 访客名单
///
/// 聚合指标只能由名单计算得到，二者总是一起替换
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roster {
    visitors: Vec<VisitorRecord>,
    aggregates: RecognitionAggregates,
}

impl Roster {
    pub fn new(visitors: Vec<VisitorRecord>, config: &ProfilerConfig) -> Self {
        let aggregates = RecognitionAggregates::compute(&visitors, config);
        Self { visitors, aggregates }
    }

    pub fn empty() -> Self {
        Self {
            visitors: Vec::new(),
            aggregates: RecognitionAggregates::empty(),
        }
    }

    pub fn visitors(&self) -> &[VisitorRecord] {
        &self.visitors
    }

    pub fn aggregates(&self) -> &RecognitionAggregates {
        &self.aggregates
    }

    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::empty()
    }
}

/// 最近一次识别结果 (仅展示)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LastDetected {
    Visitor(VisitorRecord),
    /// 没有检测到人脸
    DetectionFailed,
}

impl fmt::Display for LastDetected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visitor(v) => write!(
                f,
                "age={} gender={} expression={}",
                v.age,
                v.gender_display(),
                v.dominant_expression
            ),
            Self::DetectionFailed => write!(f, "age=detection-failed gender=- expression=N/A"),
        }
    }
}

/// 一次画像的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileOutcome {
    pub roster: Roster,
    pub last_detected: LastDetected,
}

/// 访客画像器
#[derive(Debug, Clone, Default)]
pub struct VisitorProfiler {
    config: ProfilerConfig,
}

impl VisitorProfiler {
    pub fn new(config: ProfilerConfig) -> Self {
        Self { config }
    }

    /// 整理一批人脸估计
    pub fn profile(&self, faces: Vec<FaceEstimate>, captured_at: DateTime<Utc>) -> ProfileOutcome {
        if faces.is_empty() {
            info!("画像完成: 未检测到人脸");
            return ProfileOutcome {
                roster: Roster::empty(),
                last_detected: LastDetected::DetectionFailed,
            };
        }

        let visitors: Vec<VisitorRecord> = faces
            .into_iter()
            .map(|face| to_record(face, captured_at))
            .collect();

        for v in &visitors {
            debug!("访客: age={} gender={} expression={}", v.age, v.gender_display(), v.dominant_expression);
        }

        let last_detected = LastDetected::Visitor(visitors[0].clone());
        let roster = Roster::new(visitors, &self.config);

        info!(
            "画像完成: {} 人, 老年多数={}, 未成年={}, 平均年龄={:.1}",
            roster.len(),
            roster.aggregates().has_elderly_majority,
            roster.aggregates().has_minor,
            roster.aggregates().average_age
        );

        ProfileOutcome { roster, last_detected }
    }
}

fn to_record(face: FaceEstimate, captured_at: DateTime<Utc>) -> VisitorRecord {
    let dominant_expression = dominant_expression(&face.expression_scores);
    VisitorRecord {
        age: face.age.max(0.0).round() as u32,
        gender_label: face.gender_label,
        gender_confidence: face.gender_confidence.clamp(0.0, 1.0),
        dominant_expression,
        expression_scores: face.expression_scores.into_iter().collect(),
        captured_at,
    }
}

/// 分数严格最大的表情，平分时先出现的胜出
fn dominant_expression(scores: &[(String, f32)]) -> String {
    let mut best: Option<&(String, f32)> = None;
    for entry in scores {
        match best {
            Some((_, top)) if entry.1 <= *top => {}
            _ => best = Some(entry),
        }
    }
    best.map(|(label, _)| label.clone()).unwrap_or_else(|| "neutral".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::scripted::face;

    fn profiler() -> VisitorProfiler {
        VisitorProfiler::default()
    }

    #[test]
    fn test_dominant_expression_tie_keeps_first() {
        let scores = vec![
            ("neutral".to_string(), 0.4),
            ("happy".to_string(), 0.4),
            ("sad".to_string(), 0.2),
        ];
        assert_eq!(dominant_expression(&scores), "neutral");

        let scores = vec![("neutral".to_string(), 0.1), ("happy".to_string(), 0.7)];
        assert_eq!(dominant_expression(&scores), "happy");
    }

    #[test]
    fn test_profile_rounds_age() {
        let outcome = profiler().profile(
            vec![face(44.6, "female", 0.931, &[("happy", 0.9), ("neutral", 0.1)])],
            Utc::now(),
        );
        let v = &outcome.roster.visitors()[0];
        assert_eq!(v.age, 45);
        assert_eq!(v.dominant_expression, "happy");
        assert_eq!(v.gender_display(), "female (93.1%)");
        assert!(outcome.roster.aggregates().has_elderly_majority);
        assert!(matches!(outcome.last_detected, LastDetected::Visitor(_)));
    }

    #[test]
    fn test_no_faces_gives_sentinel() {
        let outcome = profiler().profile(Vec::new(), Utc::now());
        assert!(outcome.roster.is_empty());
        assert_eq!(outcome.last_detected, LastDetected::DetectionFailed);
        assert!(!outcome.roster.aggregates().has_elderly_majority);
        assert!(outcome.last_detected.to_string().contains("detection-failed"));
    }

    #[test]
    fn test_aggregates() {
        let outcome = profiler().profile(
            vec![
                face(70.0, "male", 0.9, &[("neutral", 1.0)]),
                face(8.0, "male", 0.8, &[("happy", 1.0)]),
                face(30.0, "female", 0.7, &[("happy", 1.0)]),
                face(50.0, "male", 0.9, &[("neutral", 1.0)]),
            ],
            Utc::now(),
        );
        let agg = outcome.roster.aggregates();
        // 2/4 ≥ 50%
        assert!(agg.has_elderly_majority);
        assert!(agg.has_minor);
        // 3/4 男性 ≥ 70%
        assert_eq!(agg.dominant_gender, DominantGender::Male);
        assert!((agg.average_age - 39.5).abs() < 1e-4);
    }

    #[test]
    fn test_mixed_gender() {
        let outcome = profiler().profile(
            vec![
                face(30.0, "male", 0.9, &[]),
                face(30.0, "female", 0.9, &[]),
            ],
            Utc::now(),
        );
        assert_eq!(outcome.roster.aggregates().dominant_gender, DominantGender::Mixed);
        assert!(!outcome.roster.aggregates().has_elderly_majority);
    }
}
