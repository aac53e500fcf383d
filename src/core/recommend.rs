//! 菜单推荐引擎
//!
//! 根据访客名单、天气和时间给每个饮品打分，再挑出多样化的前三名。
//! 每一项加分都会附带一条理由，理由顺序就是评估顺序，直接展示给访客。
//!
//! 除第三位随机推荐外完全确定；随机源由调用方注入。

use chrono::{NaiveDateTime, Timelike};
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::catalog::{tags, Catalog, MenuItem, ServingType};
use crate::config::RecommendConfig;
use crate::sensing::WeatherCondition;
use super::profiler::{DominantGender, RecognitionAggregates, VisitorRecord};

const WEATHER_BONUS: f32 = 25.0;
const TIME_BONUS: f32 = 20.0;
const EVENING_CAFFEINE_PENALTY: f32 = -30.0;
const GROUP_BONUS: f32 = 15.0;
const ELDERLY_BONUS: f32 = 25.0;
const ELDERLY_PENALTY: f32 = -15.0;
const MINOR_BONUS: f32 = 25.0;
const MINOR_PENALTY: f32 = -30.0;
const YOUTH_BONUS: f32 = 15.0;
const YOUTH_AGE: f32 = 30.0;
const GENDER_BONUS: f32 = 10.0;

/// 推荐上下文 (每次请求构造一次)
#[derive(Debug, Clone)]
pub struct RecognitionContext<'a> {
    pub visitors: &'a [VisitorRecord],
    pub aggregates: RecognitionAggregates,
    pub weather: WeatherCondition,
    pub temperature_c: f32,
    /// 本地时间
    pub now: NaiveDateTime,
}

/// 带分数和理由的菜单项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
    pub item: MenuItem,
    pub score: f32,
    pub reasons: Vec<String>,
}

/// 最终推荐
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub scored: ScoredItem,
    pub serving: ServingType,
    pub asset: Option<String>,
}

impl Recommendation {
    pub fn id(&self) -> &str {
        &self.scored.item.id
    }

    pub fn score(&self) -> f32 {
        self.scored.score
    }
}

/// 推荐引擎
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: RecommendConfig,
}

impl RecommendationEngine {
    pub fn new(config: RecommendConfig) -> Self {
        Self { config }
    }

    /// 由气温和天气推出的出品偏好
    pub fn preferred_serving(&self, weather: WeatherCondition, temperature_c: f32) -> ServingType {
        if weather.is_wet() {
            ServingType::Hot
        } else {
            self.temperature_serving(temperature_c)
        }
    }

    fn temperature_serving(&self, temperature_c: f32) -> ServingType {
        if temperature_c >= self.config.iced_from_celsius {
            ServingType::Iced
        } else {
            ServingType::Hot
        }
    }

    /// 给全部饮品打分，按分数降序 (同分保持目录顺序)
    pub fn score_all(&self, catalog: &Catalog, ctx: &RecognitionContext<'_>) -> Vec<ScoredItem> {
        let mut scored: Vec<ScoredItem> = catalog
            .drinks()
            .map(|item| self.score_item(item, ctx))
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    /// 单个饮品的分数和理由
    pub fn score_item(&self, item: &MenuItem, ctx: &RecognitionContext<'_>) -> ScoredItem {
        let mut score = 0.0;
        let mut reasons = Vec::new();
        let mut bonus = |points: f32, reason: String| {
            score += points;
            reasons.push(reason);
        };

        // 天气 / 气温
        if ctx.weather.is_wet() {
            if item.supports(ServingType::Hot) {
                bonus(WEATHER_BONUS, "A warm drink for a gloomy day".to_string());
            }
        } else {
            let preference = self.temperature_serving(ctx.temperature_c);
            if item.supports(preference) {
                let reason = match preference {
                    ServingType::Iced => "Something cool for a hot day",
                    ServingType::Hot => "Something warm for a chilly day",
                };
                bonus(WEATHER_BONUS, reason.to_string());
            }
        }

        // 时间段
        let hour = ctx.now.hour();
        let mut penalty = 0.0;
        if (7..11).contains(&hour) {
            if item.has_any(&[tags::CAFFEINE, tags::HIGH_CAFFEINE]) {
                bonus(TIME_BONUS, "A morning caffeine boost".to_string());
            }
        } else if (14..17).contains(&hour) {
            if item.has_any(&[tags::SWEET, tags::DESSERT_DRINK]) {
                bonus(TIME_BONUS, "A sweet pick-me-up for a drowsy afternoon".to_string());
            }
        } else if hour >= 18 {
            if item.has_any(&[tags::NON_CAFFEINE, tags::DECAF_AVAILABLE]) {
                bonus(TIME_BONUS, "Something easy for a relaxing evening".to_string());
            }
            if item.has_tag(tags::HIGH_CAFFEINE) {
                penalty += EVENING_CAFFEINE_PENALTY;
            }
        }

        // 同行人数
        let group_size = ctx.visitors.len();
        if group_size > 1 && item.has_any(&[tags::POPULAR, tags::CLASSIC]) {
            bonus(GROUP_BONUS, format!("{} of you together! A crowd-pleasing favorite", group_size));
        }

        // 年龄段，按优先级互斥
        let agg = &ctx.aggregates;
        if agg.has_elderly_majority {
            if item.has_any(&[tags::SMOOTH_COFFEE, tags::TEA]) {
                bonus(ELDERLY_BONUS, "A gentle drink our senior guests enjoy".to_string());
            }
            if item.has_any(&[tags::HIGH_CAFFEINE, tags::EXTRA_SWEET]) {
                penalty += ELDERLY_PENALTY;
            }
        } else if agg.has_minor {
            if item.has_tag(tags::NON_CAFFEINE) && item.has_tag(tags::SWEET) {
                bonus(MINOR_BONUS, "Out with the kids! A sweet caffeine-free drink".to_string());
            }
            if item.has_tag(tags::HIGH_CAFFEINE) {
                penalty += MINOR_PENALTY;
            }
        } else if agg.average_age < YOUTH_AGE
            && item.has_any(&[tags::DESSERT_DRINK, tags::POPULAR, tags::SOUR_SWEET])
        {
            bonus(YOUTH_BONUS, "A favorite among younger guests".to_string());
        }

        // 性别倾向
        match agg.dominant_gender {
            DominantGender::Female => {
                if item.has_any(&[tags::SOUR_SWEET, tags::CREAMY, tags::FRUITY]) {
                    bonus(GENDER_BONUS, "A flavor profile women often prefer".to_string());
                }
            }
            DominantGender::Male => {
                if item.has_any(&[tags::BOLD_COFFEE, tags::CLEAN_TASTE]) {
                    bonus(GENDER_BONUS, "A flavor profile men often prefer".to_string());
                }
            }
            DominantGender::Mixed => {}
        }

        ScoredItem {
            item: item.clone(),
            score: score + penalty,
            reasons,
        }
    }

    /// 多样化前 N 名
    ///
    /// 名单为空或没有可选饮品时返回空列表
    pub fn recommend<R: Rng>(
        &self,
        catalog: &Catalog,
        ctx: &RecognitionContext<'_>,
        rng: &mut R,
    ) -> Vec<Recommendation> {
        if ctx.visitors.is_empty() {
            return Vec::new();
        }

        let sorted = self.score_all(catalog, ctx);
        let Some(top) = sorted.first() else {
            return Vec::new();
        };

        let top_n = self.config.top_n;
        let mut picks: Vec<&ScoredItem> = vec![top];
        // 第二位: 与第一名不同大类的最高分
        let top_category = top.item.major_category();
        if picks.len() < top_n {
            if let Some(alternative) = sorted
                .iter()
                .find(|s| !already_picked(&picks, s) && s.item.major_category() != top_category)
            {
                picks.push(alternative);
            }
        }

        // 第三位: 人气饮品前几名中随机一个
        if picks.len() < top_n {
            let pool: Vec<&ScoredItem> = sorted
                .iter()
                .filter(|s| !already_picked(&picks, s) && s.item.has_tag(tags::POPULAR))
                .take(self.config.wildcard_pool)
                .collect();
            if !pool.is_empty() {
                let wildcard = pool[rng.gen_range(0..pool.len())];
                debug!("随机推荐: {} (候选 {} 个)", wildcard.item.id, pool.len());
                picks.push(wildcard);
            }
        }

        // 不足时按分数补齐
        for candidate in &sorted {
            if picks.len() >= top_n {
                break;
            }
            if !already_picked(&picks, candidate) {
                picks.push(candidate);
            }
        }

        let preferred = self.preferred_serving(ctx.weather, ctx.temperature_c);
        picks
            .into_iter()
            .take(top_n)
            .filter_map(|s| {
                let serving = s.item.resolve_serving(preferred)?;
                Some(Recommendation {
                    asset: s.item.asset_for(serving).map(str::to_string),
                    serving,
                    scored: s.clone(),
                })
            })
            .collect()
    }
}

fn already_picked(picks: &[&ScoredItem], candidate: &ScoredItem) -> bool {
    picks.iter().any(|p| p.item.id == candidate.item.id)
}
