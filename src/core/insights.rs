//! Learning insights for the learner dashboard
//!
//! One provider is chosen at startup (see [`provider_for`]) and used for
//! every request; handlers never fall back on their own.

use std::collections::BTreeMap;
use std::sync::Arc;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::config::{Config, InsightsBackend};

/// Topics scoring below this are recommended for review
const REVIEW_THRESHOLD: f64 = 70.0;
const MAX_RECOMMENDATIONS: usize = 3;

/// Outcome of one finished lesson
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LessonResult {
    pub topic: String,
    /// 0..=100
    pub score: u8,
    #[serde(default)]
    pub minutes: u32,
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProgress {
    #[serde(default)]
    pub lessons: Vec<LessonResult>,
    #[serde(default)]
    pub streak_days: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    #[display("computed")]
    Computed,
    #[display("static_fallback")]
    StaticFallback,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningInsights {
    pub source: InsightSource,
    /// 0.0..=1.0
    pub mastery: f64,
    pub strongest_topic: Option<String>,
    pub weakest_topic: Option<String>,
    pub recommended_topics: Vec<String>,
    pub study_minutes: u32,
    pub streak_days: u32,
}

/// Source of learner insights, selected once at startup
pub trait LearningInsightsProvider: Send + Sync {
    fn source(&self) -> InsightSource;

    fn insights(&self, progress: &LearnerProgress) -> LearningInsights;
}

/// Derives insights from the learner's actual lesson results
#[derive(Debug, Default, Clone, Copy)]
pub struct ComputedInsights;

impl LearningInsightsProvider for ComputedInsights {
    fn source(&self) -> InsightSource {
        InsightSource::Computed
    }

    fn insights(&self, progress: &LearnerProgress) -> LearningInsights {
        let lessons = &progress.lessons;
        let mastery = if lessons.is_empty() {
            0.0
        } else {
            let total: f64 = lessons.iter().map(|l| f64::from(l.score.min(100))).sum();
            total / lessons.len() as f64 / 100.0
        };

        // BTreeMap keeps topics name-ordered, which settles ties below
        let mut per_topic: BTreeMap<&str, (f64, u32)> = BTreeMap::new();
        for lesson in lessons {
            let entry = per_topic.entry(lesson.topic.as_str()).or_default();
            entry.0 += f64::from(lesson.score.min(100));
            entry.1 += 1;
        }
        let mut averages: Vec<(&str, f64)> = per_topic
            .into_iter()
            .map(|(topic, (sum, n))| (topic, sum / f64::from(n)))
            .collect();
        // stable sort: equal averages stay in name order
        averages.sort_by(|a, b| a.1.total_cmp(&b.1));

        let weakest_topic = averages.first().map(|(t, _)| t.to_string());
        let strongest_topic = averages
            .iter()
            .rev()
            .fold(None::<(&str, f64)>, |best, &(t, avg)| match best {
                Some((_, b)) if b > avg => best,
                Some((_, b)) if b == avg => Some((t, avg)),
                _ => Some((t, avg)),
            })
            .map(|(t, _)| t.to_string());
        let recommended_topics = averages
            .iter()
            .filter(|(_, avg)| *avg < REVIEW_THRESHOLD)
            .take(MAX_RECOMMENDATIONS)
            .map(|(t, _)| t.to_string())
            .collect();

        LearningInsights {
            source: self.source(),
            mastery,
            strongest_topic,
            weakest_topic,
            recommended_topics,
            study_minutes: lessons.iter().map(|l| l.minutes).sum(),
            streak_days: progress.streak_days,
        }
    }
}

/// Fixed insights used when no computation backend is enabled
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticInsights;

impl LearningInsightsProvider for StaticInsights {
    fn source(&self) -> InsightSource {
        InsightSource::StaticFallback
    }

    fn insights(&self, progress: &LearnerProgress) -> LearningInsights {
        LearningInsights {
            source: self.source(),
            mastery: 0.5,
            strongest_topic: Some("select_queries".to_string()),
            weakest_topic: Some("normalization".to_string()),
            recommended_topics: vec!["normalization".to_string(), "indexes".to_string()],
            study_minutes: 0,
            streak_days: progress.streak_days,
        }
    }
}

/// Pick the provider for the configured backend
pub fn provider_for(config: &Config) -> Arc<dyn LearningInsightsProvider> {
    let provider: Arc<dyn LearningInsightsProvider> = match config.insights_backend {
        InsightsBackend::Computed => Arc::new(ComputedInsights),
        InsightsBackend::Static => Arc::new(StaticInsights),
    };
    tracing::info!(source = %provider.source(), "Learning insights provider selected");
    provider
}
