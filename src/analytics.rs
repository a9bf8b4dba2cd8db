use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::mode::StudyMode;
use crate::session::{SessionResult, accuracy};

/// Topics further than this from the overall topic mean count as weak or strong.
const AREA_MARGIN: f32 = 0.1;
const AREA_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalytics {
    pub session_id: String,
    pub date: DateTime<Utc>,
    pub duration_minutes: u32,
    pub cards_reviewed: u32,
    pub accuracy: f32,
    pub mode: StudyMode,
    pub topics_covered: Vec<String>,
    /// Per-topic accuracy; topics missing here use the session accuracy.
    #[serde(default)]
    pub topic_accuracies: HashMap<String, f32>,
}

impl SessionAnalytics {
    /// Summarises a finished session, using response tags as topics.
    pub fn from_result(result: &SessionResult, date: DateTime<Utc>) -> Self {
        let by_tag = result
            .responses
            .iter()
            .flat_map(|response| response.tags.iter().map(move |tag| (tag, response.clone())))
            .into_group_map();
        let topics_covered = result
            .responses
            .iter()
            .flat_map(|response| response.tags.iter())
            .unique()
            .cloned()
            .collect::<Vec<_>>();
        let topic_accuracies = by_tag
            .into_iter()
            .map(|(tag, responses)| (tag.clone(), accuracy(&responses)))
            .collect();

        Self {
            session_id: result
                .session_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            date,
            duration_minutes: result.study_time_minutes,
            cards_reviewed: result.responses.len() as u32,
            accuracy: result.accuracy(),
            mode: result.mode,
            topics_covered,
            topic_accuracies,
        }
    }

    fn topic_accuracy(&self, topic: &str) -> f32 {
        self.topic_accuracies
            .get(topic)
            .copied()
            .unwrap_or(self.accuracy)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningMetrics {
    pub total_cards_reviewed: u64,
    pub total_study_time_minutes: u64,
    pub average_accuracy: f32,
    /// Consecutive days with at least one session, ending today.
    pub study_streak: u32,
    pub weak_areas: Vec<String>,
    pub strong_areas: Vec<String>,
    /// Accuracy trend in percentage points per session.
    pub improvement_rate: f32,
}

impl LearningMetrics {
    pub fn from_sessions(sessions: &[SessionAnalytics], today: NaiveDate) -> Self {
        if sessions.is_empty() {
            return Self::default();
        }
        let (weak_areas, strong_areas) = performance_areas(sessions);
        Self {
            total_cards_reviewed: sessions.iter().map(|s| s.cards_reviewed as u64).sum(),
            total_study_time_minutes: sessions.iter().map(|s| s.duration_minutes as u64).sum(),
            average_accuracy: mean(sessions.iter().map(|s| s.accuracy)),
            study_streak: study_streak(sessions, today),
            weak_areas,
            strong_areas,
            improvement_rate: improvement_rate(sessions),
        }
    }
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f32 }
}

fn study_streak(sessions: &[SessionAnalytics], today: NaiveDate) -> u32 {
    let days = sessions
        .iter()
        .map(|s| s.date.date_naive())
        .collect::<BTreeSet<_>>();
    let mut streak = 0;
    let mut day = Some(today);
    while let Some(current) = day.filter(|d| days.contains(d)) {
        streak += 1;
        day = current.pred_opt();
    }
    streak
}

fn performance_areas(sessions: &[SessionAnalytics]) -> (Vec<String>, Vec<String>) {
    let samples = sessions.iter().flat_map(|session| {
        session
            .topics_covered
            .iter()
            .map(move |topic| (topic, session.topic_accuracy(topic)))
    });
    let by_topic = samples.clone().into_group_map();
    let averages = samples
        .map(|(topic, _)| topic)
        .unique()
        .map(|topic| (topic, mean(by_topic[topic].iter().copied())))
        .collect::<Vec<_>>();
    if averages.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let overall = mean(averages.iter().map(|(_, avg)| *avg));
    let pick = |keep: &dyn Fn(f32) -> bool| {
        averages
            .iter()
            .filter(|(_, avg)| keep(*avg))
            .map(|(topic, _)| (*topic).clone())
            .take(AREA_LIMIT)
            .collect::<Vec<_>>()
    };
    (
        pick(&|avg| avg < overall - AREA_MARGIN),
        pick(&|avg| avg > overall + AREA_MARGIN),
    )
}

/// Least-squares slope of accuracy over chronologically ordered sessions, × 100.
fn improvement_rate(sessions: &[SessionAnalytics]) -> f32 {
    if sessions.len() < 2 {
        return 0.0;
    }
    let ys = sessions
        .iter()
        .sorted_by_key(|s| s.date)
        .map(|s| s.accuracy)
        .collect::<Vec<_>>();
    let n = ys.len() as f32;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = ys.iter().sum::<f32>() / n;
    let (cov, var) = ys
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(cov, var), (i, y)| {
            let dx = i as f32 - x_mean;
            (cov + dx * (y - y_mean), var + dx * dx)
        });
    cov / var * 100.0
}
