use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, Timelike, Utc};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::card::Card;
use crate::error::{FlashcardError, Result};

/// Review intervals in days, indexed by [`PerformanceRecord::interval_index`].
pub const DEFAULT_INTERVALS: [u32; 6] = [1, 3, 7, 14, 30, 90];

/// Accuracy assumed when a record does not carry one.
pub const DEFAULT_ACCURACY: f32 = 0.5;

/// Longest review interval, jitter included, a config may produce.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

const DEFAULT_STUDY_HOUR: u32 = 9;
const DEFAULT_STUDY_MINUTES: u32 = 30;
const DEFAULT_CONFIDENCE: f32 = 0.5;
const MAX_CONFIDENCE: f32 = 0.9;
/// Sessions needed before the suggestion reaches full confidence.
const CONFIDENCE_SESSIONS: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub intervals: Vec<u32>,
    /// Accuracy at or above which the interval grows.
    pub advance_threshold: f32,
    /// Accuracy at or above which the interval is kept; below it shrinks.
    pub hold_threshold: f32,
    /// Maximum random offset, in days, added to each interval.
    pub jitter_days: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            intervals: DEFAULT_INTERVALS.to_vec(),
            advance_threshold: 0.9,
            hold_threshold: 0.7,
            jitter_days: 1,
        }
    }
}

pub(crate) fn check_config(config: &SchedulerConfig) -> Result<()> {
    let intervals = &config.intervals;
    if intervals.is_empty()
        || intervals[0] == 0
        || intervals.windows(2).any(|pair| pair[0] >= pair[1])
        || intervals[intervals.len() - 1] as u64 + config.jitter_days as u64
            > MAX_INTERVAL_DAYS as u64
    {
        return Err(FlashcardError::InvalidIntervals);
    }
    let (hold, advance) = (config.hold_threshold, config.advance_threshold);
    if !hold.is_finite() || !advance.is_finite() || !(0.0..=advance).contains(&hold) || advance > 1.0
    {
        return Err(FlashcardError::InvalidThresholds);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// In `[0, 1]`; [`DEFAULT_ACCURACY`] when absent.
    #[serde(default)]
    pub accuracy: Option<f32>,
    #[serde(default)]
    pub interval_index: usize,
}

impl PerformanceRecord {
    pub fn new(accuracy: f32, interval_index: usize) -> Self {
        Self {
            accuracy: Some(accuracy),
            interval_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum IntervalStep {
    Advance,
    Hold,
    Regress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextReview {
    pub due: DateTime<Utc>,
    /// Store this on the next [`PerformanceRecord`] for the card.
    pub interval_index: usize,
    /// Days until `due`, jitter included.
    pub interval_days: u32,
}

/// One past study session, timestamped in the learner's local offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyRecord {
    pub studied_at: DateTime<FixedOffset>,
    #[serde(default = "default_accuracy")]
    pub accuracy: f32,
    #[serde(default = "default_study_minutes")]
    pub duration_minutes: u32,
}

fn default_accuracy() -> f32 {
    DEFAULT_ACCURACY
}

fn default_study_minutes() -> u32 {
    DEFAULT_STUDY_MINUTES
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyTimeSuggestion {
    /// Local hour of day, `0..24`.
    pub hour: u32,
    pub duration_minutes: u32,
    pub confidence: f32,
    pub reasoning: String,
}

impl StudyTimeSuggestion {
    /// Formatted as `HH:00`.
    pub fn recommended_time(&self) -> String {
        format!("{:02}:00", self.hour)
    }
}

/// Schedules card reviews on a fixed interval ladder and filters due cards.
#[derive(Debug, Clone)]
pub struct SmartReviewScheduler {
    config: SchedulerConfig,
    rng: StdRng,
}

impl SmartReviewScheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        check_config(&config)?;
        Ok(Self {
            config,
            rng: StdRng::from_os_rng(),
        })
    }

    /// Same as [`SmartReviewScheduler::new`], with reproducible jitter.
    pub fn with_seed(config: SchedulerConfig, seed: u64) -> Result<Self> {
        check_config(&config)?;
        Ok(Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn last_index(&self) -> usize {
        self.config.intervals.len() - 1
    }

    pub fn step_for(&self, accuracy: f32) -> IntervalStep {
        if accuracy >= self.config.advance_threshold {
            IntervalStep::Advance
        } else if accuracy >= self.config.hold_threshold {
            IntervalStep::Hold
        } else {
            IntervalStep::Regress
        }
    }

    /// Position on the interval ladder after `record`, always in bounds.
    pub fn next_interval_index(&self, record: &PerformanceRecord) -> usize {
        let accuracy = record.accuracy.unwrap_or(DEFAULT_ACCURACY);
        let current = record.interval_index.min(self.last_index());
        match self.step_for(accuracy) {
            IntervalStep::Advance => (current + 1).min(self.last_index()),
            IntervalStep::Hold => current,
            IntervalStep::Regress => current.saturating_sub(1),
        }
    }

    pub fn calculate_next_review(
        &mut self,
        history: &[PerformanceRecord],
        now: DateTime<Utc>,
    ) -> NextReview {
        let Some(latest) = history.last() else {
            return NextReview {
                due: now + Duration::days(1),
                interval_index: 0,
                interval_days: 1,
            };
        };

        let interval_index = self.next_interval_index(latest);
        let base = self.config.intervals[interval_index] as i64;
        let jitter = self.config.jitter_days as i64;
        let offset = self.rng.random_range(-jitter..=jitter);
        let interval_days = (base + offset).max(1);
        debug!(
            "accuracy {:?} at index {}: {} to index {interval_index}, {interval_days} days",
            latest.accuracy,
            latest.interval_index,
            self.step_for(latest.accuracy.unwrap_or(DEFAULT_ACCURACY)),
        );

        NextReview {
            due: now + Duration::days(interval_days),
            interval_index,
            interval_days: interval_days as u32,
        }
    }

    /// Cards never scheduled, or scheduled at or before `now`, in input order.
    pub fn get_cards_due<'a>(&self, cards: &'a [Card], now: DateTime<Utc>) -> Vec<&'a Card> {
        cards.iter().filter(|card| card.is_due(now)).collect()
    }

    /// Hour of day with the best mean accuracy, ties going to the earliest hour.
    ///
    /// An hour must beat a mean of zero; otherwise the default hour is kept.
    pub fn suggest_optimal_study_time(&self, history: &[StudyRecord]) -> StudyTimeSuggestion {
        if history.is_empty() {
            return StudyTimeSuggestion {
                hour: DEFAULT_STUDY_HOUR,
                duration_minutes: DEFAULT_STUDY_MINUTES,
                confidence: DEFAULT_CONFIDENCE,
                reasoning: "Default recommendation for new users".into(),
            };
        }

        let mut by_hour: BTreeMap<u32, (f32, usize)> = BTreeMap::new();
        for record in history {
            let (sum, count) = by_hour.entry(record.studied_at.hour()).or_default();
            *sum += record.accuracy;
            *count += 1;
        }

        let (mut hour, mut best_mean) = (DEFAULT_STUDY_HOUR, 0.0);
        for (&bucket, &(sum, count)) in &by_hour {
            let mean = sum / count as f32;
            if mean > best_mean {
                (hour, best_mean) = (bucket, mean);
            }
        }

        StudyTimeSuggestion {
            hour,
            duration_minutes: median_minutes(history),
            confidence: (history.len() as f32 / CONFIDENCE_SESSIONS).min(MAX_CONFIDENCE),
            reasoning: format!("Based on {} previous sessions", history.len()),
        }
    }
}

/// Median session length; the mean of the middle pair, truncated, for even counts.
fn median_minutes(history: &[StudyRecord]) -> u32 {
    let mut durations = history
        .iter()
        .map(|record| record.duration_minutes as u64)
        .collect::<Vec<_>>();
    durations.sort_unstable();
    let mid = durations.len() / 2;
    let median = match durations.len() {
        0 => DEFAULT_STUDY_MINUTES as u64,
        n if n % 2 == 1 => durations[mid],
        _ => (durations[mid - 1] + durations[mid]) / 2,
    };
    median as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scheduler() -> SmartReviewScheduler {
        SmartReviewScheduler::with_seed(SchedulerConfig::default(), 42).unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn record_at(hour: u32, accuracy: f32, duration_minutes: u32) -> StudyRecord {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        StudyRecord {
            studied_at: offset.with_ymd_and_hms(2024, 3, 1, hour, 15, 0).unwrap(),
            accuracy,
            duration_minutes,
        }
    }

    #[test]
    fn empty_history_is_due_tomorrow() {
        let now = fixed_now();
        let next = scheduler().calculate_next_review(&[], now);
        assert_eq!(next.due, now + Duration::days(1));
        assert_eq!(next.interval_index, 0);
        assert_eq!(next.interval_days, 1);
    }

    #[test]
    fn high_accuracy_advances() {
        let mut scheduler = scheduler();
        let now = fixed_now();
        for i in 0..5 {
            let next = scheduler.calculate_next_review(&[PerformanceRecord::new(0.95, i)], now);
            assert_eq!(next.interval_index, i + 1);
            let base = DEFAULT_INTERVALS[i + 1];
            assert!((base - 1..=base + 1).contains(&next.interval_days));
            assert_eq!(next.due, now + Duration::days(next.interval_days as i64));
        }
    }

    #[test]
    fn advance_is_clamped_at_the_last_interval() {
        let mut scheduler = scheduler();
        let next = scheduler.calculate_next_review(&[PerformanceRecord::new(1.0, 5)], fixed_now());
        assert_eq!(next.interval_index, 5);
        assert!((89..=91).contains(&next.interval_days));
    }

    #[test]
    fn medium_accuracy_holds() {
        let scheduler = scheduler();
        assert_eq!(
            scheduler.next_interval_index(&PerformanceRecord::new(0.7, 3)),
            3
        );
        assert_eq!(
            scheduler.next_interval_index(&PerformanceRecord::new(0.89, 3)),
            3
        );
    }

    #[test]
    fn low_accuracy_regresses_to_zero_at_most() {
        let mut scheduler = scheduler();
        assert_eq!(
            scheduler.next_interval_index(&PerformanceRecord::new(0.2, 4)),
            3
        );
        let next = scheduler.calculate_next_review(&[PerformanceRecord::new(0.5, 0)], fixed_now());
        assert_eq!(next.interval_index, 0);
        assert!((1..=2).contains(&next.interval_days));
    }

    #[test]
    fn only_the_latest_record_counts() {
        let scheduler = scheduler();
        let history = [
            PerformanceRecord::new(1.0, 5),
            PerformanceRecord::new(0.1, 2),
        ];
        assert_eq!(scheduler.next_interval_index(history.last().unwrap()), 1);
    }

    #[test]
    fn missing_accuracy_is_treated_as_half() {
        let scheduler = scheduler();
        let record: PerformanceRecord = serde_json::from_str(r#"{"interval_index": 2}"#).unwrap();
        assert_eq!(record.accuracy, None);
        assert_eq!(scheduler.step_for(DEFAULT_ACCURACY), IntervalStep::Regress);
        assert_eq!(scheduler.next_interval_index(&record), 1);
    }

    #[test]
    fn out_of_range_index_is_clamped() {
        let scheduler = scheduler();
        assert_eq!(
            scheduler.next_interval_index(&PerformanceRecord::new(0.8, 42)),
            5
        );
        assert_eq!(
            scheduler.next_interval_index(&PerformanceRecord::new(0.95, 42)),
            5
        );
    }

    #[test]
    fn jitter_is_reproducible_with_a_seed() {
        let history = [PerformanceRecord::new(0.8, 3)];
        let mut a = scheduler();
        let mut b = scheduler();
        for _ in 0..20 {
            assert_eq!(
                a.calculate_next_review(&history, fixed_now()),
                b.calculate_next_review(&history, fixed_now())
            );
        }
    }

    #[test]
    fn jitter_covers_all_offsets() {
        let mut scheduler = scheduler();
        let history = [PerformanceRecord::new(0.8, 2)];
        let mut seen = (0..200)
            .map(|_| scheduler.calculate_next_review(&history, fixed_now()).interval_days)
            .collect::<Vec<_>>();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, [6, 7, 8]);
    }

    #[test]
    fn zero_jitter_is_exact() -> Result<()> {
        let config = SchedulerConfig {
            jitter_days: 0,
            ..SchedulerConfig::default()
        };
        let mut scheduler = SmartReviewScheduler::with_seed(config, 1)?;
        let next = scheduler.calculate_next_review(&[PerformanceRecord::new(0.8, 4)], fixed_now());
        assert_eq!(next.interval_days, 30);
        Ok(())
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let bad_intervals = [
            vec![],
            vec![0, 1],
            vec![1, 3, 3],
            vec![7, 3],
            vec![1, 100_000_000],
            vec![1, MAX_INTERVAL_DAYS],
        ];
        for intervals in bad_intervals {
            let config = SchedulerConfig {
                intervals,
                ..SchedulerConfig::default()
            };
            assert_eq!(
                SmartReviewScheduler::new(config).err(),
                Some(FlashcardError::InvalidIntervals)
            );
        }
        let config = SchedulerConfig {
            jitter_days: u32::MAX,
            ..SchedulerConfig::default()
        };
        assert_eq!(
            SmartReviewScheduler::new(config).err(),
            Some(FlashcardError::InvalidIntervals)
        );
        let bad_thresholds = [(0.9, 0.7), (f32::NAN, 0.9), (-0.1, 0.9), (0.7, 1.5)];
        for (hold_threshold, advance_threshold) in bad_thresholds {
            let config = SchedulerConfig {
                hold_threshold,
                advance_threshold,
                ..SchedulerConfig::default()
            };
            assert_eq!(
                SmartReviewScheduler::new(config).err(),
                Some(FlashcardError::InvalidThresholds)
            );
        }
    }

    #[test]
    fn longest_allowed_interval_is_scheduled() -> Result<()> {
        let config = SchedulerConfig {
            intervals: vec![1, MAX_INTERVAL_DAYS - 5],
            jitter_days: 5,
            ..SchedulerConfig::default()
        };
        let mut scheduler = SmartReviewScheduler::with_seed(config, 3)?;
        for _ in 0..50 {
            let next =
                scheduler.calculate_next_review(&[PerformanceRecord::new(0.95, 1)], fixed_now());
            assert!(next.interval_days <= MAX_INTERVAL_DAYS);
            assert_eq!(next.due, fixed_now() + Duration::days(next.interval_days as i64));
        }
        Ok(())
    }

    #[test]
    fn cards_due_preserves_order() {
        let now = fixed_now();
        let cards = vec![
            Card::new("future", "").with_next_review(now + Duration::days(2)),
            Card::new("new", ""),
            Card::new("past", "").with_next_review(now - Duration::days(2)),
            Card::new("exact", "").with_next_review(now),
        ];
        let due = scheduler()
            .get_cards_due(&cards, now)
            .into_iter()
            .map(|card| card.front.as_str())
            .collect::<Vec<_>>();
        assert_eq!(due, ["new", "past", "exact"]);
    }

    #[test]
    fn default_study_time_for_new_users() {
        let suggestion = scheduler().suggest_optimal_study_time(&[]);
        assert_eq!(suggestion.recommended_time(), "09:00");
        assert_eq!(suggestion.duration_minutes, 30);
        assert_eq!(suggestion.confidence, 0.5);
    }

    #[test]
    fn best_hour_uses_local_time_and_mean_accuracy() {
        let history = [
            record_at(8, 0.6, 20),
            record_at(8, 0.8, 40),
            record_at(19, 0.75, 30),
            record_at(21, 0.5, 25),
        ];
        let suggestion = scheduler().suggest_optimal_study_time(&history);
        assert_eq!(suggestion.recommended_time(), "19:00");
        // median of 20, 25, 30, 40
        assert_eq!(suggestion.duration_minutes, 27);
        assert!((suggestion.confidence - 0.4).abs() < 1e-6);
        assert_eq!(suggestion.reasoning, "Based on 4 previous sessions");
    }

    #[test]
    fn ties_go_to_the_earliest_hour() {
        let history = [
            record_at(22, 0.9, 10),
            record_at(7, 0.9, 30),
            record_at(13, 0.9, 50),
        ];
        let suggestion = scheduler().suggest_optimal_study_time(&history);
        assert_eq!(suggestion.hour, 7);
        assert_eq!(suggestion.duration_minutes, 30);
    }

    #[test]
    fn zero_accuracy_everywhere_keeps_the_default_hour() {
        let history = [record_at(22, 0.0, 20), record_at(6, 0.0, 40)];
        let suggestion = scheduler().suggest_optimal_study_time(&history);
        assert_eq!(suggestion.recommended_time(), "09:00");
        assert_eq!(suggestion.duration_minutes, 30);
        assert_eq!(suggestion.reasoning, "Based on 2 previous sessions");
    }

    #[test]
    fn study_records_fill_missing_fields() {
        let record: StudyRecord =
            serde_json::from_str(r#"{"studied_at": "2024-03-01T08:30:00+02:00"}"#).unwrap();
        assert_eq!(record.accuracy, DEFAULT_ACCURACY);
        assert_eq!(record.duration_minutes, 30);
        assert_eq!(record.studied_at.hour(), 8);
    }

    #[test]
    fn confidence_is_capped() {
        let history = (0..25).map(|i| record_at(i % 24, 0.5, 15)).collect::<Vec<_>>();
        let suggestion = scheduler().suggest_optimal_study_time(&history);
        assert_eq!(suggestion.confidence, 0.9);
        assert_eq!(suggestion.hour, 0);
    }
}
