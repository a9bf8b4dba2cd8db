use std::cmp::Reverse;
use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::card::{Card, Difficulty};
use crate::error::{FlashcardError, Result};
use crate::mode::{CardStyle, ModeConfig, StudyMode};
use crate::session::{Response, SessionId, SessionResult, StudySession};
use crate::store::{EvictionPolicy, MemoryStore, Store};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalizerConfig {
    /// Performance entries kept per profile, oldest dropped first.
    pub history_limit: usize,
    pub weak_area_limit: usize,
    /// Extra seconds given to cards tagged with a weak area.
    pub weak_area_time_bonus: u32,
    /// Session accuracy above which the session's mode becomes preferred.
    pub promotion_threshold: f32,
    /// Spaced-repetition priority of cards that were never reviewed.
    pub unseen_priority: i64,
    /// Capacity of the default in-memory profile store.
    pub profiles: EvictionPolicy,
}

impl Default for PersonalizerConfig {
    fn default() -> Self {
        Self {
            history_limit: 30,
            weak_area_limit: 5,
            weak_area_time_bonus: 10,
            promotion_threshold: 0.8,
            unseen_priority: 999,
            profiles: EvictionPolicy::default(),
        }
    }
}

fn check_config(config: &PersonalizerConfig) -> Result<()> {
    if config.history_limit == 0 {
        return Err(FlashcardError::InvalidPolicy);
    }
    if !(0.0..=1.0).contains(&config.promotion_threshold) {
        return Err(FlashcardError::InvalidThresholds);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEntry {
    pub date: DateTime<Utc>,
    pub mode: StudyMode,
    pub accuracy: f32,
    pub total_cards: usize,
    pub study_time_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizationProfile {
    pub user_id: String,
    /// Ordered; the first entry picks the mode when none is requested.
    pub preferred_modes: Vec<StudyMode>,
    pub preferred_styles: Vec<CardStyle>,
    pub difficulty_preference: Difficulty,
    /// Minutes.
    pub study_time_preference: u32,
    pub performance_history: VecDeque<PerformanceEntry>,
    pub learning_goals: Vec<String>,
    pub weak_areas: Vec<String>,
}

impl PersonalizationProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            preferred_modes: vec![StudyMode::BasicEducational],
            preferred_styles: vec![CardStyle::DefinitionBased],
            difficulty_preference: Difficulty::Medium,
            study_time_preference: 30,
            performance_history: VecDeque::new(),
            learning_goals: Vec::new(),
            weak_areas: Vec::new(),
        }
    }

    pub fn preferred_mode(&self) -> StudyMode {
        self.preferred_modes.first().copied().unwrap_or_default()
    }

    fn record_performance(&mut self, entry: PerformanceEntry, limit: usize) {
        self.performance_history.push_back(entry);
        while self.performance_history.len() > limit {
            self.performance_history.pop_front();
        }
    }
}

/// Builds mode-specific study sessions and learns from their results.
///
/// Profiles are created on first use and kept in the injected [`Store`].
/// By default that is an in-memory store bounded by
/// [`PersonalizerConfig::profiles`].
#[derive(Debug)]
pub struct FlashcardPersonalizer<S = MemoryStore<String, PersonalizationProfile>> {
    config: PersonalizerConfig,
    profiles: S,
    rng: StdRng,
}

impl FlashcardPersonalizer {
    pub fn new(config: PersonalizerConfig) -> Result<Self> {
        let profiles = MemoryStore::with_policy(config.profiles)?;
        Self::with_store(config, profiles)
    }
}

impl<S: Store<String, PersonalizationProfile>> FlashcardPersonalizer<S> {
    pub fn with_store(config: PersonalizerConfig, profiles: S) -> Result<Self> {
        check_config(&config)?;
        Ok(Self {
            config,
            profiles,
            rng: StdRng::from_os_rng(),
        })
    }

    /// Reseeds the generator used for choice shuffling and session ids.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &PersonalizerConfig {
        &self.config
    }

    pub fn profiles(&self) -> &S {
        &self.profiles
    }

    pub fn into_profiles(self) -> S {
        self.profiles
    }

    pub fn profile(&mut self, user_id: &str) -> &mut PersonalizationProfile {
        self.profiles
            .get_or_insert_with(user_id.to_string(), || PersonalizationProfile::new(user_id))
    }

    /// Starts a session in `mode`, or in the user's first preferred mode.
    pub fn create_session(
        &mut self,
        user_id: &str,
        cards: Vec<Card>,
        mode: Option<StudyMode>,
        now: DateTime<Utc>,
    ) -> StudySession {
        let profile = self
            .profiles
            .get_or_insert_with(user_id.to_string(), || PersonalizationProfile::new(user_id));
        let mode = mode.unwrap_or_else(|| profile.preferred_mode());
        let weak_areas = profile.weak_areas.clone();

        let settings = mode.config();
        let mut cards = cards
            .into_iter()
            .map(|card| self.personalize_card(card, mode, &settings, &weak_areas))
            .collect::<Vec<_>>();
        self.reorder(&mut cards, mode, now);

        let id = SessionId(self.rng.random());
        info!(
            "created {id} for {user_id}: {} cards in {mode} mode",
            cards.len()
        );
        StudySession::new(id, user_id.to_string(), mode, cards, now)
    }

    fn personalize_card(
        &mut self,
        mut card: Card,
        mode: StudyMode,
        settings: &ModeConfig,
        weak_areas: &[String],
    ) -> Card {
        match mode {
            StudyMode::ExamPrep => card.convert_to_multiple_choice(&mut self.rng),
            StudyMode::Challenge => card.convert_to_reverse_questioning(),
            StudyMode::FastReview => card.simplify(),
            StudyMode::BasicEducational | StudyMode::SpacedRepetition => {}
        }

        let mut card_settings = settings.card_settings();
        if card.has_any_tag(weak_areas) {
            card.easier = true;
            card_settings.time_limit = card_settings
                .time_limit
                .saturating_add(self.config.weak_area_time_bonus);
            card_settings.show_hints = true;
        }
        card.mode_settings = Some(card_settings);
        card
    }

    fn reorder(&self, cards: &mut [Card], mode: StudyMode, now: DateTime<Utc>) {
        match mode {
            StudyMode::SpacedRepetition => {
                let unseen = self.config.unseen_priority;
                cards.sort_by_cached_key(|card| {
                    Reverse(
                        card.last_reviewed
                            .map_or(unseen, |at| (now - at).num_days()),
                    )
                });
            }
            StudyMode::Challenge => cards.sort_by_key(|card| card.difficulty_rank().rank()),
            _ => {}
        }
    }

    /// Folds a finished session into the user's profile.
    pub fn update_profile(
        &mut self,
        user_id: &str,
        result: &SessionResult,
        now: DateTime<Utc>,
    ) -> &PersonalizationProfile {
        let accuracy = result.accuracy();
        let weak_areas = most_missed_tags(&result.responses, self.config.weak_area_limit);
        let history_limit = self.config.history_limit;
        let promote = accuracy > self.config.promotion_threshold;

        let profile = self
            .profiles
            .get_or_insert_with(user_id.to_string(), || PersonalizationProfile::new(user_id));
        profile.record_performance(
            PerformanceEntry {
                date: now,
                mode: result.mode,
                accuracy,
                total_cards: result.responses.len(),
                study_time_minutes: result.study_time_minutes,
            },
            history_limit,
        );
        debug!("weak areas for {user_id}: {weak_areas:?}");
        profile.weak_areas = weak_areas;

        if promote && !profile.preferred_modes.contains(&result.mode) {
            info!("{user_id} now prefers {} mode", result.mode);
            profile.preferred_modes.push(result.mode);
        }
        profile
    }
}

/// Most frequent tags among incorrect responses, ties in first-seen order.
fn most_missed_tags(responses: &[Response], limit: usize) -> Vec<String> {
    let missed = responses
        .iter()
        .filter(|response| !response.correct)
        .flat_map(|response| response.tags.iter());
    let counts = missed.clone().counts();
    missed
        .unique()
        .sorted_by_key(|tag| Reverse(counts[*tag]))
        .take(limit)
        .cloned()
        .collect()
}
