use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::mode::FeedbackDetail;

pub(crate) const DISTRACTORS: [&str; 3] = [
    "Alternative answer 1",
    "Alternative answer 2",
    "Alternative answer 3",
];

const FRONT_LIMIT: usize = 100;
const BACK_LIMIT: usize = 150;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Card {
    pub id: String,
    pub front: String,
    pub back: String,
    pub tags: Vec<String>,
    /// Free-form label; see [`Card::difficulty_rank`].
    pub difficulty: Option<String>,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub next_review: Option<DateTime<Utc>>,
    pub presentation: Presentation,
    pub simplified: bool,
    /// Set when the card touches one of the learner's weak areas.
    pub easier: bool,
    pub mode_settings: Option<ModeSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Presentation {
    #[default]
    Standard,
    MultipleChoice {
        choices: Vec<String>,
        correct_answer: String,
    },
    ReverseQuestioning,
}

/// Per-card view of a mode's configuration bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSettings {
    /// Seconds.
    pub time_limit: u32,
    pub show_hints: bool,
    pub allow_retries: bool,
    pub feedback_detail: FeedbackDetail,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn rank(self) -> u8 {
        match self {
            Self::Easy => 1,
            Self::Medium => 2,
            Self::Hard => 3,
        }
    }
}

impl Card {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    pub fn with_last_reviewed(mut self, at: DateTime<Utc>) -> Self {
        self.last_reviewed = Some(at);
        self
    }

    pub fn with_next_review(mut self, at: DateTime<Utc>) -> Self {
        self.next_review = Some(at);
        self
    }

    /// Missing or unrecognised labels rank as medium.
    pub fn difficulty_rank(&self) -> Difficulty {
        self.difficulty
            .as_deref()
            .and_then(|label| label.parse().ok())
            .unwrap_or_default()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review.is_none_or(|due| due <= now)
    }

    pub fn has_any_tag<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        self.tags
            .iter()
            .any(|tag| tags.iter().any(|other| other.as_ref() == tag))
    }

    /// Correct answer plus the static distractors, in shuffled order.
    pub fn convert_to_multiple_choice<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if matches!(self.presentation, Presentation::MultipleChoice { .. }) {
            return;
        }
        let correct_answer = self.back.clone();
        let mut choices = std::iter::once(correct_answer.clone())
            .chain(DISTRACTORS.iter().map(|d| d.to_string()))
            .collect::<Vec<_>>();
        choices.shuffle(rng);
        self.presentation = Presentation::MultipleChoice {
            choices,
            correct_answer,
        };
    }

    pub fn convert_to_reverse_questioning(&mut self) {
        let original_front = std::mem::take(&mut self.front);
        self.front = format!("What question would have this answer: {}", self.back);
        self.back = original_front;
        self.presentation = Presentation::ReverseQuestioning;
    }

    pub fn simplify(&mut self) {
        truncate_with_ellipsis(&mut self.front, FRONT_LIMIT);
        truncate_with_ellipsis(&mut self.back, BACK_LIMIT);
        self.simplified = true;
    }
}

/// Truncates to `limit` characters, the last three being an ellipsis, when
/// `text` is longer than `limit`. Lengths are counted in chars.
fn truncate_with_ellipsis(text: &mut String, limit: usize) {
    if text.chars().count() <= limit {
        return;
    }
    let keep = limit - ELLIPSIS.len();
    let cut = text
        .char_indices()
        .nth(keep)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    text.truncate(cut);
    text.push_str(ELLIPSIS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn difficulty_rank_defaults_to_medium() {
        let card = Card::new("q", "a");
        assert_eq!(card.difficulty_rank(), Difficulty::Medium);
        assert_eq!(
            card.clone().with_difficulty("HARD").difficulty_rank(),
            Difficulty::Hard
        );
        assert_eq!(
            card.with_difficulty("impossible").difficulty_rank(),
            Difficulty::Medium
        );
        assert!(Difficulty::Easy.rank() < Difficulty::Hard.rank());
    }

    #[test]
    fn due_without_next_review() {
        let now = Utc::now();
        assert!(Card::new("q", "a").is_due(now));
        assert!(
            Card::new("q", "a")
                .with_next_review(now - Duration::hours(1))
                .is_due(now)
        );
        assert!(Card::new("q", "a").with_next_review(now).is_due(now));
        assert!(
            !Card::new("q", "a")
                .with_next_review(now + Duration::days(1))
                .is_due(now)
        );
    }

    #[test]
    fn multiple_choice_keeps_correct_answer() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut card = Card::new("Capital of France?", "Paris");
        card.convert_to_multiple_choice(&mut rng);
        let Presentation::MultipleChoice {
            choices,
            correct_answer,
        } = &card.presentation
        else {
            panic!("expected multiple choice, got {:?}", card.presentation);
        };
        assert_eq!(correct_answer, "Paris");
        assert_eq!(choices.len(), 4);
        assert!(choices.iter().any(|c| c == "Paris"));
        for distractor in DISTRACTORS {
            assert!(choices.iter().any(|c| c == distractor));
        }

        // converting twice is a no-op
        let before = card.clone();
        card.convert_to_multiple_choice(&mut rng);
        assert_eq!(card, before);
    }

    #[test]
    fn reverse_questioning_swaps_sides() {
        let mut card = Card::new("What is 2+2?", "4");
        card.convert_to_reverse_questioning();
        assert_eq!(card.front, "What question would have this answer: 4");
        assert_eq!(card.back, "What is 2+2?");
        assert_eq!(card.presentation, Presentation::ReverseQuestioning);
    }

    #[test]
    fn simplify_truncates_long_sides() {
        let mut card = Card::new("f".repeat(150), "b".repeat(200));
        card.simplify();
        assert_eq!(card.front.len(), 100);
        assert_eq!(card.front, format!("{}...", "f".repeat(97)));
        assert_eq!(card.back.len(), 150);
        assert_eq!(card.back, format!("{}...", "b".repeat(147)));
        assert!(card.simplified);
    }

    #[test]
    fn simplify_leaves_short_sides() {
        let mut card = Card::new("f".repeat(100), "b".repeat(150));
        card.simplify();
        assert_eq!(card.front.len(), 100);
        assert!(!card.front.ends_with("..."));
        assert_eq!(card.back.len(), 150);
    }

    #[test]
    fn simplify_counts_chars_not_bytes() {
        let mut card = Card::new("é".repeat(101), "ok");
        card.simplify();
        assert_eq!(card.front.chars().count(), 100);
        assert!(card.front.starts_with("éé"));
        assert!(card.front.ends_with("..."));
    }

    #[test]
    fn tag_intersection() {
        let card = Card::new("q", "a").with_tags(["biology", "cells"]);
        assert!(card.has_any_tag(&["cells"]));
        assert!(!card.has_any_tag(&["physics"]));
        assert!(!card.has_any_tag::<String>(&[]));
    }
}
