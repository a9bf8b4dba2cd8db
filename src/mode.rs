use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::card::ModeSettings;
use crate::error::{FlashcardError, Result};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StudyMode {
    #[default]
    BasicEducational,
    ExamPrep,
    Challenge,
    FastReview,
    SpacedRepetition,
}

impl StudyMode {
    pub fn from_name(name: &str) -> Result<Self> {
        name.parse().map_err(|_| FlashcardError::UnknownMode {
            name: name.to_string(),
        })
    }

    /// The static configuration bundle attached to every session in this mode.
    pub fn config(self) -> ModeConfig {
        use CardStyle::*;
        match self {
            Self::BasicEducational => ModeConfig {
                time_per_card: 30,
                show_hints: true,
                allow_retries: true,
                feedback_detail: FeedbackDetail::Comprehensive,
                card_styles: vec![DefinitionBased, ClozeDeletion],
                ui_theme: "clean_minimal".into(),
                ..ModeConfig::default()
            },
            Self::ExamPrep => ModeConfig {
                time_per_card: 20,
                show_hints: false,
                allow_retries: false,
                feedback_detail: FeedbackDetail::Immediate,
                card_styles: vec![MultipleChoice, ScenarioBased],
                ui_theme: "exam_focused".into(),
                include_timer: true,
                track_accuracy: true,
                ..ModeConfig::default()
            },
            Self::Challenge => ModeConfig {
                time_per_card: 15,
                show_hints: false,
                allow_retries: false,
                feedback_detail: FeedbackDetail::Minimal,
                card_styles: vec![ReverseQuestioning, ClozeDeletion],
                ui_theme: "gamified".into(),
                scoring_system: true,
                difficulty_progression: true,
                ..ModeConfig::default()
            },
            Self::FastReview => ModeConfig {
                time_per_card: 10,
                show_hints: false,
                allow_retries: false,
                feedback_detail: FeedbackDetail::Off,
                card_styles: vec![DefinitionBased],
                ui_theme: "minimalist".into(),
                auto_advance: true,
                ..ModeConfig::default()
            },
            Self::SpacedRepetition => ModeConfig {
                time_per_card: 25,
                show_hints: true,
                allow_retries: true,
                feedback_detail: FeedbackDetail::Adaptive,
                card_styles: vec![DefinitionBased, ClozeDeletion],
                ui_theme: "spaced_rep".into(),
                track_intervals: true,
                ..ModeConfig::default()
            },
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CardStyle {
    DefinitionBased,
    MultipleChoice,
    ClozeDeletion,
    ReverseQuestioning,
    ScenarioBased,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FeedbackDetail {
    #[default]
    Comprehensive,
    Immediate,
    Minimal,
    Adaptive,
    #[strum(serialize = "none")]
    #[serde(rename = "none")]
    Off,
}

/// Presentation and timing parameters for one study mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    /// Seconds allotted per card.
    pub time_per_card: u32,
    pub show_hints: bool,
    pub allow_retries: bool,
    pub feedback_detail: FeedbackDetail,
    pub card_styles: Vec<CardStyle>,
    pub ui_theme: String,
    pub include_timer: bool,
    pub track_accuracy: bool,
    pub scoring_system: bool,
    pub difficulty_progression: bool,
    pub auto_advance: bool,
    pub track_intervals: bool,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            time_per_card: 30,
            show_hints: true,
            allow_retries: true,
            feedback_detail: FeedbackDetail::Comprehensive,
            card_styles: vec![CardStyle::DefinitionBased],
            ui_theme: "clean_minimal".into(),
            include_timer: false,
            track_accuracy: false,
            scoring_system: false,
            difficulty_progression: false,
            auto_advance: false,
            track_intervals: false,
        }
    }
}

impl ModeConfig {
    pub fn card_settings(&self) -> ModeSettings {
        ModeSettings {
            time_limit: self.time_per_card,
            show_hints: self.show_hints,
            allow_retries: self.allow_retries,
            feedback_detail: self.feedback_detail,
        }
    }
}
