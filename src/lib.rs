mod analytics;
mod card;
mod error;
mod mode;
mod personalize;
mod schedule;
mod session;
mod store;
mod theme;

pub use analytics::{LearningMetrics, SessionAnalytics};
pub use card::{Card, Difficulty, ModeSettings, Presentation};
pub use error::{FlashcardError, Result};
pub use mode::{CardStyle, FeedbackDetail, ModeConfig, StudyMode};
pub use personalize::{
    FlashcardPersonalizer, PerformanceEntry, PersonalizationProfile, PersonalizerConfig,
};
pub use schedule::{
    DEFAULT_ACCURACY, DEFAULT_INTERVALS, IntervalStep, MAX_INTERVAL_DAYS, NextReview,
    PerformanceRecord, SchedulerConfig, SmartReviewScheduler, StudyRecord, StudyTimeSuggestion,
};
pub use session::{Response, SessionId, SessionResult, SessionState, StudySession};
pub use store::{EvictionPolicy, MemoryStore, Store};
pub use theme::{
    DEFAULT_THEME, Theme, ThemeColors, ThemeFeatures, ThemeFonts, ThemeLayout, UiThemeManager,
};
