use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_THEME: &str = "clean_minimal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub primary: String,
    pub background: String,
    pub text: String,
    pub accent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeFonts {
    pub primary: String,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeLayout {
    pub card_padding: String,
    pub border_radius: String,
    pub shadow: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeFeatures {
    pub timer_visible: bool,
    pub progress_bar: bool,
    pub score_display: bool,
    pub streak_counter: bool,
    pub animations: bool,
    pub minimal_ui: bool,
    pub auto_advance: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub colors: ThemeColors,
    pub fonts: ThemeFonts,
    pub layout: ThemeLayout,
    #[serde(default)]
    pub features: ThemeFeatures,
}

impl Theme {
    fn new(
        [primary, background, text, accent]: [&str; 4],
        [font, size]: [&str; 2],
        [card_padding, border_radius, shadow]: [&str; 3],
        features: ThemeFeatures,
    ) -> Self {
        Self {
            colors: ThemeColors {
                primary: primary.into(),
                background: background.into(),
                text: text.into(),
                accent: accent.into(),
            },
            fonts: ThemeFonts {
                primary: font.into(),
                size: size.into(),
            },
            layout: ThemeLayout {
                card_padding: card_padding.into(),
                border_radius: border_radius.into(),
                shadow: shadow.into(),
            },
            features,
        }
    }

    /// Renders the theme as a style sheet. Output depends only on the theme.
    pub fn to_css(&self) -> String {
        let Theme {
            colors,
            fonts,
            layout,
            features,
        } = self;
        let mut css = format!(
            "
.flashcard-container {{
    background-color: {background};
    color: {text};
    font-family: {font};
    font-size: {size};
}}

.flashcard {{
    padding: {padding};
    border-radius: {radius};
    box-shadow: {shadow};
    background-color: white;
}}

.primary-button {{
    background-color: {primary};
    color: white;
    border: none;
    padding: 0.75rem 1.5rem;
    border-radius: {radius};
    font-family: {font};
}}

.accent-element {{
    color: {accent};
}}
",
            background = colors.background,
            text = colors.text,
            primary = colors.primary,
            accent = colors.accent,
            font = fonts.primary,
            size = fonts.size,
            padding = layout.card_padding,
            radius = layout.border_radius,
            shadow = layout.shadow,
        );

        if features.timer_visible {
            css.push_str(
                "
.timer-display {
    position: fixed;
    top: 1rem;
    right: 1rem;
    background: rgba(0, 0, 0, 0.8);
    color: white;
    padding: 0.5rem 1rem;
    border-radius: 4px;
}
",
            );
        }
        if features.score_display {
            css.push_str(
                "
.score-display {
    position: fixed;
    top: 1rem;
    left: 1rem;
    background: linear-gradient(45deg, #7c3aed, #06b6d4);
    color: white;
    padding: 0.5rem 1rem;
    border-radius: 8px;
    font-weight: bold;
}
",
            );
        }
        css
    }
}

fn builtin_themes() -> BTreeMap<String, Theme> {
    let themes = [
        (
            DEFAULT_THEME,
            Theme::new(
                ["#2563eb", "#ffffff", "#1f2937", "#10b981"],
                ["Inter, sans-serif", "16px"],
                ["2rem", "12px", "0 4px 6px -1px rgba(0, 0, 0, 0.1)"],
                ThemeFeatures::default(),
            ),
        ),
        (
            "exam_focused",
            Theme::new(
                ["#dc2626", "#fef2f2", "#1f2937", "#f59e0b"],
                ["system-ui, sans-serif", "18px"],
                ["1.5rem", "8px", "0 2px 4px rgba(0, 0, 0, 0.1)"],
                ThemeFeatures {
                    timer_visible: true,
                    progress_bar: true,
                    ..ThemeFeatures::default()
                },
            ),
        ),
        (
            "gamified",
            Theme::new(
                ["#7c3aed", "#faf5ff", "#1f2937", "#06b6d4"],
                ["Poppins, sans-serif", "16px"],
                ["2rem", "16px", "0 8px 25px -5px rgba(0, 0, 0, 0.1)"],
                ThemeFeatures {
                    score_display: true,
                    streak_counter: true,
                    animations: true,
                    ..ThemeFeatures::default()
                },
            ),
        ),
        (
            "minimalist",
            Theme::new(
                ["#374151", "#f9fafb", "#111827", "#6b7280"],
                ["system-ui, sans-serif", "14px"],
                ["1rem", "4px", "none"],
                ThemeFeatures {
                    minimal_ui: true,
                    auto_advance: true,
                    ..ThemeFeatures::default()
                },
            ),
        ),
    ];
    themes
        .into_iter()
        .map(|(name, theme)| (name.to_string(), theme))
        .collect()
}

/// Theme lookup by name. Unknown names resolve to [`DEFAULT_THEME`].
#[derive(Debug, Clone)]
pub struct UiThemeManager {
    themes: BTreeMap<String, Theme>,
    default: Theme,
}

impl Default for UiThemeManager {
    fn default() -> Self {
        let themes = builtin_themes();
        let default = themes[DEFAULT_THEME].clone();
        Self { themes, default }
    }
}

impl UiThemeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a theme; replacing [`DEFAULT_THEME`] changes the fallback.
    pub fn register(&mut self, name: impl Into<String>, theme: Theme) -> Option<Theme> {
        let name = name.into();
        if name == DEFAULT_THEME {
            self.default = theme.clone();
        }
        self.themes.insert(name, theme)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.themes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }

    pub fn theme(&self, name: &str) -> &Theme {
        self.themes.get(name).unwrap_or(&self.default)
    }

    pub fn generate_css(&self, name: &str) -> String {
        self.theme(name).to_css()
    }
}
