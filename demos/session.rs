use chrono::{Duration, Utc};
use flashcard_core::{
    Card, FlashcardPersonalizer, LearningMetrics, PersonalizerConfig, SessionAnalytics, StudyMode,
    UiThemeManager,
};

fn setup_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn deck() -> Vec<Card> {
    vec![
        Card::new("What is the speed of light?", "About 300,000 km/s")
            .with_id("physics-1")
            .with_tags(["physics"])
            .with_difficulty("medium"),
        Card::new("Who wrote Hamlet?", "William Shakespeare")
            .with_id("lit-1")
            .with_tags(["literature"])
            .with_difficulty("easy"),
        Card::new("What is Avogadro's number?", "6.022 × 10^23")
            .with_id("chem-1")
            .with_tags(["chemistry"])
            .with_difficulty("hard"),
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger()?;

    let mut personalizer = FlashcardPersonalizer::new(PersonalizerConfig::default())?;
    let themes = UiThemeManager::new();
    let start = Utc::now();

    // First session in challenge mode, missing the chemistry card
    let mut session = personalizer.create_session("ada", deck(), Some(StudyMode::Challenge), start);
    println!("Theme CSS:{}", themes.generate_css(&session.settings.ui_theme));
    while let Some(card) = session.current_card() {
        let correct = !card.tags.iter().any(|tag| tag == "chemistry");
        println!("{} -> {} [{}]", card.front, card.back, if correct { "ok" } else { "miss" });
        session.record_response(correct, Utc::now())?;
    }
    let ended_at = start + Duration::minutes(6);
    let result = session.end(ended_at)?;
    let profile = personalizer.update_profile("ada", &result, ended_at);
    println!("Weak areas: {:?}", profile.weak_areas);
    println!("Preferred modes: {:?}", profile.preferred_modes);

    // The next session makes the weak area easier
    let next = personalizer.create_session("ada", deck(), None, Utc::now());
    for card in &next.cards {
        println!(
            "{} easier={} settings={:?}",
            card.id, card.easier, card.mode_settings
        );
    }

    let metrics = LearningMetrics::from_sessions(
        &[SessionAnalytics::from_result(&result, ended_at)],
        ended_at.date_naive(),
    );
    println!("Metrics: {metrics:?}");
    Ok(())
}
