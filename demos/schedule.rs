use chrono::{Duration, FixedOffset, TimeZone, Utc};
use flashcard_core::{
    Card, PerformanceRecord, SchedulerConfig, SmartReviewScheduler, StudyRecord,
};

fn schedule_new_card(scheduler: &mut SmartReviewScheduler) {
    // No review history yet
    let next = scheduler.calculate_next_review(&[], Utc::now());
    println!("New card due: {} ({} day)", next.due, next.interval_days);
}

fn schedule_existing_card(scheduler: &mut SmartReviewScheduler) {
    // Reviewed three times, last time with 95% accuracy on the 7 day step
    let history = [
        PerformanceRecord::new(0.6, 0),
        PerformanceRecord::new(0.8, 1),
        PerformanceRecord::new(0.95, 2),
    ];
    let next = scheduler.calculate_next_review(&history, Utc::now());
    println!(
        "Existing card due: {} (step {}, {} days)",
        next.due, next.interval_index, next.interval_days
    );
}

fn list_due_cards(scheduler: &SmartReviewScheduler) {
    let now = Utc::now();
    let cards = vec![
        Card::new("Mitochondria", "Powerhouse of the cell"),
        Card::new("Ribosome", "Protein synthesis").with_next_review(now - Duration::days(2)),
        Card::new("Golgi apparatus", "Packaging").with_next_review(now + Duration::days(5)),
    ];
    for card in scheduler.get_cards_due(&cards, now) {
        println!("Due: {}", card.front);
    }
}

fn suggest_study_time(scheduler: &SmartReviewScheduler) -> Result<(), Box<dyn std::error::Error>> {
    let local = FixedOffset::east_opt(3600).ok_or("invalid offset")?;
    let history = [(7, 0.9, 25), (7, 0.85, 30), (20, 0.6, 45), (13, 0.7, 20)]
        .into_iter()
        .map(|(hour, accuracy, duration_minutes)| {
            local
                .with_ymd_and_hms(2024, 1, 10, hour, 0, 0)
                .single()
                .map(|studied_at| StudyRecord {
                    studied_at,
                    accuracy,
                    duration_minutes,
                })
                .ok_or("invalid timestamp")
        })
        .collect::<Result<Vec<_>, _>>()?;
    let suggestion = scheduler.suggest_optimal_study_time(&history);
    println!(
        "Study at {} for {} minutes (confidence {:.1}): {}",
        suggestion.recommended_time(),
        suggestion.duration_minutes,
        suggestion.confidence,
        suggestion.reasoning
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut scheduler = SmartReviewScheduler::new(SchedulerConfig::default())?;

    println!("Scheduling a new card:");
    schedule_new_card(&mut scheduler);

    println!("\nScheduling an existing card:");
    schedule_existing_card(&mut scheduler);

    println!("\nCards due now:");
    list_due_cards(&scheduler);

    println!("\nSuggested study time:");
    suggest_study_time(&scheduler)?;

    Ok(())
}
