//! Seeds the configured database with sample events for development.

use chrono::{Days, Local, NaiveDate};
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use event_finder_server::config::Config;
use event_finder_server::db::{Database, StorageOptions};
use event_finder_server::models::{Category, NewEvent};
use event_finder_server::repositories::create_event;

const SAMPLES: [(&str, &str, &str, Category, u64); 8] = [
    ("Lagos Tech Meetup", "Talks on AI, Web and Cloud.", "Lagos, Nigeria", Category::Tech, 14),
    ("Abuja Business Summit", "Leaders discuss SME growth and funding.", "Abuja, Nigeria", Category::Business, 21),
    ("Port Harcourt Music Festival", "Live performances by top Nigerian artists.", "Port Harcourt, Nigeria", Category::Music, 30),
    ("Lagos Marathon", "Annual road race across Lagos.", "Lagos, Nigeria", Category::Sports, 45),
    ("Abuja Art & Culture Fair", "Exhibitions and performances celebrating Nigerian culture.", "Abuja, Nigeria", Category::Arts, 35),
    ("Kano Community Clean-up", "Join hands to keep Kano clean.", "Kano, Nigeria", Category::Community, 10),
    ("Ibadan Startup Weekend", "Build and pitch startup ideas in 54 hours.", "Ibadan, Nigeria", Category::Tech, 28),
    ("Enugu Food Carnival", "Taste delicacies from across Nigeria.", "Enugu, Nigeria", Category::Community, 40),
];

fn samples(today: NaiveDate) -> Vec<NewEvent> {
    SAMPLES
        .iter()
        .map(|(title, description, location, category, days_ahead)| NewEvent {
            title: title.to_string(),
            description: Some(description.to_string()),
            location: location.to_string(),
            category: *category,
            date: today
                .checked_add_days(Days::new(*days_ahead))
                .unwrap_or(today),
        })
        .collect()
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let db = Database::open(&StorageOptions::from_config(&config))
        .await
        .expect("Failed to open database");

    let events = samples(Local::now().date_naive());
    for event in &events {
        let created = create_event(&db, event)
            .await
            .expect("Failed to insert sample event");
        tracing::info!(id = created.id, title = %created.title, "Seeded event");
    }

    db.close().await;
    println!("Seeded {} events successfully.", events.len());
}
