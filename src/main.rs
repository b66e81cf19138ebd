mod app;

use app::ReviewApp;
use spaced_review::config::Config;
use spaced_review::database::db::{get_deck_summaries, import_deck, init_database};
use spaced_review::models::{Deck, Flashcard, Scheduler};

fn sample_deck() -> Deck {
    Deck {
        name: "Polish Vocabulary".to_string(),
        flashcards: vec![
            Flashcard::new("1", "cześć", "hello"),
            Flashcard::new("2", "dziękuję", "thank you"),
            Flashcard::new("3", "proszę", "please"),
        ],
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let config = Config::load();
    let db_path = config.db_path();
    if let Some(parent) = db_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            log::warn!("Could not create {}: {}", parent.display(), e);
        }
    }
    let mut conn = init_database(&db_path).expect("Failed to initialize database");
    log::info!("Using database at {}", db_path.display());

    if get_deck_summaries(&conn).unwrap_or_default().is_empty() {
        match import_deck(&sample_deck(), &mut conn) {
            Ok(count) => log::info!("Sample deck created with {} cards", count),
            Err(e) => log::warn!("Failed to create sample deck: {}", e),
        }
    }

    let scheduler = Scheduler::new(config.scheduler.clone()).unwrap_or_else(|e| {
        log::warn!("{}; using default scheduler settings", e);
        Scheduler::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([500.0, 700.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Spaced Review",
        options,
        Box::new(|_cc| {
            Ok(Box::new(ReviewApp::new(
                conn,
                scheduler,
                config.review.default_deck,
            )))
        }),
    )
}
