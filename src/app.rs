//! Desktop front end: deck list, deck import and the review screen.
//! All scheduling goes through `ReviewSession`; this file only draws it and forwards input.

use eframe::egui;
use rusqlite::Connection;
use spaced_review::clock::{Clock, SystemClock};
use spaced_review::database::{SqliteMedium, db};
use spaced_review::error::SessionError;
use spaced_review::models::{Rating, ReviewSession, Scheduler, SessionPhase};
use spaced_review::provider::SqliteDeckProvider;
use spaced_review::provider::json::import_json;
use std::sync::{Arc, Mutex};

type DeckSession = ReviewSession<SqliteDeckProvider, SqliteMedium>;

/// Application screen states
#[derive(Default)]
enum AppScreen {
    #[default]
    Main,
    Review,
}

/// Input collected while drawing the review screen, applied afterwards
#[derive(Default)]
struct ReviewActions {
    show_answer: bool,
    rating: Option<u8>,
    start_over: bool,
    back: bool,
}

pub struct ReviewApp {
    conn: Arc<Mutex<Connection>>,
    scheduler: Scheduler,
    clock: Arc<dyn Clock>,

    decks: Vec<(String, usize)>,
    selected_deck: Option<usize>,

    current_screen: AppScreen,
    session: Option<DeckSession>,

    show_reset_confirmation: bool,
    show_message_dialog: bool,
    message: String,
}

impl eframe::App for ReviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::Review => self.render_review_screen(ctx),
        }

        if self.show_reset_confirmation {
            let mut confirmed = false;
            let mut cancelled = false;
            egui::Window::new("Start over?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("This forgets review progress for every deck.");
                    ui.horizontal(|ui| {
                        if ui.button("Cancel").clicked() {
                            cancelled = true;
                        }
                        if ui.button("Start Over").clicked() {
                            confirmed = true;
                        }
                    });
                });

            if confirmed {
                if let Some(session) = &mut self.session {
                    session.reset_session();
                }
            }
            if confirmed || cancelled {
                self.show_reset_confirmation = false;
            }
        }

        if self.show_message_dialog {
            egui::Window::new("Import Result")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.show_message_dialog = false;
                    }
                });
        }
    }
}

impl ReviewApp {
    pub fn new(conn: Connection, scheduler: Scheduler, default_deck: Option<String>) -> Self {
        let mut app = Self {
            conn: Arc::new(Mutex::new(conn)),
            scheduler,
            clock: Arc::new(SystemClock),
            decks: Vec::new(),
            selected_deck: None,
            current_screen: AppScreen::Main,
            session: None,
            show_reset_confirmation: false,
            show_message_dialog: false,
            message: String::new(),
        };
        app.refresh_decks();
        app.selected_deck = default_deck
            .and_then(|name| app.decks.iter().position(|(deck, _)| *deck == name))
            .or(if app.decks.is_empty() { None } else { Some(0) });
        app
    }

    fn refresh_decks(&mut self) {
        let decks = match self.conn.lock() {
            Ok(conn) => db::get_deck_summaries(&conn),
            Err(_) => {
                log::error!("Database lock poisoned");
                return;
            }
        };
        match decks {
            Ok(decks) => self.decks = decks,
            Err(e) => log::error!("Failed to list decks: {}", e),
        }
    }

    /// Renders the deck list with import and review actions
    fn render_main_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.clock.now().format("%Y-%m-%d").to_string());
                if ui.button("Import Deck").clicked() {
                    self.handle_import();
                }
            });

            ui.separator();
            ui.heading(format!("Decks ({})", self.decks.len()));

            let mut action_select: Option<usize> = None;
            let mut action_review: Option<usize> = None;

            egui::ScrollArea::vertical()
                .id_source("decks_list")
                .show(ui, |ui| {
                    for (i, (name, count)) in self.decks.iter().enumerate() {
                        let is_selected = self.selected_deck == Some(i);
                        ui.horizontal(|ui| {
                            if ui
                                .selectable_label(is_selected, format!("{} ({} cards)", name, count))
                                .clicked()
                            {
                                action_select = Some(i);
                            }
                            if ui.button("Review").clicked() {
                                action_review = Some(i);
                            }
                        });
                    }
                });

            if self.decks.is_empty() {
                ui.label("No decks yet. Import one from a JSON file.");
            }

            // Enter reviews the selected deck
            if ui.input(|input| input.key_pressed(egui::Key::Enter)) && action_review.is_none() {
                action_review = self.selected_deck;
            }

            if let Some(i) = action_select {
                self.selected_deck = Some(i);
            }
            if let Some(i) = action_review {
                self.start_review(i);
            }
        });
    }

    fn start_review(&mut self, deck_index: usize) {
        let Some((deck_name, _)) = self.decks.get(deck_index) else {
            return;
        };
        let provider = SqliteDeckProvider::new(deck_name.clone(), Arc::clone(&self.conn));
        let medium = SqliteMedium::new(Arc::clone(&self.conn));
        self.session = Some(ReviewSession::start(
            provider,
            medium,
            self.scheduler.clone(),
            Arc::clone(&self.clock),
        ));
        self.selected_deck = Some(deck_index);
        self.current_screen = AppScreen::Review;
    }

    /// Renders the review screen; Space/Enter reveals the answer, 1-3 rate it
    fn render_review_screen(&mut self, ctx: &egui::Context) {
        let mut actions = ReviewActions::default();

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &self.session else {
                actions.back = true;
                return;
            };
            ui.heading(format!("Reviewing: {}", session.provider().deck_name()));
            ui.add_space(10.0);

            let view = session.view();
            match view.phase {
                SessionPhase::Loading => {
                    ui.spinner();
                }
                SessionPhase::Error => {
                    match session.error() {
                        Some(SessionError::NoCardsAvailable) => {
                            ui.heading("All caught up!");
                        }
                        _ => {
                            ui.heading("Something went wrong");
                        }
                    }
                    if let Some(message) = &view.error_message {
                        ui.label(message);
                    }
                }
                SessionPhase::Complete => {
                    let counts = session.rating_counts();
                    ui.heading("Session complete!");
                    ui.label(format!(
                        "Reviewed {} cards: {} hard, {} good, {} easy",
                        session.reviewed_count(),
                        counts.hard,
                        counts.good,
                        counts.easy
                    ));
                }
                SessionPhase::AwaitingShow | SessionPhase::AnswerShown => {
                    ui.label(format!(
                        "Card {} / {} ({} remaining)",
                        view.current_card_index + 1,
                        view.total_cards,
                        session.remaining_count()
                    ));
                    if let Some(stats) = view.stats {
                        if stats.is_new {
                            ui.label("New card");
                        } else {
                            ui.label(format!("Reviewed {} times", stats.total_reviews));
                        }
                    }
                    ui.add_space(10.0);

                    if let Some(card) = view.current_card {
                        ui.group(|ui| {
                            ui.set_min_height(200.0);
                            ui.vertical_centered(|ui| {
                                ui.add_space(20.0);
                                ui.heading(&card.front_text);
                                ui.add_space(20.0);
                                if view.is_answer_visible {
                                    ui.separator();
                                    ui.label(&card.back_text);
                                } else {
                                    ui.label("(Press Space to reveal)");
                                }
                                ui.add_space(20.0);
                            });
                        });
                    }

                    ui.add_space(20.0);

                    if view.is_answer_visible {
                        ui.label("How well did you remember it?");
                        ui.horizontal(|ui| {
                            for rating in Rating::ALL {
                                let label = format!("{} - {}", rating as u8, rating.label());
                                if ui.button(label).clicked() {
                                    actions.rating = Some(rating as u8);
                                }
                            }
                        });
                    } else if ui.button("Show Answer").clicked() {
                        actions.show_answer = true;
                    }

                    // rating failures keep the card on screen
                    if let Some(message) = &view.error_message {
                        ui.colored_label(egui::Color32::RED, message);
                    }
                }
            }

            ui.add_space(20.0);
            ui.horizontal(|ui| {
                if ui.button("Back to Decks").clicked() {
                    actions.back = true;
                }
                if ui.button("Start Over").clicked() {
                    actions.start_over = true;
                }
            });
        });

        ctx.input(|input| {
            if input.key_pressed(egui::Key::Space) || input.key_pressed(egui::Key::Enter) {
                actions.show_answer = true;
            }
            let keys = [
                (egui::Key::Num1, 1),
                (egui::Key::Num2, 2),
                (egui::Key::Num3, 3),
            ];
            for (key, rating) in keys {
                if input.key_pressed(key) {
                    actions.rating = Some(rating);
                }
            }
            if input.key_pressed(egui::Key::Escape) {
                actions.back = true;
            }
        });

        // Execute deferred actions
        if let Some(session) = &mut self.session {
            if actions.show_answer {
                session.show_answer();
            }
            if let Some(rating) = actions.rating {
                session.handle_rating(rating);
            }
        }
        if actions.start_over {
            self.show_reset_confirmation = true;
        }
        if actions.back {
            self.session = None;
            self.current_screen = AppScreen::Main;
            self.refresh_decks();
        }
    }

    /// Imports a deck from a JSON file into the database
    fn handle_import(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        self.message = match import_json(&path) {
            Ok(deck) => {
                let result = match self.conn.lock() {
                    Ok(mut conn) => {
                        if db::deck_exists(&deck.name, &conn).unwrap_or(false) {
                            Err(format!(
                                "Deck '{}' already exists! Please rename it in the JSON file.",
                                deck.name
                            ))
                        } else {
                            db::import_deck(&deck, &mut conn)
                                .map_err(|e| format!("Failed to import deck: {}", e))
                        }
                    }
                    Err(_) => Err("Database is unavailable".to_string()),
                };
                match result {
                    Ok(count) if count < deck.flashcards.len() => format!(
                        "Deck '{}' imported with {} cards. Skipped {} cards with a repeated front.",
                        deck.name,
                        count,
                        deck.flashcards.len() - count
                    ),
                    Ok(count) => format!(
                        "Deck '{}' imported successfully with {} cards!",
                        deck.name, count
                    ),
                    Err(message) => message,
                }
            }
            Err(e) => format!(
                "Import failed: {}\n\nPlease check if the file has correct structure:\n{{\n  \"name\": \"Deck Name\",\n  \"flashcards\": [{{ \"id\": \"1\", \"frontText\": \"...\", \"backText\": \"...\" }}]\n}}",
                e
            ),
        };
        self.show_message_dialog = true;
        self.refresh_decks();
    }
}
