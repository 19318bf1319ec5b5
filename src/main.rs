use chrono::{Local, Utc};
use eframe::{egui, App, CreationContext, Frame};
use egui::{Align, Color32, Layout, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod config;
mod cursor;
mod dates;
mod log_index;
mod models;
mod reconcile;
mod relay;
mod rest_timer;
mod session_view;
mod snapshot;
mod worker;

use api::ApiClient;
use config::Config;
use reconcile::{GridRow, RowGroup};
use rest_timer::RestTimer;
use models::WorkoutSession;
use session_view::{SessionView, ViewState};
use worker::{Command, Event, Worker};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let config = Config::load();
    let client = ApiClient::new(&config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 700.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Workout Session",
        options,
        Box::new(move |cc| Ok(Box::new(SessionApp::new(cc, &config, client)))),
    )?;
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq)]
struct SetInput {
    reps: String,
    weight: String,
}

enum Notice {
    Info(String),
    Error(String),
}

struct SessionApp {
    worker: Worker,
    view: SessionView,
    session_id: Option<u64>,
    session_input: String,
    inputs: Vec<SetInput>,
    inputs_key: Option<(usize, usize)>,
    notice: Option<Notice>,
    rest: RestTimer,
    starting: bool,
    sessions: Vec<WorkoutSession>,
    listing: bool,
}

impl SessionApp {
    fn new(cc: &CreationContext, config: &Config, client: ApiClient) -> Self {
        let ctx = cc.egui_ctx.clone();
        let worker = Worker::spawn(client, move || ctx.request_repaint());

        let mut style = (*cc.egui_ctx.style()).clone();
        style.text_styles.insert(
            egui::TextStyle::Body,
            egui::FontId::new(18.0, egui::FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Heading,
            egui::FontId::new(28.0, egui::FontFamily::Proportional),
        );
        cc.egui_ctx.set_style(style);

        Self::with_worker(worker, config)
    }

    fn with_worker(worker: Worker, config: &Config) -> Self {
        let mut app = SessionApp {
            worker,
            view: SessionView::new(config.duplicate_policy()),
            session_id: config.session,
            session_input: String::new(),
            inputs: Vec::new(),
            inputs_key: None,
            notice: None,
            rest: RestTimer::default(),
            starting: config.start_workout.is_some(),
            sessions: Vec::new(),
            listing: false,
        };

        if let Some(workout_id) = config.start_workout {
            info!(workout_id, "starting a new session");
            app.worker.send(Command::Start { workout_id });
        } else if let Some(session_id) = app.session_id {
            app.worker.send(Command::Load { session_id });
        } else {
            app.list_sessions();
        }
        app
    }

    fn list_sessions(&mut self) {
        self.listing = true;
        self.worker.send(Command::ListSessions);
    }

    fn open(&mut self, session_id: u64) {
        self.session_id = Some(session_id);
        self.view = SessionView::new(self.view.policy());
        self.inputs_key = None;
        self.notice = None;
        self.worker.send(Command::Load { session_id });
    }

    fn handle_events(&mut self) {
        for event in self.worker.drain() {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: Event) {
        if !event.is_for(self.session_id) {
            debug!(session = ?event.session_id(), open = ?self.session_id, "dropping result for a closed session");
            return;
        }
        match event {
            Event::SessionsListed(Ok(sessions)) => {
                self.listing = false;
                self.sessions = sessions;
            }
            Event::SessionsListed(Err(e)) => {
                self.listing = false;
                self.fail(format!("Could not list sessions: {e}"));
            }
            Event::Started(Ok(started)) => {
                info!(session = started.session_id, "session started");
                self.starting = false;
                self.open(started.session_id);
            }
            Event::Started(Err(e)) => {
                self.starting = false;
                self.fail(format!("Could not start session: {e}"));
            }
            Event::Loaded { result: Ok((session, logs)), .. } => self.view.loaded(session, logs),
            Event::Loaded { result: Err(e), .. } => self.view.load_failed(&e),
            Event::SetLogged { result, .. } => match self.view.complete_log(result) {
                Ok(()) => self.notice = Some(Notice::Info("Set saved".to_string())),
                Err(e) => self.fail(format!("Set not saved: {e}")),
            },
            Event::Finished { result, .. } => match self.view.complete_finish(result) {
                Ok(()) => self.notice = None,
                Err(e) => self.fail(format!("Could not finish: {e}")),
            },
        }
    }

    fn fail(&mut self, message: String) {
        warn!("{message}");
        self.notice = Some(Notice::Error(message));
    }

    /// Inputs start empty for every card and again after each saved set.
    fn sync_inputs(&mut self) {
        let saved = self.view.logs().len();
        let key = self.view.current_group().map(|_| (self.view.cursor_index(), saved));
        if key != self.inputs_key {
            let rows = self.view.current_group().map(|g| g.rows.len()).unwrap_or(0);
            self.inputs = vec![SetInput::default(); rows];
            self.inputs_key = key;
        }
    }

    /// Arrow keys switch cards unless a text field has focus.
    fn navigate(&mut self, left: bool, right: bool, typing: bool) {
        if typing || !self.view.is_editable() {
            return;
        }
        if right {
            self.view.next();
        }
        if left {
            self.view.previous();
        }
    }

    fn submit(&mut self, exercise_id: u64, row: &GridRow, input: &SetInput) {
        let Some(session_id) = self.view.session().map(|s| s.session_id) else {
            return;
        };
        let parsed = parse_set_input(row, input);
        let result = parsed.and_then(|(reps, weight)| {
            self.view
                .begin_log(exercise_id, row.set_number, reps, weight)
                .map_err(|e| e.to_string())
        });
        match result {
            Ok(request) => self.worker.send(Command::LogSet { session_id, request }),
            Err(message) => self.fail(message),
        }
    }
}

impl App for SessionApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.handle_events();
        self.sync_inputs();
        let now = Local::now();
        self.rest.tick(now);

        let (left, right) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
            )
        });
        self.navigate(left, right, ctx.wants_keyboard_input());

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.with_layout(Layout::top_down(Align::Min), |ui| {
                ui.add_space(10.0);
                match self.view.state().clone() {
                    _ if self.session_id.is_none() && !self.starting => self.show_open_display(ui),
                    ViewState::Loading => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Loading session...");
                        });
                    }
                    ViewState::LoadFailed(message) => self.show_error_display(ui, &message),
                    ViewState::Completed => self.show_summary_display(ui),
                    _ => self.show_session_display(ui),
                }
            });
        });

        if self.rest.is_running() {
            ctx.request_repaint_after(std::time::Duration::from_millis(200));
        }
    }
}

impl SessionApp {
    fn show_open_display(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Open a workout session").heading().strong());
        ui.horizontal(|ui| {
            ui.label("Session id:");
            ui.text_edit_singleline(&mut self.session_input);
            if ui.button("Open").clicked() {
                match self.session_input.trim().parse::<u64>() {
                    Ok(id) => self.open(id),
                    Err(_) => self.fail("Session id must be a number".to_string()),
                }
            }
            if ui.add_enabled(!self.listing, egui::Button::new("Refresh")).clicked() {
                self.list_sessions();
            }
        });
        self.show_notice(ui);
        ui.add_space(10.0);

        if self.listing {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading sessions...");
            });
            return;
        }
        if self.sessions.is_empty() {
            ui.label("No workout sessions yet.");
            return;
        }

        let mut chosen = None;
        ScrollArea::vertical().show(ui, |ui| {
            for session in &self.sessions {
                if session_card(ui, session).clicked() {
                    chosen = Some(session.session_id);
                }
                ui.add_space(6.0);
            }
        });
        if let Some(id) = chosen {
            self.open(id);
        }
    }

    fn show_error_display(&mut self, ui: &mut Ui, message: &str) {
        ui.label(RichText::new("Something went wrong").heading().strong());
        ui.label(RichText::new(message).color(Color32::RED));
        ui.add_space(10.0);
        if let Some(id) = self.session_id {
            if ui.button("Retry").clicked() {
                self.open(id);
            }
        }
    }

    fn show_header(&self, ui: &mut Ui) {
        ui.label(
            RichText::new(self.view.workout_name().unwrap_or("Workout"))
                .heading()
                .size(36.0)
                .strong(),
        );
        if let Some(session) = self.view.session() {
            ui.label(format!("Started at: {}", dates::format_date_time(&session.started_at)));
            ui.label(format!("Sets logged: {}", self.view.logs().len()));
            if let Some(completed) = session.completed_at {
                ui.label(format!("Completed at: {}", dates::format_date_time(&completed)));
                ui.label(format!(
                    "Duration: {}",
                    dates::format_elapsed(&session.started_at, &completed)
                ));
            } else {
                ui.label(format!(
                    "Elapsed: {}",
                    dates::format_elapsed(&session.started_at, &Utc::now())
                ));
            }
        }
    }

    fn show_session_display(&mut self, ui: &mut Ui) {
        self.show_header(ui);
        ui.add_space(10.0);

        let finishing = matches!(self.view.state(), ViewState::FinishingInFlight);
        ui.horizontal(|ui| {
            let label = if finishing { "Finishing..." } else { "Finish" };
            if ui.add_enabled(!finishing, egui::Button::new(label)).clicked() {
                match self.view.begin_finish() {
                    Ok(session_id) => self.worker.send(Command::Finish { session_id }),
                    Err(e) => self.fail(e.to_string()),
                }
            }
            if let ViewState::LoggingInFlight { pending } = self.view.state() {
                ui.spinner();
                ui.label(format!("saving {} set(s)", pending));
            }
        });
        self.show_notice(ui);
        ui.add_space(10.0);

        let Some(group) = self.view.current_group().cloned() else {
            ui.label("This workout has no exercises.");
            return;
        };

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(&group.exercise_name).size(26.0).strong());
                ui.label(format!(
                    "{}/{}",
                    self.view.cursor_index() + 1,
                    self.view.row_groups().len()
                ));
            });
            ui.horizontal(|ui| {
                if ui.button("Previous").clicked() {
                    self.view.previous();
                }
                if ui.button("Next").clicked() {
                    self.view.next();
                }
            });
            ui.add_space(5.0);
            self.show_grid(ui, &group);
        });

        ui.add_space(10.0);
        self.show_rest_timer(ui);
    }

    fn show_grid(&mut self, ui: &mut Ui, group: &RowGroup) {
        let editable = self.view.is_editable();
        let mut clicked: Option<usize> = None;
        let inputs = &mut self.inputs;

        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto())
            .column(Column::initial(80.0))
            .column(Column::initial(90.0))
            .column(Column::initial(90.0))
            .column(Column::remainder())
            .header(24.0, |mut header| {
                for title in ["Set", "Prev", "Reps", "kg", "Log"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for (i, row) in group.rows.iter().enumerate() {
                    let Some(input) = inputs.get_mut(i) else {
                        continue;
                    };
                    body.row(30.0, |mut table_row| {
                        table_row.col(|ui| {
                            ui.label(row.set_number.to_string());
                        });
                        table_row.col(|ui| {
                            let prev = row
                                .previous
                                .as_ref()
                                .map(|p| format!("{}x{}", p.reps, p.weight))
                                .unwrap_or_else(|| "-".to_string());
                            ui.label(prev);
                        });
                        table_row.col(|ui| {
                            ui.add(
                                egui::TextEdit::singleline(&mut input.reps)
                                    .hint_text(row.reps_placeholder())
                                    .desired_width(70.0),
                            );
                        });
                        table_row.col(|ui| {
                            ui.add(
                                egui::TextEdit::singleline(&mut input.weight)
                                    .hint_text(row.weight_placeholder())
                                    .desired_width(70.0),
                            );
                        });
                        table_row.col(|ui| {
                            let text = if row.is_logged() {
                                RichText::new("Log").color(Color32::GREEN)
                            } else {
                                RichText::new("Log")
                            };
                            if ui.add_enabled(editable, egui::Button::new(text)).clicked() {
                                clicked = Some(i);
                            }
                        });
                    });
                }
            });

        if let Some(i) = clicked {
            if let (Some(row), Some(input)) = (group.rows.get(i), self.inputs.get(i).cloned()) {
                self.submit(group.exercise_id, row, &input);
            }
        }
    }

    fn show_rest_timer(&mut self, ui: &mut Ui) {
        let now = Local::now();
        ui.horizontal(|ui| {
            ui.label("Rest");
            let left = self.rest.remaining(now).num_seconds();
            ui.add(
                egui::ProgressBar::new(self.rest.fraction_left(now))
                    .desired_width(200.0)
                    .text(format!("{}s", left)),
            );
            let label = if self.rest.is_running() { "Pause" } else { "Start" };
            if ui.button(label).clicked() {
                self.rest.toggle(now);
            }
            if ui.button("Reset").clicked() {
                self.rest.reset();
            }
        });
    }

    fn show_summary_display(&mut self, ui: &mut Ui) {
        self.show_header(ui);
        ui.add_space(20.0);

        ScrollArea::vertical().show(ui, |ui| {
            for (i, group) in self.view.summary().iter().enumerate() {
                ui.push_id(i, |ui| {
                    ui.group(|ui| {
                        ui.label(RichText::new(&group.exercise_name).size(24.0).strong());
                        if group.sets.is_empty() {
                            ui.label("No sets logged");
                            return;
                        }
                        egui::Grid::new("summary").striped(true).show(ui, |ui| {
                            ui.strong("Set");
                            ui.strong("Reps");
                            ui.strong("kg");
                            ui.end_row();
                            for set in &group.sets {
                                ui.label(set.set_number.to_string());
                                ui.label(set.reps_completed.to_string());
                                ui.label(set.weight_used.to_string());
                                ui.end_row();
                            }
                        });
                        ui.label(format!("Volume: {:.1} kg", group.volume()));
                    });
                });
                ui.add_space(10.0);
            }
        });
    }

    fn show_notice(&self, ui: &mut Ui) {
        match &self.notice {
            Some(Notice::Info(text)) => {
                ui.label(RichText::new(text).color(Color32::LIGHT_GREEN));
            }
            Some(Notice::Error(text)) => {
                ui.label(RichText::new(text).color(Color32::RED));
            }
            None => {}
        }
    }
}

fn session_card(ui: &mut Ui, session: &WorkoutSession) -> egui::Response {
    let name = snapshot::workout_name(Some(session)).unwrap_or("Workout");
    let completed = session
        .completed_at
        .map(|at| dates::format_date_time(&at))
        .unwrap_or_else(|| "in progress".to_string());
    let response = ui
        .group(|ui| {
            ui.set_min_width(ui.available_width());
            ui.label(RichText::new(name).size(22.0).strong());
            ui.label(snapshot::exercise_names(session));
            ui.label(format!("Started: {}", dates::format_date_time(&session.started_at)));
            ui.label(format!("Completed: {}", completed));
        })
        .response;
    response.interact(egui::Sense::click())
}

/// Empty reps fall back to what the placeholder shows; empty weight means
/// the previously logged weight, or bodyweight (0).
fn parse_set_input(row: &GridRow, input: &SetInput) -> Result<(u32, f64), String> {
    let reps = match input.reps.trim() {
        "" => row.current_reps.unwrap_or(row.target_reps),
        text => text
            .parse::<u32>()
            .map_err(|_| format!("'{}' is not a whole number of reps", text))?,
    };
    let weight = match input.weight.trim() {
        "" => row.current_weight.unwrap_or(0.0),
        text => text
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a weight", text))?,
    };
    Ok((reps, weight))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::api::SessionBackend;
    use crate::models::PlannedExercise;

    fn backend() -> FakeBackend {
        FakeBackend::new(vec![
            PlannedExercise::new(1, "Bench Press", 3, 10),
            PlannedExercise::new(2, "Squat", 2, 5),
        ])
    }

    fn app() -> SessionApp {
        let config = Config::try_parse_from(["gainz"]).unwrap();
        SessionApp::with_worker(Worker::spawn(backend(), || {}), &config)
    }

    /// An app showing session 5 as `backend` holds it.
    fn opened(backend: &FakeBackend) -> SessionApp {
        let mut app = app();
        app.open(5);
        app.apply(Event::Loaded {
            session_id: 5,
            result: Ok((backend.session(5).unwrap(), backend.session_logs(5).unwrap())),
        });
        app.sync_inputs();
        app
    }

    #[test]
    fn listed_sessions_fill_the_open_screen() {
        let backend = backend();
        let mut app = app();
        assert!(app.listing);

        app.apply(Event::SessionsListed(Ok(backend.sessions().unwrap())));
        assert!(!app.listing);
        assert_eq!(app.sessions.len(), 1);
        assert_eq!(snapshot::exercise_names(&app.sessions[0]), "Bench Press, Squat");
    }

    #[test]
    fn results_for_a_closed_session_are_dropped() {
        let backend = backend();
        let mut app = opened(&backend);
        let request = app.view.begin_log(1, 1, 10, 50.0).unwrap();
        let stored = backend.log_set(5, &request);

        app.open(6);
        app.apply(Event::SetLogged {
            session_id: 5,
            result: stored,
        });
        app.apply(Event::Loaded {
            session_id: 5,
            result: Ok((backend.session(5).unwrap(), Vec::new())),
        });

        assert!(app.notice.is_none());
        assert_eq!(app.view.state(), &ViewState::Loading);
        assert!(app.view.logs().is_empty());
    }

    #[test]
    fn arrow_keys_are_ignored_while_typing() {
        let backend = backend();
        let mut app = opened(&backend);
        app.inputs[0].reps = "12".to_string();

        app.navigate(false, true, true);
        app.sync_inputs();
        assert_eq!(app.view.cursor_index(), 0);
        assert_eq!(app.inputs[0].reps, "12");

        app.navigate(false, true, false);
        assert_eq!(app.view.cursor_index(), 1);
        app.navigate(true, false, false);
        assert_eq!(app.view.cursor_index(), 0);
    }

    #[test]
    fn inputs_clear_after_every_save_including_duplicates() {
        let backend = backend();
        let mut app = opened(&backend);

        for _ in 0..2 {
            app.inputs[0].reps = "10".to_string();
            let request = app.view.begin_log(1, 1, 10, 50.0).unwrap();
            app.apply(Event::SetLogged {
                session_id: 5,
                result: backend.log_set(5, &request),
            });
            app.sync_inputs();
            assert_eq!(app.inputs[0], SetInput::default());
        }
        assert_eq!(app.view.logs().len(), 2);
        assert_eq!(app.view.current_group().unwrap().logged_sets(), 1);
    }

    fn row() -> GridRow {
        GridRow {
            set_number: 1,
            target_reps: 10,
            previous: None,
            current_reps: None,
            current_weight: None,
        }
    }

    fn input(reps: &str, weight: &str) -> SetInput {
        SetInput {
            reps: reps.to_string(),
            weight: weight.to_string(),
        }
    }

    #[test]
    fn empty_inputs_use_placeholders() {
        assert_eq!(parse_set_input(&row(), &input("", "")), Ok((10, 0.0)));

        let mut logged = row();
        logged.current_reps = Some(8);
        logged.current_weight = Some(60.0);
        assert_eq!(parse_set_input(&logged, &input(" ", "")), Ok((8, 60.0)));
    }

    #[test]
    fn parses_typed_values() {
        assert_eq!(parse_set_input(&row(), &input("12", "62,5")), Ok((12, 62.5)));
        assert!(parse_set_input(&row(), &input("ten", "60")).is_err());
        assert!(parse_set_input(&row(), &input("10", "heavy")).is_err());
    }
}
