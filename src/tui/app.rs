//! Main TUI application state machine.
//!
//! Handles:
//! - Route navigation (with the access gate on protected routes)
//! - Input event handling for forms and the passkey modal
//! - Service integration
//! - Background submissions via the submit worker

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};

use crate::adapters::session::MemorySessionStore;
use crate::adapters::sqlite::SqliteStorage;
use crate::application::{
    AccessGate, AppointmentService, Confirmation, FormSession, GateDecision, RegistrationService,
    SubmitAttempt,
};
use crate::config::AppConfig;
use crate::domain::appointment::schedule_draft;
use crate::domain::patient::registration_draft;
use crate::domain::{Appointment, PassKey, Patient, Route, User};
use crate::CarepulseError;

use super::ui::{
    admin::{render_admin, AdminAction, AdminActionKind, AdminState},
    form::render_form,
    passkey::{render_passkey_modal, PasskeyState},
    render_header, render_status_bar,
    success::render_success,
};
use super::worker::{SubmitHandle, SubmitOutcome, SubmitWorker};

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

const EXPORT_FILE: &str = "carepulse-appointments.json";

/// A submission waiting on the worker, tagged by what it will produce.
enum Pending {
    SignUp(SubmitHandle<User>),
    Register(SubmitHandle<Patient>),
    Appointment(SubmitHandle<Appointment>),
    AdminUpdate(SubmitHandle<Appointment>),
}

/// Outcome of loading the data a route needs.
enum Loaded {
    Ready,
    Redirect(Route),
    Missing(&'static str),
}

/// Editing command produced by a form key.
enum FormCommand {
    Submit,
    Back,
}

/// Main application state
pub struct App {
    route: Route,
    should_quit: bool,

    gate: AccessGate<MemorySessionStore>,
    registration: Arc<RegistrationService<SqliteStorage>>,
    appointments: Arc<AppointmentService<SqliteStorage>>,

    sign_up_form: FormSession,
    /// Register screen: the user being registered and their form
    patient_form: Option<(User, FormSession)>,
    /// New-appointment screen: the patient and the request form
    appointment_form: Option<(Patient, FormSession)>,
    confirmation: Option<Confirmation>,
    admin_state: AdminState,
    passkey_state: PasskeyState,

    pending: Option<Pending>,
    notice: Option<String>,
}

impl App {
    /// Create a new application instance from configuration.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let storage = Arc::new(SqliteStorage::new(&config.db_path)?);
        let session = Arc::new(MemorySessionStore::new());
        Ok(Self::with_dependencies(
            storage,
            session,
            config.admin_passkey.clone(),
        ))
    }

    /// Create application with injected dependencies (Composition Root pattern).
    #[must_use]
    pub fn with_dependencies(
        storage: Arc<SqliteStorage>,
        session: Arc<MemorySessionStore>,
        admin_passkey: Option<PassKey>,
    ) -> Self {
        let registration = Arc::new(RegistrationService::new(Arc::clone(&storage)));
        let appointments = Arc::new(AppointmentService::new(storage));
        let sign_up_form = FormSession::new(registration.sign_up_schema().clone());

        Self {
            route: Route::Home,
            should_quit: false,
            gate: AccessGate::new(session, admin_passkey),
            registration,
            appointments,
            sign_up_form,
            patient_form: None,
            appointment_form: None,
            confirmation: None,
            admin_state: AdminState::default(),
            passkey_state: PasskeyState::default(),
            pending: None,
            notice: None,
        }
    }

    /// Start at `route` instead of the landing page, as if following a link.
    ///
    /// Protected routes still go through the access gate.
    pub fn open(&mut self, route: Route) {
        self.navigate(route);
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.poll_worker();

            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Go to `route`, asking the gate first when the route is protected.
    fn navigate(&mut self, route: Route) {
        if route.is_protected() {
            self.passkey_state.reset();
            match self.gate.evaluate() {
                GateDecision::Granted(target) => self.enter(target),
                GateDecision::Prompt => tracing::debug!("Passkey required for {}", route),
            }
            return;
        }
        self.enter(route);
    }

    fn enter(&mut self, route: Route) {
        // Leaving a screen abandons any in-flight submission.
        self.pending = None;
        self.notice = None;

        let loaded = match &route {
            Route::Home => {
                if self.sign_up_form.is_busy() {
                    self.sign_up_form = FormSession::new(self.registration.sign_up_schema().clone());
                }
                Ok(Loaded::Ready)
            }
            Route::Admin => {
                // Any action form lost its submission along with `pending`.
                self.admin_state.action = None;
                self.admin_state.notice = None;
                self.refresh_admin().map(|()| Loaded::Ready)
            }
            Route::Register { user_id } => self.load_registration(user_id),
            Route::NewAppointment { user_id } => self.load_appointment_form(user_id),
            Route::AppointmentSuccess { appointment_id, .. } => {
                self.confirmation = None;
                self.appointments.confirmation(appointment_id).map(|c| {
                    self.confirmation = c;
                    Loaded::Ready
                })
            }
        };

        match loaded {
            Ok(Loaded::Ready) => {
                tracing::info!("Navigated to {}", route);
                self.route = route;
            }
            Ok(Loaded::Redirect(target)) => self.enter(target),
            Ok(Loaded::Missing(what)) => {
                tracing::warn!("{} not found for {}", what, route);
                self.route = Route::Home;
                self.notice = Some(format!("{what} not found"));
            }
            Err(e) => {
                tracing::error!("Failed to load {}: {}", route, e);
                self.route = Route::Home;
                self.notice = Some(GENERIC_FAILURE.to_string());
            }
        }
    }

    fn load_registration(&mut self, user_id: &str) -> Result<Loaded, CarepulseError> {
        let Some(user) = self.registration.get_user(user_id)? else {
            return Ok(Loaded::Missing("User"));
        };
        let schema = self.registration.registration_schema().clone();
        let today = chrono::Local::now().date_naive();
        let draft = registration_draft(&schema, &user, today);
        self.patient_form = Some((user, FormSession::with_draft(schema, draft)));
        Ok(Loaded::Ready)
    }

    fn load_appointment_form(&mut self, user_id: &str) -> Result<Loaded, CarepulseError> {
        let Some(patient) = self.registration.get_patient(user_id)? else {
            return Ok(Loaded::Redirect(Route::Register {
                user_id: user_id.to_string(),
            }));
        };
        let form = FormSession::new(self.appointments.request_schema().clone());
        self.appointment_form = Some((patient, form));
        Ok(Loaded::Ready)
    }

    fn refresh_admin(&mut self) -> Result<(), CarepulseError> {
        let summary = self.appointments.admin_summary()?;
        self.admin_state.load(summary);
        Ok(())
    }

    /// Collect a finished submission, if any.
    fn poll_worker(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        match pending {
            Pending::SignUp(handle) => match handle.try_recv() {
                None => self.pending = Some(Pending::SignUp(handle)),
                Some(SubmitOutcome::Done(user)) => {
                    self.sign_up_form.complete_submit();
                    self.navigate(Route::Register { user_id: user.id });
                }
                Some(SubmitOutcome::Failed(e)) => {
                    self.sign_up_form.fail_submit(failure_message(&e));
                }
            },
            Pending::Register(handle) => match handle.try_recv() {
                None => self.pending = Some(Pending::Register(handle)),
                Some(SubmitOutcome::Done(patient)) => {
                    if let Some((_, form)) = self.patient_form.as_mut() {
                        form.complete_submit();
                    }
                    self.patient_form = None;
                    self.navigate(Route::NewAppointment {
                        user_id: patient.profile.user_id,
                    });
                }
                Some(SubmitOutcome::Failed(e)) => {
                    if let Some((_, form)) = self.patient_form.as_mut() {
                        form.fail_submit(failure_message(&e));
                    }
                }
            },
            Pending::Appointment(handle) => match handle.try_recv() {
                None => self.pending = Some(Pending::Appointment(handle)),
                Some(SubmitOutcome::Done(appointment)) => {
                    self.appointment_form = None;
                    self.navigate(Route::AppointmentSuccess {
                        user_id: appointment.user_id,
                        appointment_id: appointment.id,
                    });
                }
                Some(SubmitOutcome::Failed(e)) => {
                    if let Some((_, form)) = self.appointment_form.as_mut() {
                        form.fail_submit(failure_message(&e));
                    }
                }
            },
            Pending::AdminUpdate(handle) => match handle.try_recv() {
                None => self.pending = Some(Pending::AdminUpdate(handle)),
                Some(SubmitOutcome::Done(appointment)) => {
                    self.admin_state.action = None;
                    self.admin_state.notice = Some(format!("Appointment {}", appointment.status));
                    if let Err(e) = self.refresh_admin() {
                        tracing::error!("Failed to refresh dashboard: {}", e);
                        self.notice = Some(GENERIC_FAILURE.to_string());
                    }
                }
                Some(SubmitOutcome::Failed(e)) => {
                    if let Some(action) = self.admin_state.action.as_mut() {
                        action.form.fail_submit(failure_message(&e));
                    }
                }
            },
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.gate.is_prompt_open() {
            self.handle_passkey_key(key);
            return;
        }

        if key == KeyCode::Char('a') && modifiers.contains(KeyModifiers::CONTROL) {
            self.navigate(Route::Admin);
            return;
        }

        match self.route {
            Route::Home => self.handle_sign_up_key(key),
            Route::Register { .. } => self.handle_register_key(key),
            Route::NewAppointment { .. } => self.handle_appointment_key(key),
            Route::AppointmentSuccess { .. } => self.handle_success_key(key),
            Route::Admin => self.handle_admin_key(key),
        }
    }

    fn handle_passkey_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.passkey_state.reset();
                let route = self.gate.revoke();
                self.navigate(route);
            }
            KeyCode::Enter => {
                let candidate = self.passkey_state.input.clone();
                match self.gate.authorize(&candidate) {
                    Ok(route) => {
                        self.passkey_state.reset();
                        self.enter(route);
                    }
                    Err(e) => self.passkey_state.error = Some(e.to_string()),
                }
            }
            KeyCode::Backspace => self.passkey_state.delete_char(),
            KeyCode::Char(c) => self.passkey_state.input_char(c),
            _ => {}
        }
    }

    fn handle_sign_up_key(&mut self, key: KeyCode) {
        match apply_form_key(&mut self.sign_up_form, key) {
            Some(FormCommand::Submit) => {
                if let SubmitAttempt::Ready(draft) = self.sign_up_form.begin_submit() {
                    let service = Arc::clone(&self.registration);
                    self.pending = Some(Pending::SignUp(SubmitWorker::spawn(move || {
                        service.sign_up(&draft)
                    })));
                }
            }
            Some(FormCommand::Back) | None => {}
        }
    }

    fn handle_register_key(&mut self, key: KeyCode) {
        let Some((user, form)) = self.patient_form.as_mut() else {
            return;
        };
        match apply_form_key(form, key) {
            Some(FormCommand::Submit) => {
                if let SubmitAttempt::Ready(draft) = form.begin_submit() {
                    let service = Arc::clone(&self.registration);
                    let user = user.clone();
                    self.pending = Some(Pending::Register(SubmitWorker::spawn(move || {
                        service.register_patient(&user, &draft)
                    })));
                }
            }
            Some(FormCommand::Back) => self.navigate(Route::Home),
            None => {}
        }
    }

    fn handle_appointment_key(&mut self, key: KeyCode) {
        let Some((patient, form)) = self.appointment_form.as_mut() else {
            return;
        };
        match apply_form_key(form, key) {
            Some(FormCommand::Submit) => {
                if let SubmitAttempt::Ready(draft) = form.begin_submit() {
                    let service = Arc::clone(&self.appointments);
                    let patient = patient.clone();
                    self.pending = Some(Pending::Appointment(SubmitWorker::spawn(move || {
                        service.request(&patient, &draft)
                    })));
                }
            }
            Some(FormCommand::Back) => self.navigate(Route::Home),
            None => {}
        }
    }

    fn handle_success_key(&mut self, key: KeyCode) {
        let Route::AppointmentSuccess { user_id, .. } = &self.route else {
            return;
        };
        match key {
            KeyCode::Char('n') | KeyCode::Char('N') => {
                let user_id = user_id.clone();
                self.navigate(Route::NewAppointment { user_id });
            }
            KeyCode::Esc => self.navigate(Route::Home),
            _ => {}
        }
    }

    fn handle_admin_key(&mut self, key: KeyCode) {
        if let Some(action) = self.admin_state.action.as_mut() {
            match apply_form_key(&mut action.form, key) {
                Some(FormCommand::Submit) => {
                    if let SubmitAttempt::Ready(draft) = action.form.begin_submit() {
                        let service = Arc::clone(&self.appointments);
                        let id = action.appointment_id.clone();
                        let kind = action.kind;
                        self.pending = Some(Pending::AdminUpdate(SubmitWorker::spawn(
                            move || match kind {
                                AdminActionKind::Schedule => service.schedule(&id, &draft),
                                AdminActionKind::Cancel => service.cancel(&id, &draft),
                            },
                        )));
                    }
                }
                Some(FormCommand::Back) => {
                    self.admin_state.action = None;
                    self.pending = None;
                }
                None => {}
            }
            return;
        }

        match key {
            KeyCode::Up | KeyCode::Char('k') => self.admin_state.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.admin_state.select_next(),
            KeyCode::Char('s') | KeyCode::Char('S') => self.open_admin_action(AdminActionKind::Schedule),
            KeyCode::Char('c') | KeyCode::Char('C') => self.open_admin_action(AdminActionKind::Cancel),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if let Err(e) = self.refresh_admin() {
                    tracing::error!("Failed to refresh dashboard: {}", e);
                    self.notice = Some(GENERIC_FAILURE.to_string());
                }
            }
            KeyCode::Char('e') | KeyCode::Char('E') => self.export_appointments(),
            KeyCode::Char('l') | KeyCode::Char('L') => {
                let route = self.gate.lock();
                self.navigate(route);
            }
            KeyCode::Esc => self.navigate(Route::Home),
            _ => {}
        }
    }

    fn open_admin_action(&mut self, kind: AdminActionKind) {
        let Some(appointment) = self
            .admin_state
            .summary
            .appointments
            .get(self.admin_state.selected)
        else {
            return;
        };

        let form = match kind {
            AdminActionKind::Schedule => FormSession::with_draft(
                self.appointments.schedule_schema().clone(),
                schedule_draft(appointment),
            ),
            AdminActionKind::Cancel => FormSession::new(self.appointments.cancel_schema().clone()),
        };
        self.admin_state.notice = None;
        self.admin_state.action = Some(AdminAction {
            kind,
            appointment_id: appointment.id.clone(),
            form,
        });
    }

    fn export_appointments(&mut self) {
        let result = self
            .appointments
            .export_json()
            .and_then(|json| std::fs::write(EXPORT_FILE, json).map_err(CarepulseError::from));
        match result {
            Ok(()) => {
                tracing::info!("Exported appointments to {}", EXPORT_FILE);
                self.admin_state.notice = Some(format!("Exported to {EXPORT_FILE}"));
            }
            Err(e) => {
                tracing::error!("Export failed: {}", e);
                self.notice = Some(GENERIC_FAILURE.to_string());
            }
        }
    }

    fn render(&self, f: &mut Frame) {
        let area = f.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(area);

        let form_hints: &[(&str, &str)] = &[
            ("↑↓", "Field"),
            ("←→", "Choose"),
            ("Enter", "Submit"),
            ("Esc", "Back"),
            ("Ctrl+A", "Admin"),
            ("Ctrl+Q", "Quit"),
        ];

        let (hints, form_error): (&[(&str, &str)], Option<&str>) = match &self.route {
            Route::Home => {
                render_header(f, chunks[0], "Hi there", "Get started with appointments.");
                render_form(f, chunks[1], "Sign up", &self.sign_up_form);
                (form_hints, self.sign_up_form.submit_error())
            }
            Route::Register { .. } => {
                let (title, error) = match &self.patient_form {
                    Some((user, form)) => {
                        render_form(f, chunks[1], "Patient registration", form);
                        (format!("Welcome, {}", user.name), form.submit_error())
                    }
                    None => (String::from("Welcome"), None),
                };
                render_header(f, chunks[0], &title, "Let us know more about yourself.");
                (form_hints, error)
            }
            Route::NewAppointment { .. } => {
                render_header(
                    f,
                    chunks[0],
                    "New Appointment",
                    "Request a new appointment in 10 seconds.",
                );
                let error = self.appointment_form.as_ref().and_then(|(_, form)| {
                    render_form(f, chunks[1], "Appointment", form);
                    form.submit_error()
                });
                (form_hints, error)
            }
            Route::AppointmentSuccess { .. } => {
                render_header(f, chunks[0], "Success", "");
                render_success(f, chunks[1], self.confirmation.as_ref());
                (
                    &[("N", "New appointment"), ("Esc", "Home"), ("Ctrl+Q", "Quit")][..],
                    None,
                )
            }
            Route::Admin => {
                render_header(
                    f,
                    chunks[0],
                    "Welcome 👋",
                    "Start the day with managing new appointments",
                );
                render_admin(f, chunks[1], &self.admin_state);
                let error = self
                    .admin_state
                    .action
                    .as_ref()
                    .and_then(|a| a.form.submit_error());
                let hints: &[(&str, &str)] = if self.admin_state.action.is_some() {
                    form_hints
                } else {
                    &[
                        ("↑↓", "Select"),
                        ("S", "Schedule"),
                        ("C", "Cancel"),
                        ("R", "Refresh"),
                        ("E", "Export"),
                        ("L", "Lock"),
                        ("Esc", "Home"),
                    ]
                };
                (hints, error)
            }
        };

        let message = self.notice.as_deref().or(form_error);
        render_status_bar(f, chunks[2], hints, message);

        if self.gate.is_prompt_open() {
            render_passkey_modal(f, area, &self.passkey_state);
        }
    }
}

/// Apply an editing key to a form; Enter and Esc are returned to the screen.
fn apply_form_key(form: &mut FormSession, key: KeyCode) -> Option<FormCommand> {
    match key {
        KeyCode::Enter => return Some(FormCommand::Submit),
        KeyCode::Esc => return Some(FormCommand::Back),
        KeyCode::Up | KeyCode::BackTab => form.prev_field(),
        KeyCode::Down | KeyCode::Tab => form.next_field(),
        KeyCode::Left => form.cycle_option(false),
        KeyCode::Right => form.cycle_option(true),
        KeyCode::Backspace => form.delete_char(),
        KeyCode::Delete => form.clear_field(),
        KeyCode::Char(c) => form.input_char(c),
        _ => {}
    }
    None
}

fn failure_message(error: &CarepulseError) -> String {
    match error {
        CarepulseError::Validation(report) => report.to_string(),
        _ => GENERIC_FAILURE.to_string(),
    }
}
