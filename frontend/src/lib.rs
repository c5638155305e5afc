use sauron::{
    html::{attributes::*, *},
    prelude::*,
};
use shared::{Priority, SortKey, SortOrder, StatusFilter, TaskQuery, TaskView};
use uuid::Uuid;
use wasm_bindgen_futures::{js_sys, JsFuture};
use web_sys::{console, window};

pub mod api;
pub mod board;
pub mod form;
pub mod session;

use api::{ApiClient, ApiFailure};
use board::{MutationId, TaskBoard};
use form::{FormErrors, TaskForm};
use session::{AuthAction, Session};

const MESSAGE_TIMEOUT_MS: i32 = 3_000;

#[derive(Debug, Clone)]
pub enum Msg {
    // Authentication
    SetAuthEmail(String),
    SetAuthPassword(String),
    SetAuthConfirm(String),
    SwitchAuthMode,
    SubmitAuth,
    AuthSucceeded(Session),
    AuthFailed(String),
    Logout,
    RefreshDue,
    SessionRefreshed(Session),
    RefreshFailed(String),

    // Task list
    LoadTasks,
    TasksLoaded(Vec<TaskView>),
    LoadFailed(ApiFailure),
    SetStatus(StatusFilter),
    SetSortBy(String),
    ToggleOrder,

    // Add / edit modal
    OpenAdd,
    OpenEdit(Uuid),
    CloseModal,
    SetTitle(String),
    SetDescription(String),
    SetPriority(String),
    SetDueDate(String),
    ToggleFormCompleted,
    SubmitForm,
    TaskCreated(TaskView),
    CreateFailed(ApiFailure),

    // Optimistic mutations
    ToggleTask(Uuid),
    DeleteTask(Uuid),
    MutationConfirmed(MutationId, Option<TaskView>, Option<&'static str>),
    MutationFailed(MutationId, ApiFailure),

    DismissError,
    ClearError(u64),
    ClearNotice(u64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modal {
    Add,
    Edit(Uuid),
}

#[derive(Debug, Clone, Default)]
struct AuthForm {
    mode: Option<AuthAction>,
    email: String,
    password: String,
    confirm: String,
    error: Option<String>,
    submitting: bool,
}

impl AuthForm {
    fn action(&self) -> AuthAction {
        self.mode.unwrap_or(AuthAction::SignIn)
    }

    fn check(&self) -> Option<&'static str> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Some("Please fill in all fields");
        }
        if self.action() == AuthAction::SignUp {
            if self.password.chars().count() < 6 {
                return Some("Password should be at least 6 characters.");
            }
            if self.password != self.confirm {
                return Some("Passwords do not match");
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Stats {
    total: usize,
    completed: usize,
    overdue: usize,
}

impl Stats {
    fn of(tasks: &[TaskView]) -> Self {
        Self {
            total: tasks.len(),
            completed: tasks.iter().filter(|t| t.task.completed).count(),
            overdue: tasks.iter().filter(|t| t.is_overdue).count(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    session: Option<Session>,
    auth: AuthForm,
    board: TaskBoard,
    status: StatusFilter,
    sort_by: SortKey,
    order: SortOrder,
    modal: Option<Modal>,
    form: TaskForm,
    form_errors: FormErrors,
    submitting: bool,
    loading: bool,
    error: Option<String>,
    error_seq: u64,
    notice: Option<&'static str>,
    notice_seq: u64,
    refreshing: bool,
    reload_after_refresh: bool,
    /// Set once a rejected token has been refreshed; a second rejection
    /// before the list loads again signs the user out.
    reauthenticated: bool,
}

impl Application for Model {
    type MSG = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        match session::restore() {
            Some(session) => {
                console::log_1(&format!("restored session for {}", session.email).into());
                let stale = session.needs_refresh_at(chrono::Utc::now());
                self.session = Some(session);
                if stale {
                    self.reload_after_refresh = true;
                    return self.begin_refresh();
                }
                Cmd::batch(vec![Cmd::new(async { Msg::LoadTasks }), self.schedule_refresh()])
            }
            None => Cmd::none(),
        }
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::SetAuthEmail(email) => {
                self.auth.email = email;
                Cmd::none()
            }
            Msg::SetAuthPassword(password) => {
                self.auth.password = password;
                Cmd::none()
            }
            Msg::SetAuthConfirm(confirm) => {
                self.auth.confirm = confirm;
                Cmd::none()
            }
            Msg::SwitchAuthMode => {
                self.auth = AuthForm {
                    mode: Some(self.auth.action().other()),
                    email: std::mem::take(&mut self.auth.email),
                    ..AuthForm::default()
                };
                Cmd::none()
            }
            Msg::SubmitAuth => {
                if self.auth.submitting {
                    return Cmd::none();
                }
                if let Some(problem) = self.auth.check() {
                    self.auth.error = Some(problem.to_string());
                    return Cmd::none();
                }
                self.auth.error = None;
                self.auth.submitting = true;
                let action = self.auth.action();
                let email = self.auth.email.trim().to_string();
                let password = self.auth.password.clone();
                Cmd::new(async move {
                    match session::authenticate(action, email, password).await {
                        Ok(session) => Msg::AuthSucceeded(session),
                        Err(message) => Msg::AuthFailed(message),
                    }
                })
            }
            Msg::AuthSucceeded(session) => {
                console::log_1(&format!("signed in as {}", session.email).into());
                session::save(&session);
                self.session = Some(session);
                self.auth = AuthForm::default();
                Cmd::batch(vec![Cmd::new(async { Msg::LoadTasks }), self.schedule_refresh()])
            }
            Msg::AuthFailed(message) => {
                self.auth.submitting = false;
                self.auth.error = Some(message);
                Cmd::none()
            }
            Msg::Logout => {
                if confirm("Are you sure you want to log out?") {
                    self.sign_out(None);
                }
                Cmd::none()
            }
            Msg::RefreshDue => {
                // Timers from an earlier session find nothing to do.
                let now = chrono::Utc::now();
                if self.session.as_ref().is_some_and(|s| s.needs_refresh_at(now)) {
                    self.begin_refresh()
                } else {
                    Cmd::none()
                }
            }
            Msg::SessionRefreshed(session) => {
                self.refreshing = false;
                if self.session.is_none() {
                    return Cmd::none();
                }
                console::log_1(&format!("refreshed session for {}", session.email).into());
                session::save(&session);
                self.session = Some(session);
                let mut next = vec![self.schedule_refresh()];
                if std::mem::take(&mut self.reload_after_refresh) {
                    next.push(Cmd::new(async { Msg::LoadTasks }));
                }
                Cmd::batch(next)
            }
            Msg::RefreshFailed(message) => {
                self.refreshing = false;
                if self.session.is_some() {
                    self.sign_out(Some(message));
                }
                Cmd::none()
            }

            Msg::LoadTasks => {
                let Some(client) = self.client() else {
                    return Cmd::none();
                };
                self.loading = true;
                self.error = None;
                let query = TaskQuery::new(self.status, self.sort_by, self.order);
                Cmd::new(async move {
                    match client.list_tasks(&query).await {
                        Ok(tasks) => Msg::TasksLoaded(tasks),
                        Err(failure) => Msg::LoadFailed(failure),
                    }
                })
            }
            Msg::TasksLoaded(tasks) => {
                console::log_1(&format!("loaded {} tasks", tasks.len()).into());
                self.board.replace_all(tasks);
                self.loading = false;
                self.reauthenticated = false;
                Cmd::none()
            }
            Msg::LoadFailed(failure) => {
                self.loading = false;
                self.board.replace_all(Vec::new());
                self.report(failure, false)
            }
            Msg::SetStatus(status) => {
                self.status = status;
                Cmd::new(async { Msg::LoadTasks })
            }
            Msg::SetSortBy(raw) => {
                self.sort_by = SortKey::parse(&raw);
                Cmd::new(async { Msg::LoadTasks })
            }
            Msg::ToggleOrder => {
                self.order = match self.order {
                    SortOrder::Asc => SortOrder::Desc,
                    SortOrder::Desc => SortOrder::Asc,
                };
                Cmd::new(async { Msg::LoadTasks })
            }

            Msg::OpenAdd => {
                self.open_modal(Modal::Add, TaskForm::default());
                Cmd::none()
            }
            Msg::OpenEdit(id) => {
                if let Some(view) = self.board.get(id) {
                    let form = TaskForm::from_task(&view.task);
                    self.open_modal(Modal::Edit(id), form);
                }
                Cmd::none()
            }
            Msg::CloseModal => {
                self.modal = None;
                self.submitting = false;
                Cmd::none()
            }
            Msg::SetTitle(title) => {
                self.form.title = title;
                self.form_errors.title = None;
                Cmd::none()
            }
            Msg::SetDescription(description) => {
                self.form.description = description;
                self.form_errors.description = None;
                Cmd::none()
            }
            Msg::SetPriority(raw) => {
                if let Ok(priority) = raw.parse::<Priority>() {
                    self.form.priority = priority;
                }
                Cmd::none()
            }
            Msg::SetDueDate(raw) => {
                self.form.due_date = raw;
                Cmd::none()
            }
            Msg::ToggleFormCompleted => {
                self.form.completed = !self.form.completed;
                Cmd::none()
            }
            Msg::SubmitForm => match self.modal {
                Some(Modal::Add) => self.submit_new(),
                Some(Modal::Edit(id)) => self.submit_edit(id),
                None => Cmd::none(),
            },
            Msg::TaskCreated(view) => {
                self.board.push_created(view);
                self.submitting = false;
                self.modal = None;
                self.notify("Task added successfully!")
            }
            Msg::CreateFailed(failure) => {
                self.submitting = false;
                self.report(failure, true)
            }

            Msg::ToggleTask(id) => {
                let (Some(client), Some((mutation, completed))) =
                    (self.client(), self.board.begin_toggle(id, chrono::Utc::now()))
                else {
                    return Cmd::none();
                };
                Cmd::new(async move {
                    let changes = shared::TaskChanges::completion(completed);
                    match client.update_task(id, &changes).await {
                        Ok(view) => Msg::MutationConfirmed(mutation, Some(view), None),
                        Err(failure) => Msg::MutationFailed(mutation, failure),
                    }
                })
            }
            Msg::DeleteTask(id) => {
                if !confirm("Are you sure you want to delete this task?") {
                    return Cmd::none();
                }
                let (Some(client), Some(mutation)) = (self.client(), self.board.begin_delete(id))
                else {
                    return Cmd::none();
                };
                Cmd::new(async move {
                    match client.delete_task(id).await {
                        Ok(_) => Msg::MutationConfirmed(
                            mutation,
                            None,
                            Some("Task deleted successfully!"),
                        ),
                        Err(failure) => Msg::MutationFailed(mutation, failure),
                    }
                })
            }
            Msg::MutationConfirmed(mutation, server_copy, notice) => {
                let Some(state) = self.board.confirm(mutation, server_copy) else {
                    return Cmd::none();
                };
                console::log_1(&format!("{mutation:?} {state:?}").into());
                match notice {
                    Some(notice) => self.notify(notice),
                    None => Cmd::none(),
                }
            }
            Msg::MutationFailed(mutation, failure) => {
                let Some(state) = self.board.roll_back(mutation) else {
                    return Cmd::none();
                };
                console::warn_1(&format!("{mutation:?} {state:?}: {failure:?}").into());
                self.report(failure, true)
            }

            Msg::DismissError => {
                self.error = None;
                Cmd::none()
            }
            Msg::ClearError(seq) => {
                if seq == self.error_seq {
                    self.error = None;
                }
                Cmd::none()
            }
            Msg::ClearNotice(seq) => {
                if seq == self.notice_seq {
                    self.notice = None;
                }
                Cmd::none()
            }
        }
    }

    fn view(&self) -> Node<Msg> {
        match &self.session {
            None => self.view_login(),
            Some(session) => div(
                [class("min-h-screen bg-ctp-base text-ctp-text")],
                [
                    self.view_header(session),
                    self.view_notice(),
                    div(
                        [class("max-w-4xl mx-auto px-4 py-6 space-y-6")],
                        [
                            self.view_filter_bar(),
                            self.view_error(),
                            self.view_tasks(),
                        ],
                    ),
                    self.view_modal(),
                ],
            ),
        }
    }
}

impl Model {
    fn client(&self) -> Option<ApiClient> {
        self.session
            .as_ref()
            .map(|session| ApiClient::new(api::default_base_url(), session.id_token.clone()))
    }

    fn sign_out(&mut self, reason: Option<String>) {
        session::forget();
        let mode = self.auth.mode;
        *self = Model::default();
        self.auth.mode = mode;
        self.auth.error = reason;
    }

    fn open_modal(&mut self, modal: Modal, form: TaskForm) {
        self.modal = Some(modal);
        self.form = form;
        self.form_errors = FormErrors::default();
        self.submitting = false;
    }

    fn submit_new(&mut self) -> Cmd<Msg> {
        if self.submitting {
            return Cmd::none();
        }
        let request = match self.form.to_new_request() {
            Ok(request) => request,
            Err(errors) => {
                self.form_errors = errors;
                return Cmd::none();
            }
        };
        let Some(client) = self.client() else {
            return Cmd::none();
        };
        self.submitting = true;
        Cmd::new(async move {
            match client.create_task(&request).await {
                Ok(view) => Msg::TaskCreated(view),
                Err(failure) => Msg::CreateFailed(failure),
            }
        })
    }

    fn submit_edit(&mut self, id: Uuid) -> Cmd<Msg> {
        let changes = match self.form.to_changes() {
            Ok(changes) => changes,
            Err(errors) => {
                self.form_errors = errors;
                return Cmd::none();
            }
        };
        let (Some(client), Some(mutation)) = (
            self.client(),
            self.board.begin_update(id, &changes, chrono::Utc::now()),
        ) else {
            return Cmd::none();
        };
        self.modal = None;
        Cmd::new(async move {
            match client.update_task(id, &changes).await {
                Ok(view) => {
                    Msg::MutationConfirmed(mutation, Some(view), Some("Task updated successfully!"))
                }
                Err(failure) => Msg::MutationFailed(mutation, failure),
            }
        })
    }

    fn begin_refresh(&mut self) -> Cmd<Msg> {
        let Some(session) = self.session.clone() else {
            return Cmd::none();
        };
        if self.refreshing {
            return Cmd::none();
        }
        self.refreshing = true;
        Cmd::new(async move {
            match session::refresh(&session).await {
                Ok(fresh) => Msg::SessionRefreshed(fresh),
                Err(message) => Msg::RefreshFailed(message),
            }
        })
    }

    fn schedule_refresh(&self) -> Cmd<Msg> {
        let Some(session) = self.session.as_ref().filter(|s| s.can_refresh()) else {
            return Cmd::none();
        };
        let delay = session.refresh_delay_ms(chrono::Utc::now());
        Cmd::new(async move {
            sleep(delay).await;
            Msg::RefreshDue
        })
    }

    fn retries_rejected_token(&self) -> bool {
        !self.reauthenticated && self.session.as_ref().is_some_and(Session::can_refresh)
    }

    /// Shows a failure to the user. A rejected token is refreshed once and
    /// the list reloaded; if that does not help the session ends.
    fn report(&mut self, failure: ApiFailure, auto_clear: bool) -> Cmd<Msg> {
        let message = failure.user_message();
        if failure.is_unauthorized() {
            if self.retries_rejected_token() {
                self.reauthenticated = true;
                self.reload_after_refresh = true;
                return self.begin_refresh();
            }
            self.sign_out(Some(message));
            return Cmd::none();
        }
        console::error_1(&format!("request failed: {failure:?}").into());
        self.error = Some(message);
        self.error_seq += 1;
        if !auto_clear {
            return Cmd::none();
        }
        let seq = self.error_seq;
        Cmd::new(async move {
            sleep(MESSAGE_TIMEOUT_MS).await;
            Msg::ClearError(seq)
        })
    }

    fn notify(&mut self, notice: &'static str) -> Cmd<Msg> {
        self.notice = Some(notice);
        self.notice_seq += 1;
        let seq = self.notice_seq;
        Cmd::new(async move {
            sleep(MESSAGE_TIMEOUT_MS).await;
            Msg::ClearNotice(seq)
        })
    }

    fn view_login(&self) -> Node<Msg> {
        let action = self.auth.action();
        let busy = self.auth.submitting;
        let input_class = "w-full px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0 focus:outline-none focus:ring-2 focus:ring-ctp-blue focus:border-transparent";
        div(
            [class("min-h-screen bg-ctp-base flex items-center justify-center px-4")],
            [div(
                [class("w-full max-w-md p-8 bg-ctp-mantle rounded-lg border border-ctp-surface0 shadow-lg")],
                [
                    h1([class("text-2xl font-bold text-ctp-text mb-1")], [text("Student Task Planner")]),
                    p([class("text-ctp-subtext0 mb-6")], [text(match action {
                        AuthAction::SignIn => "Sign in to your account",
                        AuthAction::SignUp => "Create your account",
                    })]),
                    match &self.auth.error {
                        Some(error) => div(
                            [class("mb-4 p-3 bg-ctp-red/10 border border-ctp-red/40 rounded-md text-ctp-red text-sm")],
                            [text(error)],
                        ),
                        None => span([], []),
                    },
                    div([class("space-y-4")], [
                        input([
                            r#type("email"),
                            placeholder("you@example.com"),
                            value(&self.auth.email),
                            disabled(busy),
                            on_input(|event| Msg::SetAuthEmail(event.value())),
                            class(input_class),
                        ], []),
                        input([
                            r#type("password"),
                            placeholder("Enter your password"),
                            value(&self.auth.password),
                            disabled(busy),
                            on_input(|event| Msg::SetAuthPassword(event.value())),
                            class(input_class),
                        ], []),
                        if action == AuthAction::SignUp {
                            input([
                                r#type("password"),
                                placeholder("Confirm your password"),
                                value(&self.auth.confirm),
                                disabled(busy),
                                on_input(|event| Msg::SetAuthConfirm(event.value())),
                                class(input_class),
                            ], [])
                        } else {
                            span([], [])
                        },
                        button([
                            r#type("button"),
                            disabled(busy),
                            on_click(|_| Msg::SubmitAuth),
                            class("w-full bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-6 py-2 rounded-md transition-colors duration-200 disabled:opacity-50"),
                        ], [text(match (action, busy) {
                            (AuthAction::SignIn, true) => "Signing in...",
                            (AuthAction::SignUp, true) => "Creating account...",
                            (_, false) => action.label(),
                        })]),
                    ]),
                    p([class("mt-6 text-center text-sm text-ctp-subtext0")], [
                        text(match action {
                            AuthAction::SignIn => "Don't have an account? ",
                            AuthAction::SignUp => "Already have an account? ",
                        }),
                        button([
                            r#type("button"),
                            on_click(|_| Msg::SwitchAuthMode),
                            class("text-ctp-blue hover:text-ctp-sapphire font-medium"),
                        ], [text(action.other().label())]),
                    ]),
                ],
            )],
        )
    }

    fn view_header(&self, session: &Session) -> Node<Msg> {
        let stats = Stats::of(self.board.tasks());
        header([class("bg-ctp-mantle shadow-lg border-b border-ctp-surface0")], [
            div([class("max-w-4xl mx-auto px-4 py-4 flex items-center justify-between")], [
                div([], [
                    h1([class("text-2xl font-bold text-ctp-text")], [text("Student Task Planner")]),
                    p([class("text-sm text-ctp-subtext0")], [text(&session.email)]),
                ]),
                div([class("flex items-center gap-3")], [
                    self.stat("Total", stats.total, "text-ctp-text"),
                    self.stat("Done", stats.completed, "text-ctp-green"),
                    self.stat("Overdue", stats.overdue, "text-ctp-red"),
                    button([
                        on_click(|_| Msg::OpenAdd),
                        class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-4 py-2 rounded-md transition-colors duration-200"),
                    ], [text("Add Task")]),
                    button([
                        on_click(|_| Msg::Logout),
                        class("text-ctp-subtext0 hover:text-ctp-text px-3 py-2 rounded-md hover:bg-ctp-surface0"),
                    ], [text("Logout")]),
                ]),
            ]),
        ])
    }

    fn stat(&self, label: &str, count: usize, color: &str) -> Node<Msg> {
        div([class("text-center px-2")], [
            div([class(format!("text-lg font-bold {color}"))], [text(count)]),
            div([class("text-xs text-ctp-subtext0")], [text(label)]),
        ])
    }

    fn view_notice(&self) -> Node<Msg> {
        match self.notice {
            Some(notice) => div(
                [class("fixed top-4 right-4 z-50 px-4 py-3 rounded-lg shadow-lg bg-ctp-green text-ctp-base")],
                [text(notice)],
            ),
            None => span([], []),
        }
    }

    fn view_filter_bar(&self) -> Node<Msg> {
        let status_button = |label: &str, status: StatusFilter| {
            let active = self.status == status;
            button([
                on_click(move |_| Msg::SetStatus(status)),
                class(format!(
                    "px-3 py-1 rounded-md text-sm font-medium transition-colors duration-200 {}",
                    if active {
                        "bg-ctp-blue text-ctp-base"
                    } else {
                        "text-ctp-subtext0 hover:text-ctp-text"
                    }
                )),
            ], [text(label)])
        };

        div([class("p-4 bg-ctp-surface1 rounded-lg border border-ctp-surface2 flex flex-wrap items-end justify-between gap-4")], [
            div([], [
                p([class("text-xs text-ctp-subtext0 mb-1")], [text("Filter by status")]),
                div([class("flex gap-1 bg-ctp-surface0 p-1 rounded-md")], [
                    status_button("All Tasks", StatusFilter::All),
                    status_button("Pending", StatusFilter::Pending),
                    status_button("Completed", StatusFilter::Completed),
                ]),
            ]),
            div([class("flex gap-4")], [
                div([], [
                    p([class("text-xs text-ctp-subtext0 mb-1")], [text("Sort by")]),
                    select([
                        on_input(|event| Msg::SetSortBy(event.value())),
                        class("px-3 py-1 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text"),
                    ], [
                        option([value("dueDate"), selected(self.sort_by == SortKey::DueDate)], [text("Due Date")]),
                        option([value("priority"), selected(self.sort_by == SortKey::Priority)], [text("Priority")]),
                    ]),
                ]),
                div([], [
                    p([class("text-xs text-ctp-subtext0 mb-1")], [text("Order")]),
                    button([
                        on_click(|_| Msg::ToggleOrder),
                        class("px-3 py-1 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text"),
                    ], [text(match self.order {
                        SortOrder::Asc => "↑ Ascending",
                        SortOrder::Desc => "↓ Descending",
                    })]),
                ]),
            ]),
        ])
    }

    fn view_error(&self) -> Node<Msg> {
        match &self.error {
            Some(error) => div(
                [class("p-4 bg-ctp-red/10 border border-ctp-red/40 rounded-lg flex items-center justify-between")],
                [
                    span([class("text-ctp-red")], [text(error)]),
                    button([
                        on_click(|_| Msg::DismissError),
                        class("text-ctp-red hover:text-ctp-maroon px-2"),
                    ], [text("✕")]),
                ],
            ),
            None => span([], []),
        }
    }

    fn view_tasks(&self) -> Node<Msg> {
        let tasks = self.board.tasks();
        if self.loading {
            return div([class("flex justify-center py-6 text-ctp-subtext0")], [text("Loading tasks...")]);
        }
        if tasks.is_empty() {
            return self.view_empty_state();
        }
        div([class("space-y-3")], [
            div([class("space-y-3")], tasks.iter().map(|view| self.view_task(view)).collect::<Vec<_>>()),
            p([class("text-center text-sm text-ctp-subtext0")], [text(format!(
                "Showing {} task{}",
                tasks.len(),
                if tasks.len() == 1 { "" } else { "s" }
            ))]),
        ])
    }

    fn view_empty_state(&self) -> Node<Msg> {
        let (icon, title, description) = match self.status {
            StatusFilter::All => ("📝", "No tasks yet", "Get started by creating your first task!"),
            StatusFilter::Pending => (
                "🎉",
                "No pending tasks",
                "All caught up! Create a new task or check completed ones.",
            ),
            StatusFilter::Completed => (
                "✅",
                "No completed tasks",
                "Complete some tasks to see them here.",
            ),
        };
        div([class("text-center py-12 bg-ctp-surface1 rounded-lg border border-ctp-surface2")], [
            div([class("text-4xl mb-3")], [text(icon)]),
            h3([class("text-lg font-semibold text-ctp-text")], [text(title)]),
            p([class("text-ctp-subtext0 mb-4")], [text(description)]),
            if self.status != StatusFilter::Completed {
                button([
                    on_click(|_| Msg::OpenAdd),
                    class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-6 py-2 rounded-md transition-colors duration-200"),
                ], [text("Add Your First Task")])
            } else {
                span([], [])
            },
        ])
    }

    fn view_task(&self, view: &TaskView) -> Node<Msg> {
        let task = &view.task;
        let id = task.id;
        let pending = self.board.is_pending(id);
        let priority_class = match task.priority {
            Priority::High => "bg-ctp-red/20 text-ctp-red",
            Priority::Medium => "bg-ctp-yellow/20 text-ctp-yellow",
            Priority::Low => "bg-ctp-green/20 text-ctp-green",
        };
        let priority_label = match task.priority {
            Priority::High => "High priority",
            Priority::Medium => "Medium priority",
            Priority::Low => "Low priority",
        };

        div([class(format!(
            "p-4 rounded-lg border flex items-start gap-3 transition-all duration-200 {} {}",
            if task.completed {
                "opacity-70 bg-ctp-surface0 border-ctp-surface1"
            } else {
                "bg-ctp-surface1 border-ctp-surface2"
            },
            if view.is_overdue { "ring-1 ring-ctp-red/40" } else { "" }
        ))], [
            input([
                r#type("checkbox"),
                checked(task.completed),
                disabled(pending),
                on_click(move |_| Msg::ToggleTask(id)),
                class("mt-1 h-4 w-4 accent-ctp-green"),
            ], []),
            div([class("flex-1 min-w-0")], [
                div([class("flex items-center gap-2 flex-wrap")], [
                    h3([class(format!(
                        "font-medium {}",
                        if task.completed { "line-through text-ctp-subtext0" } else { "text-ctp-text" }
                    ))], [text(&task.title)]),
                    span([class(format!("px-2 py-0.5 rounded-full text-xs font-medium {priority_class}"))], [text(priority_label)]),
                ]),
                if task.description.is_empty() {
                    span([], [])
                } else {
                    p([class(format!(
                        "text-sm mt-1 {}",
                        if task.completed { "line-through text-ctp-overlay0" } else { "text-ctp-subtext1" }
                    ))], [text(&task.description)])
                },
                match task.due_date {
                    Some(due) => span([class(format!(
                        "inline-block mt-2 text-xs px-2 py-0.5 rounded {}",
                        if view.is_overdue { "bg-ctp-red/10 text-ctp-red" } else { "text-ctp-subtext0" }
                    ))], [text(format!(
                        "{}{}",
                        if view.is_overdue { "Overdue: " } else { "" },
                        form::display_date(due)
                    ))]),
                    None => span([], []),
                },
            ]),
            div([class("flex gap-1")], [
                button([
                    r#type("button"),
                    disabled(pending),
                    on_click(move |_| Msg::OpenEdit(id)),
                    class("p-2 text-ctp-subtext0 hover:text-ctp-blue rounded-md"),
                ], [text("✏️")]),
                button([
                    r#type("button"),
                    disabled(pending),
                    on_click(move |_| Msg::DeleteTask(id)),
                    class("p-2 text-ctp-subtext0 hover:text-ctp-red rounded-md"),
                ], [text(if pending { "⏳" } else { "🗑️" })]),
            ]),
        ])
    }

    fn view_modal(&self) -> Node<Msg> {
        let Some(modal) = self.modal else {
            return span([], []);
        };
        let editing = matches!(modal, Modal::Edit(_));
        let input_class = "w-full px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0 focus:outline-none focus:ring-2 focus:ring-ctp-blue focus:border-transparent";
        let field_error = |error: Option<&'static str>| match error {
            Some(error) => p([class("mt-1 text-sm text-ctp-red")], [text(error)]),
            None => span([], []),
        };

        div([class("fixed inset-0 z-40 bg-ctp-crust/70 flex items-center justify-center px-4")], [
            div([class("w-full max-w-lg p-6 bg-ctp-mantle rounded-lg border border-ctp-surface0 shadow-lg")], [
                div([class("flex items-center justify-between mb-4 pb-2 border-b border-ctp-surface2")], [
                    h2([class("text-xl font-semibold text-ctp-text")], [text(if editing { "Edit Task" } else { "Add New Task" })]),
                    button([on_click(|_| Msg::CloseModal), class("text-ctp-subtext0 hover:text-ctp-text px-2")], [text("✕")]),
                ]),
                div([class("space-y-4")], [
                    div([], [
                        input([
                            r#type("text"),
                            placeholder("Task title"),
                            value(&self.form.title),
                            on_input(|event| Msg::SetTitle(event.value())),
                            class(input_class),
                        ], []),
                        field_error(self.form_errors.title),
                    ]),
                    div([], [
                        textarea([
                            placeholder("Task description"),
                            value(&self.form.description),
                            on_input(|event| Msg::SetDescription(event.value())),
                            class(format!("{input_class} h-20 resize-y")),
                        ], []),
                        field_error(self.form_errors.description),
                    ]),
                    select([
                        on_input(|event| Msg::SetPriority(event.value())),
                        class(input_class),
                    ], Priority::ALL.iter().map(|priority| {
                        option([
                            value(priority.as_str()),
                            selected(self.form.priority == *priority),
                        ], [text(match priority {
                            Priority::Low => "🟢 Low",
                            Priority::Medium => "🟡 Medium",
                            Priority::High => "🔴 High",
                        })])
                    }).collect::<Vec<_>>()),
                    input([
                        r#type("date"),
                        value(&self.form.due_date),
                        on_input(|event| Msg::SetDueDate(event.value())),
                        class(input_class),
                    ], []),
                    if editing {
                        div([class("flex items-center gap-2 text-sm text-ctp-text")], [
                            input([
                                r#type("checkbox"),
                                checked(self.form.completed),
                                on_click(|_| Msg::ToggleFormCompleted),
                                class("h-4 w-4"),
                            ], []),
                            span([], [text("Mark as completed")]),
                        ])
                    } else {
                        span([], [])
                    },
                    div([class("flex gap-3 pt-2")], [
                        button([
                            r#type("button"),
                            on_click(|_| Msg::CloseModal),
                            class("flex-1 px-4 py-2 border border-ctp-surface2 text-ctp-subtext1 rounded-md hover:bg-ctp-surface0"),
                        ], [text("Cancel")]),
                        button([
                            r#type("button"),
                            disabled(self.submitting),
                            on_click(|_| Msg::SubmitForm),
                            class("flex-1 px-4 py-2 bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium rounded-md disabled:opacity-50"),
                        ], [text(match (editing, self.submitting) {
                            (_, true) => "Saving...",
                            (true, false) => "Save Changes",
                            (false, false) => "Add Task",
                        })]),
                    ]),
                ]),
            ]),
        ])
    }
}

fn confirm(message: &str) -> bool {
    window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

async fn sleep(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        }
    });
    let _ = JsFuture::from(promise).await;
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    Program::mount_to_body(Model::default());
}
