//! Thin fetch wrapper around the task endpoints.
//!
//! Every request carries the bearer token, a JSON content type and a fixed
//! timeout. Failures are turned into [`ApiFailure`] which knows how to
//! describe itself to the user.

use serde::de::DeserializeOwned;
use shared::{
    DataEnvelope, ErrorEnvelope, ListEnvelope, MessageEnvelope, NewTaskRequest, TaskChanges,
    TaskQuery, TaskView,
};
use uuid::Uuid;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{console, window, AbortController, Request, RequestInit, Response, Window};

pub const REQUEST_TIMEOUT_MS: i32 = 10_000;

pub fn default_base_url() -> String {
    option_env!("PLANNER_API_URL").unwrap_or("/api").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiFailure {
    /// No response at all: offline, refused, aborted by the timeout.
    Network,
    Status {
        status: u16,
        envelope: Option<ErrorEnvelope>,
    },
    /// A 2xx response whose body did not match the expected envelope.
    Decode(String),
}

impl ApiFailure {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiFailure::Status { status: 401, .. })
    }

    pub fn user_message(&self) -> String {
        match self {
            ApiFailure::Network => "Network error. Please check your connection.".to_string(),
            ApiFailure::Decode(_) => "Something went wrong.".to_string(),
            ApiFailure::Status { status, envelope } => {
                let server = envelope.as_ref();
                match status {
                    400 => server
                        .map(ErrorEnvelope::summary)
                        .unwrap_or_else(|| "Invalid request. Please check your input.".into()),
                    401 => server
                        .map(|e| e.error.clone())
                        .unwrap_or_else(|| "Session expired. Please log in again.".into()),
                    403 => "You do not have permission to perform this action.".to_string(),
                    404 => server
                        .map(|e| e.error.clone())
                        .unwrap_or_else(|| "Resource not found.".into()),
                    500 => "Server error. Please try again later.".to_string(),
                    _ => server
                        .map(|e| e.error.clone())
                        .unwrap_or_else(|| "Something went wrong.".into()),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiClient {
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<TaskView>, ApiFailure> {
        let path = format!("/tasks{}", query_string(query));
        let envelope: ListEnvelope<TaskView> = self.send("GET", &path, None).await?;
        Ok(envelope.data)
    }

    pub async fn create_task(&self, request: &NewTaskRequest) -> Result<TaskView, ApiFailure> {
        let body = serde_json::to_string(request).map_err(|e| ApiFailure::Decode(e.to_string()))?;
        let envelope: DataEnvelope<TaskView> = self.send("POST", "/tasks", Some(body)).await?;
        Ok(envelope.data)
    }

    pub async fn update_task(
        &self,
        id: Uuid,
        changes: &TaskChanges,
    ) -> Result<TaskView, ApiFailure> {
        let body = serde_json::to_string(changes).map_err(|e| ApiFailure::Decode(e.to_string()))?;
        let envelope: DataEnvelope<TaskView> = self
            .send("PUT", &format!("/tasks/{id}"), Some(body))
            .await?;
        Ok(envelope.data)
    }

    pub async fn delete_task(&self, id: Uuid) -> Result<String, ApiFailure> {
        let envelope: MessageEnvelope = self
            .send("DELETE", &format!("/tasks/{id}"), None)
            .await?;
        Ok(envelope.message)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: Option<String>,
    ) -> Result<T, ApiFailure> {
        let url = format!("{}{}", self.base_url, path);
        let window = window().ok_or(ApiFailure::Network)?;

        let opts = RequestInit::new();
        opts.set_method(method);
        if let Some(body) = &body {
            opts.set_body(&JsValue::from_str(body));
        }
        let controller = AbortController::new().ok();
        if let Some(controller) = &controller {
            opts.set_signal(Some(&controller.signal()));
        }

        let request = Request::new_with_str_and_init(&url, &opts).map_err(|_| ApiFailure::Network)?;
        let headers = request.headers();
        headers
            .set("Content-Type", "application/json")
            .map_err(|_| ApiFailure::Network)?;
        headers
            .set("Authorization", &format!("Bearer {}", self.token))
            .map_err(|_| ApiFailure::Network)?;

        if let Some(controller) = controller {
            abort_after(&window, controller, REQUEST_TIMEOUT_MS);
        }

        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|err| {
                console::error_2(&format!("{method} {url} failed:").into(), &err);
                ApiFailure::Network
            })?
            .into();

        let text = read_text(&response).await?;
        decode(response.status(), response.ok(), &text)
    }
}

async fn read_text(response: &Response) -> Result<String, ApiFailure> {
    let promise = response.text().map_err(|_| ApiFailure::Network)?;
    JsFuture::from(promise)
        .await
        .map_err(|_| ApiFailure::Network)?
        .as_string()
        .ok_or_else(|| ApiFailure::Decode("response body is not text".into()))
}

fn decode<T: DeserializeOwned>(status: u16, ok: bool, text: &str) -> Result<T, ApiFailure> {
    if !ok {
        return Err(ApiFailure::Status {
            status,
            envelope: serde_json::from_str(text).ok(),
        });
    }
    serde_json::from_str(text).map_err(|e| ApiFailure::Decode(e.to_string()))
}

/// Cancels the request if it has not completed within `timeout_ms`. Aborting
/// a finished request is a no-op.
fn abort_after(window: &Window, controller: AbortController, timeout_ms: i32) {
    let abort = Closure::once(move || controller.abort());
    if window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            abort.as_ref().unchecked_ref(),
            timeout_ms,
        )
        .is_err()
    {
        console::warn_1(&"could not schedule request timeout".into());
    }
    abort.forget();
}

fn query_string(query: &TaskQuery) -> String {
    let pairs: Vec<String> = [
        ("status", &query.status),
        ("sortBy", &query.sort_by),
        ("order", &query.order),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.as_ref().map(|v| format!("{key}={v}")))
    .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}
