//! Email/password sign-in against the Firebase Identity Toolkit REST API.
//!
//! The resulting ID token is what the planner API verifies. ID tokens live
//! for an hour; the refresh token that comes with them is exchanged at the
//! Secure Token endpoint for a fresh one shortly before that. The session is
//! kept in `localStorage` so a reload does not sign the user out.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::{js_sys, JsFuture};
use web_sys::{console, window, Request, RequestInit, Response, Storage};

const IDENTITY_TOOLKIT: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN: &str = "https://securetoken.googleapis.com/v1/token";
const STORAGE_KEY: &str = "planner.session";
const DEFAULT_LIFETIME_SECS: i64 = 3600;

/// How long before expiry a token is swapped for a new one.
const REFRESH_MARGIN_MINUTES: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id_token: String,
    pub email: String,
    pub uid: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub refresh_token: String,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        self.can_refresh() && now + Duration::minutes(REFRESH_MARGIN_MINUTES) >= self.expires_at
    }

    /// Milliseconds until [`Session::needs_refresh_at`] turns true, in the
    /// range a browser timer accepts.
    pub fn refresh_delay_ms(&self, now: DateTime<Utc>) -> i32 {
        let due = self.expires_at - Duration::minutes(REFRESH_MARGIN_MINUTES);
        let millis = (due - now).num_milliseconds().clamp(0, i64::from(i32::MAX));
        i32::try_from(millis).unwrap_or(i32::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    SignIn,
    SignUp,
}

impl AuthAction {
    fn endpoint(&self) -> &'static str {
        match self {
            AuthAction::SignIn => "accounts:signInWithPassword",
            AuthAction::SignUp => "accounts:signUp",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuthAction::SignIn => "Log In",
            AuthAction::SignUp => "Sign Up",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            AuthAction::SignIn => AuthAction::SignUp,
            AuthAction::SignUp => AuthAction::SignIn,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    id_token: String,
    #[serde(default)]
    email: String,
    local_id: String,
    expires_in: String,
    #[serde(default)]
    refresh_token: String,
}

/// The Secure Token endpoint answers in snake_case.
#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Deserialize)]
struct AuthErrorBody {
    error: AuthErrorDetail,
}

#[derive(Deserialize)]
struct AuthErrorDetail {
    message: String,
}

/// Turns an Identity Toolkit error code into something a user can act on.
/// Codes may carry a trailing explanation (`WEAK_PASSWORD : ...`).
pub fn auth_error_message(code: &str) -> &'static str {
    let code = code.split(" : ").next().unwrap_or(code).trim();
    match code {
        "EMAIL_EXISTS" => "This email is already registered. Please log in instead.",
        "INVALID_EMAIL" => "Invalid email address format.",
        "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => {
            "Email/password accounts are not enabled. Contact support."
        }
        "WEAK_PASSWORD" => "Password should be at least 6 characters.",
        "USER_DISABLED" => "This account has been disabled.",
        "EMAIL_NOT_FOUND" => "No account found with this email.",
        "INVALID_PASSWORD" => "Incorrect password. Please try again.",
        "INVALID_LOGIN_CREDENTIALS" => "Invalid email or password.",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many failed attempts. Please try again later.",
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
            "Session expired. Please log in again."
        }
        _ => "An error occurred. Please try again.",
    }
}

fn lifetime(expires_in: &str) -> Duration {
    Duration::seconds(expires_in.parse::<i64>().unwrap_or(DEFAULT_LIFETIME_SECS))
}

fn session_from(response: AuthResponse, fallback_email: &str, now: DateTime<Utc>) -> Session {
    Session {
        id_token: response.id_token,
        email: if response.email.is_empty() {
            fallback_email.to_string()
        } else {
            response.email
        },
        uid: response.local_id,
        expires_at: now + lifetime(&response.expires_in),
        refresh_token: response.refresh_token,
    }
}

fn session_refreshed(previous: &Session, response: RefreshResponse, now: DateTime<Utc>) -> Session {
    Session {
        id_token: response.id_token,
        email: previous.email.clone(),
        uid: response.user_id,
        expires_at: now + lifetime(&response.expires_in),
        refresh_token: response.refresh_token,
    }
}

/// POSTs `body` and returns the response text, or the provider's error
/// code when the status is not 2xx.
async fn post(url: &str, content_type: &str, body: &str) -> Result<String, PostFailure> {
    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_body(&JsValue::from_str(body));
    let request = Request::new_with_str_and_init(url, &opts).map_err(|_| PostFailure::Other)?;
    request
        .headers()
        .set("Content-Type", content_type)
        .map_err(|_| PostFailure::Other)?;

    let window = window().ok_or(PostFailure::Other)?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|_| PostFailure::Network)?
        .into();
    let text = JsFuture::from(response.text().map_err(|_| PostFailure::Other)?)
        .await
        .map_err(|_| PostFailure::Other)?
        .as_string()
        .ok_or(PostFailure::Other)?;

    if !response.ok() {
        let code = serde_json::from_str::<AuthErrorBody>(&text)
            .map(|body| body.error.message)
            .unwrap_or_default();
        return Err(PostFailure::Rejected(code));
    }
    Ok(text)
}

enum PostFailure {
    Network,
    Rejected(String),
    Other,
}

impl PostFailure {
    fn message(&self) -> String {
        match self {
            PostFailure::Network => "Network error. Please check your connection.".to_string(),
            PostFailure::Rejected(code) => auth_error_message(code).to_string(),
            PostFailure::Other => auth_error_message("").to_string(),
        }
    }
}

pub async fn authenticate(
    action: AuthAction,
    email: String,
    password: String,
) -> Result<Session, String> {
    let generic = || auth_error_message("").to_string();
    let api_key = option_env!("FIREBASE_API_KEY").unwrap_or_default();
    let url = format!("{IDENTITY_TOOLKIT}/{}?key={api_key}", action.endpoint());
    let body = serde_json::to_string(&Credentials {
        email: &email,
        password: &password,
        return_secure_token: true,
    })
    .map_err(|_| generic())?;

    let text = post(&url, "application/json", &body).await.map_err(|failure| {
        if let PostFailure::Rejected(code) = &failure {
            console::warn_1(&format!("{} failed: {code}", action.label()).into());
        }
        failure.message()
    })?;
    let parsed: AuthResponse = serde_json::from_str(&text).map_err(|_| generic())?;
    Ok(session_from(parsed, &email, Utc::now()))
}

/// Trades the session's refresh token for a new ID token.
pub async fn refresh(session: &Session) -> Result<Session, String> {
    let api_key = option_env!("FIREBASE_API_KEY").unwrap_or_default();
    let url = format!("{SECURE_TOKEN}?key={api_key}");
    let token = String::from(js_sys::encode_uri_component(&session.refresh_token));
    let body = format!("grant_type=refresh_token&refresh_token={token}");

    let text = post(&url, "application/x-www-form-urlencoded", &body)
        .await
        .map_err(|failure| {
            if let PostFailure::Rejected(code) = &failure {
                console::warn_1(&format!("token refresh failed: {code}").into());
            }
            failure.message()
        })?;
    let parsed: RefreshResponse =
        serde_json::from_str(&text).map_err(|_| auth_error_message("").to_string())?;
    Ok(session_refreshed(session, parsed, Utc::now()))
}

fn local_storage() -> Option<Storage> {
    window()?.local_storage().ok().flatten()
}

pub fn save(session: &Session) {
    let Some(storage) = local_storage() else {
        return;
    };
    match serde_json::to_string(session) {
        Ok(raw) => {
            if storage.set_item(STORAGE_KEY, &raw).is_err() {
                console::warn_1(&"could not persist session".into());
            }
        }
        Err(e) => console::warn_1(&format!("could not encode session: {e}").into()),
    }
}

/// The stored session, unless it is missing, unreadable or expired with
/// nothing to refresh it with.
pub fn restore() -> Option<Session> {
    let raw = local_storage()?.get_item(STORAGE_KEY).ok().flatten()?;
    parse_stored(&raw, Utc::now())
}

pub fn forget() {
    if let Some(storage) = local_storage() {
        if storage.remove_item(STORAGE_KEY).is_err() {
            console::warn_1(&"could not clear session".into());
        }
    }
}

fn parse_stored(raw: &str, now: DateTime<Utc>) -> Option<Session> {
    serde_json::from_str::<Session>(raw)
        .ok()
        .filter(|session| session.can_refresh() || !session.is_expired_at(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("EMAIL_EXISTS", "This email is already registered. Please log in instead.")]
    #[case("INVALID_EMAIL", "Invalid email address format.")]
    #[case(
        "WEAK_PASSWORD : Password should be at least 6 characters",
        "Password should be at least 6 characters."
    )]
    #[case("EMAIL_NOT_FOUND", "No account found with this email.")]
    #[case("INVALID_PASSWORD", "Incorrect password. Please try again.")]
    #[case("INVALID_LOGIN_CREDENTIALS", "Invalid email or password.")]
    #[case("USER_DISABLED", "This account has been disabled.")]
    #[case(
        "TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account has been temporarily disabled",
        "Too many failed attempts. Please try again later."
    )]
    #[case("SOMETHING_NEW", "An error occurred. Please try again.")]
    fn maps_provider_codes(#[case] code: &str, #[case] expected: &str) {
        assert_eq!(auth_error_message(code), expected);
    }

    #[test]
    fn session_lifetime_comes_from_the_response() {
        let now = Utc::now();
        let response = AuthResponse {
            id_token: "token".into(),
            email: String::new(),
            local_id: "uid-1".into(),
            expires_in: "3600".into(),
            refresh_token: "refresh-1".into(),
        };
        let session = session_from(response, "ada@example.com", now);
        assert_eq!(session.email, "ada@example.com");
        assert_eq!(session.uid, "uid-1");
        assert_eq!(session.expires_at, now + Duration::hours(1));
        assert!(!session.is_expired_at(now));
        assert!(session.is_expired_at(now + Duration::hours(1)));
        assert_eq!(session.refresh_token, "refresh-1");
    }

    fn session(expires_in_minutes: i64, refresh_token: &str, now: DateTime<Utc>) -> Session {
        Session {
            id_token: "token".into(),
            email: "ada@example.com".into(),
            uid: "uid-1".into(),
            expires_at: now + Duration::minutes(expires_in_minutes),
            refresh_token: refresh_token.into(),
        }
    }

    #[rstest]
    #[case(60, "refresh-1", false)]
    #[case(6, "refresh-1", false)]
    #[case(5, "refresh-1", true)]
    #[case(1, "refresh-1", true)]
    #[case(-30, "refresh-1", true)]
    #[case(1, "", false)]
    #[case(-30, "", false)]
    fn refresh_is_due_near_expiry(
        #[case] expires_in_minutes: i64,
        #[case] refresh_token: &str,
        #[case] expected: bool,
    ) {
        let now = Utc::now();
        assert_eq!(
            session(expires_in_minutes, refresh_token, now).needs_refresh_at(now),
            expected
        );
    }

    #[test]
    fn refresh_timer_fires_at_the_margin() {
        let now = Utc::now();
        assert_eq!(session(60, "r", now).refresh_delay_ms(now), 55 * 60 * 1000);
        assert_eq!(session(2, "r", now).refresh_delay_ms(now), 0);
        assert_eq!(session(60 * 24 * 60, "r", now).refresh_delay_ms(now), i32::MAX);
    }

    #[test]
    fn refreshed_session_keeps_the_email() {
        let now = Utc::now();
        let previous = session(-1, "refresh-1", now);
        let response: RefreshResponse = serde_json::from_str(
            r#"{"id_token":"token-2","refresh_token":"refresh-2","expires_in":"3600","user_id":"uid-1","token_type":"Bearer"}"#,
        )
        .unwrap();
        let fresh = session_refreshed(&previous, response, now);
        assert_eq!(fresh.id_token, "token-2");
        assert_eq!(fresh.refresh_token, "refresh-2");
        assert_eq!(fresh.email, "ada@example.com");
        assert_eq!(fresh.expires_at, now + Duration::hours(1));
        assert!(!fresh.needs_refresh_at(now));
    }

    #[test]
    fn expired_sessions_with_a_refresh_token_are_restored() {
        let now = Utc::now();
        let stored = session(-10, "refresh-1", now);
        let raw = serde_json::to_string(&stored).unwrap();
        let restored = parse_stored(&raw, now).unwrap();
        assert!(restored.needs_refresh_at(now));
    }

    #[test]
    fn sessions_saved_without_a_refresh_token_still_load() {
        let now = Utc::now();
        let raw = format!(
            r#"{{"idToken":"token","email":"a@b.c","uid":"u","expiresAt":"{}"}}"#,
            (now + Duration::minutes(30)).to_rfc3339()
        );
        let restored = parse_stored(&raw, now).unwrap();
        assert!(!restored.can_refresh());
    }

    #[test]
    fn expired_or_garbled_sessions_are_not_restored() {
        let now = Utc::now();
        let session = Session {
            id_token: "token".into(),
            email: "ada@example.com".into(),
            uid: "uid-1".into(),
            expires_at: now + Duration::minutes(5),
            refresh_token: String::new(),
        };
        let raw = serde_json::to_string(&session).unwrap();

        assert_eq!(parse_stored(&raw, now), Some(session));
        assert_eq!(parse_stored(&raw, now + Duration::minutes(10)), None);
        assert_eq!(parse_stored("{not json", now), None);
    }
}
