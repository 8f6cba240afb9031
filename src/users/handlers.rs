use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    state::AppState,
    users::{
        dto::{LoginRequest, LoginResponse, PublicUser, SignupRequest},
        error::UserError,
        repo_types::{Credentials, NewUser},
    },
};

const MIN_PASSWORD_LEN: usize = 8;
const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/users", get(list_users))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    let email = normalize_email(&payload.email);
    let username = payload.username.trim().to_string();

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    if username.is_empty() {
        warn!("empty username");
        return Err((StatusCode::BAD_REQUEST, "Username is required".into()));
    }
    if payload.password.expose().chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }
    if payload.password.expose().len() > state.config.hasher.max_password_bytes {
        warn!("password too long");
        return Err((StatusCode::BAD_REQUEST, "Password too long".into()));
    }

    let mut user = NewUser::new(username, email, payload.password);
    match state.users.save(&mut user).await {
        Ok(()) => {}
        Err(e) if e.is_unique_violation() => {
            warn!(email = %user.email, "email already registered");
            return Err((StatusCode::CONFLICT, "Email already registered".into()));
        }
        Err(e) => {
            error!(error = %e, "save user failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "Could not save user".into()));
        }
    }

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(PublicUser {
            id: user.id,
            username: user.username,
            email: user.email,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, String)> {
    let candidate = Credentials {
        email: normalize_email(&payload.email),
        password: payload.password,
    };

    match state.users.validate_credentials(&candidate).await {
        Ok(id) => {
            info!(user_id = id, "user logged in");
            Ok(Json(LoginResponse { id }))
        }
        // Same answer for both so accounts cannot be enumerated.
        Err(UserError::NotFound) | Err(UserError::InvalidCredentials) => {
            warn!(email = %candidate.email, "login rejected");
            Err((StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.into()))
        }
        Err(e) => {
            error!(error = %e, "validate_credentials failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Could not authenticate".into()))
        }
    }
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicUser>>, (StatusCode, String)> {
    let users = state.users.list_all().await.map_err(|e| {
        error!(error = %e, "list users failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Could not list users".into())
    })?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    async fn call(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, String) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn app() -> Router {
        user_routes().with_state(AppState::fake().await)
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("no at sign.com"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn signup_then_login() {
        let app = app().await;
        let (status, body) = call(
            app.clone(),
            "POST",
            "/signup",
            Some(json!({"username": "alice", "email": " A@X.com ", "password": "secret123"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(created["id"], 1);
        assert_eq!(created["email"], "a@x.com");
        assert!(created.get("password").is_none());

        let (status, body) = call(
            app,
            "POST",
            "/login",
            Some(json!({"email": "a@x.com", "password": "secret123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["id"], 1);
    }

    #[tokio::test]
    async fn login_failures_look_identical() {
        let app = app().await;
        call(
            app.clone(),
            "POST",
            "/signup",
            Some(json!({"username": "alice", "email": "a@x.com", "password": "secret123"})),
        )
        .await;

        let wrong_pw = call(
            app.clone(),
            "POST",
            "/login",
            Some(json!({"email": "a@x.com", "password": "wrong-password"})),
        )
        .await;
        let unknown = call(
            app,
            "POST",
            "/login",
            Some(json!({"email": "ghost@x.com", "password": "secret123"})),
        )
        .await;
        assert_eq!(wrong_pw.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_pw, unknown);
    }

    #[tokio::test]
    async fn signup_rejects_bad_input_and_duplicates() {
        let app = app().await;
        let (status, _) = call(
            app.clone(),
            "POST",
            "/signup",
            Some(json!({"username": "alice", "email": "nope", "password": "secret123"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            app.clone(),
            "POST",
            "/signup",
            Some(json!({"username": "alice", "email": "a@x.com", "password": "short"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let ok = json!({"username": "alice", "email": "a@x.com", "password": "secret123"});
        let (status, _) = call(app.clone(), "POST", "/signup", Some(ok.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = call(app, "POST", "/signup", Some(ok)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn signup_rejects_oversized_password() {
        let app = app().await;
        let (status, body) = call(
            app.clone(),
            "POST",
            "/signup",
            Some(json!({"username": "eve", "email": "e@x.com", "password": "x".repeat(200)})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Password too long");

        let (_, body) = call(app, "GET", "/users", None).await;
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn list_users_hides_passwords() {
        let app = app().await;
        let (status, body) = call(app.clone(), "GET", "/users", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");

        call(
            app.clone(),
            "POST",
            "/signup",
            Some(json!({"username": "bob", "email": "b@x.com", "password": "hunter2hunter2"})),
        )
        .await;
        let (status, body) = call(app, "GET", "/users", None).await;
        assert_eq!(status, StatusCode::OK);
        let users: Vec<Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["username"], "bob");
        assert!(users[0].get("password").is_none());
        assert!(!body.contains("argon2"));
    }
}
