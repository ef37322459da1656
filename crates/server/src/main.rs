use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use shared::{
    domain::{RequestMethod, SessionId},
    error::{ApiError, WizardError},
    protocol::{FieldValues, WizardResponse},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wizard::WizardRequest;

mod app_state;
mod config;
mod signup;

use app_state::AppState;
use config::load_settings;

const MAX_SESSION_ID_BYTES: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings()?;
    let state = AppState::from_settings(&settings).await?;
    let app = build_router(Arc::new(state), &settings.mount_path, settings.max_body_bytes);

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, mount_path = %settings.mount_path, "wizard server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, mount_path: &str, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(mount_path, any(wizard_entry))
        .route(&format!("{mount_path}/"), any(wizard_entry))
        .route(&format!("{mount_path}/:slug"), any(wizard_step))
        .route(&format!("{mount_path}/:slug/"), any(wizard_step))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Response {
    if let Some(storage) = &state.storage {
        if let Err(error) = storage.health_check().await {
            error!(%error, "session storage health check failed");
            return (StatusCode::SERVICE_UNAVAILABLE, "unavailable").into_response();
        }
    }
    "ok".into_response()
}

async fn wizard_entry(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    dispatch(&state, method, uri, &headers, body, None).await
}

async fn wizard_step(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    dispatch(&state, method, uri, &headers, body, Some(slug)).await
}

async fn dispatch(
    state: &AppState,
    method: Method,
    uri: Uri,
    headers: &HeaderMap,
    body: Bytes,
    slug: Option<String>,
) -> Response {
    let (session_id, is_new_session) = match session_from_cookie(headers, &state.session_cookie) {
        Some(session_id) => (session_id, false),
        None => (SessionId::generate(), true),
    };

    let request = WizardRequest::new(
        RequestMethod::parse(method.as_str()),
        uri.path(),
        session_id.clone(),
    )
    .with_form(parse_form(&body));

    let outcome = state
        .wizard
        .handle(state.store.as_ref(), &request, slug.as_deref())
        .await;

    let mut response = match outcome {
        Ok(wizard_response) => wizard_response_into_http(wizard_response),
        Err(wizard_error) => wizard_error_into_http(wizard_error),
    };

    if is_new_session {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            state.session_cookie, session_id
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

fn session_from_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim())
        .filter(|value| is_valid_session_id(value))
        .map(SessionId::from)
}

fn is_valid_session_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_SESSION_ID_BYTES
        && value
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_')
}

// Repeated fields keep the last value, like a plain HTML form post.
fn parse_form(body: &Bytes) -> FieldValues {
    url::form_urlencoded::parse(body)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}

fn wizard_response_into_http(wizard_response: WizardResponse) -> Response {
    match wizard_response {
        WizardResponse::Redirect { location } => match HeaderValue::from_str(&location) {
            Ok(value) => (StatusCode::SEE_OTHER, [(header::LOCATION, value)]).into_response(),
            Err(_) => wizard_error_into_http(WizardError::Store(anyhow::anyhow!(
                "redirect location is not a valid header value"
            ))),
        },
        WizardResponse::NoContent => StatusCode::NO_CONTENT.into_response(),
        other => (StatusCode::OK, Json(other)).into_response(),
    }
}

fn wizard_error_into_http(wizard_error: WizardError) -> Response {
    let status = match &wizard_error {
        WizardError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => {
            error!(error = %wizard_error, "wizard request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiError::from(wizard_error))).into_response()
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
