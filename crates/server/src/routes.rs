use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Body,
    extract::{rejection::FormRejection, Query, State},
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use slashgate_core::{
    config::AppConfig,
    errors::{ApplicationError, InterfaceError},
    setup::{LANDING_PATH, MESSAGE_ACTION_PATH, SLASH_COMMAND_PATH},
};
use slashgate_slack::{
    install::InstallRedirect, InstallFlow, PlatformResponse, Route, SlackGateway, SlackRequest,
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};
use uuid::Uuid;

use crate::health;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gateway: SlackGateway,
    pub install: InstallFlow,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(SLASH_COMMAND_PATH, get(ssl_check).post(slash_command))
        .route(MESSAGE_ACTION_PATH, post(message_action))
        .route(LANDING_PATH, get(landing))
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

struct SlackResponse(PlatformResponse);

impl IntoResponse for SlackResponse {
    fn into_response(self) -> Response {
        let SlackResponse(platform) = self;
        let status =
            StatusCode::from_u16(platform.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, platform.body).into_response();
        match platform.content_type {
            Some(content_type) => {
                response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
            None => {
                response.headers_mut().remove(CONTENT_TYPE);
            }
        }
        response
    }
}

async fn ssl_check(State(state): State<AppState>) -> SlackResponse {
    SlackResponse(state.gateway.ssl_check())
}

async fn slash_command(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> SlackResponse {
    let request = SlackRequest::slash_command(form_fields(form, Route::SlashCommand));
    SlackResponse(state.gateway.handle_slash_command(&request, &state.config.slack).await)
}

async fn message_action(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> SlackResponse {
    let request = SlackRequest::message_action(form_fields(form, Route::MessageAction));
    SlackResponse(state.gateway.handle_message_action(&request, &state.config.slack).await)
}

// An undecodable body is treated as an empty form so it fails verification.
fn form_fields(
    form: Result<Form<HashMap<String, String>>, FormRejection>,
    route: Route,
) -> HashMap<String, String> {
    match form {
        Ok(Form(fields)) => fields,
        Err(rejection) => {
            warn!(
                event_name = "ingress.slack.form_rejected",
                route = route.as_str(),
                error = %rejection,
                "request body is not a url-encoded form"
            );
            HashMap::new()
        }
    }
}

async fn landing(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let request = SlackRequest::landing(query);
    let code = request.query.get("code").map(String::as_str);

    match state.install.handle_oauth_landing(code, state.config.slack.install_credentials()).await {
        Ok(redirect) => redirect_response(&redirect),
        Err(install_error) => {
            let correlation_id = Uuid::new_v4().to_string();
            warn!(
                event_name = "install.slack.landing_failed",
                correlation_id = %correlation_id,
                error = %install_error,
                "oauth landing did not complete"
            );
            interface_error_response(ApplicationError::from(install_error).into_interface(correlation_id))
        }
    }
}

fn redirect_response(redirect: &InstallRedirect) -> Response {
    let mut builder = Response::builder().status(StatusCode::FOUND);
    for (name, value) in redirect.headers() {
        builder = builder.header(name, value);
    }

    builder.body(Body::from(redirect.location.clone())).unwrap_or_else(|build_error| {
        error!(
            event_name = "install.slack.redirect_invalid",
            error = %build_error,
            "could not build install redirect; check slack.home_page_url"
        );
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}

fn interface_error_response(error: InterfaceError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = format!("{} (correlation id: {})", error.user_message(), error.correlation_id());
    (status, body).into_response()
}
