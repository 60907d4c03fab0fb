//! Login route
//!
//! `POST /User/login` with body `{username, secret}`:
//! - 200 with `"Bearer <token>"` when the credentials are accepted
//! - 401 when the secret is wrong
//! - 404 when the user is unknown

use crate::core::auth::{LoginRequest, LoginService};
use crate::core::error::CrudError;
use crate::server::response::ApiResponse;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

/// Route segment the login endpoint lives under
pub const LOGIN_PATH: &str = "/User/login";

/// Build the login routes for `service`
pub fn login_routes(service: LoginService) -> Router {
    Router::new()
        .route(LOGIN_PATH, post(login))
        .with_state(service)
}

async fn login(
    State(service): State<LoginService>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, CrudError> {
    if request.username.is_empty() || request.secret.is_empty() {
        return Ok(
            ApiResponse::new("Username and secret must not be empty", ())
                .with_status(StatusCode::BAD_REQUEST),
        );
    }

    let response = match service.login(&request).await? {
        None => (StatusCode::NOT_FOUND, Json("User not found")).into_response(),
        Some(result) => match result.data {
            Some(token) if result.rows_affected == 1 => {
                Json(format!("Bearer {}", token)).into_response()
            }
            _ => (StatusCode::UNAUTHORIZED, Json("Invalid username or secret")).into_response(),
        },
    };

    Ok(response)
}
