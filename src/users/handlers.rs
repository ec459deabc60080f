use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

use super::dto::{CreateUserRequest, UpdateUserRequest};
use super::repo::User;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// GET /users: all active users. An empty list is a normal 200.
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = User::list_active(&state.db).await?;
    Ok(Json(users))
}

/// POST /users: validate, pre-check uniqueness (username before email),
/// then insert. A concurrent create that slips past the pre-check still
/// comes back as 409 via the unique-index translation in `ApiError`.
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    if User::username_taken(&state.db, &payload.username).await? {
        warn!(username = %payload.username, "username already held by an active user");
        return Err(ApiError::Conflict("Username exists"));
    }
    if User::email_taken(&state.db, &payload.email).await? {
        warn!(email = %payload.email, "email already held by an active user");
        return Err(ApiError::Conflict("Email exists"));
    }

    let user = User::create(&state.db, &payload.username, &payload.email).await?;
    info!(user_id = %user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/:id
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<User>, ApiError> {
    let Path(id) = id?;
    let user = User::find_active(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;
    Ok(Json(user))
}

/// PUT /users/:id is fetch-then-save. Uniqueness is only re-checked when the
/// submitted username differs from the current one, so a same-name PUT is a
/// plain touch that still refreshes `updated_at`.
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Path(id) = id?;
    let current = User::find_active(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    let Json(payload) = payload?;
    payload.validate()?;

    let username = match payload.username() {
        Some(new) if new != current.username => {
            if User::username_taken(&state.db, new).await? {
                warn!(username = %new, "username already held by an active user");
                return Err(ApiError::Conflict("Username taken"));
            }
            new.to_string()
        }
        _ => current.username.clone(),
    };

    let user = User::save_username(&state.db, id, &username)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;
    info!(user_id = %user.id, username = %user.username, "user updated");
    Ok(Json(user))
}

/// DELETE /users/:id: soft delete, no body on success.
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    if !User::soft_delete(&state.db, id).await? {
        return Err(ApiError::NotFound("User not found"));
    }
    info!(user_id = %id, "user soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod boundary_tests {
    use crate::app::build_app;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    // These requests are rejected before any query runs, so the lazy pool
    // in AppState::fake never connects.

    async fn error_message(res: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        body["error"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn get_with_invalid_id_is_bad_request() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/users/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(res).await, "Invalid ID");
    }

    #[tokio::test]
    async fn delete_with_invalid_id_is_bad_request() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/users/42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_with_malformed_body_is_bad_request() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/users")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(!error_message(res).await.is_empty());
    }

    #[tokio::test]
    async fn create_with_missing_email_is_bad_request() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/users")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"alice"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_with_short_username_is_bad_request() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/users")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"ab","email":"a@x.com"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(res).await, "username must be 3-80 characters");
    }

    #[tokio::test]
    async fn create_with_invalid_email_is_bad_request() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/users")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"alice","email":"nope"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(res).await, "invalid email");
    }
}
