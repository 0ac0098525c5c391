//! Session endpoints: sign in, current identity, sign out.

use axum::{extract::State, Extension, Json};

use super::{error, success, ApiResult};
use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::{Identity, SessionInfo, SignInRequest};
use crate::AppState;

/// POST /api/session - Sign in with the pre-shared key.
pub async fn sign_in(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<SignInRequest>,
) -> ApiResult<SessionInfo> {
    let revision_id = state.store.current().revision_id;

    if caller != Caller::Psk {
        return error(
            AppError::BadRequest("Already signed in".to_string()),
            revision_id,
        );
    }
    if request.display_name.trim().is_empty() {
        return error(
            AppError::Validation("Display name is required".to_string()),
            revision_id,
        );
    }

    let identity = Identity {
        display_name: request.display_name.trim().to_string(),
        avatar_url: request.avatar_url,
    };
    let info = state.sessions.sign_in(identity, &state.store).await;
    success(info, revision_id)
}

/// GET /api/session - The signed-in identity, or null.
pub async fn current_identity(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Option<Identity>> {
    let revision_id = state.store.current().revision_id;

    let identity = match &caller {
        Caller::Session(token) => state.sessions.identity(token).await,
        Caller::Psk => None,
    };
    success(identity, revision_id)
}

/// DELETE /api/session - Sign out and drop the session's dashboard.
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<()> {
    let revision_id = state.store.current().revision_id;

    let token = match caller.session_token() {
        Ok(token) => token,
        Err(e) => return error(e, revision_id),
    };
    if state.sessions.sign_out(token).await {
        success((), revision_id)
    } else {
        error(
            AppError::NotFound("Session not found".to_string()),
            revision_id,
        )
    }
}
