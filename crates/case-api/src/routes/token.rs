//! Token issuance route.

use axum::extract::State;
use axum::{Form, Json};
use database::{audit_log, EventType};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{self, AuthError};
use crate::error::Result;
use crate::state::AppState;

/// Form-encoded login credentials.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Bearer token handed to the user after authentication.
#[derive(Serialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

/// Exchange a username/password pair for a signed, time-limited bearer
/// token. Both successful and failed attempts are recorded in the audit
/// log.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<Token>> {
    let Some(user) = auth::authenticate_user(&state.db, &form.username, &form.password).await?
    else {
        audit_log::record_event(
            state.db.pool(),
            EventType::UserWrongPassword,
            Some(&form.username),
            None,
        )
        .await?;
        return Err(AuthError::IncorrectCredentials.into());
    };

    let access_token = state.tokens.issue(&user.username, &user.scopes.0)?;

    audit_log::record_event(
        state.db.pool(),
        EventType::UserAuthenticated,
        Some(&user.username),
        None,
    )
    .await?;

    info!(username = %user.username, "Issued access token");

    Ok(Json(Token {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
