//! Case CRUD routes.
//!
//! Every handler requires a valid bearer token; create, read, update and
//! delete each additionally require the matching scope. Mutations are
//! recorded in the audit log.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use database::{audit_log, case, CaseRecord, CaseWrite, EventType, Scope};
use tracing::info;

use crate::auth;
use crate::error::Result;
use crate::state::AppState;

/// List every case with its nested children. The collection is
/// unfiltered and unpaginated.
pub async fn list_cases(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<CaseRecord>>> {
    auth::authorize(&state.db, &state.tokens, &headers, &[Scope::Read]).await?;

    let records = case::list_cases(state.db.pool()).await?;
    Ok(Json(records))
}

/// Get a single case by id.
pub async fn read_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<CaseRecord>> {
    auth::authorize(&state.db, &state.tokens, &headers, &[Scope::Read]).await?;

    let record = case::get_case(state.db.pool(), &id).await?;
    Ok(Json(record))
}

/// Create a case from a nested payload. Returns the full nested
/// representation, including ids generated for children.
pub async fn create_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(write): Json<CaseWrite>,
) -> Result<(StatusCode, Json<CaseRecord>)> {
    let user = auth::authorize(&state.db, &state.tokens, &headers, &[Scope::Create]).await?;

    let record = case::create_case(state.db.pool(), &write).await?;

    audit_log::record_event(
        state.db.pool(),
        EventType::CaseCreated,
        Some(&user.username),
        Some(&record.case.id),
    )
    .await?;

    info!(case_id = %record.case.id, username = %user.username, "Case created");

    Ok((StatusCode::CREATED, Json(record)))
}

/// Apply a partial update to a case. Fields omitted from the payload are
/// left unchanged; nested payloads naming an unknown id fail with 404
/// before anything is written.
pub async fn update_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(write): Json<CaseWrite>,
) -> Result<Json<CaseRecord>> {
    let user = auth::authorize(&state.db, &state.tokens, &headers, &[Scope::Update]).await?;

    let record = case::update_case(state.db.pool(), &id, &write).await?;

    audit_log::record_event(
        state.db.pool(),
        EventType::CaseUpdated,
        Some(&user.username),
        Some(&record.case.id),
    )
    .await?;

    info!(case_id = %record.case.id, username = %user.username, "Case updated");

    Ok(Json(record))
}

/// Delete a case. All nested children are removed by the cascade.
pub async fn delete_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let user = auth::authorize(&state.db, &state.tokens, &headers, &[Scope::Delete]).await?;

    case::delete_case(state.db.pool(), &id).await?;

    audit_log::record_event(
        state.db.pool(),
        EventType::CaseDeleted,
        Some(&user.username),
        Some(&id),
    )
    .await?;

    info!(case_id = %id, username = %user.username, "Case deleted");

    Ok(StatusCode::NO_CONTENT)
}
