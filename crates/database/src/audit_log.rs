//! Append-only audit log.
//!
//! Events are recorded and listed; there are no update or delete
//! operations by construction.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AuditLogEvent, EventType};

/// Record an audit event. Username and case are both optional.
pub async fn record_event(
    pool: &SqlitePool,
    event_type: EventType,
    username: Option<&str>,
    case_id: Option<&str>,
) -> Result<AuditLogEvent> {
    let event = AuditLogEvent {
        id: Uuid::new_v4().to_string(),
        event_type,
        username: username.map(str::to_string),
        case_id: case_id.map(str::to_string),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO audit_log (id, event_type, username, case_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&event.id)
    .bind(event.event_type)
    .bind(&event.username)
    .bind(&event.case_id)
    .bind(event.created_at)
    .bind(event.updated_at)
    .execute(pool)
    .await?;

    Ok(event)
}

/// List all audit events, oldest first.
pub async fn list_events(pool: &SqlitePool) -> Result<Vec<AuditLogEvent>> {
    let events = sqlx::query_as::<_, AuditLogEvent>(
        r#"
        SELECT id, event_type, username, case_id, created_at, updated_at
        FROM audit_log
        ORDER BY rowid
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(events)
}

/// List the audit events associated with a case, oldest first.
pub async fn list_events_for_case(pool: &SqlitePool, case_id: &str) -> Result<Vec<AuditLogEvent>> {
    let events = sqlx::query_as::<_, AuditLogEvent>(
        r#"
        SELECT id, event_type, username, case_id, created_at, updated_at
        FROM audit_log
        WHERE case_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(case_id)
    .fetch_all(pool)
    .await?;

    Ok(events)
}
