//! Case tracker storage. At most one tracker per case.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::models::CaseTracker;
use crate::translate::CaseChild;

/// Payload for a case tracker inside a case request.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseTrackerWrite {
    /// Existing tracker to overwrite. Honoured on updates only.
    #[serde(default)]
    pub id: Option<String>,
    pub gtm_anon_id: String,
    pub journey: JsonValue,
}

/// Fetch the tracker attached to a case, if any.
pub async fn get_for_case(
    conn: &mut SqliteConnection,
    case_id: &str,
) -> Result<Option<CaseTracker>> {
    let tracker = sqlx::query_as::<_, CaseTracker>(
        r#"
        SELECT id, case_id, gtm_anon_id, journey, created_at, updated_at
        FROM case_tracker
        WHERE case_id = ?
        "#,
    )
    .bind(case_id)
    .fetch_optional(conn)
    .await?;

    Ok(tracker)
}

impl CaseChild for CaseTracker {
    const ENTITY: &'static str = "CaseTracker";
    const TABLE: &'static str = "case_tracker";

    type Write = CaseTrackerWrite;

    fn write_id(write: &CaseTrackerWrite) -> Option<&str> {
        write.id.as_deref()
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(conn: &mut SqliteConnection, id: &str) -> Result<Option<CaseTracker>> {
        let tracker = sqlx::query_as::<_, CaseTracker>(
            r#"
            SELECT id, case_id, gtm_anon_id, journey, created_at, updated_at
            FROM case_tracker
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(tracker)
    }

    async fn insert(
        conn: &mut SqliteConnection,
        case_id: &str,
        write: &CaseTrackerWrite,
    ) -> Result<CaseTracker> {
        let tracker = CaseTracker {
            id: Uuid::new_v4().to_string(),
            case_id: case_id.to_string(),
            gtm_anon_id: write.gtm_anon_id.clone(),
            journey: Json(write.journey.clone()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO case_tracker (id, case_id, gtm_anon_id, journey, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tracker.id)
        .bind(&tracker.case_id)
        .bind(&tracker.gtm_anon_id)
        .bind(&tracker.journey)
        .bind(tracker.created_at)
        .bind(tracker.updated_at)
        .execute(conn)
        .await?;

        Ok(tracker)
    }

    async fn update(
        conn: &mut SqliteConnection,
        case_id: &str,
        existing: &CaseTracker,
        write: &CaseTrackerWrite,
    ) -> Result<CaseTracker> {
        let tracker = CaseTracker {
            id: existing.id.clone(),
            case_id: case_id.to_string(),
            gtm_anon_id: write.gtm_anon_id.clone(),
            journey: Json(write.journey.clone()),
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            UPDATE case_tracker
            SET case_id = ?, gtm_anon_id = ?, journey = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&tracker.case_id)
        .bind(&tracker.gtm_anon_id)
        .bind(&tracker.journey)
        .bind(tracker.updated_at)
        .bind(&tracker.id)
        .execute(conn)
        .await?;

        Ok(tracker)
    }
}
