//! Case adaptations storage. At most one adaptations record per case.

use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Adaptation, CaseAdaptations, Language};
use crate::translate::CaseChild;

/// Payload for case adaptations inside a case request.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseAdaptationsWrite {
    /// Existing record to overwrite. Honoured on updates only.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub needed_adaptations: Option<Vec<Adaptation>>,
    #[serde(default)]
    pub languages: Option<Vec<Language>>,
}

/// Fetch the adaptations record attached to a case, if any.
pub async fn get_for_case(
    conn: &mut SqliteConnection,
    case_id: &str,
) -> Result<Option<CaseAdaptations>> {
    let adaptations = sqlx::query_as::<_, CaseAdaptations>(
        r#"
        SELECT id, case_id, needed_adaptations, languages, created_at, updated_at
        FROM case_adaptations
        WHERE case_id = ?
        "#,
    )
    .bind(case_id)
    .fetch_optional(conn)
    .await?;

    Ok(adaptations)
}

impl CaseChild for CaseAdaptations {
    const ENTITY: &'static str = "CaseAdaptations";
    const TABLE: &'static str = "case_adaptations";

    type Write = CaseAdaptationsWrite;

    fn write_id(write: &CaseAdaptationsWrite) -> Option<&str> {
        write.id.as_deref()
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(conn: &mut SqliteConnection, id: &str) -> Result<Option<CaseAdaptations>> {
        let adaptations = sqlx::query_as::<_, CaseAdaptations>(
            r#"
            SELECT id, case_id, needed_adaptations, languages, created_at, updated_at
            FROM case_adaptations
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(adaptations)
    }

    async fn insert(
        conn: &mut SqliteConnection,
        case_id: &str,
        write: &CaseAdaptationsWrite,
    ) -> Result<CaseAdaptations> {
        let adaptations = CaseAdaptations {
            id: Uuid::new_v4().to_string(),
            case_id: case_id.to_string(),
            needed_adaptations: write.needed_adaptations.clone().map(Json),
            languages: write.languages.clone().map(Json),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO case_adaptations (id, case_id, needed_adaptations, languages,
                                          created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&adaptations.id)
        .bind(&adaptations.case_id)
        .bind(&adaptations.needed_adaptations)
        .bind(&adaptations.languages)
        .bind(adaptations.created_at)
        .bind(adaptations.updated_at)
        .execute(conn)
        .await?;

        Ok(adaptations)
    }

    async fn update(
        conn: &mut SqliteConnection,
        case_id: &str,
        existing: &CaseAdaptations,
        write: &CaseAdaptationsWrite,
    ) -> Result<CaseAdaptations> {
        let adaptations = CaseAdaptations {
            id: existing.id.clone(),
            case_id: case_id.to_string(),
            needed_adaptations: write.needed_adaptations.clone().map(Json),
            languages: write.languages.clone().map(Json),
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            UPDATE case_adaptations
            SET case_id = ?, needed_adaptations = ?, languages = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&adaptations.case_id)
        .bind(&adaptations.needed_adaptations)
        .bind(&adaptations.languages)
        .bind(adaptations.updated_at)
        .bind(&adaptations.id)
        .execute(conn)
        .await?;

        Ok(adaptations)
    }
}
