//! Eligibility outcome storage.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{EligibilityOutcome, EligibilityType, Outcome};
use crate::translate::CaseChild;

/// Payload for an eligibility outcome inside a case request.
#[derive(Debug, Clone, Deserialize)]
pub struct EligibilityOutcomeWrite {
    /// Existing outcome to overwrite. Honoured on updates only.
    #[serde(default)]
    pub id: Option<String>,
    pub eligibility_type: EligibilityType,
    pub outcome: Outcome,
    pub answers: JsonValue,
}

/// List all eligibility outcomes attached to a case, in insertion order.
pub async fn list_for_case(
    conn: &mut SqliteConnection,
    case_id: &str,
) -> Result<Vec<EligibilityOutcome>> {
    let outcomes = sqlx::query_as::<_, EligibilityOutcome>(
        r#"
        SELECT id, case_id, eligibility_type, outcome, answers, created_at, updated_at
        FROM eligibility_outcomes
        WHERE case_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(case_id)
    .fetch_all(conn)
    .await?;

    Ok(outcomes)
}

impl CaseChild for EligibilityOutcome {
    const ENTITY: &'static str = "EligibilityOutcome";
    const TABLE: &'static str = "eligibility_outcomes";

    type Write = EligibilityOutcomeWrite;

    fn write_id(write: &EligibilityOutcomeWrite) -> Option<&str> {
        write.id.as_deref()
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(conn: &mut SqliteConnection, id: &str) -> Result<Option<EligibilityOutcome>> {
        let outcome = sqlx::query_as::<_, EligibilityOutcome>(
            r#"
            SELECT id, case_id, eligibility_type, outcome, answers, created_at, updated_at
            FROM eligibility_outcomes
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(outcome)
    }

    async fn insert(
        conn: &mut SqliteConnection,
        case_id: &str,
        write: &EligibilityOutcomeWrite,
    ) -> Result<EligibilityOutcome> {
        let outcome = EligibilityOutcome {
            id: Uuid::new_v4().to_string(),
            case_id: case_id.to_string(),
            eligibility_type: write.eligibility_type,
            outcome: write.outcome,
            answers: Json(write.answers.clone()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO eligibility_outcomes (id, case_id, eligibility_type, outcome,
                                              answers, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&outcome.id)
        .bind(&outcome.case_id)
        .bind(outcome.eligibility_type)
        .bind(outcome.outcome)
        .bind(&outcome.answers)
        .bind(outcome.created_at)
        .bind(outcome.updated_at)
        .execute(conn)
        .await?;

        Ok(outcome)
    }

    async fn update(
        conn: &mut SqliteConnection,
        case_id: &str,
        existing: &EligibilityOutcome,
        write: &EligibilityOutcomeWrite,
    ) -> Result<EligibilityOutcome> {
        let outcome = EligibilityOutcome {
            id: existing.id.clone(),
            case_id: case_id.to_string(),
            eligibility_type: write.eligibility_type,
            outcome: write.outcome,
            answers: Json(write.answers.clone()),
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            UPDATE eligibility_outcomes
            SET case_id = ?, eligibility_type = ?, outcome = ?, answers = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&outcome.case_id)
        .bind(outcome.eligibility_type)
        .bind(outcome.outcome)
        .bind(&outcome.answers)
        .bind(outcome.updated_at)
        .bind(&outcome.id)
        .execute(conn)
        .await?;

        Ok(outcome)
    }
}
