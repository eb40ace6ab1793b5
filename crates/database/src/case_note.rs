//! Case note storage.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CaseNote, NoteType};
use crate::translate::CaseChild;

/// Payload for a note inside a case request.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseNoteWrite {
    /// Existing note to overwrite. Honoured on updates only.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub note_type: NoteType,
    #[serde(default)]
    pub content: String,
}

/// List all notes attached to a case, in insertion order.
pub async fn list_for_case(conn: &mut SqliteConnection, case_id: &str) -> Result<Vec<CaseNote>> {
    let notes = sqlx::query_as::<_, CaseNote>(
        r#"
        SELECT id, case_id, note_type, content, created_at, updated_at
        FROM case_notes
        WHERE case_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(case_id)
    .fetch_all(conn)
    .await?;

    Ok(notes)
}

impl CaseChild for CaseNote {
    const ENTITY: &'static str = "CaseNote";
    const TABLE: &'static str = "case_notes";

    type Write = CaseNoteWrite;

    fn write_id(write: &CaseNoteWrite) -> Option<&str> {
        write.id.as_deref()
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(conn: &mut SqliteConnection, id: &str) -> Result<Option<CaseNote>> {
        let note = sqlx::query_as::<_, CaseNote>(
            r#"
            SELECT id, case_id, note_type, content, created_at, updated_at
            FROM case_notes
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(note)
    }

    async fn insert(
        conn: &mut SqliteConnection,
        case_id: &str,
        write: &CaseNoteWrite,
    ) -> Result<CaseNote> {
        let note = CaseNote {
            id: Uuid::new_v4().to_string(),
            case_id: case_id.to_string(),
            note_type: write.note_type,
            content: write.content.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO case_notes (id, case_id, note_type, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&note.id)
        .bind(&note.case_id)
        .bind(note.note_type)
        .bind(&note.content)
        .bind(note.created_at)
        .bind(note.updated_at)
        .execute(conn)
        .await?;

        Ok(note)
    }

    async fn update(
        conn: &mut SqliteConnection,
        case_id: &str,
        existing: &CaseNote,
        write: &CaseNoteWrite,
    ) -> Result<CaseNote> {
        let note = CaseNote {
            id: existing.id.clone(),
            case_id: case_id.to_string(),
            note_type: write.note_type,
            content: write.content.clone(),
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            UPDATE case_notes
            SET case_id = ?, note_type = ?, content = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&note.case_id)
        .bind(note.note_type)
        .bind(&note.content)
        .bind(note.updated_at)
        .bind(&note.id)
        .execute(conn)
        .await?;

        Ok(note)
    }
}
