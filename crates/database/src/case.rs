//! Case CRUD operations.
//!
//! Creates and updates each run in a single transaction: either every
//! scalar assignment and nested resolution lands, or none of them do. A
//! nested payload referencing an id that does not exist rolls the whole
//! request back and surfaces as [`DatabaseError::NotFound`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::case_adaptations::{self, CaseAdaptationsWrite};
use crate::case_note::{self, CaseNoteWrite};
use crate::case_tracker::{self, CaseTrackerWrite};
use crate::eligibility_outcome::{self, EligibilityOutcomeWrite};
use crate::error::{DatabaseError, Result};
use crate::models::{
    Case, CaseAdaptations, CaseNote, CaseTracker, CaseType, EligibilityOutcome, Person,
};
use crate::person::{self, PersonWrite};
use crate::translate::{resolve_collection, resolve_singleton, WriteMode};
use crate::validation::ValidationError;

/// A nested case payload.
///
/// Scalar fields are applied directly; relation fields are resolved by
/// [`crate::translate`]. A relation left as `None` (absent or JSON null)
/// is not touched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseWrite {
    /// Required when creating, optional when updating.
    #[serde(default)]
    pub case_type: Option<CaseType>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub notes: Option<Vec<CaseNoteWrite>>,
    #[serde(default)]
    pub people: Option<Vec<PersonWrite>>,
    #[serde(default)]
    pub case_tracker: Option<CaseTrackerWrite>,
    #[serde(default)]
    pub eligibility_outcomes: Option<Vec<EligibilityOutcomeWrite>>,
    #[serde(default)]
    pub case_adaptations: Option<CaseAdaptationsWrite>,
}

/// A case together with all of its children, as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct CaseRecord {
    #[serde(flatten)]
    pub case: Case,
    pub notes: Vec<CaseNote>,
    pub people: Vec<Person>,
    pub case_tracker: Option<CaseTracker>,
    pub eligibility_outcomes: Vec<EligibilityOutcome>,
    pub case_adaptations: Option<CaseAdaptations>,
}

/// Create a new case from a nested payload.
///
/// `case_type` is required; everything else defaults to empty/absent.
/// Returns the full nested record, including ids generated for children.
pub async fn create_case(pool: &SqlitePool, write: &CaseWrite) -> Result<CaseRecord> {
    let case_type = write
        .case_type
        .ok_or_else(|| ValidationError::Empty("case_type".to_string()))?;

    let mut tx = pool.begin().await?;

    let case = Case {
        id: Uuid::new_v4().to_string(),
        case_type,
        assigned_to: write.assigned_to.clone(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO cases (id, case_type, assigned_to, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&case.id)
    .bind(case.case_type)
    .bind(&case.assigned_to)
    .bind(case.created_at)
    .bind(case.updated_at)
    .execute(&mut *tx)
    .await?;

    let record = apply_relations(&mut tx, case, write, WriteMode::Create).await?;

    tx.commit().await?;

    tracing::info!(case_id = %record.case.id, "Case created");

    Ok(record)
}

/// Get a case and all of its children by id.
pub async fn get_case(pool: &SqlitePool, id: &str) -> Result<CaseRecord> {
    let mut conn = pool.acquire().await?;

    let case = fetch_case(&mut conn, id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Case",
            id: id.to_string(),
        })?;

    load_record(&mut conn, case).await
}

/// List every case with its children. The collection is unfiltered.
pub async fn list_cases(pool: &SqlitePool) -> Result<Vec<CaseRecord>> {
    let mut conn = pool.acquire().await?;

    let cases = sqlx::query_as::<_, Case>(
        r#"
        SELECT id, case_type, assigned_to, created_at, updated_at
        FROM cases
        ORDER BY created_at
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut records = Vec::with_capacity(cases.len());
    for case in cases {
        records.push(load_record(&mut conn, case).await?);
    }

    Ok(records)
}

/// Apply a partial update to an existing case.
///
/// Scalars present in the payload are assigned; omitted scalars and
/// relations are left unchanged. `updated_at` advances on every call.
pub async fn update_case(pool: &SqlitePool, id: &str, write: &CaseWrite) -> Result<CaseRecord> {
    let mut tx = pool.begin().await?;

    let existing = fetch_case(&mut tx, id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Case",
            id: id.to_string(),
        })?;

    let case = Case {
        id: existing.id,
        case_type: write.case_type.unwrap_or(existing.case_type),
        assigned_to: write.assigned_to.clone().or(existing.assigned_to),
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    sqlx::query(
        r#"
        UPDATE cases
        SET case_type = ?, assigned_to = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(case.case_type)
    .bind(&case.assigned_to)
    .bind(case.updated_at)
    .bind(&case.id)
    .execute(&mut *tx)
    .await?;

    let record = apply_relations(&mut tx, case, write, WriteMode::Update).await?;

    tx.commit().await?;

    tracing::info!(case_id = %record.case.id, "Case updated");

    Ok(record)
}

/// Delete a case. All attached children are removed by the cascade.
pub async fn delete_case(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM cases
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Case",
            id: id.to_string(),
        });
    }

    tracing::info!(case_id = %id, "Case deleted");

    Ok(())
}

/// Count all cases.
pub async fn count_cases(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM cases
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

async fn fetch_case(conn: &mut SqliteConnection, id: &str) -> Result<Option<Case>> {
    let case = sqlx::query_as::<_, Case>(
        r#"
        SELECT id, case_type, assigned_to, created_at, updated_at
        FROM cases
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(case)
}

/// Resolve every relation present in the payload, then assemble the full
/// record, reading back the relations the payload left untouched.
async fn apply_relations(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    case: Case,
    write: &CaseWrite,
    mode: WriteMode,
) -> Result<CaseRecord> {
    let conn = &mut **tx;

    let notes = match &write.notes {
        Some(writes) => resolve_collection::<CaseNote>(conn, &case.id, writes, mode).await?,
        None => case_note::list_for_case(conn, &case.id).await?,
    };

    let people = match &write.people {
        Some(writes) => resolve_collection::<Person>(conn, &case.id, writes, mode).await?,
        None => person::list_for_case(conn, &case.id).await?,
    };

    let tracker = match &write.case_tracker {
        Some(w) => Some(resolve_singleton::<CaseTracker>(conn, &case.id, w, mode).await?),
        None => case_tracker::get_for_case(conn, &case.id).await?,
    };

    let eligibility_outcomes = match &write.eligibility_outcomes {
        Some(writes) => {
            resolve_collection::<EligibilityOutcome>(conn, &case.id, writes, mode).await?
        }
        None => eligibility_outcome::list_for_case(conn, &case.id).await?,
    };

    let adaptations = match &write.case_adaptations {
        Some(w) => Some(resolve_singleton::<CaseAdaptations>(conn, &case.id, w, mode).await?),
        None => case_adaptations::get_for_case(conn, &case.id).await?,
    };

    Ok(CaseRecord {
        case,
        notes,
        people,
        case_tracker: tracker,
        eligibility_outcomes,
        case_adaptations: adaptations,
    })
}

async fn load_record(conn: &mut SqliteConnection, case: Case) -> Result<CaseRecord> {
    let notes = case_note::list_for_case(conn, &case.id).await?;
    let people = person::list_for_case(conn, &case.id).await?;
    let case_tracker = case_tracker::get_for_case(conn, &case.id).await?;
    let eligibility_outcomes = eligibility_outcome::list_for_case(conn, &case.id).await?;
    let case_adaptations = case_adaptations::get_for_case(conn, &case.id).await?;

    Ok(CaseRecord {
        case,
        notes,
        people,
        case_tracker,
        eligibility_outcomes,
        case_adaptations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Adaptation, EligibilityType, Language, NoteType, Outcome};
    use crate::Database;
    use serde_json::json;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    /// A fully-populated case payload.
    fn nested_write() -> CaseWrite {
        CaseWrite {
            case_type: Some(CaseType::Ccq),
            notes: Some(vec![CaseNoteWrite {
                id: None,
                note_type: NoteType::Other,
                content: String::new(),
            }]),
            people: Some(vec![PersonWrite {
                id: None,
                name: "string".to_string(),
                address: Some("string".to_string()),
                phone_number: Some("0202 21212".to_string()),
                postcode: Some("SW1 1AA".to_string()),
                email: Some("user@example.com".to_string()),
            }]),
            case_tracker: Some(CaseTrackerWrite {
                id: None,
                gtm_anon_id: "string".to_string(),
                journey: json!({}),
            }),
            eligibility_outcomes: Some(vec![EligibilityOutcomeWrite {
                id: None,
                eligibility_type: EligibilityType::Ccq,
                outcome: Outcome::InScope,
                answers: json!({}),
            }]),
            case_adaptations: Some(CaseAdaptationsWrite {
                id: None,
                needed_adaptations: Some(vec![Adaptation::BslWebcam, Adaptation::TextRelay]),
                languages: Some(vec![Language::Cy, Language::En]),
            }),
            ..CaseWrite::default()
        }
    }

    async fn child_count(db: &Database, table: &str, case_id: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {table} WHERE case_id = ?"
        ))
        .bind(case_id)
        .fetch_one(db.pool())
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_minimal_case() {
        let db = test_db().await;

        let record = create_case(
            db.pool(),
            &CaseWrite {
                case_type: Some(CaseType::Cla),
                ..CaseWrite::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(record.case.case_type, CaseType::Cla);
        assert!(record.notes.is_empty());
        assert!(record.people.is_empty());
        assert!(record.case_tracker.is_none());
        assert!(record.eligibility_outcomes.is_empty());
        assert!(record.case_adaptations.is_none());
    }

    #[tokio::test]
    async fn test_minimal_case_serializes_with_empty_children() {
        let db = test_db().await;

        let record = create_case(
            db.pool(),
            &CaseWrite {
                case_type: Some(CaseType::Cla),
                ..CaseWrite::default()
            },
        )
        .await
        .unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["case_type"], json!("Civil Legal Advice"));
        assert_eq!(value["notes"], json!([]));
        assert_eq!(value["people"], json!([]));
        assert!(value["case_tracker"].is_null());
        assert_eq!(value["eligibility_outcomes"], json!([]));
        assert!(value["case_adaptations"].is_null());
        assert!(value["id"].is_string());
        assert!(value["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_create_requires_case_type() {
        let db = test_db().await;

        let result = create_case(db.pool(), &CaseWrite::default()).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
        assert_eq!(count_cases(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_nested_case() {
        let db = test_db().await;

        let record = create_case(db.pool(), &nested_write()).await.unwrap();

        assert_eq!(record.notes.len(), 1);
        assert_eq!(record.notes[0].note_type, NoteType::Other);
        assert_eq!(record.people.len(), 1);
        assert_eq!(record.people[0].name, "string");
        assert_eq!(record.people[0].case_id, record.case.id);
        assert!(!record.people[0].id.is_empty());
        let tracker = record.case_tracker.as_ref().unwrap();
        assert_eq!(tracker.gtm_anon_id, "string");
        assert_eq!(record.eligibility_outcomes.len(), 1);
        assert_eq!(record.eligibility_outcomes[0].outcome, Outcome::InScope);
        let adaptations = record.case_adaptations.as_ref().unwrap();
        assert_eq!(
            adaptations.needed_adaptations.as_ref().unwrap().0,
            vec![Adaptation::BslWebcam, Adaptation::TextRelay]
        );

        // The stored record round-trips
        let fetched = get_case(db.pool(), &record.case.id).await.unwrap();
        assert_eq!(fetched.people, record.people);
        assert_eq!(fetched.notes, record.notes);
    }

    #[tokio::test]
    async fn test_person_postcode_normalized() {
        let db = test_db().await;

        let mut write = nested_write();
        write.people.as_mut().unwrap()[0].postcode = Some("sw1a1aa".to_string());
        let record = create_case(db.pool(), &write).await.unwrap();

        assert_eq!(record.people[0].postcode.as_deref(), Some("SW1A 1AA"));
    }

    #[tokio::test]
    async fn test_person_invalid_postcode_rejected() {
        let db = test_db().await;

        let mut write = nested_write();
        write.people.as_mut().unwrap()[0].postcode = Some("SW1A 1A".to_string());
        let result = create_case(db.pool(), &write).await;

        assert!(matches!(result, Err(DatabaseError::Validation(_))));
        // Nothing committed
        assert_eq!(count_cases(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_provided_collections() {
        let db = test_db().await;
        let original = create_case(db.pool(), &nested_write()).await.unwrap();

        let update = CaseWrite {
            case_type: Some(CaseType::Cla),
            notes: Some(vec![]),
            people: Some(vec![
                PersonWrite {
                    id: None,
                    name: "John Doe".to_string(),
                    address: Some("102 Petty France".to_string()),
                    phone_number: Some("11111111".to_string()),
                    postcode: Some("SW1 1AA".to_string()),
                    email: Some("user1@example.com".to_string()),
                },
                PersonWrite {
                    id: None,
                    name: "Jane Doe".to_string(),
                    address: Some("10SC Canary Wharf".to_string()),
                    phone_number: Some("222222222".to_string()),
                    postcode: Some("SW2 2AA".to_string()),
                    email: Some("user2@example.com".to_string()),
                },
            ]),
            ..CaseWrite::default()
        };

        let updated = update_case(db.pool(), &original.case.id, &update)
            .await
            .unwrap();

        assert_eq!(updated.case.case_type, CaseType::Cla);
        assert!(updated.notes.is_empty());
        assert_eq!(updated.people.len(), 2);
        assert_eq!(updated.people[0].name, "John Doe");
        assert_eq!(updated.people[1].name, "Jane Doe");

        // The original person was not referenced, so it is gone
        assert_eq!(child_count(&db, "persons", &original.case.id).await, 2);
        assert_eq!(child_count(&db, "case_notes", &original.case.id).await, 0);

        // Relations omitted from the payload are unchanged
        let tracker = updated.case_tracker.as_ref().unwrap();
        assert_eq!(tracker.gtm_anon_id, "string");
        assert_eq!(updated.eligibility_outcomes.len(), 1);
        assert_eq!(
            updated.eligibility_outcomes[0].id,
            original.eligibility_outcomes[0].id
        );
    }

    #[tokio::test]
    async fn test_update_existing_person_keeps_created_at() {
        let db = test_db().await;
        let original = create_case(db.pool(), &nested_write()).await.unwrap();
        let person = &original.people[0];

        let update = CaseWrite {
            people: Some(vec![PersonWrite {
                id: Some(person.id.clone()),
                name: "John Doe".to_string(),
                address: Some("102 Petty France".to_string()),
                phone_number: Some("11111111".to_string()),
                postcode: Some("SW1 1AA".to_string()),
                email: Some("user1@example.com".to_string()),
            }]),
            ..CaseWrite::default()
        };

        let updated = update_case(db.pool(), &original.case.id, &update)
            .await
            .unwrap();

        assert_eq!(updated.people.len(), 1);
        assert_eq!(updated.people[0].id, person.id);
        assert_eq!(updated.people[0].name, "John Doe");
        assert_eq!(updated.people[0].created_at, person.created_at);
        assert!(updated.people[0].updated_at > person.updated_at);

        // The case itself omitted case_type, so it is unchanged
        assert_eq!(updated.case.case_type, CaseType::Ccq);
        assert!(updated.case.updated_at > original.case.updated_at);
        assert_eq!(updated.case.created_at, original.case.created_at);
    }

    #[tokio::test]
    async fn test_update_unknown_nested_id_rolls_back() {
        let db = test_db().await;
        let original = create_case(db.pool(), &nested_write()).await.unwrap();

        let update = CaseWrite {
            case_type: Some(CaseType::Cla),
            people: Some(vec![PersonWrite {
                id: Some("00000000-0000-0000-0000-000000000000".to_string()),
                name: "John Doe".to_string(),
                address: None,
                phone_number: None,
                postcode: None,
                email: None,
            }]),
            ..CaseWrite::default()
        };

        let result = update_case(db.pool(), &original.case.id, &update).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));

        // Nothing was mutated, including the scalar assignment
        let fetched = get_case(db.pool(), &original.case.id).await.unwrap();
        assert_eq!(fetched.case.case_type, CaseType::Ccq);
        assert_eq!(fetched.case.updated_at, original.case.updated_at);
        assert_eq!(fetched.people, original.people);
    }

    #[tokio::test]
    async fn test_update_unknown_case_not_found() {
        let db = test_db().await;

        let result = update_case(
            db.pool(),
            "00000000-0000-0000-0000-000000000000",
            &CaseWrite::default(),
        )
        .await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_case_cascades_to_children() {
        let db = test_db().await;
        let record = create_case(db.pool(), &nested_write()).await.unwrap();
        let case_id = record.case.id.clone();

        delete_case(db.pool(), &case_id).await.unwrap();

        let result = get_case(db.pool(), &case_id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));

        for table in [
            "case_notes",
            "persons",
            "case_tracker",
            "eligibility_outcomes",
            "case_adaptations",
        ] {
            assert_eq!(child_count(&db, table, &case_id).await, 0, "{table}");
        }
    }

    #[tokio::test]
    async fn test_delete_child_keeps_case() {
        let db = test_db().await;
        let record = create_case(db.pool(), &nested_write()).await.unwrap();

        sqlx::query("DELETE FROM case_notes WHERE id = ?")
            .bind(&record.notes[0].id)
            .execute(db.pool())
            .await
            .unwrap();

        let fetched = get_case(db.pool(), &record.case.id).await.unwrap();
        assert!(fetched.notes.is_empty());
        assert_eq!(fetched.people.len(), 1);
    }

    #[tokio::test]
    async fn test_create_ignores_nested_ids() {
        let db = test_db().await;

        let mut write = nested_write();
        write.people.as_mut().unwrap()[0].id =
            Some("11111111-1111-1111-1111-111111111111".to_string());
        let record = create_case(db.pool(), &write).await.unwrap();

        // A fresh id was minted for the person
        assert_ne!(
            record.people[0].id,
            "11111111-1111-1111-1111-111111111111"
        );
    }

    #[tokio::test]
    async fn test_list_cases() {
        let db = test_db().await;
        assert!(list_cases(db.pool()).await.unwrap().is_empty());

        create_case(db.pool(), &nested_write()).await.unwrap();
        create_case(
            db.pool(),
            &CaseWrite {
                case_type: Some(CaseType::Cla),
                ..CaseWrite::default()
            },
        )
        .await
        .unwrap();

        let records = list_cases(db.pool()).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].people.len(), 1);
        assert!(records[1].people.is_empty());
    }
}
