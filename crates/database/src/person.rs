//! Person storage.
//!
//! Contact fields are validated on every write: postcodes are stored
//! normalized (uppercase, single internal space), phone numbers keep their
//! original formatting.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Person;
use crate::translate::CaseChild;
use crate::validation;

/// Payload for a person inside a case request.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonWrite {
    /// Existing person to overwrite. Honoured on updates only.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl PersonWrite {
    /// Validate contact fields, returning (phone_number, postcode, email)
    /// in their persisted form.
    fn validated_contact(&self) -> Result<(Option<String>, Option<String>, Option<String>)> {
        let phone_number = self
            .phone_number
            .as_deref()
            .map(validation::validate_phone_number)
            .transpose()?;

        let postcode = self
            .postcode
            .as_deref()
            .map(validation::validate_postcode)
            .transpose()?;

        if let Some(email) = self.email.as_deref() {
            validation::validate_email(email)?;
        }

        Ok((phone_number, postcode, self.email.clone()))
    }
}

/// List all people attached to a case, in insertion order.
pub async fn list_for_case(conn: &mut SqliteConnection, case_id: &str) -> Result<Vec<Person>> {
    let people = sqlx::query_as::<_, Person>(
        r#"
        SELECT id, case_id, name, address, phone_number, postcode, email,
               created_at, updated_at
        FROM persons
        WHERE case_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(case_id)
    .fetch_all(conn)
    .await?;

    Ok(people)
}

impl CaseChild for Person {
    const ENTITY: &'static str = "Person";
    const TABLE: &'static str = "persons";

    type Write = PersonWrite;

    fn write_id(write: &PersonWrite) -> Option<&str> {
        write.id.as_deref()
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(conn: &mut SqliteConnection, id: &str) -> Result<Option<Person>> {
        let person = sqlx::query_as::<_, Person>(
            r#"
            SELECT id, case_id, name, address, phone_number, postcode, email,
                   created_at, updated_at
            FROM persons
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(person)
    }

    async fn insert(
        conn: &mut SqliteConnection,
        case_id: &str,
        write: &PersonWrite,
    ) -> Result<Person> {
        let (phone_number, postcode, email) = write.validated_contact()?;

        let person = Person {
            id: Uuid::new_v4().to_string(),
            case_id: case_id.to_string(),
            name: write.name.clone(),
            address: write.address.clone(),
            phone_number,
            postcode,
            email,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO persons (id, case_id, name, address, phone_number, postcode,
                                 email, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&person.id)
        .bind(&person.case_id)
        .bind(&person.name)
        .bind(&person.address)
        .bind(&person.phone_number)
        .bind(&person.postcode)
        .bind(&person.email)
        .bind(person.created_at)
        .bind(person.updated_at)
        .execute(conn)
        .await?;

        Ok(person)
    }

    async fn update(
        conn: &mut SqliteConnection,
        case_id: &str,
        existing: &Person,
        write: &PersonWrite,
    ) -> Result<Person> {
        let (phone_number, postcode, email) = write.validated_contact()?;

        let person = Person {
            id: existing.id.clone(),
            case_id: case_id.to_string(),
            name: write.name.clone(),
            address: write.address.clone(),
            phone_number,
            postcode,
            email,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            UPDATE persons
            SET case_id = ?, name = ?, address = ?, phone_number = ?, postcode = ?,
                email = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&person.case_id)
        .bind(&person.name)
        .bind(&person.address)
        .bind(&person.phone_number)
        .bind(&person.postcode)
        .bind(&person.email)
        .bind(person.updated_at)
        .bind(&person.id)
        .execute(conn)
        .await?;

        Ok(person)
    }
}
