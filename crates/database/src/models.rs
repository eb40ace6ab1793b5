//! Database models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::FromRow;

/// The service a case was opened under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum CaseType {
    /// Check if your client qualifies for legal aid.
    #[serde(rename = "Check if your client qualifies for legal aid")]
    #[sqlx(rename = "Check if your client qualifies for legal aid")]
    Ccq,
    /// Civil Legal Advice.
    #[serde(rename = "Civil Legal Advice")]
    #[sqlx(rename = "Civil Legal Advice")]
    Cla,
}

/// Who or what a case note originates from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum NoteType {
    Adaptation,
    Personal,
    Provider,
    Caseworker,
    Operator,
    #[default]
    Other,
}

/// The eligibility check that produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum EligibilityType {
    Ccq,
    Means,
    Cfe,
}

/// Result of an eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Outcome {
    #[serde(rename = "In scope")]
    #[sqlx(rename = "In scope")]
    InScope,
    #[serde(rename = "Out of scope")]
    #[sqlx(rename = "Out of scope")]
    OutOfScope,
    Unknown,
}

/// Communication adaptations a client may need, based on the CHS
/// adaptation details list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Adaptation {
    #[serde(rename = "BSL - Webcam")]
    BslWebcam,
    Minicom,
    #[serde(rename = "Text Relay")]
    TextRelay,
    Skype,
    #[serde(rename = "Callback Preference")]
    CallbackPreference,
}

/// Languages the service operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "EN")]
    En,
    #[serde(rename = "CY")]
    Cy,
}

/// A named permission embedded in a bearer token and checked per-route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Read,
    Create,
    Update,
    Delete,
}

/// Audit log event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum EventType {
    #[serde(rename = "Case Created")]
    #[sqlx(rename = "Case Created")]
    CaseCreated,
    #[serde(rename = "Case Updated")]
    #[sqlx(rename = "Case Updated")]
    CaseUpdated,
    #[serde(rename = "Case Deleted")]
    #[sqlx(rename = "Case Deleted")]
    CaseDeleted,
    #[serde(rename = "User Authenticated")]
    #[sqlx(rename = "User Authenticated")]
    UserAuthenticated,
    #[serde(rename = "User Entered Incorrect Password")]
    #[sqlx(rename = "User Entered Incorrect Password")]
    UserWrongPassword,
    Error,
    Other,
}

/// Root aggregate: a legal-aid case.
///
/// Owns its notes, people, tracker, eligibility outcomes and adaptations;
/// deleting a case cascades to all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Case {
    /// UUID, assigned at construction and never reassigned.
    pub id: String,
    pub case_type: CaseType,
    /// Caseworker the case is assigned to, if any.
    pub assigned_to: Option<String>,
    /// Fixed at construction.
    pub created_at: DateTime<Utc>,
    /// Advances on every committed mutation.
    pub updated_at: DateTime<Utc>,
}

/// A note attached to a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CaseNote {
    pub id: String,
    pub case_id: String,
    pub note_type: NoteType,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A person connected to a case.
///
/// Contact fields are validated before they are persisted; postcodes are
/// stored normalized (uppercase, single internal space).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Person {
    pub id: String,
    pub case_id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub postcode: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Journey tracking blob for a case. At most one per case.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CaseTracker {
    pub id: String,
    pub case_id: String,
    /// Anonymised tracking identifier.
    pub gtm_anon_id: String,
    /// Free-form journey data.
    pub journey: Json<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of an eligibility check run against a case.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EligibilityOutcome {
    pub id: String,
    pub case_id: String,
    pub eligibility_type: EligibilityType,
    pub outcome: Outcome,
    /// Free-form answers captured during the check.
    pub answers: Json<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Adaptations and languages recorded for a case. At most one per case.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CaseAdaptations {
    pub id: String,
    pub case_id: String,
    pub needed_adaptations: Option<Json<Vec<Adaptation>>>,
    pub languages: Option<Json<Vec<Language>>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A caseworker account.
///
/// Users are required to be authenticated to use some functionality of the
/// API. Disabled users are unable to use a token even if it is still valid.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Immutable primary key.
    pub username: String,
    /// Argon2 PHC-format hash.
    pub hashed_password: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub disabled: bool,
    /// Permissions this user's tokens carry.
    pub scopes: Json<Vec<Scope>>,
}

/// An append-only audit log row.
///
/// Events can be associated with a user and/or a case, but neither is
/// required.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEvent {
    pub id: String,
    pub event_type: EventType,
    pub username: Option<String>,
    pub case_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
