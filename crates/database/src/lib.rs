//! SQLite persistence layer for the casework API.
//!
//! This crate provides async database operations for cases (with their
//! nested notes, people, tracker, eligibility outcomes and adaptations),
//! users, and the audit log using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{case, case::CaseWrite, models::CaseType, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:casework.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create a case
//!     let write = CaseWrite {
//!         case_type: Some(CaseType::Cla),
//!         ..CaseWrite::default()
//!     };
//!     let record = case::create_case(db.pool(), &write).await?;
//!     println!("created case {}", record.case.id);
//!
//!     Ok(())
//! }
//! ```

pub mod audit_log;
pub mod case;
pub mod case_adaptations;
pub mod case_note;
pub mod case_tracker;
pub mod eligibility_outcome;
pub mod error;
pub mod models;
pub mod person;
pub mod translate;
pub mod user;
pub mod validation;

pub use case::{CaseRecord, CaseWrite};
pub use error::{DatabaseError, Result};
pub use models::{
    AuditLogEvent, Case, CaseAdaptations, CaseNote, CaseTracker, CaseType, EligibilityOutcome,
    EventType, NoteType, Person, Scope, User,
};
pub use translate::WriteMode;
pub use validation::ValidationError;

// Callers build and read model fields like `User::scopes` through this
// wrapper; re-exported so they don't need their own sqlx dependency.
pub use sqlx::types::Json;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/casework.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    ///
    /// Foreign key enforcement is always enabled; the cascade from cases
    /// to their children depends on it.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_user_crud() {
        let db = test_db().await;

        // Create
        let user = User {
            username: "johndoe".to_string(),
            hashed_password: "$argon2id$fake".to_string(),
            email: Some("johndoe@example.com".to_string()),
            full_name: Some("John Doe".to_string()),
            disabled: false,
            scopes: Json(vec![Scope::Read, Scope::Create]),
        };
        user::create_user(db.pool(), &user).await.unwrap();

        // Duplicate usernames are rejected
        let result = user::create_user(db.pool(), &user).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));

        // Read
        let fetched = user::get_user(db.pool(), "johndoe").await.unwrap();
        assert_eq!(fetched.full_name.as_deref(), Some("John Doe"));
        assert_eq!(fetched.scopes.0, vec![Scope::Read, Scope::Create]);
        assert!(!fetched.disabled);

        // Disable
        user::set_disabled(db.pool(), "johndoe", true).await.unwrap();
        let fetched = user::get_user(db.pool(), "johndoe").await.unwrap();
        assert!(fetched.disabled);

        // List
        let users = user::list_users(db.pool()).await.unwrap();
        assert_eq!(users.len(), 1);

        // Delete
        user::delete_user(db.pool(), "johndoe").await.unwrap();
        let result = user::get_user(db.pool(), "johndoe").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_audit_log_append_and_list() {
        let db = test_db().await;

        audit_log::record_event(db.pool(), EventType::Other, None, None)
            .await
            .unwrap();
        audit_log::record_event(db.pool(), EventType::Error, None, None)
            .await
            .unwrap();

        let events = audit_log::list_events(db.pool()).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::Other);
        assert_eq!(events[1].event_type, EventType::Error);
        assert!(events[0].username.is_none());
        assert!(events[0].case_id.is_none());
    }

    #[tokio::test]
    async fn test_audit_log_survives_case_deletion() {
        let db = test_db().await;

        let record = case::create_case(
            db.pool(),
            &CaseWrite {
                case_type: Some(CaseType::Cla),
                ..CaseWrite::default()
            },
        )
        .await
        .unwrap();

        audit_log::record_event(
            db.pool(),
            EventType::CaseCreated,
            None,
            Some(&record.case.id),
        )
        .await
        .unwrap();

        case::delete_case(db.pool(), &record.case.id).await.unwrap();

        // The event row remains and still names the deleted case.
        let events = audit_log::list_events(db.pool()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].case_id.as_deref(), Some(record.case.id.as_str()));
    }
}
