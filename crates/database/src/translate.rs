//! Resolution of nested request payloads into child entity rows.
//!
//! A case payload mixes scalar fields with related-entity fields. The
//! scalar fields are applied directly by [`crate::case`]; the related
//! fields are resolved here, one level deep (case to direct children,
//! never grandchildren).
//!
//! Resolution of a single child payload:
//! - carries an `id` and the caller is updating: the row must already
//!   exist (otherwise [`DatabaseError::NotFound`], and the surrounding
//!   transaction rolls back), and its fields are overwritten in place,
//!   keeping `created_at` and advancing `updated_at`;
//! - no `id`, or the caller is creating: a brand-new row is minted.
//!
//! A provided collection is the complete new state for that relation:
//! rows previously attached to the case but not referenced by the payload
//! are deleted afterwards. An absent relation is never touched.

use sqlx::SqliteConnection;

use crate::error::{DatabaseError, Result};

/// Whether a payload is creating a new case or updating an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

/// A child entity of a case that can be resolved from a request payload.
///
/// Implementations supply the per-table SQL; the resolution protocol
/// itself lives in [`resolve_collection`] and [`resolve_singleton`].
pub(crate) trait CaseChild: Sized {
    /// Entity name used in NotFound errors.
    const ENTITY: &'static str;
    /// Table name, used to clear unreferenced rows.
    const TABLE: &'static str;

    /// The request payload this entity is resolved from.
    type Write;

    /// Identifier carried by the payload, if any.
    fn write_id(write: &Self::Write) -> Option<&str>;

    /// Identifier of a resolved row.
    fn id(&self) -> &str;

    async fn fetch(conn: &mut SqliteConnection, id: &str) -> Result<Option<Self>>;

    async fn insert(
        conn: &mut SqliteConnection,
        case_id: &str,
        write: &Self::Write,
    ) -> Result<Self>;

    async fn update(
        conn: &mut SqliteConnection,
        case_id: &str,
        existing: &Self,
        write: &Self::Write,
    ) -> Result<Self>;
}

/// Resolve a collection relation (notes, people, eligibility outcomes).
pub(crate) async fn resolve_collection<C: CaseChild>(
    conn: &mut SqliteConnection,
    case_id: &str,
    writes: &[C::Write],
    mode: WriteMode,
) -> Result<Vec<C>> {
    let mut resolved = Vec::with_capacity(writes.len());
    for write in writes {
        resolved.push(resolve_one::<C>(conn, case_id, write, mode).await?);
    }

    let keep: Vec<&str> = resolved.iter().map(|child| child.id()).collect();
    delete_unreferenced(conn, C::TABLE, case_id, &keep).await?;

    Ok(resolved)
}

/// Resolve a zero-or-one relation (case tracker, case adaptations).
pub(crate) async fn resolve_singleton<C: CaseChild>(
    conn: &mut SqliteConnection,
    case_id: &str,
    write: &C::Write,
    mode: WriteMode,
) -> Result<C> {
    let resolved = resolve_one::<C>(conn, case_id, write, mode).await?;
    delete_unreferenced(conn, C::TABLE, case_id, &[resolved.id()]).await?;
    Ok(resolved)
}

async fn resolve_one<C: CaseChild>(
    conn: &mut SqliteConnection,
    case_id: &str,
    write: &C::Write,
    mode: WriteMode,
) -> Result<C> {
    match (C::write_id(write), mode) {
        (Some(id), WriteMode::Update) => {
            let existing = C::fetch(conn, id).await?.ok_or_else(|| DatabaseError::NotFound {
                entity: C::ENTITY,
                id: id.to_string(),
            })?;
            C::update(conn, case_id, &existing, write).await
        }
        // Identifiers in create payloads are ignored: resolution by id
        // applies to updates only.
        _ => C::insert(conn, case_id, write).await,
    }
}

/// Delete rows attached to the case that the payload no longer references.
async fn delete_unreferenced(
    conn: &mut SqliteConnection,
    table: &str,
    case_id: &str,
    keep: &[&str],
) -> Result<()> {
    if keep.is_empty() {
        sqlx::query(&format!("DELETE FROM {table} WHERE case_id = ?"))
            .bind(case_id)
            .execute(conn)
            .await?;
        return Ok(());
    }

    // SQLite has no array binds; the placeholder list is built by hand.
    let placeholders = vec!["?"; keep.len()].join(", ");
    let sql = format!("DELETE FROM {table} WHERE case_id = ? AND id NOT IN ({placeholders})");

    let mut query = sqlx::query(&sql).bind(case_id);
    for id in keep {
        query = query.bind(*id);
    }
    query.execute(conn).await?;

    Ok(())
}
