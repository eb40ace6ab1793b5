//! Authentication and authorization.
//!
//! Login exchanges a username/password pair for a signed bearer token;
//! every protected route then verifies the token, loads the embedded
//! user, rejects disabled accounts, and checks the route's required
//! scopes against the scopes the token carries.

pub mod password;
pub mod token;

pub use token::{Claims, TokenSigner};

use axum::http::{header, HeaderMap};
use database::{user, Database, DatabaseError, Scope, User};
use thiserror::Error;

/// Authentication failures. All surface as HTTP 401; the messages are
/// part of the API contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Login with a bad username or password.
    #[error("Incorrect username or password")]
    IncorrectCredentials,

    /// Missing, expired, or tampered token, or a token for an unknown user.
    #[error("Could not validate credentials")]
    InvalidCredentials,

    /// Valid token, but the account has been disabled.
    #[error("User Disabled")]
    UserDisabled,

    /// Valid token, but it does not carry a required scope.
    #[error("Not enough permissions")]
    NotEnoughPermissions,
}

/// Check a username/password pair against the user table.
///
/// Returns `None` for an unknown username or a wrong password; the two
/// cases are indistinguishable to the caller.
pub async fn authenticate_user(
    db: &Database,
    username: &str,
    password: &str,
) -> Result<Option<User>, DatabaseError> {
    let user = match user::get_user(db.pool(), username).await {
        Ok(user) => user,
        Err(DatabaseError::NotFound { .. }) => return Ok(None),
        Err(err) => return Err(err),
    };

    if !password::verify_password(password, &user.hashed_password) {
        return Ok(None);
    }

    Ok(Some(user))
}

/// Authorize a request against the scopes a route requires.
///
/// Verifies the bearer token, loads the embedded user, rejects disabled
/// accounts, and requires the token's scopes to cover `required`.
pub async fn authorize(
    db: &Database,
    signer: &TokenSigner,
    headers: &HeaderMap,
    required: &[Scope],
) -> Result<User, crate::error::ApiError> {
    let token = bearer_token(headers).ok_or(AuthError::InvalidCredentials)?;
    let claims = signer.verify(token)?;

    let user = match user::get_user(db.pool(), &claims.sub).await {
        Ok(user) => user,
        Err(DatabaseError::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
        Err(err) => return Err(err.into()),
    };

    if user.disabled {
        return Err(AuthError::UserDisabled.into());
    }

    for scope in required {
        if !claims.scopes.contains(scope) {
            return Err(AuthError::NotEnoughPermissions.into());
        }
    }

    Ok(user)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use database::Json;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn test_signer() -> TokenSigner {
        TokenSigner::new("test-secret-that-is-at-least-32-characters-long", 1800)
    }

    async fn seed_user(db: &Database, username: &str, password: &str, scopes: Vec<Scope>) -> User {
        let user = User {
            username: username.to_string(),
            hashed_password: password::hash_password(password).unwrap(),
            email: None,
            full_name: None,
            disabled: false,
            scopes: Json(scopes),
        };
        user::create_user(db.pool(), &user).await.unwrap();
        user
    }

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn test_authenticate_user() {
        let db = test_db().await;
        seed_user(&db, "johndoe", "password", vec![Scope::Read]).await;

        let user = authenticate_user(&db, "johndoe", "password")
            .await
            .unwrap();
        assert_eq!(user.unwrap().username, "johndoe");

        // Wrong password and unknown user are both None
        assert!(authenticate_user(&db, "johndoe", "wrong")
            .await
            .unwrap()
            .is_none());
        assert!(authenticate_user(&db, "nobody", "password")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_authorize_happy_path() {
        let db = test_db().await;
        let user = seed_user(&db, "johndoe", "password", vec![Scope::Read, Scope::Create]).await;
        let signer = test_signer();
        let token = signer.issue(&user.username, &user.scopes.0).unwrap();

        let authorized = authorize(
            &db,
            &signer,
            &bearer_headers(&token),
            &[Scope::Read],
        )
        .await
        .unwrap();
        assert_eq!(authorized.username, "johndoe");
    }

    #[tokio::test]
    async fn test_authorize_missing_header() {
        let db = test_db().await;
        let signer = test_signer();

        let result = authorize(&db, &signer, &HeaderMap::new(), &[]).await;
        assert!(matches!(
            result,
            Err(ApiError::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_authorize_unknown_user() {
        let db = test_db().await;
        let signer = test_signer();
        let token = signer.issue("ghost", &[Scope::Read]).unwrap();

        let result = authorize(&db, &signer, &bearer_headers(&token), &[]).await;
        assert!(matches!(
            result,
            Err(ApiError::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_authorize_disabled_user() {
        let db = test_db().await;
        let user = seed_user(&db, "johndoe", "password", vec![Scope::Read]).await;
        user::set_disabled(db.pool(), "johndoe", true).await.unwrap();
        let signer = test_signer();
        let token = signer.issue(&user.username, &user.scopes.0).unwrap();

        // Rejected even on a route requiring no scopes at all
        let result = authorize(&db, &signer, &bearer_headers(&token), &[]).await;
        assert!(matches!(result, Err(ApiError::Auth(AuthError::UserDisabled))));
    }

    #[tokio::test]
    async fn test_authorize_insufficient_scope() {
        let db = test_db().await;
        let user = seed_user(&db, "johndoe", "password", vec![Scope::Read]).await;
        let signer = test_signer();
        let token = signer.issue(&user.username, &user.scopes.0).unwrap();

        let result = authorize(
            &db,
            &signer,
            &bearer_headers(&token),
            &[Scope::Create],
        )
        .await;
        assert!(matches!(
            result,
            Err(ApiError::Auth(AuthError::NotEnoughPermissions))
        ));
    }
}
