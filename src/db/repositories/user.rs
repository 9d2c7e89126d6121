use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr, sea_query::Expr,
};
use tracing::warn;

use crate::entities::{prelude::*, users};
use crate::models::user::{Role, UserSummary};
use crate::services::auth_service::AuthError;

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Whether any record exists for `username`.
    pub async fn exists(&self, username: &str) -> Result<bool, AuthError> {
        Ok(!Self::matching(&self.conn, username).await?.is_empty())
    }

    /// The single record for `username`, including its credential hash.
    pub async fn find_unique(&self, username: &str) -> Result<users::Model, AuthError> {
        let rows = Self::matching(&self.conn, username).await?;
        single_match(rows, username)
    }

    /// Insert a new user as a single statement. The unique index decides a
    /// race between concurrent inserts; the loser gets `DuplicateUser`.
    pub async fn insert(
        &self,
        username: &str,
        role: Role,
        credential_hash: String,
    ) -> Result<(), AuthError> {
        Self::insert_row(&self.conn, username, role, credential_hash)
            .await
            .map_err(|e| duplicate_or_persistence(e, username))
    }

    /// Insert unless the username is already present. Returns whether a row was written.
    pub async fn insert_if_absent(
        &self,
        username: &str,
        role: Role,
        credential_hash: String,
    ) -> Result<bool, AuthError> {
        match self.insert(username, role, credential_hash).await {
            Ok(()) => Ok(true),
            Err(AuthError::DuplicateUser(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete every record for `username`. Returns the number of rows removed.
    pub async fn delete(&self, username: &str) -> Result<u64, AuthError> {
        let result = Users::delete_many()
            .filter(users::Column::Username.eq(username))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn set_credential_hash(
        &self,
        username: &str,
        credential_hash: String,
    ) -> Result<(), AuthError> {
        single_match(Self::matching(&self.conn, username).await?, username)?;

        let result = Users::update_many()
            .col_expr(users::Column::CredentialHash, Expr::value(credential_hash))
            .col_expr(users::Column::UpdatedAt, Expr::value(now()))
            .filter(users::Column::Username.eq(username))
            .exec(&self.conn)
            .await?;

        updated_one(result.rows_affected, username)
    }

    /// Compare-and-set on the credential hash. Returns `false` when the stored
    /// hash no longer equals `expected`, e.g. after a concurrent rotation.
    pub async fn replace_credential_hash(
        &self,
        username: &str,
        expected: &str,
        credential_hash: String,
    ) -> Result<bool, AuthError> {
        let result = Users::update_many()
            .col_expr(users::Column::CredentialHash, Expr::value(credential_hash))
            .col_expr(users::Column::UpdatedAt, Expr::value(now()))
            .filter(users::Column::Username.eq(username))
            .filter(users::Column::CredentialHash.eq(expected))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    pub async fn set_role(&self, username: &str, role: Role) -> Result<(), AuthError> {
        single_match(Self::matching(&self.conn, username).await?, username)?;

        let result = Users::update_many()
            .col_expr(users::Column::Role, Expr::value(role.as_str()))
            .col_expr(users::Column::UpdatedAt, Expr::value(now()))
            .filter(users::Column::Username.eq(username))
            .exec(&self.conn)
            .await?;

        updated_one(result.rows_affected, username)
    }

    pub async fn list(&self) -> Result<Vec<UserSummary>, AuthError> {
        let rows = Users::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(UserSummary::try_from).collect()
    }

    async fn matching<C: ConnectionTrait>(
        conn: &C,
        username: &str,
    ) -> Result<Vec<users::Model>, DbErr> {
        Users::find()
            .filter(users::Column::Username.eq(username))
            .all(conn)
            .await
    }

    async fn insert_row<C: ConnectionTrait>(
        conn: &C,
        username: &str,
        role: Role,
        credential_hash: String,
    ) -> Result<(), DbErr> {
        let now = now();
        let active = users::ActiveModel {
            username: Set(username.to_string()),
            role: Set(role.as_str().to_string()),
            credential_hash: Set(credential_hash),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        Users::insert(active).exec(conn).await?;
        Ok(())
    }
}

/// Exactly one row must match. More than one means the uniqueness invariant
/// was broken outside this crate.
fn single_match(mut rows: Vec<users::Model>, username: &str) -> Result<users::Model, AuthError> {
    match rows.len() {
        0 => Err(AuthError::UserNotFound(username.to_string())),
        1 => Ok(rows.remove(0)),
        n => {
            warn!(username = %username, records = n, "Duplicate user records found");
            Err(AuthError::AmbiguousUser(username.to_string()))
        }
    }
}

/// Writes are single autocommit statements so SQLite never has to upgrade a
/// read snapshot to a write lock. A row deleted between the lookup and the
/// update shows up here as zero rows.
fn updated_one(rows_affected: u64, username: &str) -> Result<(), AuthError> {
    match rows_affected {
        0 => Err(AuthError::UserNotFound(username.to_string())),
        _ => Ok(()),
    }
}

fn duplicate_or_persistence(err: DbErr, username: &str) -> AuthError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AuthError::DuplicateUser(username.to_string())
        }
        _ => err.into(),
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: i32, username: &str) -> users::Model {
        users::Model {
            id,
            username: username.to_string(),
            role: "user".to_string(),
            credential_hash: "$argon2id$v=19$m=64,t=1,p=1$c2FsdHNhbHQ$aGFzaA".to_string(),
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn no_rows_is_not_found() {
        let err = single_match(vec![], "ghost").unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound(ref u) if u == "ghost"));
    }

    #[test]
    fn one_row_is_returned() {
        let user = single_match(vec![model(1, "alice")], "alice").unwrap();
        assert_eq!(user.id, 1);
    }

    #[test]
    fn duplicate_rows_are_ambiguous() {
        let err = single_match(vec![model(1, "alice"), model(2, "alice")], "alice").unwrap_err();
        assert!(matches!(err, AuthError::AmbiguousUser(ref u) if u == "alice"));
    }

    #[test]
    fn update_of_vanished_row_is_not_found() {
        let err = updated_one(0, "alice").unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound(ref u) if u == "alice"));
        assert!(updated_one(1, "alice").is_ok());
    }

    #[test]
    fn non_constraint_errors_stay_persistence() {
        let err = duplicate_or_persistence(DbErr::Custom("locked".to_string()), "alice");
        assert!(matches!(err, AuthError::Persistence(_)));
    }
}
