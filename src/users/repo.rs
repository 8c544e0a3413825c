use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use super::repo_types::{NewUser, User, UserSearch};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, phone, age, status, created_at, updated_at";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already exists")]
    DuplicateEmail,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Storage capability the services depend on.
///
/// Email uniqueness must be enforced atomically by the implementation:
/// concurrent inserts of one email yield exactly one success and one
/// [`StoreError::DuplicateEmail`].
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Persists every mutable field of `user`; `None` when the row is gone.
    async fn update(&self, user: &User) -> Result<Option<User>, StoreError>;
    /// Returns whether a row was deleted.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
    async fn search(&self, search: &UserSearch) -> Result<(Vec<User>, i64), StoreError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Deletes every user and restarts the id sequence. Used by the seed tool.
    pub async fn reset(&self) -> Result<u64, StoreError> {
        let mut tx = self.db.begin().await?;
        let deleted = sqlx::query("DELETE FROM users")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("ALTER SEQUENCE users_id_seq RESTART WITH 1")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(deleted)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO users (name, email, password_hash, phone, age, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.phone)
            .bind(user.age)
            .bind(user.status)
            .fetch_one(&self.db)
            .await
            .map_err(classify)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<Option<User>, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
               SET name = $2, email = $3, password_hash = $4, phone = $5,
                   age = $6, status = $7, updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.phone)
            .bind(user.age)
            .bind(user.status)
            .fetch_optional(&self.db)
            .await
            .map_err(classify)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn search(&self, search: &UserSearch) -> Result<(Vec<User>, i64), StoreError> {
        let pattern = (!search.name.is_empty()).then(|| format!("%{}%", escape_like(&search.name)));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.db)
        .await?;

        // Column and direction come from a whitelist, never from raw input.
        let dir = if search.descending { "DESC" } else { "ASC" };
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
              FROM users
             WHERE ($1::text IS NULL OR name ILIKE $1)
             ORDER BY {col} {dir}, id {dir}
             LIMIT $2 OFFSET $3
            "#,
            col = search.sort_by.as_sql(),
        );
        let items = sqlx::query_as::<_, User>(&sql)
            .bind(pattern.as_deref())
            .bind(search.size)
            .bind(search.offset())
            .fetch_all(&self.db)
            .await?;

        Ok((items, total))
    }
}

fn classify(err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::DuplicateEmail
    } else {
        StoreError::Database(err)
    }
}

/// Postgres SQLSTATE 23505 (`unique_violation`); `email` is the only unique column.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
