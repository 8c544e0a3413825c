use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

pub const STATUS_ACTIVE: i16 = 1;
pub const STATUS_INACTIVE: i16 = 0;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never exposed in JSON
    pub phone: String,
    pub age: i32,
    pub status: i16, // 1 active, 0 inactive
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Fields needed to insert a user; id and timestamps come from storage.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub age: i32,
    pub status: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    Id,
    Name,
    Email,
    Phone,
    Age,
    Status,
    #[default]
    CreatedAt,
}

impl SortColumn {
    /// Parses a client supplied column name, falling back to `created_at`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "id" => Self::Id,
            "name" => Self::Name,
            "email" => Self::Email,
            "phone" => Self::Phone,
            "age" => Self::Age,
            "status" => Self::Status,
            _ => Self::CreatedAt,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Age => "age",
            Self::Status => "status",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Normalised search request handed to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSearch {
    /// Case-insensitive substring of the name; empty means no filter.
    pub name: String,
    pub page: i64,
    pub size: i64,
    pub sort_by: SortColumn,
    pub descending: bool,
}

impl UserSearch {
    /// Saturates instead of overflowing; a far-off page is simply empty.
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.size.max(0))
    }
}
