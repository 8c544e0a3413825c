use std::sync::Arc;

use tracing::{info, warn};

use super::{
    dto::{CreateUserRequest, SearchQuery, UpdateUserRequest, UserPage},
    repo::UserRepository,
    repo_types::{NewUser, SortColumn, User, UserSearch, STATUS_ACTIVE},
};
use crate::{auth::password::hash_password, error::AppError, validate};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Keeps `(page - 1) * size` inside `i64` for every accepted size.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.repo.find_by_email(email).await?)
    }

    /// Stores a new password hash, leaving every other field untouched.
    pub async fn set_password_hash(&self, mut user: User, password_hash: String) -> Result<User, AppError> {
        user.password_hash = password_hash;
        self.repo
            .update(&user)
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    pub async fn create_user(&self, req: CreateUserRequest) -> Result<User, AppError> {
        let name = validate::name(&req.name)?;
        let email = validate::email(&req.email)?;
        let phone = validate::phone(&req.phone)?;
        validate::password("password", &req.password)?;
        let age = validate::age(req.age)?;
        let status = validate::status(req.status.unwrap_or(STATUS_ACTIVE))?;

        // Fast path only: the unique index decides under concurrency.
        if self.repo.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict("email already exists".into()));
        }

        let password_hash = hash_password(&req.password)?;
        let user = self
            .repo
            .create(NewUser {
                name,
                email,
                password_hash,
                phone,
                age,
                status,
            })
            .await?;

        info!(user_id = user.id, email = %user.email, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<User, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    pub async fn update_user(&self, id: i64, req: UpdateUserRequest) -> Result<User, AppError> {
        let mut user = self.get_user(id).await?;

        if let Some(raw) = req.email.as_deref() {
            let email = validate::email(raw)?;
            if email != user.email {
                if let Some(other) = self.repo.find_by_email(&email).await? {
                    if other.id != id {
                        return Err(AppError::Conflict("email already exists".into()));
                    }
                }
                user.email = email;
            }
        }
        if let Some(name) = req.name.as_deref() {
            user.name = validate::name(name)?;
        }
        if let Some(phone) = req.phone.as_deref() {
            user.phone = validate::phone(phone)?;
        }
        if let Some(age) = req.age {
            user.age = validate::age(age)?;
        }
        if let Some(status) = req.status {
            user.status = validate::status(status)?;
        }

        let saved = self
            .repo
            .update(&user)
            .await?
            .ok_or(AppError::NotFound("user"))?;
        info!(user_id = saved.id, "user updated");
        Ok(saved)
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("user"));
        }
        info!(user_id = id, "user deleted");
        Ok(())
    }

    pub async fn search_users(&self, query: SearchQuery) -> Result<UserPage, AppError> {
        let search = normalize_search(query);
        let (items, total) = self.repo.search(&search).await?;
        Ok(UserPage {
            items,
            page: search.page,
            size: search.size,
            total,
        })
    }
}

pub fn normalize_search(q: SearchQuery) -> UserSearch {
    let page = q.page.filter(|p| *p >= 1).unwrap_or(1).min(MAX_PAGE);
    let size = match q.size {
        Some(s) if s > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
        Some(s) if s >= 1 => s,
        _ => DEFAULT_PAGE_SIZE,
    };
    let sort_by = q
        .sort_by
        .as_deref()
        .map(SortColumn::parse)
        .unwrap_or_default();
    let descending = !q
        .sort_order
        .as_deref()
        .is_some_and(|o| o.trim().eq_ignore_ascii_case("asc"));

    UserSearch {
        name: q.name.unwrap_or_default().trim().to_string(),
        page,
        size,
        sort_by,
        descending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::password::verify_password, users::memory::MemoryUserRepository};

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryUserRepository::new()))
    }

    fn req(name: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: name.into(),
            email: email.into(),
            password: "secret1".into(),
            phone: "13800138000".into(),
            age: 30,
            status: None,
        }
    }

    #[test]
    fn search_defaults_and_clamps() {
        let s = normalize_search(SearchQuery::default());
        assert_eq!(s.page, 1);
        assert_eq!(s.size, DEFAULT_PAGE_SIZE);
        assert_eq!(s.sort_by, SortColumn::CreatedAt);
        assert!(s.descending);
        assert!(s.name.is_empty());

        let s = normalize_search(SearchQuery {
            name: Some("  ann ".into()),
            page: Some(0),
            size: Some(1000),
            sort_by: Some(" NAME ".into()),
            sort_order: Some("ASC".into()),
        });
        assert_eq!(s.name, "ann");
        assert_eq!(s.page, 1);
        assert_eq!(s.size, MAX_PAGE_SIZE);
        assert_eq!(s.sort_by, SortColumn::Name);
        assert!(!s.descending);

        let s = normalize_search(SearchQuery {
            size: Some(-5),
            sort_by: Some("password_hash; DROP TABLE users".into()),
            sort_order: Some("sideways".into()),
            ..Default::default()
        });
        assert_eq!(s.size, DEFAULT_PAGE_SIZE);
        assert_eq!(s.sort_by, SortColumn::CreatedAt);
        assert!(s.descending);

        let s = normalize_search(SearchQuery {
            page: Some(i64::MAX),
            size: Some(MAX_PAGE_SIZE),
            ..Default::default()
        });
        assert_eq!(s.page, MAX_PAGE);
        assert!(s.offset() > 0);
    }

    #[tokio::test]
    async fn create_hashes_password_and_defaults_status() {
        let svc = service();
        let user = svc.create_user(req("Alice", "alice@x.com")).await.unwrap();
        assert_eq!(user.status, STATUS_ACTIVE);
        assert_ne!(user.password_hash, "secret1");
        assert!(verify_password("secret1", &user.password_hash).unwrap());

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@x.com");
    }

    #[tokio::test]
    async fn create_rejects_bad_input_and_duplicates() {
        let svc = service();
        let mut bad = req("Alice", "not-an-email");
        assert!(matches!(svc.create_user(bad.clone()).await, Err(AppError::Validation(_))));
        bad.email = "alice@x.com".into();
        bad.password = "123".into();
        assert!(matches!(svc.create_user(bad.clone()).await, Err(AppError::Validation(_))));
        bad.password = "secret1".into();
        bad.name = " ".into();
        assert!(matches!(svc.create_user(bad).await, Err(AppError::Validation(_))));

        svc.create_user(req("Alice", "alice@x.com")).await.unwrap();
        let err = svc.create_user(req("Other", "alice@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn overlong_fields_are_rejected_before_storage() {
        let svc = service();
        let mut long = req(&"n".repeat(validate::MAX_NAME_LEN + 1), "alice@x.com");
        assert!(matches!(svc.create_user(long.clone()).await, Err(AppError::Validation(_))));
        long.name = "Alice".into();
        long.email = format!("{}@x.com", "a".repeat(validate::MAX_EMAIL_LEN));
        assert!(matches!(svc.create_user(long.clone()).await, Err(AppError::Validation(_))));
        long.email = "alice@x.com".into();
        long.phone = "1".repeat(validate::MAX_PHONE_LEN + 1);
        assert!(matches!(svc.create_user(long).await, Err(AppError::Validation(_))));

        let user = svc.create_user(req("Alice", "alice@x.com")).await.unwrap();
        let err = svc
            .update_user(
                user.id,
                UpdateUserRequest {
                    phone: Some("9".repeat(validate::MAX_PHONE_LEN + 1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(svc.get_user(user.id).await.unwrap().phone, "13800138000");
    }

    #[tokio::test]
    async fn set_password_hash_replaces_only_the_hash() {
        let svc = service();
        let user = svc.create_user(req("Alice", "alice@x.com")).await.unwrap();
        let saved = svc
            .set_password_hash(user.clone(), "new-hash".into())
            .await
            .unwrap();
        assert_eq!(saved.password_hash, "new-hash");
        assert_eq!((saved.name.as_str(), saved.email.as_str()), ("Alice", "alice@x.com"));
        assert_eq!(
            svc.find_by_email("alice@x.com").await.unwrap().unwrap().password_hash,
            "new-hash"
        );

        svc.delete_user(user.id).await.unwrap();
        assert!(matches!(
            svc.set_password_hash(user, "again".into()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(svc.find_by_email("alice@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_is_partial_and_can_deactivate() {
        let svc = service();
        let user = svc.create_user(req("Alice", "alice@x.com")).await.unwrap();

        let updated = svc
            .update_user(
                user.id,
                UpdateUserRequest {
                    age: Some(31),
                    status: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.age, 31);
        assert_eq!(updated.status, 0);
        assert_eq!(updated.name, "Alice");
        assert_eq!(updated.phone, "13800138000");
        assert_eq!(updated.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn update_email_conflicts_with_other_user() {
        let svc = service();
        let alice = svc.create_user(req("Alice", "alice@x.com")).await.unwrap();
        svc.create_user(req("Bob", "bob@x.com")).await.unwrap();

        let err = svc
            .update_user(
                alice.id,
                UpdateUserRequest {
                    email: Some("bob@x.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = svc
            .update_user(999, UpdateUserRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let svc = service();
        let user = svc.create_user(req("Alice", "alice@x.com")).await.unwrap();
        svc.delete_user(user.id).await.unwrap();
        assert!(matches!(svc.get_user(user.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(svc.delete_user(user.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn search_returns_page_envelope() {
        let svc = service();
        for i in 0..12 {
            svc.create_user(req(&format!("user{i:02}"), &format!("u{i}@x.com")))
                .await
                .unwrap();
        }
        let page = svc
            .search_users(SearchQuery {
                name: Some("user".into()),
                page: Some(2),
                size: Some(5),
                sort_by: Some("name".into()),
                sort_order: Some("asc".into()),
            })
            .await
            .unwrap();
        assert_eq!(page.total, 12);
        assert_eq!((page.page, page.size), (2, 5));
        let names: Vec<_> = page.items.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["user05", "user06", "user07", "user08", "user09"]);
    }
}
