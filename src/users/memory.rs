use std::{cmp::Ordering, collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{
    repo::{StoreError, UserRepository},
    repo_types::{NewUser, SortColumn, User, UserSearch},
};

/// In-process stand-in for [`super::repo::PgUserRepository`].
///
/// Every operation runs under one lock, which makes the email check and the
/// insert a single atomic step just like the unique index does in Postgres.
#[derive(Default)]
pub struct MemoryUserRepository {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, User>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Inner {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.lock();
        if inner.email_taken(&user.email, None) {
            return Err(StoreError::DuplicateEmail);
        }
        inner.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: inner.next_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            phone: user.phone,
            age: user.age,
            status: user.status,
            created_at: now,
            updated_at: now,
        };
        inner.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.lock().rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().rows.values().find(|u| u.email == email).cloned())
    }

    async fn update(&self, user: &User) -> Result<Option<User>, StoreError> {
        let mut inner = self.lock();
        if !inner.rows.contains_key(&user.id) {
            return Ok(None);
        }
        if inner.email_taken(&user.email, Some(user.id)) {
            return Err(StoreError::DuplicateEmail);
        }
        let Some(row) = inner.rows.get_mut(&user.id) else {
            return Ok(None);
        };
        row.name = user.name.clone();
        row.email = user.email.clone();
        row.password_hash = user.password_hash.clone();
        row.phone = user.phone.clone();
        row.age = user.age;
        row.status = user.status;
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.lock().rows.remove(&id).is_some())
    }

    async fn search(&self, search: &UserSearch) -> Result<(Vec<User>, i64), StoreError> {
        let needle = search.name.to_lowercase();
        let mut matches: Vec<User> = self
            .lock()
            .rows
            .values()
            .filter(|u| needle.is_empty() || u.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            let ord = compare(a, b, search.sort_by).then(a.id.cmp(&b.id));
            if search.descending {
                ord.reverse()
            } else {
                ord
            }
        });

        let total = matches.len() as i64;
        let items = matches
            .into_iter()
            .skip(search.offset().max(0) as usize)
            .take(search.size.max(0) as usize)
            .collect();
        Ok((items, total))
    }
}

fn compare(a: &User, b: &User, col: SortColumn) -> Ordering {
    match col {
        SortColumn::Id => a.id.cmp(&b.id),
        SortColumn::Name => a.name.cmp(&b.name),
        SortColumn::Email => a.email.cmp(&b.email),
        SortColumn::Phone => a.phone.cmp(&b.phone),
        SortColumn::Age => a.age.cmp(&b.age),
        SortColumn::Status => a.status.cmp(&b.status),
        SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str, age: i32) -> NewUser {
        NewUser {
            name: name.into(),
            email: email.into(),
            password_hash: "hash".into(),
            phone: String::new(),
            age,
            status: 1,
        }
    }

    #[tokio::test]
    async fn create_assigns_ids_and_rejects_duplicate_email() {
        let repo = MemoryUserRepository::new();
        let a = repo.create(new_user("A", "a@x.com", 1)).await.unwrap();
        let b = repo.create(new_user("B", "b@x.com", 2)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        let err = repo.create(new_user("A2", "a@x.com", 3)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        // Case-sensitive as stored.
        assert!(repo.create(new_user("A3", "A@x.com", 3)).await.is_ok());
    }

    #[tokio::test]
    async fn update_enforces_uniqueness_against_other_rows() {
        let repo = MemoryUserRepository::new();
        let a = repo.create(new_user("A", "a@x.com", 1)).await.unwrap();
        repo.create(new_user("B", "b@x.com", 2)).await.unwrap();

        let mut changed = a.clone();
        changed.email = "b@x.com".into();
        assert!(matches!(repo.update(&changed).await, Err(StoreError::DuplicateEmail)));

        // Keeping its own email is fine.
        changed.email = "a@x.com".into();
        changed.name = "Alpha".into();
        let saved = repo.update(&changed).await.unwrap().unwrap();
        assert_eq!(saved.name, "Alpha");

        changed.id = 99;
        assert!(repo.update(&changed).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_filters_sorts_and_pages() {
        let repo = MemoryUserRepository::new();
        for (i, name) in ["Anna", "bob", "Joanna", "Hannah", "Zed"].iter().enumerate() {
            repo.create(new_user(name, &format!("{i}@x.com"), 20 + i as i32))
                .await
                .unwrap();
        }

        let search = UserSearch {
            name: "ANN".into(),
            page: 1,
            size: 2,
            sort_by: SortColumn::Age,
            descending: false,
        };
        let (items, total) = repo.search(&search).await.unwrap();
        assert_eq!(total, 3);
        let names: Vec<_> = items.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Anna", "Joanna"]);

        let (items, total) = repo
            .search(&UserSearch { page: 2, ..search.clone() })
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Hannah");

        let (items, _) = repo
            .search(&UserSearch {
                name: String::new(),
                page: 1,
                size: 10,
                sort_by: SortColumn::Id,
                descending: true,
            })
            .await
            .unwrap();
        assert_eq!(items.first().map(|u| u.id), Some(5));
        assert_eq!(items.len(), 5);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_went_away() {
        let repo = MemoryUserRepository::new();
        let a = repo.create(new_user("A", "a@x.com", 1)).await.unwrap();
        assert!(repo.delete(a.id).await.unwrap());
        assert!(!repo.delete(a.id).await.unwrap());
        assert!(repo.find_by_id(a.id).await.unwrap().is_none());
    }
}
