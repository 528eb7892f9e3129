use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use sales_core::{Direction, OrderBy, Page};
use sales_db::Transaction;
use sales_models::{Email, QueryFilter, User, UserError};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::UserRepository;

/// A [`UserRepository`] held in process memory.
///
/// Writes are applied immediately; a transaction passed in is accepted but
/// does not stage anything, so a rollback leaves earlier writes in place.
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn email_taken(users: &HashMap<Uuid, User>, email: &Email, except: Uuid) -> bool {
    users
        .values()
        .any(|u| u.id != except && u.email == *email)
}

fn compare(a: &User, b: &User, field: &str) -> Ordering {
    match field {
        "name" => a.name.cmp(&b.name),
        "email" => a.email.as_str().cmp(b.email.as_str()),
        "roles" => {
            let names = |u: &User| u.roles.iter().map(|r| r.as_str()).collect::<Vec<_>>();
            names(a).cmp(&names(b))
        }
        "enabled" => a.enabled.cmp(&b.enabled),
        _ => a.id.cmp(&b.id),
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: &User, _tx: Option<&dyn Transaction>) -> Result<(), UserError> {
        let mut users = self.users.write().await;
        if email_taken(&users, &user.email, user.id) {
            return Err(UserError::UniqueEmail);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User, _tx: Option<&dyn Transaction>) -> Result<(), UserError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound);
        }
        if email_taken(&users, &user.email, user.id) {
            return Err(UserError::UniqueEmail);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete(&self, user_id: Uuid, _tx: Option<&dyn Transaction>) -> Result<(), UserError> {
        self.users.write().await.remove(&user_id);
        Ok(())
    }

    async fn query(
        &self,
        filter: &QueryFilter,
        order: &OrderBy,
        page: &Page,
    ) -> Result<Vec<User>, UserError> {
        let users = self.users.read().await;
        let mut matched: Vec<User> = users.values().filter(|u| filter.matches(u)).cloned().collect();

        matched.sort_by(|a, b| {
            let ord = compare(a, b, &order.field);
            match order.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });

        Ok(matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    async fn count(&self, filter: &QueryFilter) -> Result<i64, UserError> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| filter.matches(u)).count() as i64)
    }

    async fn query_by_id(
        &self,
        user_id: Uuid,
        _tx: Option<&dyn Transaction>,
    ) -> Result<User, UserError> {
        self.users
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(UserError::NotFound)
    }

    async fn query_by_email(&self, email: &Email) -> Result<User, UserError> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == *email)
            .cloned()
            .ok_or(UserError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sales_auth::Role;

    fn user(name: &str, email: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: Email::new_unchecked(email),
            roles: vec![Role::User],
            password_hash: String::new(),
            department: None,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let repo = MemoryUserRepository::new();
        repo.create(&user("a", "a@example.com"), None).await.unwrap();

        let err = repo
            .create(&user("b", "a@example.com"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::UniqueEmail));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_query_orders_and_pages() {
        let repo = MemoryUserRepository::new();
        for name in ["carol", "alice", "dave", "bob", "erin"] {
            repo.create(&user(name, &format!("{}@example.com", name)), None)
                .await
                .unwrap();
        }

        let order = OrderBy::new("name", Direction::Desc);
        let page = Page { number: 2, size: 2 };
        let names: Vec<String> = repo
            .query(&QueryFilter::default(), &order, &page)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();

        assert_eq!(names, vec!["carol", "bob"]);
        assert_eq!(repo.count(&QueryFilter::default()).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = MemoryUserRepository::new();
        let err = repo.update(&user("x", "x@example.com"), None).await.unwrap_err();
        assert!(matches!(err, UserError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = MemoryUserRepository::new();
        let u = user("x", "x@example.com");
        repo.create(&u, None).await.unwrap();
        repo.delete(u.id, None).await.unwrap();
        repo.delete(u.id, None).await.unwrap();
        assert!(repo.is_empty().await);
    }
}
