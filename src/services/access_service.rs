use crate::database::DbPool;
use crate::entities::{Role, profile_entity as profiles};
use crate::error::{AppError, AppResult};
use sea_orm::EntityTrait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Short-lived role lookups for request gating. Writes never consult it.
#[derive(Clone)]
pub struct RoleCache {
    entries: Arc<RwLock<HashMap<Uuid, (Role, Instant)>>>,
    ttl: Duration,
}

impl RoleCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, user_id: &Uuid) -> Option<Role> {
        let entries = self.entries.read().await;
        entries
            .get(user_id)
            .filter(|(_, cached_at)| cached_at.elapsed() < self.ttl)
            .map(|(role, _)| *role)
    }

    /// Expired entries are dropped on every write.
    pub async fn put(&self, user_id: Uuid, role: Role) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, cached_at)| cached_at.elapsed() < self.ttl);
        entries.insert(user_id, (role, Instant::now()));
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn invalidate(&self, user_id: &Uuid) {
        self.entries.write().await.remove(user_id);
    }
}

#[derive(Clone)]
pub struct AccessService {
    pool: DbPool,
    cache: RoleCache,
}

impl AccessService {
    pub fn new(pool: DbPool, cache_ttl: Duration) -> Self {
        Self {
            pool,
            cache: RoleCache::new(cache_ttl),
        }
    }

    /// A user without a profile row is a plain user.
    pub async fn role_of(&self, user_id: Uuid) -> AppResult<Role> {
        if let Some(role) = self.cache.get(&user_id).await {
            return Ok(role);
        }
        let role = profiles::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .map(|p| p.role)
            .unwrap_or_default();
        self.cache.put(user_id, role).await;
        Ok(role)
    }

    pub async fn is_admin(&self, user_id: Uuid) -> AppResult<bool> {
        Ok(self.role_of(user_id).await?.is_admin())
    }

    pub async fn require_admin(&self, user_id: Uuid) -> AppResult<()> {
        if self.is_admin(user_id).await? {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub async fn invalidate(&self, user_id: Uuid) {
        self.cache.invalidate(&user_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn profile(id: Uuid, role: Role) -> profiles::Model {
        profiles::Model {
            id,
            email: "ama@example.com".to_string(),
            full_name: None,
            phone: None,
            role,
            created_at: Some(Utc::now()),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_role_cache_expires_and_invalidates() {
        let cache = RoleCache::new(Duration::from_millis(50));
        let id = Uuid::new_v4();
        cache.put(id, Role::Admin).await;
        assert_eq!(cache.get(&id).await, Some(Role::Admin));

        cache.invalidate(&id).await;
        assert_eq!(cache.get(&id).await, None);

        cache.put(id, Role::User).await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get(&id).await, None);
    }

    #[tokio::test]
    async fn test_role_cache_evicts_expired_entries_on_put() {
        let cache = RoleCache::new(Duration::from_millis(50));
        cache.put(Uuid::new_v4(), Role::User).await;
        cache.put(Uuid::new_v4(), Role::User).await;
        assert_eq!(cache.len().await, 2);

        tokio::time::sleep(Duration::from_millis(80)).await;
        let fresh = Uuid::new_v4();
        cache.put(fresh, Role::Admin).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&fresh).await, Some(Role::Admin));
    }

    #[tokio::test]
    async fn test_require_admin() {
        let admin = Uuid::new_v4();
        let user = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![profile(admin, Role::Admin)]])
            .append_query_results([vec![profile(user, Role::User)]])
            .into_connection();
        let svc = AccessService::new(Arc::new(db), Duration::from_secs(60));

        assert!(svc.require_admin(admin).await.is_ok());
        assert!(matches!(
            svc.require_admin(user).await,
            Err(AppError::Forbidden)
        ));
        // served from cache, no third query
        assert!(svc.require_admin(admin).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_profile_is_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<profiles::Model>::new()])
            .into_connection();
        let svc = AccessService::new(Arc::new(db), Duration::from_secs(60));
        assert_eq!(svc.role_of(Uuid::new_v4()).await.unwrap(), Role::User);
    }
}
