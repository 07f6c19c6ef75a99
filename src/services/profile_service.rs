use crate::database::DbPool;
use crate::entities::{Role, profile_entity as profiles};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::AuthUser;
use chrono::Utc;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::sea_query::{Expr, Func, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Clone)]
pub struct ProfileService {
    pool: DbPool,
    bootstrap_admins: HashSet<String>,
}

impl ProfileService {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            bootstrap_admins: HashSet::new(),
        }
    }

    /// Profiles signing up with one of these emails become admins.
    pub fn with_bootstrap_admins(mut self, emails: &[String]) -> Self {
        self.bootstrap_admins = emails
            .iter()
            .map(|e| normalize_email(e))
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    fn role_for_signup(&self, email: &str) -> Role {
        if self.bootstrap_admins.contains(&normalize_email(email)) {
            Role::Admin
        } else {
            Role::User
        }
    }

    async fn find(&self, user_id: Uuid) -> AppResult<profiles::Model> {
        profiles::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<profiles::Model>> {
        let found = profiles::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(profiles::Column::Email))).eq(email))
            .one(self.pool.as_ref())
            .await?;
        Ok(found)
    }

    /// Creates the caller's profile with role `user` (or `admin` for a bootstrap email);
    /// repeated calls return the existing row.
    pub async fn signup(&self, user: &AuthUser, req: SignupRequest) -> AppResult<ProfileResponse> {
        let existing = profiles::Entity::find_by_id(user.id)
            .one(self.pool.as_ref())
            .await?;
        if let Some(existing) = existing {
            let bootstrap = self.role_for_signup(&existing.email) == Role::Admin;
            if bootstrap && existing.role != Role::Admin {
                log::info!("Bootstrap admin {} promoted on signup", existing.id);
                return self.write_role(existing.id, Role::Admin).await;
            }
            return Ok(existing.into());
        }

        let email = req
            .email
            .or_else(|| user.email.clone())
            .map(|e| normalize_email(&e))
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::ValidationError("Email is required".to_string()))?;
        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::ValidationError(
                "Email is already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let row = profiles::ActiveModel {
            id: Set(user.id),
            email: Set(email.clone()),
            full_name: Set(req.full_name.filter(|n| !n.trim().is_empty())),
            phone: Set(req.phone.filter(|p| !p.trim().is_empty())),
            role: Set(self.role_for_signup(&email)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
        };
        profiles::Entity::insert(row)
            .on_conflict(
                OnConflict::column(profiles::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.pool.as_ref())
            .await?;

        log::info!("Profile created for {}", user.id);
        Ok(self.find(user.id).await?.into())
    }

    pub async fn me(&self, user_id: Uuid) -> AppResult<ProfileResponse> {
        Ok(self.find(user_id).await?.into())
    }

    pub async fn get(&self, user_id: Uuid) -> AppResult<Option<ProfileResponse>> {
        Ok(profiles::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .map(ProfileResponse::from))
    }

    /// Grants admin by email, matched case-insensitively.
    pub async fn promote(&self, req: PromoteRequest) -> AppResult<ProfileResponse> {
        let email = req
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::ValidationError("Email is required".to_string()))?;
        let profile = self
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let updated = self.write_role(profile.id, Role::Admin).await?;
        log::info!("Promoted {} to admin", updated.id);
        Ok(updated)
    }

    pub async fn set_role(&self, user_id: Uuid, role: Role) -> AppResult<ProfileResponse> {
        self.find(user_id).await?;
        let updated = self.write_role(user_id, role).await?;
        log::info!("Role of {user_id} set to {role}");
        Ok(updated)
    }

    async fn write_role(&self, user_id: Uuid, role: Role) -> AppResult<ProfileResponse> {
        let model = profiles::ActiveModel {
            id: Unchanged(user_id),
            role: Set(role),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .update(self.pool.as_ref())
        .await?;
        Ok(model.into())
    }

    pub async fn delete(&self, user_id: Uuid) -> AppResult<()> {
        let res = profiles::Entity::delete_by_id(user_id)
            .exec(self.pool.as_ref())
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Profile not found".to_string()));
        }
        log::info!("Profile {user_id} deleted");
        Ok(())
    }

    pub async fn list(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<ProfileResponse>> {
        let total = profiles::Entity::find().count(self.pool.as_ref()).await?;
        let rows = profiles::Entity::find()
            .order_by_desc(profiles::Column::CreatedAt)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(self.pool.as_ref())
            .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(ProfileResponse::from).collect(),
            params.get_page(),
            params.get_limit(),
            total,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn profile(id: Uuid, email: &str, role: Role) -> profiles::Model {
        profiles::Model {
            id,
            email: email.to_string(),
            full_name: Some("Ama Owusu".to_string()),
            phone: None,
            role,
            created_at: Some(Utc::now()),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_signup_is_idempotent() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![profile(id, "ama@example.com", Role::User)]])
            .into_connection();
        let svc = ProfileService::new(Arc::new(db));
        let user = AuthUser {
            id,
            email: Some("ama@example.com".into()),
        };
        let resp = svc.signup(&user, SignupRequest::default()).await.unwrap();
        assert_eq!(resp.id, id);
        assert_eq!(resp.role, Role::User);
    }

    #[tokio::test]
    async fn test_signup_creates_user_profile() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<profiles::Model>::new(), Vec::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![profile(id, "kofi@example.com", Role::User)]])
            .into_connection();
        let svc = ProfileService::new(Arc::new(db));
        let user = AuthUser {
            id,
            email: Some("Kofi@Example.com".into()),
        };
        let resp = svc.signup(&user, SignupRequest::default()).await.unwrap();
        assert_eq!(resp.email, "kofi@example.com");
    }

    #[test]
    fn test_bootstrap_emails_sign_up_as_admin() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let svc = ProfileService::new(Arc::new(db))
            .with_bootstrap_admins(&[" Owner@Example.com ".to_string(), "".to_string()]);

        assert_eq!(svc.role_for_signup("owner@example.com"), Role::Admin);
        assert_eq!(svc.role_for_signup("OWNER@example.COM"), Role::Admin);
        assert_eq!(svc.role_for_signup("ama@example.com"), Role::User);
        assert_eq!(svc.role_for_signup(""), Role::User);
    }

    #[tokio::test]
    async fn test_existing_bootstrap_profile_is_promoted_on_signup() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![profile(id, "owner@example.com", Role::User)],
                // UPDATE .. RETURNING
                vec![profile(id, "owner@example.com", Role::Admin)],
            ])
            .into_connection();
        let svc = ProfileService::new(Arc::new(db))
            .with_bootstrap_admins(&["owner@example.com".to_string()]);
        let user = AuthUser {
            id,
            email: Some("owner@example.com".into()),
        };
        let resp = svc.signup(&user, SignupRequest::default()).await.unwrap();
        assert_eq!(resp.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_signup_without_email_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<profiles::Model>::new()])
            .into_connection();
        let svc = ProfileService::new(Arc::new(db));
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: None,
        };
        assert!(matches!(
            svc.signup(&user, SignupRequest::default()).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_promote_validation_and_lookup() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<profiles::Model>::new()])
            .into_connection();
        let svc = ProfileService::new(Arc::new(db));

        let missing = svc.promote(PromoteRequest { email: Some("  ".into()) }).await;
        assert!(matches!(missing, Err(AppError::ValidationError(_))));

        let unknown = svc
            .promote(PromoteRequest {
                email: Some("Nobody@Example.com".into()),
            })
            .await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_promote_sets_admin() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![profile(id, "ama@example.com", Role::User)],
                vec![profile(id, "ama@example.com", Role::Admin)],
            ])
            .into_connection();
        let svc = ProfileService::new(Arc::new(db));
        let resp = svc
            .promote(PromoteRequest {
                email: Some("AMA@example.com".into()),
            })
            .await
            .unwrap();
        assert_eq!(resp.role, Role::Admin);
    }
}
