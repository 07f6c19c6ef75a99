use crate::database::DbPool;
use crate::entities::{
    game_entity as games, profile_entity as profiles, purchase_entity as purchases,
};
use crate::error::AppResult;
use crate::models::*;
use crate::services::{AccessService, ProfileService, PurchaseService};
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

pub const RECENT_PURCHASES_SHOWN: u64 = 5;

#[derive(Clone)]
pub struct DashboardService {
    pool: DbPool,
    purchases: PurchaseService,
    profiles: ProfileService,
    access: AccessService,
}

impl DashboardService {
    pub fn new(
        pool: DbPool,
        purchases: PurchaseService,
        profiles: ProfileService,
        access: AccessService,
    ) -> Self {
        Self {
            pool,
            purchases,
            profiles,
            access,
        }
    }

    pub async fn admin_summary(&self) -> AppResult<AdminDashboard> {
        let total_users = profiles::Entity::find().count(self.pool.as_ref()).await?;
        let total_games = games::Entity::find().count(self.pool.as_ref()).await?;
        let total_purchases = purchases::Entity::find().count(self.pool.as_ref()).await?;
        let recent_purchases = self
            .purchases
            .recent_purchases(RECENT_PURCHASES_SHOWN)
            .await?;

        Ok(AdminDashboard {
            total_users,
            total_games,
            total_purchases,
            recent_purchases,
        })
    }

    pub async fn user_summary(&self, user_id: Uuid) -> AppResult<UserDashboard> {
        let profile = self.profiles.get(user_id).await?;
        let role = self.access.role_of(user_id).await?;
        let purchases = self.purchases.list_user_purchases(user_id).await?;

        Ok(UserDashboard {
            profile,
            role,
            purchases,
        })
    }
}
