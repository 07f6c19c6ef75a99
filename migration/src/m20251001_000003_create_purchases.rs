use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Purchases {
    Table,
    Id,
    UserId,
    GameId,
    Amount,
    Currency,
    Status,
    PaymentReference,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No foreign key to games: deleted games leave purchases behind and
        // readers drop them silently.
        manager
            .create_table(
                Table::create()
                    .table(Purchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Purchases::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Purchases::UserId).uuid().not_null())
                    .col(ColumnDef::new(Purchases::GameId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Purchases::Amount)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Purchases::Currency)
                            .string()
                            .not_null()
                            .default("GHS"),
                    )
                    .col(
                        ColumnDef::new(Purchases::Status)
                            .text()
                            .not_null()
                            .default("paid"),
                    )
                    .col(ColumnDef::new(Purchases::PaymentReference).string().null())
                    .col(
                        ColumnDef::new(Purchases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchases_user_game_unique")
                    .table(Purchases::Table)
                    .col(Purchases::UserId)
                    .col(Purchases::GameId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // NULL references (admin grants) do not collide.
        manager
            .create_index(
                Index::create()
                    .name("idx_purchases_payment_reference_unique")
                    .table(Purchases::Table)
                    .col(Purchases::PaymentReference)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchases_user_created_at")
                    .table(Purchases::Table)
                    .col(Purchases::UserId)
                    .col(Purchases::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Purchases::Table).to_owned())
            .await
    }
}
