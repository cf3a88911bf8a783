use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthUser::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthUser::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AuthUser::Username)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(AuthUser::HashedPsw).string_len(256).not_null())
                    .col(ColumnDef::new(AuthUser::Description).string_len(300))
                    .col(
                        ColumnDef::new(AuthUser::CanUse)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AuthUser::PswLastModifiedDatetime)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AuthUser::LastLoginIp).string_len(64))
                    .col(ColumnDef::new(AuthUser::LastLoginDt).timestamp())
                    .col(
                        ColumnDef::new(AuthUser::CreateDatetime)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AuthUser::InfoLastModifiedDatetime).timestamp())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_auth_user_username")
                    .table(AuthUser::Table)
                    .col(AuthUser::Username)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthUser::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AuthUser {
    Table,
    Id,
    Username,
    HashedPsw,
    Description,
    CanUse,
    PswLastModifiedDatetime,
    LastLoginIp,
    LastLoginDt,
    CreateDatetime,
    InfoLastModifiedDatetime,
}
