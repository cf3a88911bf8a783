use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SystemSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SystemSettings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SystemSettings::MinPswLength).integer().not_null())
                    .col(ColumnDef::new(SystemSettings::MaxPswLength).integer().not_null())
                    .col(
                        ColumnDef::new(SystemSettings::PswChangeMaxAgeEnable)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SystemSettings::PswChangeMaxAge)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SystemSettings::SessionIdleLogoutMaxAge)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SystemSettings::LoginFailedLockPolicy)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SystemSettings::LoginFailedLockNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SystemSettings::LoginFailedLockMaxAge)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SystemSettings::CreateDatetime)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SystemSettings::ModifyDatetime)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SystemSettings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SystemSettings {
    Table,
    Id,
    MinPswLength,
    MaxPswLength,
    PswChangeMaxAgeEnable,
    PswChangeMaxAge,
    SessionIdleLogoutMaxAge,
    LoginFailedLockPolicy,
    LoginFailedLockNumber,
    LoginFailedLockMaxAge,
    CreateDatetime,
    ModifyDatetime,
}
