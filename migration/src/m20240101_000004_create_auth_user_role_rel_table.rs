use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthUserRoleRel::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthUserRoleRel::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuthUserRoleRel::UserId).integer().not_null())
                    .col(ColumnDef::new(AuthUserRoleRel::RoleId).integer().not_null())
                    .col(
                        ColumnDef::new(AuthUserRoleRel::JoinDatetime)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_user_role_rel_user_id")
                            .from(AuthUserRoleRel::Table, AuthUserRoleRel::UserId)
                            .to(AuthUser::Table, AuthUser::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_user_role_rel_role_id")
                            .from(AuthUserRoleRel::Table, AuthUserRoleRel::RoleId)
                            .to(AuthRole::Table, AuthRole::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 用户与角色联合唯一
        manager
            .create_index(
                Index::create()
                    .name("uk_auth_user_role_rel_user_role")
                    .table(AuthUserRoleRel::Table)
                    .col(AuthUserRoleRel::UserId)
                    .col(AuthUserRoleRel::RoleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_auth_user_role_rel_role_id")
                    .table(AuthUserRoleRel::Table)
                    .col(AuthUserRoleRel::RoleId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthUserRoleRel::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AuthUserRoleRel {
    Table,
    Id,
    UserId,
    RoleId,
    JoinDatetime,
}

#[derive(DeriveIden)]
enum AuthUser {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum AuthRole {
    Table,
    Id,
}
