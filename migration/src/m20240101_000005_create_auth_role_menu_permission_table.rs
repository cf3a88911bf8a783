use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthRoleMenuPermission::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthRoleMenuPermission::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AuthRoleMenuPermission::RoleId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthRoleMenuPermission::MenuPermissionId)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_role_menu_permission_role_id")
                            .from(AuthRoleMenuPermission::Table, AuthRoleMenuPermission::RoleId)
                            .to(AuthRole::Table, AuthRole::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_role_menu_permission_menu_permission_id")
                            .from(
                                AuthRoleMenuPermission::Table,
                                AuthRoleMenuPermission::MenuPermissionId,
                            )
                            .to(AuthMenuPermission::Table, AuthMenuPermission::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uk_auth_role_menu_permission_role_permission")
                    .table(AuthRoleMenuPermission::Table)
                    .col(AuthRoleMenuPermission::RoleId)
                    .col(AuthRoleMenuPermission::MenuPermissionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthRoleMenuPermission::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AuthRoleMenuPermission {
    Table,
    Id,
    RoleId,
    MenuPermissionId,
}

#[derive(DeriveIden)]
enum AuthRole {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum AuthMenuPermission {
    Table,
    Id,
}
