use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthMenuPermission::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthMenuPermission::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AuthMenuPermission::Name)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthMenuPermission::Code)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(AuthMenuPermission::ParentId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_menu_permission_parent_id")
                            .from(AuthMenuPermission::Table, AuthMenuPermission::ParentId)
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
                    .name("idx_auth_menu_permission_code")
                    .table(AuthMenuPermission::Table)
                    .col(AuthMenuPermission::Code)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthMenuPermission::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AuthMenuPermission {
    Table,
    Id,
    Name,
    Code,
    ParentId,
}
