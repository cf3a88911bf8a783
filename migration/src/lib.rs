pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_auth_user_table;
mod m20240101_000002_create_auth_role_table;
mod m20240101_000003_create_auth_menu_permission_table;
mod m20240101_000004_create_auth_user_role_rel_table;
mod m20240101_000005_create_auth_role_menu_permission_table;
mod m20240101_000006_create_system_settings_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_auth_user_table::Migration),
            Box::new(m20240101_000002_create_auth_role_table::Migration),
            Box::new(m20240101_000003_create_auth_menu_permission_table::Migration),
            Box::new(m20240101_000004_create_auth_user_role_rel_table::Migration),
            Box::new(m20240101_000005_create_auth_role_menu_permission_table::Migration),
            Box::new(m20240101_000006_create_system_settings_table::Migration),
        ]
    }
}
