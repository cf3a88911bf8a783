//! # Entity 模块
//!
//! 认证与权限子系统的 Sea-ORM 实体定义

pub mod menu_permissions;
pub mod role_menu_permission;
pub mod roles;
pub mod system_settings;
pub mod user_role_rel;
pub mod users;

pub use menu_permissions::Entity as MenuPermissions;
pub use role_menu_permission::Entity as RoleMenuPermission;
pub use roles::Entity as Roles;
pub use system_settings::Entity as SystemSettings;
pub use user_role_rel::Entity as UserRoleRel;
pub use users::Entity as Users;

#[cfg(test)]
mod tests;
