//! # 角色菜单权限关联实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role 与 MenuPermission 多对多中间表
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_role_menu_permission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub role_id: i32,
    pub menu_permission_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::RoleId",
        to = "super::roles::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Role,
    #[sea_orm(
        belongs_to = "super::menu_permissions::Entity",
        from = "Column::MenuPermissionId",
        to = "super::menu_permissions::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    MenuPermission,
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::menu_permissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuPermission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
