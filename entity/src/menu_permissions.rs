//! # 菜单权限实体定义
//!
//! 菜单权限以自关联的父子树表示导航层级，权限检查只使用 `code`

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 菜单权限实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_menu_permission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 权限名称
    pub name: String,
    /// 权限代码
    #[sea_orm(unique)]
    pub code: String,
    /// 父权限
    pub parent_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Parent,
    #[sea_orm(has_many = "super::role_menu_permission::Entity")]
    RoleMenuPermission,
}

impl Related<super::role_menu_permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleMenuPermission.def()
    }
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        super::role_menu_permission::Relation::Role.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::role_menu_permission::Relation::MenuPermission.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
