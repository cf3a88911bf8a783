//! # 角色实体定义
//!
//! 角色是一组菜单权限的集合，与用户、菜单权限均为多对多关系

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 角色实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_role")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
    pub create_datetime: DateTime,
    pub modify_datetime: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_role_rel::Entity")]
    UserRoleRel,
    #[sea_orm(has_many = "super::role_menu_permission::Entity")]
    RoleMenuPermission,
}

impl Related<super::user_role_rel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRoleRel.def()
    }
}

impl Related<super::role_menu_permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleMenuPermission.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_role_rel::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_role_rel::Relation::Role.def().rev())
    }
}

impl Related<super::menu_permissions::Entity> for Entity {
    fn to() -> RelationDef {
        super::role_menu_permission::Relation::MenuPermission.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::role_menu_permission::Relation::Role.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
