//! # 用户实体定义
//!
//! 权限系统用户表的 Sea-ORM 实体模型

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 用户实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    /// 密码哈希，只能通过密码哈希组件写入
    #[serde(skip_serializing)]
    pub hashed_psw: String,
    pub description: Option<String>,
    /// 是否可用
    pub can_use: bool,
    /// 密码最后更新时间
    pub psw_last_modified_datetime: DateTime,
    pub last_login_ip: Option<String>,
    pub last_login_dt: Option<DateTime>,
    pub create_datetime: DateTime,
    pub info_last_modified_datetime: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_role_rel::Entity")]
    UserRoleRel,
}

impl Related<super::user_role_rel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRoleRel.def()
    }
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_role_rel::Relation::Role.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_role_rel::Relation::User.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
