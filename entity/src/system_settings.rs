//! # 系统设置实体定义
//!
//! 全局只有一行，首次读取时以默认值惰性创建

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 系统设置实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "system_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 密码最小长度
    pub min_psw_length: i32,
    /// 密码最大长度
    pub max_psw_length: i32,
    /// 开启密码使用期限
    pub psw_change_max_age_enable: bool,
    /// 密码使用期限(单位:天)
    pub psw_change_max_age: i32,
    /// 会话空闲登出时间(单位:分钟)
    pub session_idle_logout_max_age: i32,
    /// 用户登录失败锁定策略: 0 不锁定 / 1 锁定IP与用户 / 2 锁定IP
    pub login_failed_lock_policy: i32,
    /// 用户登录失败锁定次数
    pub login_failed_lock_number: i32,
    /// 用户登录失败锁定时间(单位:分钟)
    pub login_failed_lock_max_age: i32,
    pub create_datetime: DateTime,
    pub modify_datetime: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
