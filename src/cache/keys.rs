//! # 缓存键命名规范
//!
//! 权限、设置、登录锁定与会话的缓存键统一在这里生成，组件之间不自行拼接键名

use std::fmt;

/// 缓存键类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// 用户所属角色 - `user_{user_id}_roles`
    UserRoles { user_id: i32 },

    /// 角色拥有的菜单权限代码 - `role_{role_id}_menu_permissions`
    RoleMenuPermissions { role_id: i32 },

    /// 菜单权限树 - `all_menu_permissions`
    AllMenuPermissions,

    /// 系统设置快照，键名来自配置
    Settings { key: String },

    /// 按 IP + 用户名统计的登录失败次数 - `{ip}_{username}_lock_number`
    LoginLockIpUser { ip: String, username: String },

    /// 按 IP 统计的登录失败次数 - `{ip}_lock_number`
    LoginLockIp { ip: String },

    /// 服务端会话 - `session:{token}`
    Session { token: String },
}

impl CacheKey {
    /// 生成缓存键字符串
    #[must_use]
    pub fn build(&self) -> String {
        match self {
            Self::UserRoles { user_id } => format!("user_{user_id}_roles"),
            Self::RoleMenuPermissions { role_id } => format!("role_{role_id}_menu_permissions"),
            Self::AllMenuPermissions => "all_menu_permissions".to_string(),
            Self::Settings { key } => key.clone(),
            Self::LoginLockIpUser { ip, username } => format!("{ip}_{username}_lock_number"),
            Self::LoginLockIp { ip } => format!("{ip}_lock_number"),
            Self::Session { token } => format!("session:{token}"),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

/// 缓存键构建器
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    #[must_use]
    pub const fn user_roles(user_id: i32) -> CacheKey {
        CacheKey::UserRoles { user_id }
    }

    #[must_use]
    pub const fn role_menu_permissions(role_id: i32) -> CacheKey {
        CacheKey::RoleMenuPermissions { role_id }
    }

    #[must_use]
    pub const fn all_menu_permissions() -> CacheKey {
        CacheKey::AllMenuPermissions
    }

    #[must_use]
    pub fn settings(key: &str) -> CacheKey {
        CacheKey::Settings {
            key: key.to_string(),
        }
    }

    /// 构建登录失败计数键；`username` 为 `None` 时按 IP 统计
    #[must_use]
    pub fn login_lock(ip: &str, username: Option<&str>) -> CacheKey {
        match username {
            Some(username) => CacheKey::LoginLockIpUser {
                ip: ip.to_string(),
                username: username.to_string(),
            },
            None => CacheKey::LoginLockIp { ip: ip.to_string() },
        }
    }

    #[must_use]
    pub fn session(token: &str) -> CacheKey {
        CacheKey::Session {
            token: token.to_string(),
        }
    }
}
