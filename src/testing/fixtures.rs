//! # 测试数据 Fixtures
//!
//! 通过服务层写入，保证密码经过哈希且缓存失效路径与生产一致

use crate::app::AuthCore;
use crate::error::Result;
use crate::repository::{MenuPermissionRecord, NewMenuPermission, RoleRecord, UserRecord};

/// 用户测试数据构建器
pub struct UserFixture {
    pub username: String,
    pub password: String,
    pub description: Option<String>,
    pub can_use: bool,
    pub role_ids: Vec<i32>,
}

impl Default for UserFixture {
    fn default() -> Self {
        Self {
            username: "test_user".to_string(),
            password: "Passw0rd".to_string(),
            description: None,
            can_use: true,
            role_ids: Vec::new(),
        }
    }
}

impl UserFixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    #[must_use]
    pub fn password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    /// 设置为禁用状态
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.can_use = false;
        self
    }

    #[must_use]
    pub fn roles(mut self, role_ids: &[i32]) -> Self {
        self.role_ids = role_ids.to_vec();
        self
    }

    /// 写入数据库
    pub async fn create(self, core: &AuthCore) -> Result<UserRecord> {
        let user = core
            .users()
            .create_user(&self.username, &self.password, self.description.as_deref())
            .await?;
        if !self.can_use {
            core.users().set_enabled(user.id, false).await?;
        }
        if !self.role_ids.is_empty() {
            core.permissions()
                .update_user_roles(user.id, self.role_ids)
                .await?;
        }
        Ok(user)
    }
}

/// 角色测试数据构建器
pub struct RoleFixture {
    pub name: String,
    pub permissions: Vec<String>,
}

impl RoleFixture {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            permissions: Vec::new(),
        }
    }

    #[must_use]
    pub fn permissions(mut self, codes: &[&str]) -> Self {
        self.permissions = codes.iter().map(ToString::to_string).collect();
        self
    }

    pub async fn create(self, core: &AuthCore) -> Result<RoleRecord> {
        let role = core.permissions().create_role(&self.name, None).await?;
        if !self.permissions.is_empty() {
            core.permissions()
                .update_role_permissions(role.id, self.permissions)
                .await?;
        }
        Ok(role)
    }
}

/// 菜单权限测试数据构建器
pub struct MenuPermissionFixture {
    inner: NewMenuPermission,
}

impl MenuPermissionFixture {
    #[must_use]
    pub fn new(code: &str) -> Self {
        Self {
            inner: NewMenuPermission {
                name: code.to_uppercase(),
                code: code.to_string(),
                parent_id: None,
            },
        }
    }

    #[must_use]
    pub const fn parent(mut self, parent_id: i32) -> Self {
        self.inner.parent_id = Some(parent_id);
        self
    }

    pub async fn create(self, core: &AuthCore) -> Result<MenuPermissionRecord> {
        core.permissions().create_menu_permission(self.inner).await
    }

    /// 按顺序创建多个顶层权限
    pub async fn create_all(core: &AuthCore, codes: &[&str]) -> Result<Vec<MenuPermissionRecord>> {
        let mut records = Vec::with_capacity(codes.len());
        for code in codes {
            records.push(Self::new(code).create(core).await?);
        }
        Ok(records)
    }
}
