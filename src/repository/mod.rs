//! # 存储后端
//!
//! 认证子系统所需的持久化能力：事务性增删改、唯一约束与级联删除。
//! 生产实现为 [`SeaOrmRepository`]，测试中可使用 `MockAuthRepository` 统计读取次数

mod sea_orm_backend;

pub use sea_orm_backend::SeaOrmRepository;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::settings::{SettingsPatch, SettingsSnapshot};

pub use entity::menu_permissions::Model as MenuPermissionRecord;
pub use entity::roles::Model as RoleRecord;
pub use entity::users::Model as UserRecord;

/// 新建用户所需字段，密码必须已经过哈希
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub hashed_psw: String,
    pub description: Option<String>,
    pub can_use: bool,
}

/// 新建菜单权限所需字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMenuPermission {
    pub name: String,
    pub code: String,
    pub parent_id: Option<i32>,
}

/// 菜单权限树节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuNode {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    /// 由扁平记录构建森林，子节点按 id 排序；父节点缺失的记录作为根节点
    #[must_use]
    pub fn build_tree(records: &[MenuPermissionRecord]) -> Vec<Self> {
        fn children_of(records: &[MenuPermissionRecord], parent: Option<i32>) -> Vec<MenuNode> {
            let mut nodes: Vec<MenuNode> = records
                .iter()
                .filter(|record| record.parent_id == parent)
                .map(|record| MenuNode {
                    id: record.id,
                    name: record.name.clone(),
                    code: record.code.clone(),
                    children: children_of(records, Some(record.id)),
                })
                .collect();
            nodes.sort_by_key(|node| node.id);
            nodes
        }

        let known: std::collections::HashSet<i32> = records.iter().map(|r| r.id).collect();
        let mut roots = children_of(records, None);
        for orphan in records
            .iter()
            .filter(|r| r.parent_id.is_some_and(|p| !known.contains(&p)))
        {
            roots.push(Self {
                id: orphan.id,
                name: orphan.name.clone(),
                code: orphan.code.clone(),
                children: children_of(records, Some(orphan.id)),
            });
        }
        roots.sort_by_key(|node| node.id);
        roots
    }

    /// 深度优先收集所有权限代码
    #[must_use]
    pub fn codes(&self) -> Vec<&str> {
        let mut codes = vec![self.code.as_str()];
        for child in &self.children {
            codes.extend(child.codes());
        }
        codes
    }
}

/// 认证子系统的存储接口
///
/// 每个写操作都在单个事务中完成；缓存失效由调用方在提交之后执行
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// 按 id 查找用户
    async fn find_user(&self, user_id: i32) -> Result<Option<UserRecord>>;

    /// 按用户名查找用户
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// 用户当前所属的角色 id
    async fn find_role_ids_for_user(&self, user_id: i32) -> Result<Vec<i32>>;

    /// 角色拥有的权限代码；角色不存在时返回 `None`
    async fn find_permission_codes_for_role(&self, role_id: i32) -> Result<Option<Vec<String>>>;

    /// 全部菜单权限组成的树
    async fn load_menu_tree(&self) -> Result<Vec<MenuNode>>;

    /// 读取系统设置，不存在时在事务中以 `defaults` 创建
    async fn load_or_init_settings(&self, defaults: &SettingsSnapshot) -> Result<SettingsSnapshot>;

    /// 新建用户
    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord>;

    /// 更新密码哈希及修改时间
    async fn update_user_credential(
        &self,
        user_id: i32,
        hashed_psw: String,
        changed_at: NaiveDateTime,
    ) -> Result<()>;

    /// 启用或禁用用户
    async fn update_user_enabled(&self, user_id: i32, can_use: bool) -> Result<()>;

    /// 记录最近一次登录的 IP 与时间
    async fn record_login(&self, user_id: i32, ip: String, at: NaiveDateTime) -> Result<()>;

    /// 删除用户及其角色关联，返回删除的用户数
    async fn delete_users(&self, user_ids: Vec<i32>) -> Result<u64>;

    /// 新建角色
    async fn create_role(&self, name: String, description: Option<String>) -> Result<RoleRecord>;

    /// 删除角色及其全部关联，返回删除的角色数
    async fn delete_roles(&self, role_ids: Vec<i32>) -> Result<u64>;

    /// 新建菜单权限
    async fn create_menu_permission(
        &self,
        permission: NewMenuPermission,
    ) -> Result<MenuPermissionRecord>;

    /// 用给定角色替换用户的全部角色关联，不存在的角色 id 被忽略
    async fn replace_user_roles(&self, user_id: i32, role_ids: Vec<i32>) -> Result<()>;

    /// 用给定权限代码替换角色的全部权限关联，不存在的代码被忽略
    async fn replace_role_permissions(&self, role_id: i32, codes: Vec<String>) -> Result<()>;

    /// 在同一事务内读取系统设置（不存在时以 `defaults` 为基础）、合并 `patch`、校验并写回
    ///
    /// 读取时对设置行加排他锁，并发的修改依次生效。校验失败时不写入任何内容
    async fn apply_settings_patch(
        &self,
        patch: &SettingsPatch,
        defaults: &SettingsSnapshot,
    ) -> Result<SettingsSnapshot>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: i32, code: &str, parent_id: Option<i32>) -> MenuPermissionRecord {
        MenuPermissionRecord {
            id,
            name: code.to_uppercase(),
            code: code.to_string(),
            parent_id,
        }
    }

    #[test]
    fn test_build_tree_nests_children() {
        let records = vec![
            record(3, "user_add", Some(2)),
            record(1, "system", None),
            record(2, "user", Some(1)),
            record(4, "role", Some(1)),
            record(5, "report", None),
        ];

        let tree = MenuNode::build_tree(&records);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].code, "system");
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].children[0].code, "user_add");
        assert_eq!(tree[0].codes(), vec!["system", "user", "user_add", "role"]);
    }

    #[test]
    fn test_orphans_become_roots() {
        let records = vec![record(2, "dangling", Some(99))];
        let tree = MenuNode::build_tree(&records);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].code, "dangling");
    }
}
