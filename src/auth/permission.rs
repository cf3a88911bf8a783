//! # 权限解析
//!
//! 两级缓存：`user_{id}_roles` 保存用户的角色 id，`role_{id}_menu_permissions`
//! 保存角色的权限代码。关系写入在事务提交之后才删除对应缓存键，
//! 下一次读取从数据库重新填充

use futures::future::try_join_all;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::cache::{CacheKeyBuilder, CacheManager, CacheSlot};
use crate::error::{PermissionDecision, Result};
use crate::repository::{AuthRepository, MenuNode, MenuPermissionRecord, NewMenuPermission, RoleRecord};
use crate::{ldebug, linfo, logging::{LogComponent, LogStage}};

/// 权限解析器
#[derive(Clone)]
pub struct PermissionResolver {
    cache: CacheManager,
    repository: Arc<dyn AuthRepository>,
}

impl PermissionResolver {
    #[must_use]
    pub fn new(cache: CacheManager, repository: Arc<dyn AuthRepository>) -> Self {
        Self { cache, repository }
    }

    /// 用户所属角色 id
    pub async fn get_user_roles(&self, user_id: i32) -> Result<Vec<i32>> {
        self.cache
            .get_or_populate(&CacheKeyBuilder::user_roles(user_id), None, || {
                self.repository.find_role_ids_for_user(user_id)
            })
            .await
    }

    /// 角色的权限代码；角色不存在时返回 `None` 且不写缓存
    async fn get_role_permissions(&self, role_id: i32) -> Result<Option<Vec<String>>> {
        let key = CacheKeyBuilder::role_menu_permissions(role_id);
        match self.cache.fetch::<Vec<String>>(&key).await? {
            CacheSlot::Hit(codes) => Ok(Some(codes)),
            CacheSlot::Miss(slot) => {
                match self.repository.find_permission_codes_for_role(role_id).await? {
                    Some(codes) => Ok(Some(slot.fill(codes, None).await?)),
                    None => {
                        ldebug!(
                            "system",
                            LogStage::Authorization,
                            LogComponent::Permission,
                            "role_missing",
                            &format!("角色已不存在，跳过: role_id={role_id}")
                        );
                        Ok(None)
                    }
                }
            }
        }
    }

    /// 用户通过全部角色获得的权限代码并集
    pub async fn get_user_permissions(&self, user_id: i32) -> Result<BTreeSet<String>> {
        let role_ids = self.get_user_roles(user_id).await?;
        let resolved = try_join_all(
            role_ids
                .into_iter()
                .map(|role_id| self.get_role_permissions(role_id)),
        )
        .await?;
        Ok(resolved.into_iter().flatten().flatten().collect())
    }

    /// 用户是否拥有指定权限
    pub async fn check_permission(&self, user_id: i32, code: &str) -> Result<bool> {
        Ok(self.get_user_permissions(user_id).await?.contains(code))
    }

    /// 以结果值形式返回权限判断，供外层直接转换为响应
    pub async fn authorize(&self, user_id: i32, code: &str) -> Result<PermissionDecision> {
        if self.check_permission(user_id, code).await? {
            return Ok(PermissionDecision::Granted);
        }
        ldebug!(
            "system",
            LogStage::Authorization,
            LogComponent::Permission,
            "permission_denied",
            &format!("权限不足: user_id={user_id}, code={code}")
        );
        Ok(PermissionDecision::Denied {
            code: code.to_string(),
        })
    }

    /// 替换角色的权限，提交后删除该角色的权限缓存
    pub async fn update_role_permissions(&self, role_id: i32, codes: Vec<String>) -> Result<()> {
        self.repository
            .replace_role_permissions(role_id, codes)
            .await?;
        self.cache
            .delete(&CacheKeyBuilder::role_menu_permissions(role_id))
            .await?;

        linfo!(
            "system",
            LogStage::Authorization,
            LogComponent::Permission,
            "role_permissions_updated",
            &format!("角色权限已更新: role_id={role_id}")
        );
        Ok(())
    }

    /// 替换用户的角色，提交后删除该用户的角色缓存
    pub async fn update_user_roles(&self, user_id: i32, role_ids: Vec<i32>) -> Result<()> {
        self.repository.replace_user_roles(user_id, role_ids).await?;
        self.cache
            .delete(&CacheKeyBuilder::user_roles(user_id))
            .await?;

        linfo!(
            "system",
            LogStage::Authorization,
            LogComponent::Permission,
            "user_roles_updated",
            &format!("用户角色已更新: user_id={user_id}")
        );
        Ok(())
    }

    /// 新建角色
    pub async fn create_role(&self, name: &str, description: Option<&str>) -> Result<RoleRecord> {
        self.repository
            .create_role(name.to_string(), description.map(str::to_string))
            .await
    }

    /// 删除角色，提交后删除每个角色的权限缓存
    ///
    /// 仍缓存着这些角色 id 的用户角色列表会在解析时跳过已删除的角色
    pub async fn delete_roles(&self, role_ids: &[i32]) -> Result<u64> {
        let deleted = self.repository.delete_roles(role_ids.to_vec()).await?;
        for role_id in role_ids {
            self.cache
                .delete(&CacheKeyBuilder::role_menu_permissions(*role_id))
                .await?;
        }

        linfo!(
            "system",
            LogStage::Authorization,
            LogComponent::Permission,
            "roles_deleted",
            &format!("已删除 {deleted} 个角色")
        );
        Ok(deleted)
    }

    /// 菜单权限树
    pub async fn get_menu_tree(&self) -> Result<Vec<MenuNode>> {
        self.cache
            .get_or_populate(&CacheKeyBuilder::all_menu_permissions(), None, || {
                self.repository.load_menu_tree()
            })
            .await
    }

    /// 新建菜单权限，提交后删除菜单树缓存
    pub async fn create_menu_permission(
        &self,
        permission: NewMenuPermission,
    ) -> Result<MenuPermissionRecord> {
        let record = self.repository.create_menu_permission(permission).await?;
        self.cache
            .delete(&CacheKeyBuilder::all_menu_permissions())
            .await?;
        Ok(record)
    }
}
