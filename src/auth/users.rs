//! # 用户账号
//!
//! 密码只通过这里写入：先按系统设置检查长度，再经哈希器计算后落库

use chrono::Utc;
use std::sync::Arc;

use super::password::PasswordHasher;
use crate::cache::{CacheKeyBuilder, CacheManager};
use crate::error::{AuthError, Result};
use crate::repository::{AuthRepository, NewUser, UserRecord};
use crate::settings::SettingsResolver;
use crate::{linfo, logging::{LogComponent, LogStage}};

/// 用户账号服务
#[derive(Clone)]
pub struct UserService {
    cache: CacheManager,
    repository: Arc<dyn AuthRepository>,
    settings: SettingsResolver,
    hasher: PasswordHasher,
}

impl UserService {
    #[must_use]
    pub fn new(
        cache: CacheManager,
        repository: Arc<dyn AuthRepository>,
        settings: SettingsResolver,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            cache,
            repository,
            settings,
            hasher,
        }
    }

    /// 新建启用状态的用户
    pub async fn create_user(
        &self,
        username: &str,
        plaintext: &str,
        description: Option<&str>,
    ) -> Result<UserRecord> {
        self.settings
            .get_settings()
            .await?
            .check_password_length(plaintext)?;
        let hashed_psw = self.hasher.hash(plaintext).await?;

        let user = self
            .repository
            .create_user(NewUser {
                username: username.to_string(),
                hashed_psw,
                description: description.map(str::to_string),
                can_use: true,
            })
            .await?;

        linfo!(
            "system",
            LogStage::Authentication,
            LogComponent::Password,
            "user_created",
            &format!("用户已创建: {}", user.username),
            user_id = user.id
        );
        Ok(user)
    }

    /// 按用户名查找
    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        self.repository.find_user_by_username(username).await
    }

    /// 设置新密码并刷新密码修改时间
    pub async fn set_credential(&self, user_id: i32, plaintext: &str) -> Result<()> {
        self.settings
            .get_settings()
            .await?
            .check_password_length(plaintext)?;
        if self.repository.find_user(user_id).await?.is_none() {
            return Err(AuthError::UserNotFound.into());
        }

        let hashed_psw = self.hasher.hash(plaintext).await?;
        self.repository
            .update_user_credential(user_id, hashed_psw, Utc::now().naive_utc())
            .await?;

        linfo!(
            "system",
            LogStage::Authentication,
            LogComponent::Password,
            "credential_updated",
            "用户密码已更新",
            user_id = user_id
        );
        Ok(())
    }

    /// 校验明文密码是否与用户的哈希匹配
    pub async fn verify_credential(&self, user: &UserRecord, plaintext: &str) -> Result<bool> {
        self.hasher.verify(plaintext, &user.hashed_psw).await
    }

    /// 启用或禁用用户
    pub async fn set_enabled(&self, user_id: i32, can_use: bool) -> Result<()> {
        self.repository.update_user_enabled(user_id, can_use).await
    }

    /// 删除用户，提交后删除各自的角色缓存
    pub async fn delete_users(&self, user_ids: &[i32]) -> Result<u64> {
        let deleted = self.repository.delete_users(user_ids.to_vec()).await?;
        for user_id in user_ids {
            self.cache
                .delete(&CacheKeyBuilder::user_roles(*user_id))
                .await?;
        }
        Ok(deleted)
    }

    /// 按当前设置判断用户密码是否已过期
    pub async fn password_expired(&self, user: &UserRecord) -> Result<bool> {
        let settings = self.settings.get_settings().await?;
        Ok(settings.password_expired(user.psw_last_modified_datetime, Utc::now().naive_utc()))
    }
}
