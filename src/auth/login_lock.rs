//! # 登录失败锁定
//!
//! 按策略以 `IP` 或 `IP + 用户名` 为范围统计失败次数。每次失败都会把计数的过期时间
//! 重置为锁定窗口（滑动窗口），达到阈值后在窗口内拒绝登录。
//!
//! 计数的读写没有加锁，同一范围的并发失败可能少计，最多少计并发请求数

use crate::cache::{CacheKey, CacheKeyBuilder, CacheManager};
use crate::error::{AuthError, Result};
use crate::settings::{LoginFailLockPolicy, SettingsResolver};
use crate::{ldebug, linfo, logging::{LogComponent, LogStage}};
use std::time::Duration;

/// 登录失败锁定入口
#[derive(Clone)]
pub struct LoginFailureLock {
    cache: CacheManager,
    settings: SettingsResolver,
}

/// 某个范围内的失败计数状态
#[derive(Debug)]
pub struct LockState {
    cache: CacheManager,
    key: CacheKey,
    policy: LoginFailLockPolicy,
    count: i64,
    threshold: i64,
    window: Duration,
    window_minutes: i32,
}

impl LoginFailureLock {
    #[must_use]
    pub const fn new(cache: CacheManager, settings: SettingsResolver) -> Self {
        Self { cache, settings }
    }

    /// 读取策略并加载当前计数
    ///
    /// 策略为不锁定时返回 `None`，此时无需再做任何锁定相关调用
    pub async fn init(&self, client_ip: &str, username: &str) -> Result<Option<LockState>> {
        let settings = self.settings.get_settings().await?;
        let key = match settings.login_failed_lock_policy {
            LoginFailLockPolicy::NoLock => return Ok(None),
            LoginFailLockPolicy::LockIpUser => {
                CacheKeyBuilder::login_lock(client_ip, Some(username))
            }
            LoginFailLockPolicy::LockIp => CacheKeyBuilder::login_lock(client_ip, None),
        };

        let count: i64 = self.cache.get_json(&key.build()).await?.unwrap_or(0);
        ldebug!(
            "system",
            LogStage::Authentication,
            LogComponent::LoginLock,
            "lock_state_loaded",
            &format!("登录失败计数: key={key}, count={count}")
        );

        Ok(Some(LockState {
            cache: self.cache.clone(),
            key,
            policy: settings.login_failed_lock_policy,
            count,
            threshold: i64::from(settings.login_failed_lock_number),
            window: settings.lock_window(),
            window_minutes: settings.login_failed_lock_max_age,
        }))
    }
}

impl LockState {
    /// 当前失败次数
    #[must_use]
    pub const fn count(&self) -> i64 {
        self.count
    }

    /// 计数所在的缓存键
    #[must_use]
    pub const fn key(&self) -> &CacheKey {
        &self.key
    }

    /// 失败次数是否已达到阈值
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.count >= self.threshold
    }

    /// 已锁定时返回带剩余时间说明的 `AccountLocked`
    pub fn check_locked(&self) -> std::result::Result<(), AuthError> {
        if !self.is_locked() {
            return Ok(());
        }
        let message = match self.policy {
            LoginFailLockPolicy::LockIp => format!(
                "当前IP的登录行为被限制，请{}分钟后再试!",
                self.window_minutes
            ),
            _ => format!(
                "当前IP对该用户的登录行为被限制，请 {} 分钟后再试!",
                self.window_minutes
            ),
        };
        Err(AuthError::AccountLocked { message })
    }

    /// 记录一次失败，计数的过期时间重置为完整的锁定窗口
    ///
    /// 返回“已尝试 N 次，剩余 M 次”的提示
    pub async fn record_failure(&mut self) -> Result<String> {
        let count = self.count + 1;
        self.cache
            .set_json(&self.key.build(), &count, Some(self.window))
            .await?;
        self.count = count;

        let remaining = (self.threshold - count).max(0);
        if remaining == 0 {
            linfo!(
                "system",
                LogStage::Authentication,
                LogComponent::LoginLock,
                "lock_engaged",
                &format!("登录失败次数达到阈值，开始锁定: key={}", self.key)
            );
        }

        Ok(match self.policy {
            LoginFailLockPolicy::LockIp => format!("已尝试 {count} 次，剩余 {remaining} 次！"),
            _ => format!("此用户名已尝试 {count} 次，剩余 {remaining} 次！"),
        })
    }

    /// 删除计数，在该范围内登录成功后调用
    pub async fn clear(mut self) -> Result<()> {
        self.cache.delete(&self.key).await?;
        self.count = 0;
        Ok(())
    }
}
