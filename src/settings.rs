//! # 系统设置
//!
//! 密码策略、登录失败锁定策略与会话空闲时间。设置以值快照的形式读取，缓存中保存完整快照

use chrono::{Duration as ChronoDuration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheKey, CacheKeyBuilder, CacheManager};
use crate::error::{PasswordPolicyError, Result, SettingsError};
use crate::repository::AuthRepository;
use crate::{ldebug, linfo, logging::{LogComponent, LogStage}};

const PSW_LENGTH_BOUNDS: RangeInclusive<i32> = 6..=16;
const PSW_MAX_AGE_BOUNDS: RangeInclusive<i32> = 0..=90;
const SESSION_IDLE_BOUNDS: RangeInclusive<i32> = 1..=43200;
const LOCK_NUMBER_BOUNDS: RangeInclusive<i32> = 1..=20;
const LOCK_MAX_AGE_BOUNDS: RangeInclusive<i32> = 1..=60;

/// 登录失败锁定策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginFailLockPolicy {
    /// 不锁定
    NoLock,
    /// 按 IP + 用户名锁定
    #[default]
    LockIpUser,
    /// 按 IP 锁定
    LockIp,
}

impl LoginFailLockPolicy {
    /// 数据库中的存储值
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::NoLock => 0,
            Self::LockIpUser => 1,
            Self::LockIp => 2,
        }
    }
}

impl TryFrom<i32> for LoginFailLockPolicy {
    type Error = SettingsError;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NoLock),
            1 => Ok(Self::LockIpUser),
            2 => Ok(Self::LockIp),
            other => Err(SettingsError::UnknownLockPolicy(other)),
        }
    }
}

/// 系统设置快照
///
/// `Default` 即首次创建设置行时使用的默认值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    /// 密码最小长度
    pub min_psw_length: i32,
    /// 密码最大长度
    pub max_psw_length: i32,
    /// 是否开启密码使用期限
    pub psw_change_max_age_enable: bool,
    /// 密码使用期限（天）
    pub psw_change_max_age: i32,
    /// 会话空闲登出时间（分钟）
    pub session_idle_logout_max_age: i32,
    /// 登录失败锁定策略
    pub login_failed_lock_policy: LoginFailLockPolicy,
    /// 锁定阈值（次）
    pub login_failed_lock_number: i32,
    /// 锁定窗口（分钟）
    pub login_failed_lock_max_age: i32,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            min_psw_length: 8,
            max_psw_length: 16,
            psw_change_max_age_enable: true,
            psw_change_max_age: 90,
            session_idle_logout_max_age: 30,
            login_failed_lock_policy: LoginFailLockPolicy::LockIpUser,
            login_failed_lock_number: 10,
            login_failed_lock_max_age: 5,
        }
    }
}

fn check_bounds(
    field: &'static str,
    value: i32,
    bounds: &RangeInclusive<i32>,
) -> std::result::Result<(), SettingsError> {
    if bounds.contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfBounds {
            field,
            value,
            min: *bounds.start(),
            max: *bounds.end(),
        })
    }
}

impl SettingsSnapshot {
    /// 校验取值范围以及 `min_psw_length <= max_psw_length`
    pub fn validate(&self) -> std::result::Result<(), SettingsError> {
        if self.min_psw_length > self.max_psw_length {
            return Err(SettingsError::InvalidRange {
                min: self.min_psw_length,
                max: self.max_psw_length,
            });
        }
        check_bounds("min_psw_length", self.min_psw_length, &PSW_LENGTH_BOUNDS)?;
        check_bounds("max_psw_length", self.max_psw_length, &PSW_LENGTH_BOUNDS)?;
        check_bounds("psw_change_max_age", self.psw_change_max_age, &PSW_MAX_AGE_BOUNDS)?;
        check_bounds(
            "session_idle_logout_max_age",
            self.session_idle_logout_max_age,
            &SESSION_IDLE_BOUNDS,
        )?;
        check_bounds(
            "login_failed_lock_number",
            self.login_failed_lock_number,
            &LOCK_NUMBER_BOUNDS,
        )?;
        check_bounds(
            "login_failed_lock_max_age",
            self.login_failed_lock_max_age,
            &LOCK_MAX_AGE_BOUNDS,
        )?;
        Ok(())
    }

    /// 会话空闲超时
    #[must_use]
    pub fn session_idle_timeout(&self) -> Duration {
        minutes(self.session_idle_logout_max_age)
    }

    /// 登录失败计数窗口
    #[must_use]
    pub fn lock_window(&self) -> Duration {
        minutes(self.login_failed_lock_max_age)
    }

    /// 密码是否已超过使用期限
    #[must_use]
    pub fn password_expired(&self, last_changed: NaiveDateTime, now: NaiveDateTime) -> bool {
        if !self.psw_change_max_age_enable {
            return false;
        }
        now - last_changed > ChronoDuration::days(i64::from(self.psw_change_max_age))
    }

    /// 按当前长度限制检查明文密码（按字符计数）
    pub fn check_password_length(
        &self,
        plaintext: &str,
    ) -> std::result::Result<(), PasswordPolicyError> {
        let len = plaintext.chars().count();
        let min = usize::try_from(self.min_psw_length).unwrap_or(0);
        let max = usize::try_from(self.max_psw_length).unwrap_or(usize::MAX);
        if len < min {
            return Err(PasswordPolicyError::TooShort { min });
        }
        if len > max {
            return Err(PasswordPolicyError::TooLong { max });
        }
        Ok(())
    }
}

fn minutes(value: i32) -> Duration {
    Duration::from_secs(u64::try_from(value).unwrap_or(0) * 60)
}

/// 设置修改请求，未给出的字段保持原值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub min_psw_length: Option<i32>,
    pub max_psw_length: Option<i32>,
    pub psw_change_max_age_enable: Option<bool>,
    pub psw_change_max_age: Option<i32>,
    pub session_idle_logout_max_age: Option<i32>,
    pub login_failed_lock_policy: Option<LoginFailLockPolicy>,
    pub login_failed_lock_number: Option<i32>,
    pub login_failed_lock_max_age: Option<i32>,
}

impl SettingsPatch {
    /// 以 `base` 为基础合并出完整快照
    #[must_use]
    pub fn apply_to(&self, base: &SettingsSnapshot) -> SettingsSnapshot {
        SettingsSnapshot {
            min_psw_length: self.min_psw_length.unwrap_or(base.min_psw_length),
            max_psw_length: self.max_psw_length.unwrap_or(base.max_psw_length),
            psw_change_max_age_enable: self
                .psw_change_max_age_enable
                .unwrap_or(base.psw_change_max_age_enable),
            psw_change_max_age: self.psw_change_max_age.unwrap_or(base.psw_change_max_age),
            session_idle_logout_max_age: self
                .session_idle_logout_max_age
                .unwrap_or(base.session_idle_logout_max_age),
            login_failed_lock_policy: self
                .login_failed_lock_policy
                .unwrap_or(base.login_failed_lock_policy),
            login_failed_lock_number: self
                .login_failed_lock_number
                .unwrap_or(base.login_failed_lock_number),
            login_failed_lock_max_age: self
                .login_failed_lock_max_age
                .unwrap_or(base.login_failed_lock_max_age),
        }
    }
}

/// 系统设置读取与更新
#[derive(Clone)]
pub struct SettingsResolver {
    cache: CacheManager,
    repository: Arc<dyn AuthRepository>,
    cache_key: CacheKey,
    defaults: SettingsSnapshot,
}

impl SettingsResolver {
    #[must_use]
    pub fn new(
        cache: CacheManager,
        repository: Arc<dyn AuthRepository>,
        cache_key: &str,
        defaults: SettingsSnapshot,
    ) -> Self {
        Self {
            cache,
            repository,
            cache_key: CacheKeyBuilder::settings(cache_key),
            defaults,
        }
    }

    /// 读取当前设置
    ///
    /// 缓存未命中时从数据库读取（不存在则以默认值创建），并以不过期的方式写回缓存
    pub async fn get_settings(&self) -> Result<SettingsSnapshot> {
        self.cache
            .get_or_populate(&self.cache_key, None, || async {
                ldebug!(
                    "system",
                    LogStage::Settings,
                    LogComponent::Settings,
                    "load_settings",
                    "系统设置缓存未命中，从数据库加载"
                );
                self.repository.load_or_init_settings(&self.defaults).await
            })
            .await
    }

    /// 更新设置
    ///
    /// 读取、合并、校验与写入在同一个数据库事务中完成，提交后用完整快照覆盖缓存。
    /// 校验或写入失败时数据库与缓存都保持不变
    pub async fn update_settings(&self, patch: &SettingsPatch) -> Result<SettingsSnapshot> {
        let stored = self
            .repository
            .apply_settings_patch(patch, &self.defaults)
            .await?;
        self.cache.replace_json(&self.cache_key, &stored, None).await?;

        linfo!(
            "system",
            LogStage::Settings,
            LogComponent::Settings,
            "settings_updated",
            "系统设置已更新"
        );
        Ok(stored)
    }

    /// 删除缓存中的设置快照，下次读取时从数据库重新加载
    pub async fn invalidate(&self) -> Result<()> {
        self.cache.delete(&self.cache_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    #[case(8, 8, true)]
    #[case(6, 16, true)]
    #[case(10, 8, false)]
    #[case(16, 6, false)]
    fn test_psw_length_range(#[case] min: i32, #[case] max: i32, #[case] ok: bool) {
        let settings = SettingsSnapshot {
            min_psw_length: min,
            max_psw_length: max,
            ..SettingsSnapshot::default()
        };
        assert_eq!(settings.validate().is_ok(), ok);
        if !ok {
            assert_eq!(
                settings.validate(),
                Err(SettingsError::InvalidRange { min, max })
            );
        }
    }

    #[rstest]
    #[case::psw_too_short("min_psw_length", SettingsPatch { min_psw_length: Some(5), ..Default::default() })]
    #[case::max_age("psw_change_max_age", SettingsPatch { psw_change_max_age: Some(91), ..Default::default() })]
    #[case::session("session_idle_logout_max_age", SettingsPatch { session_idle_logout_max_age: Some(0), ..Default::default() })]
    #[case::lock_number("login_failed_lock_number", SettingsPatch { login_failed_lock_number: Some(21), ..Default::default() })]
    #[case::lock_age("login_failed_lock_max_age", SettingsPatch { login_failed_lock_max_age: Some(61), ..Default::default() })]
    fn test_out_of_bounds(#[case] expected_field: &str, #[case] patch: SettingsPatch) {
        let merged = patch.apply_to(&SettingsSnapshot::default());
        match merged.validate() {
            Err(SettingsError::OutOfBounds { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("预期越界错误，实际: {other:?}"),
        }
    }

    #[test]
    fn test_lock_policy_conversion() {
        for policy in [
            LoginFailLockPolicy::NoLock,
            LoginFailLockPolicy::LockIpUser,
            LoginFailLockPolicy::LockIp,
        ] {
            assert_eq!(LoginFailLockPolicy::try_from(policy.as_i32()), Ok(policy));
        }
        assert_eq!(
            LoginFailLockPolicy::try_from(7),
            Err(SettingsError::UnknownLockPolicy(7))
        );
    }

    #[test]
    fn test_password_expiry() {
        let changed = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut settings = SettingsSnapshot::default();

        assert!(!settings.password_expired(changed, changed + ChronoDuration::days(90)));
        assert!(settings.password_expired(changed, changed + ChronoDuration::days(91)));

        settings.psw_change_max_age_enable = false;
        assert!(!settings.password_expired(changed, changed + ChronoDuration::days(365)));
    }

    #[test]
    fn test_password_length_counts_chars() {
        let settings = SettingsSnapshot {
            min_psw_length: 6,
            max_psw_length: 8,
            ..SettingsSnapshot::default()
        };
        assert_eq!(
            settings.check_password_length("abc"),
            Err(PasswordPolicyError::TooShort { min: 6 })
        );
        assert!(settings.check_password_length("密码密码密码").is_ok());
        assert_eq!(
            settings.check_password_length("123456789"),
            Err(PasswordPolicyError::TooLong { max: 8 })
        );
    }

    #[test]
    fn test_durations() {
        let settings = SettingsSnapshot::default();
        assert_eq!(settings.session_idle_timeout(), Duration::from_secs(30 * 60));
        assert_eq!(settings.lock_window(), Duration::from_secs(5 * 60));
    }
}
