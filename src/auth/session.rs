//! # 会话与登录状态守卫
//!
//! 会话内容以 JSON 形式保存在缓存中，键为 `session:{token}`。每次保存都按当前系统设置
//! 重新设置空闲过期时间，调整设置后对已有会话的下一次保存立即生效

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::cache::{CacheKeyBuilder, CacheManager};
use crate::error::{AuthError, Result};
use crate::settings::SettingsResolver;
use crate::{ldebug, logging::{LogComponent, LogStage}};

/// 会话中保存的键值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionState {
    values: HashMap<String, Value>,
}

impl SessionState {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub(crate) fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// 一个客户端会话
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    token: String,
    state: SessionState,
}

impl Session {
    /// 以新的随机令牌创建空会话
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: uuid::Uuid::new_v4().to_string(),
            state: SessionState::default(),
        }
    }

    /// 会话令牌，由外层写入客户端 cookie
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// 会话内容只读视图；登录标记与验证码答案只能经守卫和验证码组件写入
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// 基于缓存的会话存储
#[derive(Clone)]
pub struct CacheSessionStore {
    cache: CacheManager,
    settings: SettingsResolver,
}

impl CacheSessionStore {
    #[must_use]
    pub const fn new(cache: CacheManager, settings: SettingsResolver) -> Self {
        Self { cache, settings }
    }

    /// 按令牌加载会话，不存在或已过期时返回 `None`
    pub async fn load(&self, token: &str) -> Result<Option<Session>> {
        let key = CacheKeyBuilder::session(token);
        let state: Option<SessionState> = self.cache.get_json(&key.build()).await?;
        Ok(state.map(|state| Session {
            token: token.to_string(),
            state,
        }))
    }

    /// 加载会话，不存在时创建新会话（新会话在保存前不会写入缓存）
    pub async fn load_or_create(&self, token: Option<&str>) -> Result<Session> {
        if let Some(token) = token {
            if let Some(session) = self.load(token).await? {
                return Ok(session);
            }
        }
        Ok(Session::new())
    }

    /// 保存会话并重新设置空闲过期时间
    pub async fn save(&self, session: &Session) -> Result<()> {
        let idle = self.settings.get_settings().await?.session_idle_timeout();
        let key = CacheKeyBuilder::session(&session.token);
        self.cache
            .set_json(&key.build(), &session.state, Some(idle))
            .await?;

        ldebug!(
            "system",
            LogStage::Session,
            LogComponent::Session,
            "session_saved",
            &format!("会话已保存，空闲过期 {} 秒", idle.as_secs())
        );
        Ok(())
    }

    /// 删除会话
    pub async fn destroy(&self, session: &Session) -> Result<()> {
        self.cache
            .delete(&CacheKeyBuilder::session(&session.token))
            .await
    }
}

/// 登录状态守卫
#[derive(Debug, Clone)]
pub struct LoginStateGuard {
    session_user_key: String,
}

impl LoginStateGuard {
    #[must_use]
    pub fn new(session_user_key: impl Into<String>) -> Self {
        Self {
            session_user_key: session_user_key.into(),
        }
    }

    /// 会话中的登录用户；值缺失、为空或不是合法的用户 ID 都视为未登录
    fn logged_in_user(&self, session: &Session) -> Option<i32> {
        session
            .state
            .get(&self.session_user_key)
            .and_then(Value::as_i64)
            .and_then(|id| i32::try_from(id).ok())
    }

    /// 需要已登录，返回当前用户 ID
    pub fn require_logged_in(&self, session: &Session) -> std::result::Result<i32, AuthError> {
        self.logged_in_user(session).ok_or_else(|| {
            ldebug!(
                "system",
                LogStage::Session,
                LogComponent::Session,
                "not_authenticated",
                "会话中没有登录用户"
            );
            AuthError::NotAuthenticated
        })
    }

    /// 需要未登录
    pub fn require_logged_out(&self, session: &Session) -> std::result::Result<(), AuthError> {
        if let Some(user_id) = self.logged_in_user(session) {
            ldebug!(
                "system",
                LogStage::Session,
                LogComponent::Session,
                "already_authenticated",
                "会话中已有登录用户",
                user_id = user_id
            );
            return Err(AuthError::AlreadyAuthenticated);
        }
        Ok(())
    }

    pub(crate) fn mark_logged_in(&self, session: &mut Session, user_id: i32) {
        session
            .state
            .insert(self.session_user_key.clone(), user_id);
    }

    pub(crate) fn clear(&self, session: &mut Session) {
        session.state.remove(&self.session_user_key);
    }
}

/// 会话中的验证码答案
///
/// 验证码图片的生成由外层负责，这里只保存答案并在校验时消费
#[derive(Debug, Clone)]
pub struct CaptchaChallenge {
    captcha_key: String,
}

impl CaptchaChallenge {
    #[must_use]
    pub fn new(captcha_key: impl Into<String>) -> Self {
        Self {
            captcha_key: captcha_key.into(),
        }
    }

    /// 保存验证码答案，覆盖尚未使用的旧答案
    pub fn issue(&self, session: &mut Session, answer: &str) {
        session.state.insert(self.captcha_key.clone(), answer);
    }

    /// 校验验证码（忽略大小写），无论结果如何答案都会被移除
    pub fn verify(&self, session: &mut Session, input: &str) -> bool {
        match session.state.remove(&self.captcha_key) {
            Some(Value::String(expected)) => expected.to_lowercase() == input.to_lowercase(),
            _ => false,
        }
    }
}
