//! # 登录流程
//!
//! 顺序：未登录检查、验证码、锁定检查、密码校验（失败计数）、禁用检查、
//! 清除失败计数、记录登录 IP 与时间、写入会话。会话只在其余步骤全部成功后才标记为已登录

use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use super::login_lock::LoginFailureLock;
use super::session::{CaptchaChallenge, LoginStateGuard, Session};
use super::users::UserService;
use crate::error::{AuthError, Result};
use crate::repository::AuthRepository;
use crate::{linfo, logging::{LogComponent, LogStage}};

/// 登录表单
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub captcha: String,
}

/// 登录结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// 登录成功，`password_expired` 为真时外层应引导修改密码
    LoggedIn { user_id: i32, password_expired: bool },
    /// 登录被拒绝
    Rejected(AuthError),
}

impl LoginOutcome {
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn { .. })
    }
}

/// 登录服务
#[derive(Clone)]
pub struct LoginService {
    repository: Arc<dyn AuthRepository>,
    users: UserService,
    lock: LoginFailureLock,
    guard: LoginStateGuard,
    captcha: CaptchaChallenge,
}

impl LoginService {
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuthRepository>,
        users: UserService,
        lock: LoginFailureLock,
        guard: LoginStateGuard,
        captcha: CaptchaChallenge,
    ) -> Self {
        Self {
            repository,
            users,
            lock,
            guard,
            captcha,
        }
    }

    /// 执行登录；会话的保存由调用方负责
    pub async fn login(
        &self,
        session: &mut Session,
        client_ip: &str,
        request: &LoginRequest,
    ) -> Result<LoginOutcome> {
        if let Err(e) = self.guard.require_logged_out(session) {
            return Ok(LoginOutcome::Rejected(e));
        }
        if !self.captcha.verify(session, &request.captcha) {
            return Ok(LoginOutcome::Rejected(AuthError::CaptchaMismatch));
        }

        let lock = self.lock.init(client_ip, &request.username).await?;
        if let Some(state) = &lock {
            if let Err(e) = state.check_locked() {
                linfo!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::LoginLock,
                    "login_blocked",
                    "登录已被锁定",
                    client_ip = client_ip
                );
                return Ok(LoginOutcome::Rejected(e));
            }
        }

        let candidate = self.users.find_by_username(&request.username).await?;
        let verified = match &candidate {
            Some(user) => self.users.verify_credential(user, &request.password).await?,
            None => false,
        };

        let user = match candidate {
            Some(user) if verified => user,
            _ => {
                let attempts = match lock {
                    Some(mut state) => Some(state.record_failure().await?),
                    None => None,
                };
                linfo!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::LoginLock,
                    "login_failed",
                    "用户名或密码错误",
                    client_ip = client_ip,
                    username = request.username
                );
                return Ok(LoginOutcome::Rejected(AuthError::InvalidCredentials {
                    attempts,
                }));
            }
        };

        if !user.can_use {
            return Ok(LoginOutcome::Rejected(AuthError::AccountDisabled));
        }

        if let Some(state) = lock {
            state.clear().await?;
        }
        self.repository
            .record_login(user.id, client_ip.to_string(), Utc::now().naive_utc())
            .await?;
        let password_expired = self.users.password_expired(&user).await?;
        self.guard.mark_logged_in(session, user.id);

        linfo!(
            "system",
            LogStage::Authentication,
            LogComponent::Session,
            "login_succeeded",
            &format!("用户登录成功: {}", user.username),
            user_id = user.id,
            client_ip = client_ip
        );
        Ok(LoginOutcome::LoggedIn {
            user_id: user.id,
            password_expired,
        })
    }

    /// 退出登录，返回退出的用户 ID
    pub fn logout(&self, session: &mut Session) -> std::result::Result<i32, AuthError> {
        let user_id = self.guard.require_logged_in(session)?;
        self.guard.clear(session);
        linfo!(
            "system",
            LogStage::Authentication,
            LogComponent::Session,
            "logout",
            "用户已退出登录",
            user_id = user_id
        );
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AuthCore;
    use crate::auth::PasswordHasher;
    use crate::cache::MemoryCache;
    use crate::error::PortalError;
    use crate::repository::{MockAuthRepository, UserRecord};
    use crate::settings::SettingsSnapshot;
    use crate::testing::{TEST_BCRYPT_COST, TestContext, init_test_env, test_auth_config};

    fn request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            captcha: "ABCD".to_string(),
        }
    }

    fn session_with_captcha(ctx: &TestContext) -> Session {
        let mut session = Session::new();
        ctx.core.captcha().issue(&mut session, "abcd");
        session
    }

    #[tokio::test]
    async fn test_successful_login_writes_session() {
        let ctx = TestContext::new().await;
        let user = ctx.core.users().create_user("alice", "Passw0rd", None).await.unwrap();
        let mut session = session_with_captcha(&ctx);

        let outcome = ctx
            .core
            .login()
            .login(&mut session, "127.0.0.1", &request("alice", "Passw0rd"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            LoginOutcome::LoggedIn {
                user_id: user.id,
                password_expired: false
            }
        );
        assert_eq!(ctx.core.guard().require_logged_in(&session), Ok(user.id));

        let reloaded = ctx.core.users().find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(reloaded.last_login_ip.as_deref(), Some("127.0.0.1"));
        assert!(reloaded.last_login_dt.is_some());
    }

    #[tokio::test]
    async fn test_wrong_captcha_rejected_before_credentials() {
        let ctx = TestContext::new().await;
        ctx.core.users().create_user("alice", "Passw0rd", None).await.unwrap();
        let mut session = Session::new();

        let outcome = ctx
            .core
            .login()
            .login(&mut session, "127.0.0.1", &request("alice", "Passw0rd"))
            .await
            .unwrap();
        assert_eq!(outcome, LoginOutcome::Rejected(AuthError::CaptchaMismatch));
    }

    #[tokio::test]
    async fn test_wrong_password_counts_attempts() {
        let ctx = TestContext::new().await;
        ctx.core.users().create_user("alice", "Passw0rd", None).await.unwrap();
        let mut session = session_with_captcha(&ctx);

        let outcome = ctx
            .core
            .login()
            .login(&mut session, "127.0.0.1", &request("alice", "wrong-pass"))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::Rejected(AuthError::InvalidCredentials {
                attempts: Some("此用户名已尝试 1 次，剩余 9 次！".to_string())
            })
        );
        assert!(ctx.core.guard().require_logged_in(&session).is_err());
    }

    #[tokio::test]
    async fn test_unknown_user_looks_like_wrong_password() {
        let ctx = TestContext::new().await;
        let mut session = session_with_captcha(&ctx);

        let outcome = ctx
            .core
            .login()
            .login(&mut session, "127.0.0.1", &request("ghost", "whatever"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            LoginOutcome::Rejected(AuthError::InvalidCredentials { .. })
        ));
    }

    #[tokio::test]
    async fn test_disabled_user_rejected() {
        let ctx = TestContext::new().await;
        let users = ctx.core.users();
        let user = users.create_user("alice", "Passw0rd", None).await.unwrap();
        users.set_enabled(user.id, false).await.unwrap();
        let mut session = session_with_captcha(&ctx);

        let outcome = ctx
            .core
            .login()
            .login(&mut session, "127.0.0.1", &request("alice", "Passw0rd"))
            .await
            .unwrap();
        assert_eq!(outcome, LoginOutcome::Rejected(AuthError::AccountDisabled));
    }

    #[tokio::test]
    async fn test_login_requires_logged_out_and_logout_requires_logged_in() {
        let ctx = TestContext::new().await;
        let user = ctx.core.users().create_user("alice", "Passw0rd", None).await.unwrap();
        let service = ctx.core.login();
        let mut session = session_with_captcha(&ctx);

        assert!(
            service
                .login(&mut session, "127.0.0.1", &request("alice", "Passw0rd"))
                .await
                .unwrap()
                .is_logged_in()
        );
        ctx.core.captcha().issue(&mut session, "abcd");
        assert_eq!(
            service
                .login(&mut session, "127.0.0.1", &request("alice", "Passw0rd"))
                .await
                .unwrap(),
            LoginOutcome::Rejected(AuthError::AlreadyAuthenticated)
        );

        assert_eq!(service.logout(&mut session), Ok(user.id));
        assert_eq!(
            service.logout(&mut session),
            Err(AuthError::NotAuthenticated)
        );
    }

    #[tokio::test]
    async fn test_storage_failure_after_verification_leaves_session_anonymous() {
        init_test_env();
        let hashed_psw = PasswordHasher::new(TEST_BCRYPT_COST, 1)
            .hash("Passw0rd")
            .await
            .unwrap();
        let now = Utc::now().naive_utc();
        let user = UserRecord {
            id: 7,
            username: "alice".to_string(),
            hashed_psw,
            description: None,
            can_use: true,
            psw_last_modified_datetime: now,
            last_login_ip: None,
            last_login_dt: None,
            create_datetime: now,
            info_last_modified_datetime: None,
        };

        let mut repository = MockAuthRepository::new();
        repository
            .expect_load_or_init_settings()
            .returning(|defaults| Ok(defaults.clone()));
        repository
            .expect_find_user_by_username()
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_record_login()
            .times(1)
            .returning(|_, _, _| Err(PortalError::database("写入登录记录失败")));

        let core = AuthCore::new(
            Arc::new(MemoryCache::new(64)),
            Arc::new(repository),
            test_auth_config(SettingsSnapshot::default()),
        );
        let mut session = Session::new();
        core.captcha().issue(&mut session, "abcd");

        let result = core
            .login()
            .login(&mut session, "127.0.0.1", &request("alice", "Passw0rd"))
            .await;

        assert!(matches!(result, Err(PortalError::Database { .. })));
        assert_eq!(
            core.guard().require_logged_in(&session),
            Err(AuthError::NotAuthenticated)
        );
        assert_eq!(core.guard().require_logged_out(&session), Ok(()));
    }
}
