//! 认证核心的依赖注入容器
//!
//! 持有缓存后端与存储后端，并据此构建全部组件。测试中可以注入替身实现。

use std::sync::Arc;

use crate::auth::{
    CacheSessionStore, CaptchaChallenge, LoginFailureLock, LoginService, LoginStateGuard,
    PasswordHasher, PermissionResolver, UserService,
};
use crate::cache::{CacheManager, CacheStore, build_cache_store};
use crate::config::{AppConfig, AuthConfig};
use crate::database::{init_database, run_migrations};
use crate::error::Result;
use crate::repository::{AuthRepository, SeaOrmRepository};
use crate::settings::SettingsResolver;
use crate::{linfo, logging::{LogComponent, LogStage}};

/// 认证核心：装配好的全部认证与授权组件
///
/// 各组件共享同一个缓存后端与存储后端，克隆开销只是若干 `Arc` 计数
#[derive(Clone)]
pub struct AuthCore {
    config: Arc<AuthConfig>,
    cache_store: Arc<dyn CacheStore>,
    repository: Arc<dyn AuthRepository>,
    settings: SettingsResolver,
    hasher: PasswordHasher,
    login_lock: LoginFailureLock,
    session_store: CacheSessionStore,
    guard: LoginStateGuard,
    captcha: CaptchaChallenge,
    permissions: PermissionResolver,
    users: UserService,
    login: LoginService,
}

impl AuthCore {
    /// 由已构建的缓存后端与存储后端装配全部组件
    #[must_use]
    pub fn new(
        cache_store: Arc<dyn CacheStore>,
        repository: Arc<dyn AuthRepository>,
        config: AuthConfig,
    ) -> Self {
        let cache = CacheManager::new(Arc::clone(&cache_store));
        let settings = SettingsResolver::new(
            cache.clone(),
            Arc::clone(&repository),
            &config.settings_cache_key,
            config.defaults.clone(),
        );
        let hasher = PasswordHasher::new(config.bcrypt_cost, config.hash_workers);
        let login_lock = LoginFailureLock::new(cache.clone(), settings.clone());
        let session_store = CacheSessionStore::new(cache.clone(), settings.clone());
        let guard = LoginStateGuard::new(config.session_user_key.clone());
        let captcha = CaptchaChallenge::new(config.captcha_key.clone());
        let permissions = PermissionResolver::new(cache.clone(), Arc::clone(&repository));
        let users = UserService::new(
            cache,
            Arc::clone(&repository),
            settings.clone(),
            hasher.clone(),
        );
        let login = LoginService::new(
            Arc::clone(&repository),
            users.clone(),
            login_lock.clone(),
            guard.clone(),
            captcha.clone(),
        );

        Self {
            config: Arc::new(config),
            cache_store,
            repository,
            settings,
            hasher,
            login_lock,
            session_store,
            guard,
            captcha,
            permissions,
            users,
            login,
        }
    }

    /// 按应用配置连接数据库、执行迁移并创建缓存后端
    pub async fn bootstrap(config: &AppConfig) -> Result<Self> {
        let db = init_database(&config.database).await?;
        run_migrations(&db).await?;
        let cache_store = build_cache_store(&config.cache).await?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "auth_core_ready",
            &format!("认证核心已就绪，缓存后端: {}", cache_store.backend())
        );

        Ok(Self::new(
            cache_store,
            Arc::new(SeaOrmRepository::new(db)),
            config.auth.clone(),
        ))
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn cache_store(&self) -> &Arc<dyn CacheStore> {
        &self.cache_store
    }

    #[must_use]
    pub fn repository(&self) -> &Arc<dyn AuthRepository> {
        &self.repository
    }

    #[must_use]
    pub const fn settings(&self) -> &SettingsResolver {
        &self.settings
    }

    #[must_use]
    pub const fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    #[must_use]
    pub const fn login_lock(&self) -> &LoginFailureLock {
        &self.login_lock
    }

    #[must_use]
    pub const fn session_store(&self) -> &CacheSessionStore {
        &self.session_store
    }

    #[must_use]
    pub const fn guard(&self) -> &LoginStateGuard {
        &self.guard
    }

    #[must_use]
    pub const fn captcha(&self) -> &CaptchaChallenge {
        &self.captcha
    }

    #[must_use]
    pub const fn permissions(&self) -> &PermissionResolver {
        &self.permissions
    }

    #[must_use]
    pub const fn users(&self) -> &UserService {
        &self.users
    }

    #[must_use]
    pub const fn login(&self) -> &LoginService {
        &self.login
    }
}
